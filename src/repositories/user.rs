//! # User Repository

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::user::{ActiveModel as UserActiveModel, Column as UserColumn, Entity as User, Model as UserModel};

#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub display_name: String,
    pub email: String,
}

pub struct UserRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> UserRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a user. Emails are stored lowercased and must be unique.
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<UserModel, RepositoryError> {
        let display_name = request.display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(RepositoryError::validation_error("display name cannot be empty"));
        }

        let email = request.email.trim().to_ascii_lowercase();
        let well_formed = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !well_formed {
            return Err(RepositoryError::validation_error("email address is not valid"));
        }

        let user = UserActiveModel {
            id: Set(Uuid::new_v4()),
            display_name: Set(display_name),
            email: Set(email),
            created_at: Set(Utc::now().into()),
        };

        user.insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn list_users(&self) -> Result<Vec<UserModel>, RepositoryError> {
        User::find()
            .order_by_asc(UserColumn::DisplayName)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find_user(&self, id: Uuid) -> Result<Option<UserModel>, RepositoryError> {
        User::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
