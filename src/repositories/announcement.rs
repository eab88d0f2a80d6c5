//! # Announcement Repository

use chrono::Utc;
use sea_orm::{ActiveValue, ColumnTrait, DatabaseConnection, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use super::scoped::ScopedRepository;
use crate::error::RepositoryError;
use crate::models::announcement::{self, Entity as Announcement};
use crate::tenancy::TenantContext;

#[derive(Debug, Clone)]
pub struct NewAnnouncement {
    pub title: String,
    pub body: String,
    pub published: bool,
}

pub struct AnnouncementRepository<'a> {
    db: &'a DatabaseConnection,
    scoped: ScopedRepository<'a, Announcement>,
}

impl<'a> AnnouncementRepository<'a> {
    pub fn new(db: &'a DatabaseConnection, context: &TenantContext) -> Self {
        Self {
            db,
            scoped: ScopedRepository::new(db, context),
        }
    }

    pub async fn create(
        &self,
        request: NewAnnouncement,
    ) -> Result<announcement::Model, RepositoryError> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(RepositoryError::validation_error("announcement title cannot be empty"));
        }

        let model = announcement::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: ActiveValue::NotSet,
            title: Set(title.to_string()),
            body: Set(request.body),
            published: Set(request.published),
            created_at: Set(Utc::now().into()),
        };

        self.scoped.insert(model).await
    }

    /// Newest first. In global mode this spans every journal.
    pub async fn list(
        &self,
        published_only: bool,
    ) -> Result<Vec<announcement::Model>, RepositoryError> {
        let mut query = self.scoped.select();
        if published_only {
            query = query.filter(announcement::Column::Published.eq(true));
        }

        query
            .order_by_desc(announcement::Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}
