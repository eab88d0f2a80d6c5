//! # Email Template Repository
//!
//! Templates are global; journals share one set keyed by slug.

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryOrder, Set};

use super::tenant::validate_slug;
use crate::error::RepositoryError;
use crate::models::email_template::{self, Entity as EmailTemplate};

pub struct EmailTemplateRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> EmailTemplateRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn get(&self, slug: &str) -> Result<Option<email_template::Model>, RepositoryError> {
        EmailTemplate::find_by_id(slug.to_string())
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn list(&self) -> Result<Vec<email_template::Model>, RepositoryError> {
        EmailTemplate::find()
            .order_by_asc(email_template::Column::Slug)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Insert or replace the template stored under `slug`.
    pub async fn upsert(
        &self,
        slug: &str,
        subject: String,
        body: String,
    ) -> Result<email_template::Model, RepositoryError> {
        validate_slug(slug)?;
        if subject.trim().is_empty() {
            return Err(RepositoryError::validation_error("template subject cannot be empty"));
        }

        let now = Utc::now();
        match self.get(slug).await? {
            Some(existing) => {
                let mut model = existing.into_active_model();
                model.subject = Set(subject);
                model.body = Set(body);
                model.updated_at = Set(now.into());
                model
                    .update(self.db)
                    .await
                    .map_err(RepositoryError::database_error)
            }
            None => email_template::ActiveModel {
                slug: Set(slug.to_string()),
                subject: Set(subject),
                body: Set(body),
                updated_at: Set(now.into()),
            }
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error),
        }
    }
}
