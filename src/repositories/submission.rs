//! # Submission Repository

use chrono::Utc;
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::Expr,
};
use uuid::Uuid;

use super::scoped::ScopedRepository;
use crate::error::RepositoryError;
use crate::models::submission::{self, Entity as Submission, SubmissionStatus};
use crate::tenancy::TenantContext;

pub struct SubmissionRepository<'a> {
    db: &'a DatabaseConnection,
    scoped: ScopedRepository<'a, Submission>,
}

impl<'a> SubmissionRepository<'a> {
    pub fn new(db: &'a DatabaseConnection, context: &TenantContext) -> Self {
        Self {
            db,
            scoped: ScopedRepository::new(db, context),
        }
    }

    pub async fn create(
        &self,
        author_id: Uuid,
        title: &str,
        abstract_text: &str,
    ) -> Result<submission::Model, RepositoryError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(RepositoryError::validation_error("submission title cannot be empty"));
        }

        let now = Utc::now();
        let model = submission::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: ActiveValue::NotSet,
            author_id: Set(author_id),
            title: Set(title.to_string()),
            abstract_text: Set(abstract_text.trim().to_string()),
            status: Set(SubmissionStatus::Submitted),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        self.scoped.insert(model).await
    }

    /// Newest first
    pub async fn list(&self) -> Result<Vec<submission::Model>, RepositoryError> {
        self.scoped
            .select()
            .order_by_desc(submission::Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Submissions filed by one author, newest first
    pub async fn list_for_author(
        &self,
        author_id: Uuid,
    ) -> Result<Vec<submission::Model>, RepositoryError> {
        self.scoped
            .select()
            .filter(submission::Column::AuthorId.eq(author_id))
            .order_by_desc(submission::Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<submission::Model>, RepositoryError> {
        self.scoped.find_by_id(id).await
    }

    /// Stores a new status, provided the stored status still equals `current.status`.
    ///
    /// Returns `None` when the status changed since `current` was read. Workflow
    /// rules are enforced by the caller.
    pub async fn set_status(
        &self,
        current: &submission::Model,
        status: SubmissionStatus,
    ) -> Result<Option<submission::Model>, RepositoryError> {
        let result = self
            .scoped
            .apply(Submission::update_many())
            .col_expr(submission::Column::Status, Expr::value(status))
            .col_expr(submission::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(submission::Column::Id.eq(current.id))
            .filter(submission::Column::Status.eq(current.status))
            .exec(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.find(current.id).await
    }
}
