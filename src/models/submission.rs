//! Submission entity model
//!
//! A manuscript submitted to a journal, moving through the editorial workflow
//! described by [`SubmissionStatus`].

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::repositories::scoped::TenantScoped;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "submissions")]
#[schema(as = Submission)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub tenant_id: Option<Uuid>,

    pub author_id: Uuid,

    pub title: String,

    #[serde(rename = "abstract")]
    pub abstract_text: String,

    pub status: SubmissionStatus,

    #[schema(value_type = String, example = "2025-01-01T12:00:00Z")]
    pub created_at: DateTimeWithTimeZone,

    #[schema(value_type = String, example = "2025-01-01T12:00:00Z")]
    pub updated_at: DateTimeWithTimeZone,
}

/// Editorial workflow state of a submission
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[sea_orm(string_value = "submitted")]
    #[default]
    Submitted,

    #[sea_orm(string_value = "under_review")]
    UnderReview,

    #[sea_orm(string_value = "revision_requested")]
    RevisionRequested,

    #[sea_orm(string_value = "accepted")]
    Accepted,

    #[sea_orm(string_value = "rejected")]
    Rejected,

    #[sea_orm(string_value = "published")]
    Published,
}

impl SubmissionStatus {
    /// Whether the workflow allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: SubmissionStatus) -> bool {
        use SubmissionStatus::*;

        matches!(
            (self, next),
            (Submitted, UnderReview)
                | (Submitted, Rejected)
                | (UnderReview, RevisionRequested)
                | (UnderReview, Accepted)
                | (UnderReview, Rejected)
                | (RevisionRequested, UnderReview)
                | (RevisionRequested, Rejected)
                | (Accepted, Published)
        )
    }

    /// Human readable label used in notifications.
    pub fn label(self) -> &'static str {
        match self {
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::UnderReview => "under review",
            SubmissionStatus::RevisionRequested => "revision requested",
            SubmissionStatus::Accepted => "accepted",
            SubmissionStatus::Rejected => "rejected",
            SubmissionStatus::Published => "published",
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id"
    )]
    Author,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TenantScoped for Entity {
    fn tenant_column() -> Column {
        Column::TenantId
    }
}
