//! Email template entity model
//!
//! Templates are global and keyed by slug. Subject and body may contain
//! `{{ placeholder }}` tokens.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "email_templates")]
#[schema(as = EmailTemplate)]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub slug: String,

    pub subject: String,

    pub body: String,

    #[schema(value_type = String, example = "2025-01-01T12:00:00Z")]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
