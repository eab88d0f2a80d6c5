//! # Tenant Repository
//!
//! CRUD operations for journals (tenants). Tenants are global records and are
//! never scoped.

use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::tenant::{
    ActiveModel as TenantActiveModel, Column as TenantColumn, Entity as Tenant,
    Model as TenantModel,
};

static SLUG_PATTERN: OnceLock<Regex> = OnceLock::new();

fn slug_pattern() -> &'static Regex {
    SLUG_PATTERN
        .get_or_init(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("slug pattern is valid"))
}

const SLUG_MIN_LEN: usize = 2;
const SLUG_MAX_LEN: usize = 64;

/// Request data for creating a new journal
#[derive(Debug, Clone)]
pub struct CreateTenantRequest {
    pub slug: String,
    pub name: String,
}

/// Mutable journal fields. The slug cannot change.
#[derive(Debug, Clone, Default)]
pub struct UpdateTenantRequest {
    pub name: Option<String>,
    pub active: Option<bool>,
}

/// Repository for Tenant database operations
pub struct TenantRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> TenantRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a new, active journal
    pub async fn create_tenant(
        &self,
        request: CreateTenantRequest,
    ) -> Result<TenantModel, RepositoryError> {
        validate_slug(&request.slug)?;
        let name = validate_name(&request.name)?;

        if self.get_by_slug(&request.slug).await?.is_some() {
            return Err(RepositoryError::Conflict(format!(
                "journal slug '{}' is already taken",
                request.slug
            )));
        }

        let now = Utc::now();
        let tenant = TenantActiveModel {
            id: Set(Uuid::new_v4()),
            slug: Set(request.slug),
            name: Set(name),
            active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        tenant
            .insert(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// List all journals, ordered by slug
    pub async fn list_tenants(&self) -> Result<Vec<TenantModel>, RepositoryError> {
        Tenant::find()
            .order_by_asc(TenantColumn::Slug)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<TenantModel>, RepositoryError> {
        Tenant::find()
            .filter(TenantColumn::Slug.eq(slug))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Lookup used by the tenant resolver; inactive journals do not resolve.
    pub async fn find_active_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<TenantModel>, RepositoryError> {
        Tenant::find()
            .filter(TenantColumn::Slug.eq(slug))
            .filter(TenantColumn::Active.eq(true))
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    /// Update the name and/or active flag of a journal
    pub async fn update_tenant(
        &self,
        slug: &str,
        request: UpdateTenantRequest,
    ) -> Result<TenantModel, RepositoryError> {
        let tenant = self
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| RepositoryError::not_found(format!("journal '{}' not found", slug)))?;

        let mut active_tenant = tenant.into_active_model();
        if let Some(name) = request.name {
            active_tenant.name = Set(validate_name(&name)?);
        }
        if let Some(active) = request.active {
            active_tenant.active = Set(active);
        }
        active_tenant.updated_at = Set(Utc::now().into());

        active_tenant
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}

/// Checks that a slug is URL-safe: lowercase alphanumerics separated by single hyphens.
pub fn validate_slug(slug: &str) -> Result<(), RepositoryError> {
    if !(SLUG_MIN_LEN..=SLUG_MAX_LEN).contains(&slug.len()) {
        return Err(RepositoryError::validation_error(format!(
            "slug must be between {} and {} characters",
            SLUG_MIN_LEN, SLUG_MAX_LEN
        )));
    }

    if !slug_pattern().is_match(slug) {
        return Err(RepositoryError::validation_error(
            "slug may only contain lowercase letters, digits and single hyphens",
        ));
    }

    Ok(())
}

fn validate_name(name: &str) -> Result<String, RepositoryError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RepositoryError::validation_error("journal name cannot be empty"));
    }
    if trimmed.chars().count() > 255 {
        return Err(RepositoryError::validation_error(
            "journal name cannot exceed 255 characters",
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_slugs() {
        for slug in ["acme", "j2", "journal-of-things", "a1-b2-c3"] {
            assert!(validate_slug(slug).is_ok(), "{slug} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_slugs() {
        let too_long = "a".repeat(65);
        for slug in ["a", "Acme", "-acme", "acme-", "ac--me", "ac me", "acme_j", too_long.as_str()] {
            assert!(
                matches!(validate_slug(slug), Err(RepositoryError::Validation(_))),
                "{slug} should be rejected"
            );
        }
    }

    #[test]
    fn names_are_trimmed_and_required() {
        assert_eq!(validate_name("  Acme  ").unwrap(), "Acme");
        assert!(validate_name("   ").is_err());
    }
}
