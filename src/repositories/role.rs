//! # Role Repository
//!
//! Roles bundle permissions; grants attach a role to a user either globally or
//! for a single journal (the authorization team).

use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::{
    role::{self, Entity as Role},
    role_assignment::{self, Entity as RoleAssignment},
    role_permission::{self, Entity as RolePermission},
};

/// A role together with the permissions it grants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RoleWithPermissions {
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<String>,
}

pub struct RoleRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> RoleRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a role or replace the permission set of an existing one.
    pub async fn upsert_role(
        &self,
        name: &str,
        description: Option<String>,
        permissions: &[String],
    ) -> Result<RoleWithPermissions, RepositoryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RepositoryError::validation_error("role name cannot be empty"));
        }

        let mut permissions: Vec<String> = permissions
            .iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        permissions.sort();
        permissions.dedup();

        let txn = self.db.begin().await.map_err(RepositoryError::database_error)?;

        let existing = Role::find_by_id(name.to_string())
            .one(&txn)
            .await
            .map_err(RepositoryError::database_error)?;

        let description = match existing {
            Some(model) if description.is_some() => {
                let mut active: role::ActiveModel = model.into();
                active.description = Set(description.clone());
                active
                    .update(&txn)
                    .await
                    .map_err(RepositoryError::database_error)?;
                description
            }
            Some(model) => model.description,
            None => {
                role::ActiveModel {
                    name: Set(name.to_string()),
                    description: Set(description.clone()),
                    created_at: Set(Utc::now().into()),
                }
                .insert(&txn)
                .await
                .map_err(RepositoryError::database_error)?;
                description
            }
        };

        RolePermission::delete_many()
            .filter(role_permission::Column::RoleName.eq(name))
            .exec(&txn)
            .await
            .map_err(RepositoryError::database_error)?;

        if !permissions.is_empty() {
            RolePermission::insert_many(permissions.iter().map(|permission| {
                role_permission::ActiveModel {
                    role_name: Set(name.to_string()),
                    permission: Set(permission.clone()),
                }
            }))
            .exec(&txn)
            .await
            .map_err(RepositoryError::database_error)?;
        }

        txn.commit().await.map_err(RepositoryError::database_error)?;

        Ok(RoleWithPermissions {
            name: name.to_string(),
            description,
            permissions,
        })
    }

    /// All roles with their permissions, ordered by name
    pub async fn list_roles(&self) -> Result<Vec<RoleWithPermissions>, RepositoryError> {
        let roles = Role::find()
            .order_by_asc(role::Column::Name)
            .find_with_related(RolePermission)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(roles
            .into_iter()
            .map(|(role, grants)| {
                let mut permissions: Vec<String> =
                    grants.into_iter().map(|grant| grant.permission).collect();
                permissions.sort();
                RoleWithPermissions {
                    name: role.name,
                    description: role.description,
                    permissions,
                }
            })
            .collect())
    }

    /// Grant `role_name` to a user, globally when `tenant_id` is `None`.
    ///
    /// Granting the same role for the same team twice is a no-op.
    pub async fn grant_role(
        &self,
        user_id: Uuid,
        role_name: &str,
        tenant_id: Option<Uuid>,
    ) -> Result<role_assignment::Model, RepositoryError> {
        if Role::find_by_id(role_name.to_string())
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .is_none()
        {
            return Err(RepositoryError::not_found(format!("role '{}' not found", role_name)));
        }

        let team = match tenant_id {
            Some(id) => role_assignment::Column::TenantId.eq(id),
            None => role_assignment::Column::TenantId.is_null(),
        };
        let existing = RoleAssignment::find()
            .filter(role_assignment::Column::UserId.eq(user_id))
            .filter(role_assignment::Column::RoleName.eq(role_name))
            .filter(team)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        if let Some(assignment) = existing {
            return Ok(assignment);
        }

        role_assignment::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            role_name: Set(role_name.to_string()),
            tenant_id: Set(tenant_id),
            created_at: Set(Utc::now().into()),
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)
    }

    /// Effective permissions of a user: global grants plus grants for `team_id`.
    pub async fn permissions_for(
        &self,
        user_id: Uuid,
        team_id: Option<Uuid>,
    ) -> Result<HashSet<String>, RepositoryError> {
        let mut team_filter = Condition::any().add(role_assignment::Column::TenantId.is_null());
        if let Some(team_id) = team_id {
            team_filter = team_filter.add(role_assignment::Column::TenantId.eq(team_id));
        }

        let role_names: Vec<String> = RoleAssignment::find()
            .select_only()
            .column(role_assignment::Column::RoleName)
            .filter(role_assignment::Column::UserId.eq(user_id))
            .filter(team_filter)
            .into_tuple()
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        if role_names.is_empty() {
            return Ok(HashSet::new());
        }

        let permissions: Vec<String> = RolePermission::find()
            .select_only()
            .column(role_permission::Column::Permission)
            .filter(role_permission::Column::RoleName.is_in(role_names))
            .into_tuple()
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)?;

        Ok(permissions.into_iter().collect())
    }
}
