//! # Roles API Handlers

use axum::{
    extract::{State, rejection::JsonRejection},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::OperatorAuth;
use crate::error::ApiError;
use crate::repositories::{RoleRepository, RoleWithPermissions};
use crate::server::AppState;

/// Request payload for creating a role or replacing its permissions
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpsertRoleRequest {
    #[schema(example = "editor")]
    pub name: String,
    pub description: Option<String>,
    #[schema(example = json!(["manage-submissions", "view-reports"]))]
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Create a role, or replace the permission set of an existing one
#[utoipa::path(
    post,
    path = "/api/v1/roles",
    security(("bearer_auth" = [])),
    request_body = UpsertRoleRequest,
    responses(
        (status = 200, description = "Role stored", body = RoleWithPermissions),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "roles"
)]
pub async fn upsert_role(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    payload: Result<Json<UpsertRoleRequest>, JsonRejection>,
) -> Result<Json<RoleWithPermissions>, ApiError> {
    let Json(request) = payload?;

    let role = RoleRepository::new(&state.db)
        .upsert_role(&request.name, request.description, &request.permissions)
        .await?;

    tracing::info!(role = %role.name, permissions = role.permissions.len(), "Role stored");
    Ok(Json(role))
}

/// List roles with their permissions
#[utoipa::path(
    get,
    path = "/api/v1/roles",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Roles ordered by name", body = Vec<RoleWithPermissions>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "roles"
)]
pub async fn list_roles(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
) -> Result<Json<Vec<RoleWithPermissions>>, ApiError> {
    Ok(Json(RoleRepository::new(&state.db).list_roles().await?))
}
