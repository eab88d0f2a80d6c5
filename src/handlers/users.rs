//! # Users API Handlers
//!
//! Operator endpoints for user accounts and role grants.

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::OperatorAuth;
use crate::error::ApiError;
use crate::models::user;
use crate::repositories::{CreateUserRequest, RoleRepository, TenantRepository, UserRepository};
use crate::server::AppState;

/// Request payload for creating a user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateUserDto {
    #[schema(example = "Ada Lovelace")]
    pub display_name: String,
    #[schema(example = "ada@example.org")]
    pub email: String,
}

/// Request payload for granting a role
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GrantRoleRequest {
    #[schema(example = "editor")]
    pub role: String,
    /// Journal the grant is limited to; omit for a global grant
    #[schema(example = "acme-review")]
    pub journal: Option<String>,
}

/// A recorded role grant
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoleGrantResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    /// `null` for global grants
    pub journal: Option<String>,
}

/// Create a user
#[utoipa::path(
    post,
    path = "/api/v1/users",
    security(("bearer_auth" = [])),
    request_body = CreateUserDto,
    responses(
        (status = 201, description = "User created", body = user::Model),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 409, description = "Email already registered", body = ApiError)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    payload: Result<Json<CreateUserDto>, JsonRejection>,
) -> Result<(StatusCode, Json<user::Model>), ApiError> {
    let Json(request) = payload?;

    let user = UserRepository::new(&state.db)
        .create_user(CreateUserRequest {
            display_name: request.display_name,
            email: request.email,
        })
        .await?;

    tracing::info!(user_id = %user.id, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// List users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Users ordered by display name", body = Vec<user::Model>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
) -> Result<Json<Vec<user::Model>>, ApiError> {
    Ok(Json(UserRepository::new(&state.db).list_users().await?))
}

/// Grant a role to a user, globally or for one journal
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/roles",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User id")
    ),
    request_body = GrantRoleRequest,
    responses(
        (status = 201, description = "Role granted (idempotent)", body = RoleGrantResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "User, role or journal not found", body = ApiError)
    ),
    tag = "users"
)]
pub async fn grant_role(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Path(user_id): Path<Uuid>,
    payload: Result<Json<GrantRoleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RoleGrantResponse>), ApiError> {
    let Json(request) = payload?;

    UserRepository::new(&state.db)
        .find_user(user_id)
        .await?
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("User {} not found", user_id),
            )
        })?;

    let journal = match request.journal.as_deref() {
        Some(slug) => Some(
            TenantRepository::new(&state.db)
                .get_by_slug(slug)
                .await?
                .ok_or_else(|| {
                    ApiError::new(
                        StatusCode::NOT_FOUND,
                        "NOT_FOUND",
                        format!("Journal '{}' not found", slug),
                    )
                })?,
        ),
        None => None,
    };

    let grant = RoleRepository::new(&state.db)
        .grant_role(user_id, &request.role, journal.as_ref().map(|j| j.id))
        .await?;

    tracing::info!(
        %user_id,
        role = %grant.role_name,
        journal = ?journal.as_ref().map(|j| j.slug.as_str()),
        "Role granted"
    );

    Ok((
        StatusCode::CREATED,
        Json(RoleGrantResponse {
            id: grant.id,
            user_id,
            role: grant.role_name,
            journal: journal.map(|j| j.slug),
        }),
    ))
}
