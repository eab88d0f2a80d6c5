//! # Journals API Handlers
//!
//! Operator endpoints for creating and administering journals (tenants).

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderName, StatusCode, header::LOCATION},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::OperatorAuth;
use crate::error::ApiError;
use crate::models::tenant;
use crate::repositories::{CreateTenantRequest, TenantRepository, UpdateTenantRequest};
use crate::server::AppState;

/// Request payload for creating a journal
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateJournalRequest {
    /// URL-safe identifier, immutable once created
    #[schema(example = "acme-review")]
    pub slug: String,
    #[schema(example = "Acme Review of Applied Science")]
    pub name: String,
}

/// Request payload for updating a journal
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateJournalRequest {
    pub name: Option<String>,
    /// Inactive journals stop resolving on tenant routes
    pub active: Option<bool>,
}

/// Create a new journal
#[utoipa::path(
    post,
    path = "/api/v1/journals",
    security(("bearer_auth" = [])),
    request_body = CreateJournalRequest,
    responses(
        (status = 201, description = "Journal created", body = tenant::Model, headers(
            ("Location", description = "URL of the created journal")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 409, description = "Slug already in use", body = ApiError)
    ),
    tag = "journals"
)]
pub async fn create_journal(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    payload: Result<Json<CreateJournalRequest>, JsonRejection>,
) -> Result<(StatusCode, [(HeaderName, String); 1], Json<tenant::Model>), ApiError> {
    let Json(request) = payload?;

    let journal = TenantRepository::new(&state.db)
        .create_tenant(CreateTenantRequest {
            slug: request.slug,
            name: request.name,
        })
        .await?;

    tracing::info!(journal = %journal.slug, journal_id = %journal.id, "Journal created");
    let location = format!("/api/v1/journals/{}", journal.slug);

    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(journal)))
}

/// List all journals
#[utoipa::path(
    get,
    path = "/api/v1/journals",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All journals ordered by slug", body = Vec<tenant::Model>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "journals"
)]
pub async fn list_journals(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
) -> Result<Json<Vec<tenant::Model>>, ApiError> {
    let journals = TenantRepository::new(&state.db).list_tenants().await?;
    Ok(Json(journals))
}

/// Get a journal by slug
#[utoipa::path(
    get,
    path = "/api/v1/journals/{slug}",
    security(("bearer_auth" = [])),
    params(
        ("slug" = String, Path, description = "Journal slug")
    ),
    responses(
        (status = 200, description = "Journal found", body = tenant::Model),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Journal not found", body = ApiError)
    ),
    tag = "journals"
)]
pub async fn get_journal(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Path(slug): Path<String>,
) -> Result<Json<tenant::Model>, ApiError> {
    TenantRepository::new(&state.db)
        .get_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| journal_not_found(&slug))
}

/// Update a journal's name or active flag
#[utoipa::path(
    patch,
    path = "/api/v1/journals/{slug}",
    security(("bearer_auth" = [])),
    params(
        ("slug" = String, Path, description = "Journal slug")
    ),
    request_body = UpdateJournalRequest,
    responses(
        (status = 200, description = "Journal updated", body = tenant::Model),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Journal not found", body = ApiError)
    ),
    tag = "journals"
)]
pub async fn update_journal(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Path(slug): Path<String>,
    payload: Result<Json<UpdateJournalRequest>, JsonRejection>,
) -> Result<Json<tenant::Model>, ApiError> {
    let Json(request) = payload?;

    let journal = TenantRepository::new(&state.db)
        .update_tenant(
            &slug,
            UpdateTenantRequest {
                name: request.name,
                active: request.active,
            },
        )
        .await?;

    tracing::info!(journal = %journal.slug, active = journal.active, "Journal updated");
    Ok(Json(journal))
}

fn journal_not_found(slug: &str) -> ApiError {
    ApiError::new(
        StatusCode::NOT_FOUND,
        "NOT_FOUND",
        format!("Journal '{}' not found", slug),
    )
}
