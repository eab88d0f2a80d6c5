//! # Email Template Handlers
//!
//! Administration of notification templates and a preview endpoint that runs
//! the merge engine exactly as notifications do.

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{OperatorAuth, Principal};
use crate::error::ApiError;
use crate::models::email_template;
use crate::repositories::EmailTemplateRepository;
use crate::server::AppState;
use crate::templating::{MergeFields, RenderedMessage, TemplateRenderer};

/// Request payload for storing a template
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpsertTemplateRequest {
    #[schema(example = "[{{journal_name}}] Update on {{submission_title}}")]
    pub subject: String,
    #[schema(example = "Dear {{user_name}}, ... {{action_url}}")]
    pub body: String,
}

/// Request payload for previewing a template
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct PreviewTemplateRequest {
    /// Merge values; these override `user_name` and `action_url`
    #[serde(default)]
    #[schema(value_type = Object)]
    pub data: MergeFields,
    pub action_url: Option<String>,
}

/// List templates
#[utoipa::path(
    get,
    path = "/api/v1/templates",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Templates ordered by slug", body = Vec<email_template::Model>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "templates"
)]
pub async fn list_templates(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
) -> Result<Json<Vec<email_template::Model>>, ApiError> {
    Ok(Json(EmailTemplateRepository::new(&state.db).list().await?))
}

/// Get a template
#[utoipa::path(
    get,
    path = "/api/v1/templates/{slug}",
    security(("bearer_auth" = [])),
    params(("slug" = String, Path, description = "Template key")),
    responses(
        (status = 200, description = "Template found", body = email_template::Model),
        (status = 404, description = "Template not found", body = ApiError)
    ),
    tag = "templates"
)]
pub async fn get_template(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Path(slug): Path<String>,
) -> Result<Json<email_template::Model>, ApiError> {
    EmailTemplateRepository::new(&state.db)
        .get(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Template '{}' not found", slug),
            )
        })
}

/// Create or replace a template
#[utoipa::path(
    put,
    path = "/api/v1/templates/{slug}",
    security(("bearer_auth" = [])),
    params(("slug" = String, Path, description = "Template key")),
    request_body = UpsertTemplateRequest,
    responses(
        (status = 200, description = "Template stored", body = email_template::Model),
        (status = 400, description = "Invalid slug or empty subject", body = ApiError)
    ),
    tag = "templates"
)]
pub async fn upsert_template(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    Path(slug): Path<String>,
    payload: Result<Json<UpsertTemplateRequest>, JsonRejection>,
) -> Result<Json<email_template::Model>, ApiError> {
    let Json(request) = payload?;

    let template = EmailTemplateRepository::new(&state.db)
        .upsert(&slug, request.subject, request.body)
        .await?;

    tracing::info!(template = %template.slug, "Email template stored");
    Ok(Json(template))
}

/// Render a template for the acting user without sending it
///
/// Missing templates render the built-in fallback message.
#[utoipa::path(
    post,
    path = "/api/v1/templates/{slug}/preview",
    security(("bearer_auth" = [])),
    params(("slug" = String, Path, description = "Template key")),
    request_body = PreviewTemplateRequest,
    responses(
        (status = 200, description = "Rendered subject and body", body = RenderedMessage)
    ),
    tag = "templates"
)]
pub async fn preview_template(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    principal: Principal,
    Path(slug): Path<String>,
    payload: Result<Json<PreviewTemplateRequest>, JsonRejection>,
) -> Result<Json<RenderedMessage>, ApiError> {
    let Json(request) = payload?;

    let rendered = TemplateRenderer::new(&state.db, &state.config)
        .render(&slug, &principal, request.data, request.action_url.as_deref())
        .await;

    Ok(Json(rendered))
}
