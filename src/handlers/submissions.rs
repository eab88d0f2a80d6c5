//! # Submission Handlers
//!
//! Manuscript intake and editorial decisions for a journal. Status changes go
//! through [`SubmissionWorkflow`], which also notifies the author.

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{OperatorAuth, Principal, PermissionCheck, permissions};
use crate::error::ApiError;
use crate::models::submission::{self, SubmissionStatus};
use crate::repositories::SubmissionRepository;
use crate::server::AppState;
use crate::tenancy::TenantContext;
use crate::workflow::SubmissionWorkflow;

/// Request payload for a new submission
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateSubmissionRequest {
    #[schema(example = "On the Analytical Engine")]
    pub title: String,
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,
}

/// Request payload for an editorial decision
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransitionRequest {
    pub status: SubmissionStatus,
}

/// List submissions
///
/// Users holding `manage-submissions` see every submission of the journal,
/// everyone else only their own.
#[utoipa::path(
    get,
    path = "/api/v1/j/{journal}/submissions",
    security(("bearer_auth" = [])),
    params(("journal" = String, Path, description = "Journal slug")),
    responses(
        (status = 200, description = "Submissions, newest first", body = Vec<submission::Model>),
        (status = 401, description = "No acting user", body = ApiError)
    ),
    tag = "submissions"
)]
pub async fn list_submissions(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    context: TenantContext,
    principal: Principal,
) -> Result<Json<Vec<submission::Model>>, ApiError> {
    let user_id = principal.require_user()?;
    let repo = SubmissionRepository::new(&state.db, &context);

    let submissions = if principal.has_permission(permissions::MANAGE_SUBMISSIONS) {
        repo.list().await?
    } else {
        repo.list_for_author(user_id).await?
    };

    Ok(Json(submissions))
}

/// Submit a manuscript
#[utoipa::path(
    post,
    path = "/api/v1/j/{journal}/submissions",
    security(("bearer_auth" = [])),
    params(("journal" = String, Path, description = "Journal slug")),
    request_body = CreateSubmissionRequest,
    responses(
        (status = 201, description = "Submission received", body = submission::Model),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "No acting user", body = ApiError)
    ),
    tag = "submissions"
)]
pub async fn create_submission(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    context: TenantContext,
    principal: Principal,
    payload: Result<Json<CreateSubmissionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<submission::Model>), ApiError> {
    let author_id = principal.require_user()?;
    let Json(request) = payload?;

    let created = SubmissionWorkflow::new(&state.db, &state.config, state.mailer.as_ref(), &context)
        .submit(&principal, author_id, &request.title, &request.abstract_text)
        .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Move a submission to a new editorial status
#[utoipa::path(
    post,
    path = "/api/v1/j/{journal}/submissions/{id}/transition",
    security(("bearer_auth" = [])),
    params(
        ("journal" = String, Path, description = "Journal slug"),
        ("id" = Uuid, Path, description = "Submission id")
    ),
    request_body = TransitionRequest,
    responses(
        (status = 200, description = "Status changed; the author is notified", body = submission::Model),
        (status = 401, description = "No acting user", body = ApiError),
        (status = 403, description = "Missing manage-submissions permission", body = ApiError),
        (status = 404, description = "Submission not found in this journal", body = ApiError),
        (status = 409, description = "Transition not allowed from the current status", body = ApiError)
    ),
    tag = "submissions"
)]
pub async fn transition_submission(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    context: TenantContext,
    principal: Principal,
    Path((_journal, id)): Path<(String, Uuid)>,
    payload: Result<Json<TransitionRequest>, JsonRejection>,
) -> Result<Json<submission::Model>, ApiError> {
    principal.require(permissions::MANAGE_SUBMISSIONS)?;
    let Json(request) = payload?;

    let updated = SubmissionWorkflow::new(&state.db, &state.config, state.mailer.as_ref(), &context)
        .transition(id, request.status)
        .await?;

    Ok(Json(updated))
}
