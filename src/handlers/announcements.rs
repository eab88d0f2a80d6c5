//! # Announcements API Handlers
//!
//! The list handler serves both the journal route and the global route; the
//! tenant context decides whether results are scoped or span every journal.

use axum::{
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::{OperatorAuth, Principal, permissions};
use crate::error::ApiError;
use crate::models::announcement;
use crate::repositories::{AnnouncementRepository, NewAnnouncement};
use crate::server::AppState;
use crate::tenancy::TenantContext;

/// Request payload for a new announcement
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateAnnouncementRequest {
    #[schema(example = "Call for papers")]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub published: bool,
}

/// Query parameters for listing announcements
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListAnnouncementsQuery {
    /// Only return published announcements
    #[serde(default)]
    pub published_only: bool,
}

/// List announcements
///
/// Mounted at `/api/v1/announcements` as well, where it lists every journal's
/// announcements.
#[utoipa::path(
    get,
    path = "/api/v1/j/{journal}/announcements",
    security(("bearer_auth" = [])),
    params(
        ("journal" = String, Path, description = "Journal slug"),
        ListAnnouncementsQuery
    ),
    responses(
        (status = 200, description = "Announcements, newest first", body = Vec<announcement::Model>),
        (status = 404, description = "Journal not found", body = ApiError)
    ),
    tag = "announcements"
)]
pub async fn list_announcements(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    context: TenantContext,
    Query(query): Query<ListAnnouncementsQuery>,
) -> Result<Json<Vec<announcement::Model>>, ApiError> {
    let announcements = AnnouncementRepository::new(&state.db, &context)
        .list(query.published_only)
        .await?;
    Ok(Json(announcements))
}

/// Create an announcement in the journal
#[utoipa::path(
    post,
    path = "/api/v1/j/{journal}/announcements",
    security(("bearer_auth" = [])),
    params(("journal" = String, Path, description = "Journal slug")),
    request_body = CreateAnnouncementRequest,
    responses(
        (status = 201, description = "Announcement created", body = announcement::Model),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "No acting user", body = ApiError),
        (status = 403, description = "Missing manage-announcements permission", body = ApiError)
    ),
    tag = "announcements"
)]
pub async fn create_announcement(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    context: TenantContext,
    principal: Principal,
    payload: Result<Json<CreateAnnouncementRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<announcement::Model>), ApiError> {
    principal.require(permissions::MANAGE_ANNOUNCEMENTS)?;
    let Json(request) = payload?;

    let announcement = AnnouncementRepository::new(&state.db, &context)
        .create(NewAnnouncement {
            title: request.title,
            body: request.body,
            published: request.published,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(announcement)))
}
