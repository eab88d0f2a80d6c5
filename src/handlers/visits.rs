//! # Visitor Analytics Handlers

use axum::{
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header::USER_AGENT},
    response::Json,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{OperatorAuth, Principal, permissions};
use crate::error::ApiError;
use crate::repositories::{VisitRepository, VisitStats};
use crate::server::AppState;
use crate::tenancy::TenantContext;

/// A page view reported by the front end
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordVisitRequest {
    #[schema(example = "/acme/issues/3")]
    pub path: String,
    pub referrer: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordedVisit {
    pub id: Uuid,
}

/// Record a page view
#[utoipa::path(
    post,
    path = "/api/v1/j/{journal}/visits",
    security(("bearer_auth" = [])),
    params(("journal" = String, Path, description = "Journal slug")),
    request_body = RecordVisitRequest,
    responses(
        (status = 201, description = "Visit recorded", body = RecordedVisit),
        (status = 400, description = "Path is not absolute", body = ApiError),
        (status = 404, description = "Journal not found", body = ApiError)
    ),
    tag = "visits"
)]
pub async fn record_visit(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    context: TenantContext,
    headers: HeaderMap,
    payload: Result<Json<RecordVisitRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RecordedVisit>), ApiError> {
    let Json(request) = payload?;
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let visit = VisitRepository::new(&state.db, &context)
        .record(&request.path, request.referrer, user_agent)
        .await?;

    counter!("visits_recorded_total").increment(1);
    Ok((StatusCode::CREATED, Json(RecordedVisit { id: visit.id })))
}

/// Visit counts for the journal
#[utoipa::path(
    get,
    path = "/api/v1/j/{journal}/visits/stats",
    security(("bearer_auth" = [])),
    params(("journal" = String, Path, description = "Journal slug")),
    responses(
        (status = 200, description = "Total and per-path visit counts", body = VisitStats),
        (status = 401, description = "No acting user", body = ApiError),
        (status = 403, description = "Missing view-reports permission", body = ApiError)
    ),
    tag = "visits"
)]
pub async fn visit_stats(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    context: TenantContext,
    principal: Principal,
) -> Result<Json<VisitStats>, ApiError> {
    principal.require(permissions::VIEW_REPORTS)?;

    let stats = VisitRepository::new(&state.db, &context).stats().await?;
    Ok(Json(stats))
}
