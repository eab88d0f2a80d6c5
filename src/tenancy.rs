//! # Tenant Context
//!
//! Resolves the journal a request is addressed to and carries it through the
//! request as an explicit [`TenantContext`] value.
//!
//! Tenant routes live under `/api/v1/j/{journal}/...`. When the path names a
//! journal, the resolver looks up the active tenant with that slug and fails the
//! request with `404 TENANT_NOT_FOUND` if there is none. Paths without a journal
//! segment run in [`TenantContext::Global`] mode.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, OriginalUri, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::counter;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{ApiError, TenancyError};
use crate::repositories::TenantRepository;
use crate::server::AppState;

/// Path prefix under which tenant-scoped routes are mounted.
pub const TENANT_ROUTE_PREFIX: &str = "/api/v1/j";

/// The journal a request resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTenant {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
}

/// Request-scoped tenant state. Never shared between requests.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TenantContext {
    /// No journal in the path; reads span all tenants.
    #[default]
    Global,
    Journal(ActiveTenant),
}

impl TenantContext {
    pub fn journal(id: Uuid, slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Journal(ActiveTenant {
            id,
            slug: slug.into(),
            name: name.into(),
        })
    }

    pub fn tenant_id(&self) -> Option<Uuid> {
        self.active().map(|tenant| tenant.id)
    }

    /// Authorization team for role lookups. Equal to the tenant id.
    pub fn team_id(&self) -> Option<Uuid> {
        self.tenant_id()
    }

    /// Namespace prepended to menu routes, the journal slug in tenant mode.
    pub fn route_namespace(&self) -> Option<&str> {
        self.active().map(|tenant| tenant.slug.as_str())
    }

    pub fn active(&self) -> Option<&ActiveTenant> {
        match self {
            TenantContext::Global => None,
            TenantContext::Journal(tenant) => Some(tenant),
        }
    }
}

/// Extracts the journal slug from a request path, if the path is a tenant route.
///
/// `/api/v1/j/acme/menu` yields `Some("acme")`; `/api/v1/journals` and
/// `/api/v1/j/` yield `None`.
pub fn journal_slug_from_path(path: &str) -> Option<&str> {
    let rest = path.strip_prefix(TENANT_ROUTE_PREFIX)?.strip_prefix('/')?;
    let slug = rest.split('/').next()?;
    (!slug.is_empty()).then_some(slug)
}

/// Looks up the active tenant named by `slug`.
pub async fn resolve_tenant(
    state: &AppState,
    slug: &str,
) -> Result<TenantContext, TenancyError> {
    let tenant = TenantRepository::new(&state.db)
        .find_active_by_slug(slug)
        .await?
        .ok_or_else(|| TenancyError::TenantNotFound {
            slug: slug.to_string(),
        })?;

    Ok(TenantContext::journal(tenant.id, tenant.slug, tenant.name))
}

/// Middleware establishing the [`TenantContext`] for every request.
///
/// On a tenant route with an unknown or inactive journal the request is aborted
/// before any handler runs. The slug is read from the original request path, so
/// the middleware also works on nested routers.
pub async fn tenant_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = match request.extensions().get::<OriginalUri>() {
        Some(OriginalUri(uri)) => uri.path().to_owned(),
        None => request.uri().path().to_owned(),
    };

    let Some(slug) = journal_slug_from_path(&path).map(str::to_owned) else {
        request.extensions_mut().insert(TenantContext::Global);
        return next.run(request).await;
    };

    let context = match resolve_tenant(&state, &slug).await {
        Ok(context) => context,
        Err(error) => {
            if matches!(error, TenancyError::TenantNotFound { .. }) {
                counter!("tenant_resolution_failures_total").increment(1);
                tracing::info!(journal = %slug, "Rejected request for unknown journal");
            } else {
                tracing::error!(journal = %slug, error = %error, "Tenant lookup failed");
            }
            return ApiError::from(error).into_response();
        }
    };

    let span = tracing::info_span!(
        "tenant",
        journal = %slug,
        tenant_id = ?context.tenant_id()
    );
    request.extensions_mut().insert(context);
    next.run(request).instrument(span).await
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<TenantContext>()
            .cloned()
            .unwrap_or_default())
    }
}
