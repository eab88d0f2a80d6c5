//! # Authentication and Authorization
//!
//! Operator bearer authentication for the API surface, plus the acting
//! [`Principal`] resolved per request from the `X-User-Id` header forwarded by
//! the trusted front end.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{ApiError, forbidden, unauthorized, validation_error};
use crate::repositories::{RoleRepository, UserRepository};
use crate::server::AppState;
use crate::tenancy::TenantContext;

/// Header carrying the acting user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Permission names understood by the platform.
pub mod permissions {
    pub const MANAGE_MENU: &str = "manage-menu";
    pub const MANAGE_ANNOUNCEMENTS: &str = "manage-announcements";
    pub const VIEW_REPORTS: &str = "view-reports";
    pub const MANAGE_SUBMISSIONS: &str = "manage-submissions";
}

/// Anything that can answer "does the caller hold this permission?"
pub trait PermissionCheck {
    fn has_permission(&self, permission: &str) -> bool;
}

impl PermissionCheck for HashSet<String> {
    fn has_permission(&self, permission: &str) -> bool {
        self.contains(permission)
    }
}

/// The acting user of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Option<Uuid>,
    pub display_name: String,
    pub email: Option<String>,
    /// Effective permissions in the request's journal
    pub permissions: HashSet<String>,
}

impl Principal {
    /// A caller without a user: no permissions at all.
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            display_name: "Guest".to_string(),
            email: None,
            permissions: HashSet::new(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    /// Fails with 401 for anonymous callers and 403 when the permission is missing.
    pub fn require(&self, permission: &str) -> Result<(), ApiError> {
        if !self.is_authenticated() {
            return Err(unauthorized(Some("A user is required for this action")));
        }
        if !self.has_permission(permission) {
            return Err(forbidden(Some(&format!(
                "Missing required permission '{}'",
                permission
            ))));
        }
        Ok(())
    }

    /// Returns the user id or 401.
    pub fn require_user(&self) -> Result<Uuid, ApiError> {
        self.user_id
            .ok_or_else(|| unauthorized(Some("A user is required for this action")))
    }
}

impl PermissionCheck for Principal {
    fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

/// Marker type for authenticated operator requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorAuth;

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        Arc::clone(&app_state.config)
    }
}

/// Middleware requiring a valid operator bearer token.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())?;
    validate_token(&config, token)?;

    request.extensions_mut().insert(OperatorAuth);
    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized(Some("Missing Authorization header")))?
        .to_str()
        .map_err(|_| unauthorized(Some("Invalid Authorization header")))?;

    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| unauthorized(Some("Authorization header must use Bearer scheme")))
}

fn validate_token(config: &AppConfig, token: &str) -> Result<(), ApiError> {
    let is_valid = config
        .operator_tokens
        .iter()
        .any(|configured| ConstantTimeEq::ct_eq(token.as_bytes(), configured.as_bytes()).into());

    if is_valid {
        Ok(())
    } else {
        Err(unauthorized(Some("Invalid bearer token")))
    }
}

fn user_id_from_headers(headers: &HeaderMap) -> Result<Option<Uuid>, ApiError> {
    let Some(value) = headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|raw| raw.trim().parse::<Uuid>().ok())
        .map(Some)
        .ok_or_else(|| {
            validation_error(
                "Invalid user header",
                serde_json::json!({ "X-User-Id": "Must be a valid UUID" }),
            )
        })
}

/// Loads the principal for `user_id` with the permissions effective in `context`.
pub async fn load_principal(
    state: &AppState,
    user_id: Uuid,
    context: &TenantContext,
) -> Result<Principal, ApiError> {
    let user = UserRepository::new(&state.db)
        .find_user(user_id)
        .await?
        .ok_or_else(|| unauthorized(Some("Unknown user")))?;

    let permissions = RoleRepository::new(&state.db)
        .permissions_for(user.id, context.team_id())
        .await?;

    Ok(Principal {
        user_id: Some(user.id),
        display_name: user.display_name,
        email: Some(user.email),
        permissions,
    })
}

impl FromRequestParts<AppState> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(principal.clone());
        }

        let principal = match user_id_from_headers(&parts.headers)? {
            None => Principal::anonymous(),
            Some(user_id) => {
                let context = parts
                    .extensions
                    .get::<TenantContext>()
                    .cloned()
                    .unwrap_or_default();
                load_principal(state, user_id, &context).await?
            }
        };

        parts.extensions.insert(principal.clone());
        Ok(principal)
    }
}

impl<S> FromRequestParts<S> for OperatorAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<OperatorAuth>()
            .copied()
            .ok_or_else(|| unauthorized(Some("Operator authentication required")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode},
        routing::get,
    };
    use tower::ServiceExt;

    fn create_test_config() -> Arc<AppConfig> {
        Arc::new(AppConfig {
            operator_tokens: vec!["test-token-123".to_string()],
            ..Default::default()
        })
    }

    async fn run_middleware(config: Arc<AppConfig>, request: Request<Body>) -> Response {
        async fn handler(_: OperatorAuth) -> &'static str {
            "OK"
        }

        Router::new()
            .route("/test", get(handler))
            .layer(axum::middleware::from_fn_with_state(
                Arc::clone(&config),
                auth_middleware,
            ))
            .oneshot(request)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn missing_auth_header_returns_401() {
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();

        let response = run_middleware(create_test_config(), request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_auth_scheme_returns_401() {
        let request = Request::builder()
            .uri("/test")
            .header("Authorization", "Basic dGVzdDoxMjM=")
            .body(Body::empty())
            .unwrap();

        let response = run_middleware(create_test_config(), request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_token_returns_401() {
        let request = Request::builder()
            .uri("/test")
            .header("Authorization", "Bearer wrong-token")
            .body(Body::empty())
            .unwrap();

        let response = run_middleware(create_test_config(), request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn multiple_tokens_supported() {
        let config = Arc::new(AppConfig {
            operator_tokens: vec!["token-one".to_string(), "token-two".to_string()],
            ..Default::default()
        });

        for candidate in ["token-one", "token-two"] {
            let request = Request::builder()
                .uri("/test")
                .header("Authorization", format!("Bearer {}", candidate))
                .body(Body::empty())
                .unwrap();

            let response = run_middleware(Arc::clone(&config), request).await;
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[test]
    fn user_header_is_optional_but_must_be_uuid() {
        let mut headers = HeaderMap::new();
        assert_eq!(user_id_from_headers(&headers).unwrap(), None);

        let id = Uuid::new_v4();
        headers.insert(USER_ID_HEADER, id.to_string().parse().unwrap());
        assert_eq!(user_id_from_headers(&headers).unwrap(), Some(id));

        headers.insert(USER_ID_HEADER, "nope".parse().unwrap());
        let err = user_id_from_headers(&headers).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn anonymous_principal_is_rejected_for_guarded_actions() {
        let err = Principal::anonymous()
            .require(permissions::MANAGE_MENU)
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn missing_permission_is_forbidden() {
        let principal = Principal {
            user_id: Some(Uuid::new_v4()),
            display_name: "Ada".to_string(),
            email: None,
            permissions: HashSet::from([permissions::VIEW_REPORTS.to_string()]),
        };

        assert!(principal.require(permissions::VIEW_REPORTS).is_ok());
        let err = principal.require(permissions::MANAGE_MENU).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }
}
