//! # Server Configuration
//!
//! Router assembly, middleware stack and the OpenAPI document for the journals API.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router, middleware,
    routing::{get, patch, post},
};
use sea_orm::DatabaseConnection;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::auth_middleware;
use crate::config::AppConfig;
use crate::handlers;
use crate::mail::{Mailer, TracingMailer};
use crate::telemetry::trace_id_middleware;
use crate::tenancy::tenant_middleware;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// State with the logging mailer configured from `config`.
    pub fn new(config: AppConfig, db: DatabaseConnection) -> Self {
        let mailer = Arc::new(TracingMailer::new(config.mail_from.clone()));
        Self {
            config: Arc::new(config),
            db,
            mailer,
        }
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }
}

/// Routes mounted under `/api/v1/j/{journal}`.
fn journal_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/menu",
            get(handlers::menu::list_menu_items).post(handlers::menu::create_menu_item),
        )
        .route("/menu/tree", get(handlers::menu::menu_tree))
        .route(
            "/menu/{id}",
            patch(handlers::menu::update_menu_item).delete(handlers::menu::delete_menu_item),
        )
        .route(
            "/announcements",
            get(handlers::announcements::list_announcements)
                .post(handlers::announcements::create_announcement),
        )
        .route("/visits", post(handlers::visits::record_visit))
        .route("/visits/stats", get(handlers::visits::visit_stats))
        .route(
            "/submissions",
            get(handlers::submissions::list_submissions)
                .post(handlers::submissions::create_submission),
        )
        .route(
            "/submissions/{id}/transition",
            post(handlers::submissions::transition_submission),
        )
}

/// Routes mounted under `/api/v1`.
fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/journals",
            get(handlers::tenants::list_journals).post(handlers::tenants::create_journal),
        )
        .route(
            "/journals/{slug}",
            get(handlers::tenants::get_journal).patch(handlers::tenants::update_journal),
        )
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route("/users/{id}/roles", post(handlers::users::grant_role))
        .route(
            "/roles",
            get(handlers::roles::list_roles).post(handlers::roles::upsert_role),
        )
        .route("/templates", get(handlers::templates::list_templates))
        .route(
            "/templates/{slug}",
            get(handlers::templates::get_template).put(handlers::templates::upsert_template),
        )
        .route(
            "/templates/{slug}/preview",
            post(handlers::templates::preview_template),
        )
        .route(
            "/announcements",
            get(handlers::announcements::list_announcements),
        )
        .nest("/j/{journal}", journal_routes())
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let cors = if state.config.is_development() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    // Operator auth runs before the journal is resolved.
    let api = api_routes()
        .layer(middleware::from_fn_with_state(state.clone(), tenant_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(trace_id_middleware))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> Result<()> {
    let addr = config
        .bind_addr()
        .with_context(|| format!("Invalid server address: {}", config.api_bind_addr))?;
    let profile = config.profile.clone();

    let app = create_app(AppState::new(config, db));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("Operator bearer token"))
                    .build(),
            ),
        );
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::tenants::create_journal,
        crate::handlers::tenants::list_journals,
        crate::handlers::tenants::get_journal,
        crate::handlers::tenants::update_journal,
        crate::handlers::users::create_user,
        crate::handlers::users::list_users,
        crate::handlers::users::grant_role,
        crate::handlers::roles::upsert_role,
        crate::handlers::roles::list_roles,
        crate::handlers::templates::list_templates,
        crate::handlers::templates::get_template,
        crate::handlers::templates::upsert_template,
        crate::handlers::templates::preview_template,
        crate::handlers::menu::list_menu_items,
        crate::handlers::menu::create_menu_item,
        crate::handlers::menu::update_menu_item,
        crate::handlers::menu::delete_menu_item,
        crate::handlers::menu::menu_tree,
        crate::handlers::announcements::list_announcements,
        crate::handlers::announcements::create_announcement,
        crate::handlers::visits::record_visit,
        crate::handlers::visits::visit_stats,
        crate::handlers::submissions::list_submissions,
        crate::handlers::submissions::create_submission,
        crate::handlers::submissions::transition_submission,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::handlers::HealthStatus,
            crate::models::tenant::Model,
            crate::models::user::Model,
            crate::models::menu_item::Model,
            crate::models::announcement::Model,
            crate::models::email_template::Model,
            crate::models::submission::Model,
            crate::models::submission::SubmissionStatus,
            crate::menu::MenuTreeNode,
            crate::templating::RenderedMessage,
            crate::repositories::RoleWithPermissions,
            crate::repositories::VisitStats,
            crate::repositories::PathCount,
            crate::handlers::tenants::CreateJournalRequest,
            crate::handlers::tenants::UpdateJournalRequest,
            crate::handlers::users::CreateUserDto,
            crate::handlers::users::GrantRoleRequest,
            crate::handlers::users::RoleGrantResponse,
            crate::handlers::roles::UpsertRoleRequest,
            crate::handlers::templates::UpsertTemplateRequest,
            crate::handlers::templates::PreviewTemplateRequest,
            crate::handlers::menu::CreateMenuItemRequest,
            crate::handlers::menu::UpdateMenuItemRequest,
            crate::handlers::announcements::CreateAnnouncementRequest,
            crate::handlers::visits::RecordVisitRequest,
            crate::handlers::visits::RecordedVisit,
            crate::handlers::submissions::CreateSubmissionRequest,
            crate::handlers::submissions::TransitionRequest,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Journals API",
        description = "Multi-tenant academic journal platform",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
