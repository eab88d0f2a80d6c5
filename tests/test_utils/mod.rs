//! Test utilities for database and HTTP testing.
//!
//! Sets up an in-memory SQLite database with migrations applied, plus helpers
//! for creating fixtures through the repositories and driving the router.

#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use journals::config::AppConfig;
use journals::mail::Mailer;
use journals::models::{tenant, user};
use journals::repositories::{
    CreateTenantRequest, CreateUserRequest, RoleRepository, TenantRepository, UserRepository,
};
use journals::server::{AppState, create_app};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_TOKEN: &str = "test-token";

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

pub fn test_config() -> AppConfig {
    AppConfig {
        profile: "test".to_string(),
        database_url: "sqlite::memory:".to_string(),
        db_max_connections: 1,
        operator_tokens: vec![TEST_TOKEN.to_string()],
        public_base_url: "https://journals.test".to_string(),
        ..Default::default()
    }
}

pub fn test_app(db: DatabaseConnection) -> Router {
    create_app(AppState::new(test_config(), db))
}

pub fn test_app_with_mailer(db: DatabaseConnection, mailer: Arc<dyn Mailer>) -> Router {
    create_app(AppState::new(test_config(), db).with_mailer(mailer))
}

pub async fn create_journal(db: &DatabaseConnection, slug: &str) -> Result<tenant::Model> {
    let journal = TenantRepository::new(db)
        .create_tenant(CreateTenantRequest {
            slug: slug.to_string(),
            name: format!("{} Journal", slug),
        })
        .await?;
    Ok(journal)
}

pub async fn create_user(db: &DatabaseConnection, name: &str) -> Result<user::Model> {
    let user = UserRepository::new(db)
        .create_user(CreateUserRequest {
            display_name: name.to_string(),
            email: format!("{}@example.org", name.to_lowercase()),
        })
        .await?;
    Ok(user)
}

/// Creates a role holding `permissions` and grants it to `user_id`.
pub async fn grant_permissions(
    db: &DatabaseConnection,
    user_id: Uuid,
    role: &str,
    permissions: &[&str],
    journal_id: Option<Uuid>,
) -> Result<()> {
    let repo = RoleRepository::new(db);
    let permissions: Vec<String> = permissions.iter().map(|p| p.to_string()).collect();
    repo.upsert_role(role, None, &permissions).await?;
    repo.grant_role(user_id, role, journal_id).await?;
    Ok(())
}

/// Sends an operator-authenticated request and returns the status and JSON body.
///
/// Empty bodies come back as `Value::Null`.
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<Uuid>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", TEST_TOKEN));
    if let Some(user) = user {
        builder = builder.header("x-user-id", user.to_string());
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };

    Ok((status, json))
}
