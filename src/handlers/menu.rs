//! # Menu API Handlers
//!
//! Journal navigation: flat administration of menu items plus the rendered,
//! permission-filtered tree for the calling user.

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::nullable;
use crate::auth::{OperatorAuth, Principal, permissions};
use crate::error::ApiError;
use crate::menu::{MenuNode, MenuTreeNode, build_tree};
use crate::models::menu_item;
use crate::repositories::{MenuItemChanges, MenuItemRepository, NewMenuItem};
use crate::server::AppState;
use crate::tenancy::TenantContext;

/// Request payload for a new menu item
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateMenuItemRequest {
    pub parent_id: Option<Uuid>,
    #[schema(example = "Reports")]
    pub title: String,
    pub icon: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[schema(example = "view-reports")]
    pub permission: Option<String>,
    /// Route relative to the journal, or `#` for a heading
    #[schema(example = "reports")]
    pub route: Option<String>,
}

/// Partial update of a menu item. Omitted fields are unchanged, `null` clears.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateMenuItemRequest {
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub parent_id: Option<Option<Uuid>>,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub icon: Option<Option<String>>,
    pub sort_order: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub permission: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    #[schema(value_type = Option<String>)]
    pub route: Option<Option<String>>,
}

/// List the journal's menu items, flat
#[utoipa::path(
    get,
    path = "/api/v1/j/{journal}/menu",
    security(("bearer_auth" = [])),
    params(("journal" = String, Path, description = "Journal slug")),
    responses(
        (status = 200, description = "Menu items ordered by sort order", body = Vec<menu_item::Model>),
        (status = 404, description = "Journal not found", body = ApiError)
    ),
    tag = "menu"
)]
pub async fn list_menu_items(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    context: TenantContext,
) -> Result<Json<Vec<menu_item::Model>>, ApiError> {
    let items = MenuItemRepository::new(&state.db, &context).list().await?;
    Ok(Json(items))
}

/// Create a menu item
#[utoipa::path(
    post,
    path = "/api/v1/j/{journal}/menu",
    security(("bearer_auth" = [])),
    params(("journal" = String, Path, description = "Journal slug")),
    request_body = CreateMenuItemRequest,
    responses(
        (status = 201, description = "Menu item created", body = menu_item::Model),
        (status = 400, description = "Validation failed or unknown parent", body = ApiError),
        (status = 401, description = "No acting user", body = ApiError),
        (status = 403, description = "Missing manage-menu permission", body = ApiError),
        (status = 404, description = "Journal not found", body = ApiError)
    ),
    tag = "menu"
)]
pub async fn create_menu_item(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    context: TenantContext,
    principal: Principal,
    payload: Result<Json<CreateMenuItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<menu_item::Model>), ApiError> {
    principal.require(permissions::MANAGE_MENU)?;
    let Json(request) = payload?;

    let item = MenuItemRepository::new(&state.db, &context)
        .create(NewMenuItem {
            parent_id: request.parent_id,
            title: request.title,
            icon: request.icon,
            sort_order: request.sort_order,
            permission: request.permission,
            route: request.route,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(item)))
}

/// Update a menu item
#[utoipa::path(
    patch,
    path = "/api/v1/j/{journal}/menu/{id}",
    security(("bearer_auth" = [])),
    params(
        ("journal" = String, Path, description = "Journal slug"),
        ("id" = Uuid, Path, description = "Menu item id")
    ),
    request_body = UpdateMenuItemRequest,
    responses(
        (status = 200, description = "Menu item updated", body = menu_item::Model),
        (status = 400, description = "Validation failed or cyclic parent", body = ApiError),
        (status = 403, description = "Missing manage-menu permission", body = ApiError),
        (status = 404, description = "Menu item not found in this journal", body = ApiError)
    ),
    tag = "menu"
)]
pub async fn update_menu_item(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    context: TenantContext,
    principal: Principal,
    Path((_journal, id)): Path<(String, Uuid)>,
    payload: Result<Json<UpdateMenuItemRequest>, JsonRejection>,
) -> Result<Json<menu_item::Model>, ApiError> {
    principal.require(permissions::MANAGE_MENU)?;
    let Json(request) = payload?;

    let item = MenuItemRepository::new(&state.db, &context)
        .update(
            id,
            MenuItemChanges {
                parent_id: request.parent_id,
                title: request.title,
                icon: request.icon,
                sort_order: request.sort_order,
                permission: request.permission,
                route: request.route,
            },
        )
        .await?;

    Ok(Json(item))
}

/// Delete a menu item; its children move up to its parent
#[utoipa::path(
    delete,
    path = "/api/v1/j/{journal}/menu/{id}",
    security(("bearer_auth" = [])),
    params(
        ("journal" = String, Path, description = "Journal slug"),
        ("id" = Uuid, Path, description = "Menu item id")
    ),
    responses(
        (status = 204, description = "Menu item deleted"),
        (status = 403, description = "Missing manage-menu permission", body = ApiError),
        (status = 404, description = "Menu item not found in this journal", body = ApiError)
    ),
    tag = "menu"
)]
pub async fn delete_menu_item(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    context: TenantContext,
    principal: Principal,
    Path((_journal, id)): Path<(String, Uuid)>,
) -> Result<StatusCode, ApiError> {
    principal.require(permissions::MANAGE_MENU)?;

    MenuItemRepository::new(&state.db, &context).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Navigation tree visible to the acting user
#[utoipa::path(
    get,
    path = "/api/v1/j/{journal}/menu/tree",
    security(("bearer_auth" = [])),
    params(("journal" = String, Path, description = "Journal slug")),
    responses(
        (status = 200, description = "Permission-filtered navigation tree", body = Vec<MenuTreeNode>),
        (status = 404, description = "Journal not found", body = ApiError)
    ),
    tag = "menu"
)]
pub async fn menu_tree(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    context: TenantContext,
    principal: Principal,
) -> Result<Json<Vec<MenuTreeNode>>, ApiError> {
    let nodes: Vec<MenuNode> = MenuItemRepository::new(&state.db, &context)
        .list()
        .await?
        .into_iter()
        .map(MenuNode::from)
        .collect();

    let tree = build_tree(&nodes, &principal, context.route_namespace());
    Ok(Json(tree))
}
