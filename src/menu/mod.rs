//! # Navigation Menus
//!
//! Turns a journal's flat list of menu items into the navigation tree a caller
//! is allowed to see. The assembly itself is pure; see [`build_tree`].

mod tree;

pub use tree::{build_tree, resolve_url};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::menu_item;

/// Route value marking a heading without a target of its own.
pub const DISABLED_ROUTE: &str = "#";

/// Deepest nesting a menu may have; a root sits at depth 1.
pub const MAX_MENU_DEPTH: usize = 16;

/// The fields of a menu item the tree assembler works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuNode {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub title: String,
    pub icon: Option<String>,
    pub sort_order: i32,
    pub permission: Option<String>,
    pub route: Option<String>,
}

impl From<menu_item::Model> for MenuNode {
    fn from(item: menu_item::Model) -> Self {
        Self {
            id: item.id,
            parent_id: item.parent_id,
            title: item.title,
            icon: item.icon,
            sort_order: item.sort_order,
            permission: item.permission,
            route: item.route,
        }
    }
}

/// One entry of the rendered navigation tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MenuTreeNode {
    pub id: Uuid,
    #[schema(example = "Reports")]
    pub title: String,
    pub icon: Option<String>,
    /// Resolved link, `null` for headings
    #[schema(example = "/acme/reports")]
    pub url: Option<String>,
    #[schema(no_recursion)]
    pub children: Vec<MenuTreeNode>,
}
