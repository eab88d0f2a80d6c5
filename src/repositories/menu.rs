//! # Menu Item Repository
//!
//! Journal-scoped storage for navigation menu items. All reads and writes go
//! through [`ScopedRepository`], so a journal only ever sees its own items.

use std::collections::{HashMap, HashSet};

use chrono::Utc;
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use super::scoped::ScopedRepository;
use crate::error::RepositoryError;
use crate::menu::MAX_MENU_DEPTH;
use crate::models::menu_item::{self, Entity as MenuItem};
use crate::tenancy::TenantContext;

/// Fields for a new menu item
#[derive(Debug, Clone, Default)]
pub struct NewMenuItem {
    pub parent_id: Option<Uuid>,
    pub title: String,
    pub icon: Option<String>,
    pub sort_order: i32,
    pub permission: Option<String>,
    pub route: Option<String>,
}

/// Partial update. The outer `Option` means "leave unchanged", the inner one
/// clears a nullable field.
#[derive(Debug, Clone, Default)]
pub struct MenuItemChanges {
    pub parent_id: Option<Option<Uuid>>,
    pub title: Option<String>,
    pub icon: Option<Option<String>>,
    pub sort_order: Option<i32>,
    pub permission: Option<Option<String>>,
    pub route: Option<Option<String>>,
}

pub struct MenuItemRepository<'a> {
    db: &'a DatabaseConnection,
    context: &'a TenantContext,
    scoped: ScopedRepository<'a, MenuItem>,
}

impl<'a> MenuItemRepository<'a> {
    pub fn new(db: &'a DatabaseConnection, context: &'a TenantContext) -> Self {
        Self {
            db,
            context,
            scoped: ScopedRepository::new(db, context),
        }
    }

    /// Flat list in fetch order: `sort_order`, then creation time.
    pub async fn list(&self) -> Result<Vec<menu_item::Model>, RepositoryError> {
        self.scoped
            .select()
            .order_by_asc(menu_item::Column::SortOrder)
            .order_by_asc(menu_item::Column::CreatedAt)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<menu_item::Model>, RepositoryError> {
        self.scoped.find_by_id(id).await
    }

    pub async fn create(&self, item: NewMenuItem) -> Result<menu_item::Model, RepositoryError> {
        let title = required_title(&item.title)?;
        if let Some(parent_id) = item.parent_id {
            self.require_parent(parent_id).await?;
            let parents = self.parent_links().await?;
            check_depth(depth_of(&parents, parent_id) + 1)?;
        }

        let now = Utc::now();
        let model = menu_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: ActiveValue::NotSet,
            parent_id: Set(item.parent_id),
            title: Set(title),
            icon: Set(normalize(item.icon)),
            sort_order: Set(item.sort_order),
            permission: Set(normalize(item.permission)),
            route: Set(normalize(item.route)),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        self.scoped.insert(model).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        changes: MenuItemChanges,
    ) -> Result<menu_item::Model, RepositoryError> {
        let existing = self
            .find(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("menu item not found"))?;

        if let Some(Some(parent_id)) = changes.parent_id {
            if parent_id == id {
                return Err(RepositoryError::validation_error(
                    "a menu item cannot be its own parent",
                ));
            }
            self.require_parent(parent_id).await?;
            let parents = self.parent_links().await?;
            if is_ancestor(&parents, id, parent_id) {
                return Err(RepositoryError::validation_error(
                    "moving the menu item there would create a cycle",
                ));
            }
            check_depth(depth_of(&parents, parent_id) + subtree_height(&parents, id))?;
        }

        let mut model = existing.into_active_model();
        if let Some(parent_id) = changes.parent_id {
            model.parent_id = Set(parent_id);
        }
        if let Some(title) = changes.title {
            model.title = Set(required_title(&title)?);
        }
        if let Some(icon) = changes.icon {
            model.icon = Set(normalize(icon));
        }
        if let Some(sort_order) = changes.sort_order {
            model.sort_order = Set(sort_order);
        }
        if let Some(permission) = changes.permission {
            model.permission = Set(normalize(permission));
        }
        if let Some(route) = changes.route {
            model.route = Set(normalize(route));
        }
        model.updated_at = Set(Utc::now().into());

        self.scoped.update(model).await
    }

    /// Deletes an item and hands its children to its parent, atomically.
    pub async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(RepositoryError::database_error)?;
        let scoped = ScopedRepository::<MenuItem, DatabaseTransaction>::new(&txn, self.context);

        let item = scoped
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepositoryError::not_found("menu item not found"))?;

        let moved = scoped
            .apply(MenuItem::update_many())
            .col_expr(menu_item::Column::ParentId, Expr::value(item.parent_id))
            .col_expr(menu_item::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(menu_item::Column::ParentId.eq(id))
            .exec(&txn)
            .await
            .map_err(RepositoryError::database_error)?;

        scoped.delete_by_id(id).await?;
        txn.commit().await.map_err(RepositoryError::database_error)?;

        tracing::debug!(
            menu_item_id = %id,
            children_moved = moved.rows_affected,
            "Deleted menu item"
        );
        Ok(())
    }

    async fn require_parent(&self, parent_id: Uuid) -> Result<(), RepositoryError> {
        match self.find(parent_id).await? {
            Some(_) => Ok(()),
            None => Err(RepositoryError::validation_error(
                "parent menu item does not exist in this journal",
            )),
        }
    }

    async fn parent_links(&self) -> Result<HashMap<Uuid, Option<Uuid>>, RepositoryError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .map(|item| (item.id, item.parent_id))
            .collect())
    }
}

/// Whether `node` appears on the parent chain starting at `start` (inclusive).
fn is_ancestor(parents: &HashMap<Uuid, Option<Uuid>>, node: Uuid, start: Uuid) -> bool {
    let mut seen = HashSet::new();
    let mut current = Some(start);
    while let Some(id) = current {
        if id == node {
            return true;
        }
        if !seen.insert(id) {
            return false;
        }
        current = parents.get(&id).copied().flatten();
    }
    false
}

/// Number of items on the parent chain starting at `start`, `start` included.
fn depth_of(parents: &HashMap<Uuid, Option<Uuid>>, start: Uuid) -> usize {
    let mut seen = HashSet::new();
    let mut current = Some(start);
    while let Some(id) = current {
        if !seen.insert(id) {
            break;
        }
        current = parents.get(&id).copied().flatten();
    }
    seen.len()
}

/// Levels in the subtree rooted at `root`, `root` included.
fn subtree_height(parents: &HashMap<Uuid, Option<Uuid>>, root: Uuid) -> usize {
    let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for (&id, &parent) in parents {
        if let Some(parent) = parent {
            children.entry(parent).or_default().push(id);
        }
    }

    let mut seen = HashSet::from([root]);
    let mut level = vec![root];
    let mut height = 0;
    while !level.is_empty() {
        height += 1;
        level = level
            .iter()
            .filter_map(|id| children.get(id))
            .flatten()
            .copied()
            .filter(|child| seen.insert(*child))
            .collect();
    }
    height
}

fn check_depth(depth: usize) -> Result<(), RepositoryError> {
    if depth > MAX_MENU_DEPTH {
        return Err(RepositoryError::validation_error(format!(
            "menus can be nested at most {} levels deep",
            MAX_MENU_DEPTH
        )));
    }
    Ok(())
}

fn required_title(title: &str) -> Result<String, RepositoryError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(RepositoryError::validation_error("menu item title cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_ancestor_chain() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let parents = HashMap::from([(a, None), (b, Some(a)), (c, Some(b))]);

        // Moving `a` under `c` would close the loop a -> b -> c -> a.
        assert!(is_ancestor(&parents, a, c));
        assert!(!is_ancestor(&parents, c, a));
    }

    #[test]
    fn ancestor_walk_terminates_on_existing_cycles() {
        let (a, b, outsider) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let parents = HashMap::from([(a, Some(b)), (b, Some(a))]);

        assert!(!is_ancestor(&parents, outsider, a));
    }

    #[test]
    fn depth_and_height_follow_parent_links() {
        let (a, b, c, d) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let parents = HashMap::from([(a, None), (b, Some(a)), (c, Some(b)), (d, Some(a))]);

        assert_eq!(depth_of(&parents, a), 1);
        assert_eq!(depth_of(&parents, c), 3);
        assert_eq!(subtree_height(&parents, a), 3);
        assert_eq!(subtree_height(&parents, b), 2);
        assert_eq!(subtree_height(&parents, d), 1);
    }

    #[test]
    fn depth_limit_is_inclusive() {
        assert!(check_depth(MAX_MENU_DEPTH).is_ok());
        assert!(check_depth(MAX_MENU_DEPTH + 1).is_err());
    }

    #[test]
    fn normalize_drops_blank_values() {
        assert_eq!(normalize(Some("  ".into())), None);
        assert_eq!(normalize(Some(" reports ".into())), Some("reports".into()));
    }
}
