use std::collections::HashMap;

use super::{DISABLED_ROUTE, MAX_MENU_DEPTH, MenuNode, MenuTreeNode};
use crate::auth::PermissionCheck;

/// Builds the navigation forest visible to `principal`.
///
/// Siblings keep ascending `sort_order`, ties keep fetch order. A node whose
/// permission the principal lacks is dropped together with its whole subtree.
/// A surviving node is kept only when it links somewhere or still has children.
///
/// Links resolve to `/{namespace}/{route}`, or `/{route}` without a namespace.
///
/// Broken links are repaired instead of failing: a node whose parent is missing
/// becomes a root, and a cycle is cut by promoting its first member in fetch
/// order to a root. Every node appears at most once. Nodes nested deeper than
/// [`MAX_MENU_DEPTH`] are left out.
pub fn build_tree<P>(nodes: &[MenuNode], principal: &P, namespace: Option<&str>) -> Vec<MenuTreeNode>
where
    P: PermissionCheck + ?Sized,
{
    let forest = Forest::link(nodes);
    let assembler = Assembler {
        nodes,
        forest: &forest,
        principal,
        namespace,
    };

    forest
        .roots
        .iter()
        .filter_map(|&root| assembler.assemble(root))
        .collect()
}

/// Resolves a route template to a link. Blank routes and the disabled marker have none.
pub fn resolve_url(route: Option<&str>, namespace: Option<&str>) -> Option<String> {
    let route = route.map(str::trim).unwrap_or_default();
    if route.is_empty() || route == DISABLED_ROUTE {
        return None;
    }

    let route = route.trim_start_matches('/');
    Some(match namespace {
        Some(namespace) => format!("/{}/{}", namespace, route),
        None => format!("/{}", route),
    })
}

/// Parent/child links between node indices, free of cycles.
struct Forest {
    roots: Vec<usize>,
    children: Vec<Vec<usize>>,
}

impl Forest {
    fn link(nodes: &[MenuNode]) -> Self {
        let mut order: Vec<usize> = (0..nodes.len()).collect();
        order.sort_by_key(|&i| nodes[i].sort_order);

        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            index.entry(node.id).or_insert(i);
        }

        let mut candidates = vec![Vec::new(); nodes.len()];
        let mut top_level = Vec::new();
        for &i in &order {
            let node = &nodes[i];
            match node.parent_id.and_then(|parent| index.get(&parent).copied()) {
                Some(parent) => candidates[parent].push(i),
                None => {
                    if let Some(parent_id) = node.parent_id {
                        tracing::debug!(
                            node_id = %node.id,
                            %parent_id,
                            "Menu item references a missing parent; promoting to root"
                        );
                    }
                    top_level.push(i);
                }
            }
        }

        let mut forest = Forest {
            roots: Vec::new(),
            children: vec![Vec::new(); nodes.len()],
        };
        let mut visited = vec![false; nodes.len()];

        for root in top_level {
            forest.claim(root, &candidates, &mut visited);
        }

        // Whatever is left is only reachable through a cycle.
        for i in 0..nodes.len() {
            if !visited[i] {
                tracing::debug!(
                    node_id = %nodes[i].id,
                    "Menu item is part of a parent cycle; promoting to root"
                );
                forest.claim(i, &candidates, &mut visited);
            }
        }

        // Promoted cycle members take their place among the other roots.
        forest.roots.sort_by_key(|&i| (nodes[i].sort_order, i));
        forest
    }

    fn claim(&mut self, root: usize, candidates: &[Vec<usize>], visited: &mut [bool]) {
        visited[root] = true;
        self.roots.push(root);

        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            for &child in &candidates[current] {
                if !visited[child] {
                    visited[child] = true;
                    self.children[current].push(child);
                    stack.push(child);
                }
            }
        }
    }
}

enum Visit {
    Enter(usize, usize),
    Exit(usize),
}

struct Assembler<'a, P: ?Sized> {
    nodes: &'a [MenuNode],
    forest: &'a Forest,
    principal: &'a P,
    namespace: Option<&'a str>,
}

impl<P> Assembler<'_, P>
where
    P: PermissionCheck + ?Sized,
{
    /// Assembles the subtree under `root` bottom-up with an explicit stack.
    fn assemble(&self, root: usize) -> Option<MenuTreeNode> {
        let mut built: HashMap<usize, MenuTreeNode> = HashMap::new();
        let mut stack = vec![Visit::Enter(root, 1)];

        while let Some(visit) = stack.pop() {
            match visit {
                Visit::Enter(i, depth) => {
                    let node = &self.nodes[i];
                    if !self.permits(node) {
                        continue;
                    }
                    if depth > MAX_MENU_DEPTH {
                        tracing::debug!(
                            node_id = %node.id,
                            depth,
                            "Menu item is nested too deep; dropping subtree"
                        );
                        continue;
                    }

                    stack.push(Visit::Exit(i));
                    for &child in self.forest.children[i].iter().rev() {
                        stack.push(Visit::Enter(child, depth + 1));
                    }
                }
                Visit::Exit(i) => {
                    let node = &self.nodes[i];
                    let children: Vec<MenuTreeNode> = self.forest.children[i]
                        .iter()
                        .filter_map(|child| built.remove(child))
                        .collect();
                    let url = resolve_url(node.route.as_deref(), self.namespace);

                    if url.is_none() && children.is_empty() {
                        continue;
                    }

                    built.insert(
                        i,
                        MenuTreeNode {
                            id: node.id,
                            title: node.title.clone(),
                            icon: node.icon.clone(),
                            url,
                            children,
                        },
                    );
                }
            }
        }

        built.remove(&root)
    }

    fn permits(&self, node: &MenuNode) -> bool {
        match node.permission.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(permission) => self.principal.has_permission(permission),
        }
    }
}
