// SPDX-License-Identifier: MIT OR Apache-2.0
//! Traversal order calculation.
//!
//! Every node carries two integer layerings:
//!
//! - **update order**: `1 + max(parents)`, or `0` for a root. Evaluating
//!   nodes in increasing update order runs every parent before its children.
//! - **draw order**: `max(parents) + is_visual`, or `is_visual` for a root.
//!   Only visual nodes add a layer, so the value measures visual depth.
//!
//! Both are cached on the node and only recomputed after a topology change.
//! A change invalidates the affected node and its descendants, then
//! recomputes the same region eagerly so the cache is complete again when the
//! mutation returns.

use crate::node::{Node, NodeId, INVALID_ORDER};
use crate::store::NodeStore;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Selects one of the two layerings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    /// Evaluation order
    Update,
    /// Visual depth
    Draw,
}

impl OrderKind {
    /// Cached value of this layering on `node`
    pub fn get(self, node: &Node) -> i32 {
        match self {
            Self::Update => node.update_order,
            Self::Draw => node.draw_order,
        }
    }

    fn set(self, node: &mut Node, order: i32) {
        match self {
            Self::Update => node.update_order = order,
            Self::Draw => node.draw_order = order,
        }
    }

    /// Order of `node` given the largest order among its parents
    pub fn derive(self, node: &Node, max_parent: Option<i32>) -> i32 {
        match self {
            Self::Update => max_parent.map_or(0, |max| max + 1),
            Self::Draw => max_parent.unwrap_or(0) + i32::from(node.is_visual),
        }
    }
}

impl NodeStore {
    /// Reset the requested orders of `root` and its descendants to
    /// [`INVALID_ORDER`].
    ///
    /// The walk does not descend through a node that is already invalid for
    /// every requested field; its descendants were cleared with it.
    pub fn invalidate_subgraph(
        &mut self,
        root: NodeId,
        invalidate_update: bool,
        invalidate_draw: bool,
    ) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = self.get_mut(id);
            let needs_update = invalidate_update && node.update_order != INVALID_ORDER;
            let needs_draw = invalidate_draw && node.draw_order != INVALID_ORDER;
            if !needs_update && !needs_draw {
                continue;
            }

            if invalidate_update {
                node.update_order = INVALID_ORDER;
            }
            if invalidate_draw {
                node.draw_order = INVALID_ORDER;
            }
            stack.extend(node.children.iter().map(|c| c.node));
        }
    }

    /// Invalidate the subgraph rooted at `root`, then recompute the requested
    /// orders for `root` and all of its descendants.
    pub fn recalculate_traversal_order(
        &mut self,
        root: NodeId,
        recalc_update: bool,
        recalc_draw: bool,
    ) {
        tracing::trace!(?root, recalc_update, recalc_draw, "Recalculating traversal order");
        self.invalidate_subgraph(root, recalc_update, recalc_draw);

        if recalc_update {
            self.compute_order(root, OrderKind::Update);
        }
        if recalc_draw {
            self.compute_order(root, OrderKind::Draw);
        }
    }

    /// Compute the order of `id`, resolving invalid ancestors first, then
    /// bring every descendant's cached value up to date.
    pub fn compute_order(&mut self, id: NodeId, kind: OrderKind) -> i32 {
        let mut in_progress = vec![false; self.node_count()];
        let order = self.resolve_order(id, kind, &mut in_progress);

        let mut visited = vec![false; self.node_count()];
        visited[id.index()] = true;
        let mut stack: Vec<NodeId> = self.get(id).children.iter().map(|c| c.node).collect();
        while let Some(current) = stack.pop() {
            if std::mem::replace(&mut visited[current.index()], true) {
                continue;
            }
            self.resolve_order(current, kind, &mut in_progress);
            stack.extend(self.get(current).children.iter().map(|c| c.node));
        }

        order
    }

    /// Cached order of `id`, computing it (and its ancestors) if invalid
    pub fn resolved_order(&mut self, id: NodeId, kind: OrderKind) -> i32 {
        let mut in_progress = vec![false; self.node_count()];
        self.resolve_order(id, kind, &mut in_progress)
    }

    /// Memoized recursion over parents.
    ///
    /// `in_progress` marks nodes on the current recursion path; meeting one
    /// again means the parent links form a cycle, which connect rejects, so
    /// this is treated as a broken engine invariant.
    fn resolve_order(&mut self, id: NodeId, kind: OrderKind, in_progress: &mut [bool]) -> i32 {
        let node = self.get(id);
        let cached = kind.get(node);
        if cached != INVALID_ORDER {
            return cached;
        }
        assert!(
            !in_progress[id.index()],
            "cycle through node {id:?} while computing {kind:?} order"
        );
        in_progress[id.index()] = true;

        let parents: SmallVec<[NodeId; 4]> = node.parents.iter().map(|p| p.node).collect();
        let max_parent = parents
            .into_iter()
            .map(|parent| self.resolve_order(parent, kind, in_progress))
            .max();

        in_progress[id.index()] = false;
        let node = self.get_mut(id);
        let order = kind.derive(node, max_parent);
        kind.set(node, order);
        order
    }

    /// The order `id` should have given its parents' cached orders.
    ///
    /// Returns `None` while `id` or any parent is still invalid.
    pub fn expected_order(&self, id: NodeId, kind: OrderKind) -> Option<i32> {
        let node = self.get(id);
        if kind.get(node) == INVALID_ORDER {
            return None;
        }
        let mut max_parent = None;
        for parent in &node.parents {
            let order = kind.get(self.get(parent.node));
            if order == INVALID_ORDER {
                return None;
            }
            max_parent = Some(max_parent.map_or(order, |max: i32| max.max(order)));
        }
        Some(kind.derive(node, max_parent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{add_adjacent, NodeBehavior, NodeTypeId, UpdateResult};
    use crate::pin::PinSpec;

    struct Plain {
        visual: bool,
    }

    impl NodeBehavior for Plain {
        fn update(&mut self, _elapsed: f32) -> UpdateResult {
            UpdateResult::Changed
        }

        fn is_visual(&self) -> bool {
            self.visual
        }

        fn inputs(&self) -> &[PinSpec] {
            &[]
        }

        fn outputs(&self) -> &[PinSpec] {
            &[]
        }
    }

    fn add(store: &mut NodeStore, visual: bool) -> NodeId {
        store.insert(NodeTypeId(0), "plain", Box::new(Plain { visual }))
    }

    fn link(store: &mut NodeStore, parent: NodeId, child: NodeId) {
        add_adjacent(&mut store.get_mut(parent).children, child);
        add_adjacent(&mut store.get_mut(child).parents, parent);
        store.recalculate_traversal_order(child, true, true);
    }

    fn orders(store: &NodeStore, id: NodeId) -> (i32, i32) {
        let node = store.node(id).unwrap();
        (node.update_order(), node.draw_order())
    }

    #[test]
    fn test_roots_get_base_orders() {
        let mut store = NodeStore::new();
        let plain = add(&mut store, false);
        let visual = add(&mut store, true);

        assert_eq!(store.resolved_order(plain, OrderKind::Update), 0);
        assert_eq!(store.resolved_order(plain, OrderKind::Draw), 0);
        assert_eq!(store.resolved_order(visual, OrderKind::Update), 0);
        assert_eq!(store.resolved_order(visual, OrderKind::Draw), 1);
    }

    #[test]
    fn test_draw_order_counts_only_visual_layers() {
        // a(plain) -> b(visual) -> c(plain) -> d(visual)
        let mut store = NodeStore::new();
        let a = add(&mut store, false);
        let b = add(&mut store, true);
        let c = add(&mut store, false);
        let d = add(&mut store, true);
        link(&mut store, a, b);
        link(&mut store, b, c);
        link(&mut store, c, d);

        assert_eq!(orders(&store, a), (0, 0));
        assert_eq!(orders(&store, b), (1, 1));
        assert_eq!(orders(&store, c), (2, 1));
        assert_eq!(orders(&store, d), (3, 2));
    }

    #[test]
    fn test_update_order_uses_longest_path() {
        // a -> b -> c, a -> c
        let mut store = NodeStore::new();
        let a = add(&mut store, false);
        let b = add(&mut store, false);
        let c = add(&mut store, false);
        link(&mut store, a, c);
        assert_eq!(orders(&store, c).0, 1);

        link(&mut store, a, b);
        link(&mut store, b, c);
        assert_eq!(orders(&store, c).0, 2);
    }

    #[test]
    fn test_recalculation_repairs_descendants() {
        // x -> y -> z, then a new root feeds x through a two-node chain
        let mut store = NodeStore::new();
        let x = add(&mut store, true);
        let y = add(&mut store, false);
        let z = add(&mut store, true);
        link(&mut store, x, y);
        link(&mut store, y, z);
        assert_eq!(orders(&store, z), (2, 2));

        let r = add(&mut store, true);
        let s = add(&mut store, false);
        link(&mut store, r, s);
        link(&mut store, s, x);

        assert_eq!(orders(&store, x), (2, 2));
        assert_eq!(orders(&store, y), (3, 2));
        assert_eq!(orders(&store, z), (4, 3));
        for id in [r, s, x, y, z] {
            assert_eq!(store.expected_order(id, OrderKind::Update), Some(orders(&store, id).0));
            assert_eq!(store.expected_order(id, OrderKind::Draw), Some(orders(&store, id).1));
        }
    }

    #[test]
    fn test_invalidate_only_requested_fields() {
        let mut store = NodeStore::new();
        let a = add(&mut store, false);
        let b = add(&mut store, true);
        link(&mut store, a, b);

        store.invalidate_subgraph(a, false, true);
        assert_eq!(orders(&store, a), (0, INVALID_ORDER));
        assert_eq!(orders(&store, b), (1, INVALID_ORDER));

        store.recalculate_traversal_order(a, false, true);
        assert_eq!(orders(&store, a), (0, 0));
        assert_eq!(orders(&store, b), (1, 1));
    }

    #[test]
    fn test_shared_child_is_resolved_through_sibling_parent() {
        // p -> a -> c and p -> c; recompute rooted at a while p is invalid
        let mut store = NodeStore::new();
        let p = add(&mut store, false);
        let a = add(&mut store, false);
        let c = add(&mut store, false);
        link(&mut store, p, a);
        link(&mut store, a, c);
        link(&mut store, p, c);

        store.invalidate_subgraph(p, true, true);
        store.compute_order(a, OrderKind::Update);

        assert_eq!(orders(&store, p).0, 0);
        assert_eq!(orders(&store, a).0, 1);
        assert_eq!(orders(&store, c).0, 2);
    }

    #[test]
    #[should_panic(expected = "cycle")]
    fn test_cycle_is_fatal() {
        let mut store = NodeStore::new();
        let a = add(&mut store, false);
        let b = add(&mut store, false);
        add_adjacent(&mut store.get_mut(a).children, b);
        add_adjacent(&mut store.get_mut(b).parents, a);
        add_adjacent(&mut store.get_mut(b).children, a);
        add_adjacent(&mut store.get_mut(a).parents, b);

        store.resolved_order(a, OrderKind::Update);
    }
}
