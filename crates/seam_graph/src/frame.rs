// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-frame evaluation of the observed part of the graph.
//!
//! A frame runs in one synchronous pass:
//!
//! 1. Time-driven nodes are flagged dirty. Only the flag is set; a time-driven
//!    node may decide it has nothing new to report (a timer that has not fired
//!    yet), so its children are left alone.
//! 2. Each visible node is visited depth-first, parents before the node
//!    itself, so every ancestor is evaluated before anything that reads it.
//! 3. A dirty node runs its update step and becomes clean. If it reports a
//!    change, its descendants become dirty. Visual nodes that ran are queued
//!    for drawing.
//! 4. The draw queue is sorted by draw order.
//!
//! A node is visited at most once per frame, however many visible nodes share
//! it as an ancestor.

use crate::node::{NodeId, UpdateResult};
use crate::order::OrderKind;
use crate::store::NodeStore;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Summary of one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameStats {
    /// Frame number, starting at 1
    pub frame: u64,
    /// Nodes whose update step ran
    pub evaluated: usize,
    /// Visual nodes queued for drawing
    pub drawn: usize,
}

/// Drives dirty nodes through their update step once per frame
#[derive(Debug, Default)]
pub struct FrameScheduler {
    frame: u64,
    visited: Vec<bool>,
    evaluated: Vec<NodeId>,
    nodes_to_draw: Vec<NodeId>,
}

impl FrameScheduler {
    /// Create a scheduler that has not run any frame yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one frame over the ancestors of `visible`.
    pub fn run(
        &mut self,
        store: &mut NodeStore,
        visible: impl IntoIterator<Item = NodeId>,
        time_driven: &[NodeId],
        elapsed: f32,
    ) -> FrameStats {
        self.frame += 1;
        self.evaluated.clear();
        self.nodes_to_draw.clear();
        self.visited.clear();
        self.visited.resize(store.node_count(), false);

        for &id in time_driven {
            store.get_mut(id).dirty = true;
        }

        for id in visible {
            self.visit(store, id, elapsed);
        }

        for &id in &self.nodes_to_draw {
            store.resolved_order(id, OrderKind::Draw);
        }
        // stable, so nodes on the same layer keep evaluation order
        self.nodes_to_draw.sort_by_key(|&id| store.get(id).draw_order);

        let stats = FrameStats {
            frame: self.frame,
            evaluated: self.evaluated.len(),
            drawn: self.nodes_to_draw.len(),
        };
        tracing::trace!(?stats, "Frame evaluated");
        stats
    }

    fn visit(&mut self, store: &mut NodeStore, id: NodeId, elapsed: f32) {
        if std::mem::replace(&mut self.visited[id.index()], true) {
            return;
        }

        // shared ancestors come first when parents are taken lowest layer first
        let mut parents: SmallVec<[(i32, NodeId); 4]> = store
            .get(id)
            .parents
            .iter()
            .map(|p| (store.get(p.node).update_order, p.node))
            .collect();
        parents.sort_by_key(|&(order, _)| order);
        for (_, parent) in parents {
            self.visit(store, parent, elapsed);
        }

        let node = store.get_mut(id);
        if !node.dirty {
            return;
        }

        let result = node.behavior.update(elapsed);
        node.dirty = false;
        self.evaluated.push(id);
        if node.is_visual {
            self.nodes_to_draw.push(id);
        }
        tracing::trace!(node = ?id, ?result, "Node updated");

        if result == UpdateResult::Changed {
            store.mark_children_dirty(id);
        }
    }

    /// Call the draw step of every node queued by the last frame, in draw order
    pub fn draw(&self, store: &mut NodeStore) {
        for &id in &self.nodes_to_draw {
            store.get_mut(id).behavior.draw();
        }
    }

    /// Visual nodes updated by the last frame, sorted by draw order
    pub fn nodes_to_draw(&self) -> &[NodeId] {
        &self.nodes_to_draw
    }

    /// Nodes updated by the last frame, in evaluation order
    pub fn evaluated(&self) -> &[NodeId] {
        &self.evaluated
    }

    /// Number of frames run so far
    pub fn frame(&self) -> u64 {
        self.frame
    }
}
