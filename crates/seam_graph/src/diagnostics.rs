// SPDX-License-Identifier: MIT OR Apache-2.0
//! Serializable snapshots of engine state for inspector panels and tooling.

use crate::connection::Link;
use crate::engine::GraphEngine;
use crate::node::{Adjacent, Node, NodeId, NodeTypeId};
use serde::{Deserialize, Serialize};

/// State of one node as shown in a properties panel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDiagnostics {
    /// Node handle
    pub id: NodeId,
    /// Node type tag
    pub type_id: NodeTypeId,
    /// Display name
    pub name: String,
    /// Cached update order
    pub update_order: i32,
    /// Cached draw order
    pub draw_order: i32,
    /// Whether the output is stale
    pub dirty: bool,
    /// Whether the node draws
    pub is_visual: bool,
    /// Whether the node is dirtied every frame
    pub updates_over_time: bool,
    /// Whether the node is in the visible set
    pub visible: bool,
    /// Parent nodes with link counts
    pub parents: Vec<Adjacent>,
    /// Child nodes with link counts
    pub children: Vec<Adjacent>,
}

impl NodeDiagnostics {
    fn capture(node: &Node, visible: bool) -> Self {
        Self {
            id: node.id,
            type_id: node.type_id,
            name: node.name.clone(),
            update_order: node.update_order(),
            draw_order: node.draw_order(),
            dirty: node.is_dirty(),
            is_visual: node.is_visual(),
            updates_over_time: node.updates_over_time(),
            visible,
            parents: node.parents().to_vec(),
            children: node.children().to_vec(),
        }
    }
}

/// Snapshot of the whole graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDiagnostics {
    /// Frames run so far
    pub frame: u64,
    /// Every node, in registration order
    pub nodes: Vec<NodeDiagnostics>,
    /// Every link, in creation order
    pub links: Vec<Link>,
    /// Visual nodes drawn by the last frame, in draw order
    pub drawn: Vec<NodeId>,
}

impl GraphEngine {
    /// Diagnostics for a single node
    pub fn node_diagnostics(&self, id: NodeId) -> Option<NodeDiagnostics> {
        self.node(id)
            .map(|node| NodeDiagnostics::capture(node, self.is_visible(id)))
    }

    /// Diagnostics for the whole graph
    pub fn diagnostics(&self) -> GraphDiagnostics {
        GraphDiagnostics {
            frame: self.frame(),
            nodes: self
                .nodes()
                .map(|node| NodeDiagnostics::capture(node, self.is_visible(node.id)))
                .collect(),
            links: self.links().to_vec(),
            drawn: self.nodes_to_draw().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::engine::GraphEngine;
    use crate::node::{NodeBehavior, NodeTypeId, UpdateResult};
    use crate::pin::{PinSpec, PinType};

    struct Preview {
        inputs: Vec<PinSpec>,
    }

    impl NodeBehavior for Preview {
        fn update(&mut self, _elapsed: f32) -> UpdateResult {
            UpdateResult::Changed
        }

        fn is_visual(&self) -> bool {
            true
        }

        fn inputs(&self) -> &[PinSpec] {
            &self.inputs
        }

        fn outputs(&self) -> &[PinSpec] {
            &[]
        }
    }

    #[test]
    fn test_snapshot_reflects_node_state() {
        let mut engine = GraphEngine::new(EngineConfig::default());
        let id = engine.add_node(
            NodeTypeId::from_name("Preview"),
            "preview",
            Box::new(Preview {
                inputs: vec![PinSpec::new("texture", PinType::Texture)],
            }),
        );

        let node = engine.node_diagnostics(id).unwrap();
        assert_eq!(node.name, "preview");
        assert_eq!(node.update_order, 0);
        assert_eq!(node.draw_order, 1);
        assert!(node.dirty);
        assert!(node.visible);

        engine.update(0.0);
        let snapshot = engine.diagnostics();
        assert_eq!(snapshot.frame, 1);
        assert_eq!(snapshot.drawn, vec![id]);
        assert_eq!(snapshot.nodes[0].draw_order, 1);
        assert!(!snapshot.nodes[0].dirty);
    }
}
