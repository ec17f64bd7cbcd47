// SPDX-License-Identifier: MIT OR Apache-2.0
//! The graph engine: one object owning nodes, pins, links and frame state.

use crate::config::EngineConfig;
use crate::connection::Link;
use crate::error::InvariantViolation;
use crate::frame::{FrameScheduler, FrameStats};
use crate::node::{Node, NodeBehavior, NodeId, NodeRegistry, NodeTypeId};
use crate::order::OrderKind;
use crate::pin::{Pin, PinId};
use crate::pin_index::PinIndex;
use crate::store::NodeStore;
use indexmap::IndexSet;

/// A live dataflow graph.
///
/// Graph mutation (`connect`, `disconnect`, `mark_dirty`) and evaluation
/// (`update`, `draw`) all take `&mut self`, so they are serialised by
/// construction. The engine is meant to be driven from a single frame loop.
#[derive(Debug)]
pub struct GraphEngine {
    config: EngineConfig,
    registry: NodeRegistry,
    pub(crate) store: NodeStore,
    pub(crate) pin_index: PinIndex,
    pub(crate) links: Vec<Link>,
    visible: IndexSet<NodeId>,
    time_driven: Vec<NodeId>,
    scheduler: FrameScheduler,
}

impl GraphEngine {
    /// Create an engine with an empty node registry
    pub fn new(config: EngineConfig) -> Self {
        Self::with_registry(NodeRegistry::new(), config)
    }

    /// Create an engine that builds nodes from `registry`
    pub fn with_registry(registry: NodeRegistry, config: EngineConfig) -> Self {
        Self {
            config,
            registry,
            store: NodeStore::new(),
            pin_index: PinIndex::new(),
            links: Vec::new(),
            visible: IndexSet::new(),
            time_driven: Vec::new(),
            scheduler: FrameScheduler::new(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The node factory
    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// The node factory, e.g. to register more types
    pub fn registry_mut(&mut self) -> &mut NodeRegistry {
        &mut self.registry
    }

    /// Register a node built outside the registry.
    ///
    /// Its pins are indexed immediately. With no parents yet its update
    /// order is 0 and its draw order is 1 if visual, 0 otherwise.
    pub fn add_node(
        &mut self,
        type_id: NodeTypeId,
        name: impl Into<String>,
        behavior: Box<dyn NodeBehavior>,
    ) -> NodeId {
        let id = self.store.insert(type_id, name, behavior);
        let node = self.store.get(id);
        self.pin_index
            .register(id, node.inputs.iter().chain(&node.outputs).copied());

        if node.updates_over_time {
            self.time_driven.push(id);
        }
        if node.is_visual && self.config.auto_show_visual_nodes {
            self.visible.insert(id);
        }

        tracing::debug!(
            node = ?id,
            name = %node.name,
            inputs = node.inputs.len(),
            outputs = node.outputs.len(),
            visual = node.is_visual,
            time_driven = node.updates_over_time,
            "Added node"
        );
        id
    }

    /// Build a node of a registered type and add it.
    ///
    /// Returns `None` if the type is unknown.
    pub fn create_and_add(&mut self, type_id: NodeTypeId) -> Option<NodeId> {
        let Some(node_type) = self.registry.get(type_id) else {
            tracing::debug!(?type_id, "Unknown node type");
            return None;
        };
        let name = node_type.name.clone();
        let behavior = node_type.instantiate();
        Some(self.add_node(type_id, name, behavior))
    }

    /// Build a node from its type's human-readable name
    pub fn create_and_add_by_name(&mut self, name: &str) -> Option<NodeId> {
        self.create_and_add(NodeTypeId::from_name(name))
    }

    /// Get a node by ID
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.store.node(id)
    }

    /// Mutably borrow a node's behaviour, e.g. to edit a property.
    ///
    /// Editing through this handle does not dirty the node; follow it with
    /// [`GraphEngine::mark_dirty`].
    pub fn behavior_mut(&mut self, id: NodeId) -> Option<&mut dyn NodeBehavior> {
        self.store.node_mut(id).map(Node::behavior_mut)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.store.nodes()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.store.node_count()
    }

    /// Get a pin by ID
    pub fn pin(&self, id: PinId) -> Option<&Pin> {
        self.store.pin(id)
    }

    /// Node owning a pin
    pub fn pin_owner(&self, pin: PinId) -> Option<NodeId> {
        self.pin_index.resolve(pin)
    }

    /// Node and pin storage
    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    /// Cached update order of a node
    pub fn update_order(&self, id: NodeId) -> Option<i32> {
        self.store.node(id).map(Node::update_order)
    }

    /// Cached draw order of a node
    pub fn draw_order(&self, id: NodeId) -> Option<i32> {
        self.store.node(id).map(Node::draw_order)
    }

    /// Invalidate and recompute the requested orders of `id` and its
    /// descendants. Returns false for an unknown node.
    pub fn recalculate_traversal_order(
        &mut self,
        id: NodeId,
        recalc_update: bool,
        recalc_draw: bool,
    ) -> bool {
        if !self.store.contains(id) {
            return false;
        }
        self.store.recalculate_traversal_order(id, recalc_update, recalc_draw);
        self.check_invariants();
        true
    }

    /// Mark a node and everything downstream of it dirty, e.g. after one of
    /// its properties was edited. Returns false for an unknown node.
    pub fn mark_dirty(&mut self, id: NodeId) -> bool {
        if !self.store.contains(id) {
            return false;
        }
        self.store.mark_dirty(id);
        true
    }

    /// Observe a node: its ancestors are evaluated every frame.
    ///
    /// The node is appended to the end of the visible set; it is not placed
    /// by draw order. Returns false if the node is unknown or already
    /// visible.
    pub fn show_node(&mut self, id: NodeId) -> bool {
        self.store.contains(id) && self.visible.insert(id)
    }

    /// Stop observing a node. Returns false if it was not visible.
    pub fn hide_node(&mut self, id: NodeId) -> bool {
        self.visible.shift_remove(&id)
    }

    /// Whether a node is currently observed
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.visible.contains(&id)
    }

    /// Observed nodes, in the order they were shown.
    ///
    /// This is insertion order, not draw order, including for visual nodes
    /// shown automatically on registration. Evaluation does not depend on it:
    /// [`nodes_to_draw`](Self::nodes_to_draw) is stably sorted by draw order
    /// every frame.
    pub fn visible_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.visible.iter().copied()
    }

    /// Nodes dirtied at the start of every frame
    pub fn time_driven_nodes(&self) -> &[NodeId] {
        &self.time_driven
    }

    /// Run one frame: dirty time-driven nodes, evaluate the ancestors of every
    /// visible node, and collect the visual nodes to redraw.
    pub fn update(&mut self, elapsed: f32) -> FrameStats {
        self.scheduler.run(
            &mut self.store,
            self.visible.iter().copied(),
            &self.time_driven,
            elapsed,
        )
    }

    /// Draw the nodes updated by the last frame, in draw order
    pub fn draw(&mut self) {
        self.scheduler.draw(&mut self.store);
    }

    /// Visual nodes updated by the last frame, sorted by draw order
    pub fn nodes_to_draw(&self) -> &[NodeId] {
        self.scheduler.nodes_to_draw()
    }

    /// Nodes updated by the last frame, in evaluation order
    pub fn evaluated_nodes(&self) -> &[NodeId] {
        self.scheduler.evaluated()
    }

    /// Number of frames run so far
    pub fn frame(&self) -> u64 {
        self.scheduler.frame()
    }

    /// Check every structural invariant of the graph
    pub fn verify_invariants(&self) -> Result<(), InvariantViolation> {
        if !self.pin_index.is_sorted() {
            return Err(InvariantViolation::UnsortedPinIndex);
        }
        for pin in self.store.pins() {
            let indexed = self.pin_index.resolve(pin.id);
            if indexed != Some(pin.node) {
                return Err(InvariantViolation::PinIndexMismatch {
                    pin: pin.id,
                    indexed,
                    owner: pin.node,
                });
            }
        }

        for link in &self.links {
            let fed = self
                .store
                .pin(link.output)
                .is_some_and(|pin| pin.connections.contains(&link.input));
            if !fed {
                return Err(InvariantViolation::FanOutMismatch {
                    output: link.output,
                    input: link.input,
                });
            }
        }

        for node in self.store.nodes() {
            for child in &node.children {
                let parent_count = self
                    .store
                    .get(child.node)
                    .parents
                    .iter()
                    .find(|p| p.node == node.id)
                    .map_or(0, |p| p.connection_count);
                if parent_count != child.connection_count {
                    return Err(InvariantViolation::AdjacencyAsymmetry {
                        parent: node.id,
                        child: child.node,
                        child_count: child.connection_count,
                        parent_count,
                    });
                }

                let actual = self
                    .links
                    .iter()
                    .filter(|l| {
                        self.pin_index.resolve(l.output) == Some(node.id)
                            && self.pin_index.resolve(l.input) == Some(child.node)
                    })
                    .count() as u32;
                if actual != child.connection_count {
                    return Err(InvariantViolation::ConnectionCountMismatch {
                        parent: node.id,
                        child: child.node,
                        recorded: child.connection_count,
                        actual,
                    });
                }
            }

            for parent in &node.parents {
                let listed = self
                    .store
                    .get(parent.node)
                    .children
                    .iter()
                    .any(|c| c.node == node.id);
                if !listed {
                    return Err(InvariantViolation::AdjacencyAsymmetry {
                        parent: parent.node,
                        child: node.id,
                        child_count: 0,
                        parent_count: parent.connection_count,
                    });
                }
            }

            for kind in [OrderKind::Update, OrderKind::Draw] {
                if let Some(expected) = self.store.expected_order(node.id, kind) {
                    let actual = kind.get(node);
                    if actual != expected {
                        return Err(InvariantViolation::StaleOrder {
                            kind,
                            node: node.id,
                            actual,
                            expected,
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Panic on a broken invariant when the configuration asks for checks
    pub(crate) fn check_invariants(&self) {
        if !self.config.verify_invariants {
            return;
        }
        if let Err(violation) = self.verify_invariants() {
            panic!("graph invariant violated: {violation}");
        }
    }
}

impl Default for GraphEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeType, UpdateResult};
    use crate::pin::{PinSpec, PinType};

    struct Source {
        outputs: Vec<PinSpec>,
    }

    impl NodeBehavior for Source {
        fn update(&mut self, _elapsed: f32) -> UpdateResult {
            UpdateResult::Changed
        }

        fn updates_over_time(&self) -> bool {
            true
        }

        fn inputs(&self) -> &[PinSpec] {
            &[]
        }

        fn outputs(&self) -> &[PinSpec] {
            &self.outputs
        }
    }

    struct Screen {
        inputs: Vec<PinSpec>,
    }

    impl NodeBehavior for Screen {
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

    fn registry() -> NodeRegistry {
        let mut registry = NodeRegistry::new();
        registry.register(NodeType::new("Source", "time-driven float", || {
            Box::new(Source {
                outputs: vec![PinSpec::new("value", PinType::Float)],
            })
        }));
        registry.register(NodeType::new("Screen", "visual sink", || {
            Box::new(Screen {
                inputs: vec![PinSpec::new("value", PinType::Float)],
            })
        }));
        registry
    }

    #[test]
    fn test_create_and_add_registers_bookkeeping() {
        let mut engine = GraphEngine::with_registry(registry(), EngineConfig::default());
        let source = engine.create_and_add_by_name("Source").unwrap();
        let screen = engine.create_and_add_by_name("Screen").unwrap();

        assert_eq!(engine.node_count(), 2);
        let node = engine.node(source).unwrap();
        assert_eq!(node.id(), source);
        assert_eq!(node.name(), "Source");
        assert_eq!(node.type_id(), NodeTypeId::from_name("Source"));
        assert_eq!(engine.time_driven_nodes(), &[source]);
        assert!(engine.is_visible(screen));
        assert!(!engine.is_visible(source));

        let out = engine.node(source).unwrap().output(0).unwrap();
        let input = engine.node(screen).unwrap().input(0).unwrap();
        assert_eq!(engine.pin_owner(out), Some(source));
        assert_eq!(engine.pin_owner(input), Some(screen));
        assert!(engine.verify_invariants().is_ok());
    }

    #[test]
    fn test_unknown_type_is_not_created() {
        let mut engine = GraphEngine::with_registry(registry(), EngineConfig::default());
        assert!(engine.create_and_add_by_name("Nope").is_none());
        assert_eq!(engine.node_count(), 0);
    }

    #[test]
    fn test_auto_show_can_be_disabled() {
        let config = EngineConfig {
            auto_show_visual_nodes: false,
            ..EngineConfig::default()
        };
        let mut engine = GraphEngine::with_registry(registry(), config);
        let screen = engine.create_and_add_by_name("Screen").unwrap();

        assert!(!engine.is_visible(screen));
        assert!(engine.show_node(screen));
        assert!(!engine.show_node(screen));
        assert!(engine.hide_node(screen));
        assert!(!engine.show_node(NodeId(42)));
    }

    #[test]
    fn test_mark_dirty_reaches_descendants() {
        let mut engine = GraphEngine::with_registry(registry(), EngineConfig::default());
        let source = engine.create_and_add_by_name("Source").unwrap();
        let screen = engine.create_and_add_by_name("Screen").unwrap();
        let out = engine.node(source).unwrap().output(0).unwrap();
        let input = engine.node(screen).unwrap().input(0).unwrap();
        engine.connect(out, input).unwrap();

        engine.update(0.0);
        assert!(!engine.node(source).unwrap().is_dirty());
        assert!(!engine.node(screen).unwrap().is_dirty());

        assert!(engine.mark_dirty(source));
        assert!(engine.node(screen).unwrap().is_dirty());
        assert!(!engine.mark_dirty(NodeId(99)));
    }

    #[test]
    fn test_behavior_mut_leaves_topology_alone() {
        let mut engine = GraphEngine::with_registry(registry(), EngineConfig::default());
        let source = engine.create_and_add_by_name("Source").unwrap();
        let screen = engine.create_and_add_by_name("Screen").unwrap();
        let out = engine.node(source).unwrap().output(0).unwrap();
        let input = engine.node(screen).unwrap().input(0).unwrap();
        engine.connect(out, input).unwrap();

        let behavior = engine.behavior_mut(screen).unwrap();
        assert!(behavior.is_visual());
        assert_eq!(behavior.inputs().len(), 1);
        assert!(engine.behavior_mut(NodeId(7)).is_none());

        let node = engine.node(screen).unwrap();
        assert_eq!(node.id(), screen);
        assert_eq!(node.name(), "Screen");
        assert_eq!(engine.pin_owner(input), Some(screen));
        assert_eq!(engine.connection_count(source, screen), 1);
        assert!(engine.verify_invariants().is_ok());
    }
}
