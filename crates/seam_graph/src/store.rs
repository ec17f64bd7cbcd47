// SPDX-License-Identifier: MIT OR Apache-2.0
//! Arena storage for nodes and their pins.

use crate::node::{Node, NodeBehavior, NodeId, NodeTypeId};
use crate::pin::{Pin, PinDirection, PinId};

/// Owns every node and pin of a graph.
///
/// Nodes and pins live in dense vectors and are referred to by index handles.
/// Slots are never released, so a handle stays valid for the store's lifetime.
#[derive(Debug, Default)]
pub struct NodeStore {
    nodes: Vec<Node>,
    pins: Vec<Pin>,
}

impl NodeStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node, creating its pins from the behaviour's declarations.
    ///
    /// Inputs are allocated before outputs, both in declaration order.
    pub fn insert(
        &mut self,
        type_id: NodeTypeId,
        name: impl Into<String>,
        behavior: Box<dyn NodeBehavior>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let mut node = Node::new(id, type_id, name.into(), behavior);

        let mut inputs = Vec::with_capacity(node.behavior.inputs().len());
        for spec in node.behavior.inputs() {
            let pin_id = PinId(self.pins.len() as u32);
            self.pins.push(Pin::new(pin_id, id, spec, PinDirection::Input));
            inputs.push(pin_id);
        }

        let mut outputs = Vec::with_capacity(node.behavior.outputs().len());
        for spec in node.behavior.outputs() {
            let pin_id = PinId(self.pins.len() as u32);
            self.pins.push(Pin::new(pin_id, id, spec, PinDirection::Output));
            outputs.push(pin_id);
        }

        node.inputs = inputs;
        node.outputs = outputs;
        self.nodes.push(node);
        id
    }

    /// Get a node by handle
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a mutable node by handle
    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Get a pin by handle
    pub fn pin(&self, id: PinId) -> Option<&Pin> {
        self.pins.get(id.index())
    }

    /// All nodes, in registration order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// All pins, in allocation order
    pub fn pins(&self) -> impl Iterator<Item = &Pin> {
        self.pins.iter()
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of pins
    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }

    /// Whether `id` refers to a registered node
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Node lookup for handles that were validated earlier.
    ///
    /// Panics on a dangling handle: handles are only minted by this store and
    /// slots are never released, so a miss is an engine bug.
    pub(crate) fn get(&self, id: NodeId) -> &Node {
        match self.nodes.get(id.index()) {
            Some(node) => node,
            None => panic!("node handle {id:?} does not belong to this store"),
        }
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node {
        match self.nodes.get_mut(id.index()) {
            Some(node) => node,
            None => panic!("node handle {id:?} does not belong to this store"),
        }
    }

    pub(crate) fn get_pin_mut(&mut self, id: PinId) -> &mut Pin {
        match self.pins.get_mut(id.index()) {
            Some(pin) => pin,
            None => panic!("pin handle {id:?} does not belong to this store"),
        }
    }

    /// Whether `target` can be reached from `from` by following child links.
    ///
    /// A node reaches itself.
    pub fn reaches(&self, from: NodeId, target: NodeId) -> bool {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if std::mem::replace(&mut visited[current.index()], true) {
                continue;
            }
            stack.extend(self.get(current).children.iter().map(|c| c.node));
        }
        false
    }

    /// Mark `id` and every descendant dirty
    pub fn mark_dirty(&mut self, id: NodeId) {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if std::mem::replace(&mut visited[current.index()], true) {
                continue;
            }
            let node = self.get_mut(current);
            node.dirty = true;
            stack.extend(node.children.iter().map(|c| c.node));
        }
    }

    /// Mark the children of `id` (and their descendants) dirty, but not `id`
    pub(crate) fn mark_children_dirty(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.get(id).children.iter().map(|c| c.node).collect();
        for child in children {
            self.mark_dirty(child);
        }
    }
}
