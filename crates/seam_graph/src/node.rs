// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph engine.

use crate::pin::{PinId, PinSpec};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Order value meaning "not computed yet, recalculate before use"
pub const INVALID_ORDER: i32 = -1;

/// Handle of a node in the engine's node arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Position of the node in the arena
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Stable numeric tag of a node type.
///
/// Derived from the type's human-readable name with 32-bit FNV-1a, so the same
/// name always maps to the same id across runs and builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeTypeId(pub u32);

impl NodeTypeId {
    /// Hash a node type name into its id
    pub const fn from_name(name: &str) -> Self {
        const OFFSET_BASIS: u32 = 0x811c_9dc5;
        const PRIME: u32 = 0x0100_0193;

        let bytes = name.as_bytes();
        let mut hash = OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u32;
            hash = hash.wrapping_mul(PRIME);
            i += 1;
        }
        Self(hash)
    }
}

/// What a node's computation step reports back to the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpdateResult {
    /// Outputs changed; children become dirty
    Changed,
    /// Outputs are the same as before (e.g. a timer that has not fired yet)
    Unchanged,
}

/// Capability surface of a node type.
///
/// The engine never looks inside a node: it only asks for the flags and pin
/// declarations once at registration, then drives `update`/`draw`.
pub trait NodeBehavior {
    /// Recompute the node's outputs. `elapsed` is the total host time in
    /// seconds since the host started, not the delta of the last frame.
    fn update(&mut self, elapsed: f32) -> UpdateResult;

    /// Render the node's visual output. Only called on visual nodes.
    fn draw(&mut self) {}

    /// Whether the node produces a drawable result
    fn is_visual(&self) -> bool {
        false
    }

    /// Whether the node must be dirtied every frame regardless of its parents
    fn updates_over_time(&self) -> bool {
        false
    }

    /// Input pin declarations
    fn inputs(&self) -> &[PinSpec];

    /// Output pin declarations
    fn outputs(&self) -> &[PinSpec];
}

/// One neighbour in a node's parent or child list.
///
/// Several links between the same two nodes collapse into a single entry;
/// `connection_count` records how many there are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjacent {
    /// The neighbouring node
    pub node: NodeId,
    /// Number of links between the two nodes
    pub connection_count: u32,
}

/// Parent or child list of a node
pub type AdjacencyList = SmallVec<[Adjacent; 4]>;

/// Add one link to `node` in `list`.
///
/// Returns true when this created a new entry, i.e. the topology changed.
pub(crate) fn add_adjacent(list: &mut AdjacencyList, node: NodeId) -> bool {
    match list.iter_mut().find(|a| a.node == node) {
        Some(existing) => {
            existing.connection_count += 1;
            false
        }
        None => {
            list.push(Adjacent {
                node,
                connection_count: 1,
            });
            true
        }
    }
}

/// Remove one link to `node` from `list`.
///
/// Returns `Some(true)` when the entry dropped out, `Some(false)` when only the
/// count went down, and `None` if there was no entry at all.
pub(crate) fn remove_adjacent(list: &mut AdjacencyList, node: NodeId) -> Option<bool> {
    let position = list.iter().position(|a| a.node == node)?;
    if list[position].connection_count == 1 {
        // keep neighbour order stable so a connect/disconnect pair is a no-op
        list.remove(position);
        Some(true)
    } else {
        list[position].connection_count -= 1;
        Some(false)
    }
}

/// A node registered in the engine
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) type_id: NodeTypeId,
    pub(crate) name: String,
    pub(crate) behavior: Box<dyn NodeBehavior>,
    pub(crate) is_visual: bool,
    pub(crate) updates_over_time: bool,
    pub(crate) inputs: Vec<PinId>,
    pub(crate) outputs: Vec<PinId>,
    pub(crate) update_order: i32,
    pub(crate) draw_order: i32,
    pub(crate) dirty: bool,
    pub(crate) parents: AdjacencyList,
    pub(crate) children: AdjacencyList,
}

impl Node {
    pub(crate) fn new(
        id: NodeId,
        type_id: NodeTypeId,
        name: String,
        behavior: Box<dyn NodeBehavior>,
    ) -> Self {
        let is_visual = behavior.is_visual();
        let updates_over_time = behavior.updates_over_time();
        Self {
            id,
            type_id,
            name,
            behavior,
            is_visual,
            updates_over_time,
            inputs: Vec::new(),
            outputs: Vec::new(),
            // no parents yet, so both orders are already resolved
            update_order: 0,
            draw_order: i32::from(is_visual),
            dirty: true,
            parents: AdjacencyList::new(),
            children: AdjacencyList::new(),
        }
    }

    /// Arena handle
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Node type tag
    pub fn type_id(&self) -> NodeTypeId {
        self.type_id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the node produces a drawable result
    pub fn is_visual(&self) -> bool {
        self.is_visual
    }

    /// Whether the node is dirtied at the start of every frame
    pub fn updates_over_time(&self) -> bool {
        self.updates_over_time
    }

    /// Input pin handles
    pub fn inputs(&self) -> &[PinId] {
        &self.inputs
    }

    /// Output pin handles
    pub fn outputs(&self) -> &[PinId] {
        &self.outputs
    }

    /// Get an input pin by index
    pub fn input(&self, index: usize) -> Option<PinId> {
        self.inputs.get(index).copied()
    }

    /// Get an output pin by index
    pub fn output(&self, index: usize) -> Option<PinId> {
        self.outputs.get(index).copied()
    }

    /// Cached update order
    pub fn update_order(&self) -> i32 {
        self.update_order
    }

    /// Cached draw order
    pub fn draw_order(&self) -> i32 {
        self.draw_order
    }

    /// Whether the node's output is stale
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Nodes feeding this node
    pub fn parents(&self) -> &[Adjacent] {
        &self.parents
    }

    /// Nodes fed by this node
    pub fn children(&self) -> &[Adjacent] {
        &self.children
    }

    /// Borrow the node's behaviour
    pub fn behavior(&self) -> &dyn NodeBehavior {
        self.behavior.as_ref()
    }

    pub(crate) fn behavior_mut(&mut self) -> &mut dyn NodeBehavior {
        self.behavior.as_mut()
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("type_id", &self.type_id)
            .field("name", &self.name)
            .field("update_order", &self.update_order)
            .field("draw_order", &self.draw_order)
            .field("dirty", &self.dirty)
            .field("parents", &self.parents)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

/// Node type definition
pub struct NodeType {
    /// Unique type identifier, hashed from `name`
    pub id: NodeTypeId,
    /// Display name
    pub name: String,
    /// Description
    pub description: String,
    constructor: Box<dyn Fn() -> Box<dyn NodeBehavior>>,
}

impl NodeType {
    /// Create a node type whose instances are built by `constructor`
    pub fn new<F>(name: impl Into<String>, description: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> Box<dyn NodeBehavior> + 'static,
    {
        let name = name.into();
        Self {
            id: NodeTypeId::from_name(&name),
            name,
            description: description.into(),
            constructor: Box::new(constructor),
        }
    }

    /// Build a fresh instance of this type
    pub fn instantiate(&self) -> Box<dyn NodeBehavior> {
        (self.constructor)()
    }
}

impl std::fmt::Debug for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeType")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Registry of available node types (the node factory)
#[derive(Debug, Default)]
pub struct NodeRegistry {
    /// Registered node types by ID
    types: indexmap::IndexMap<NodeTypeId, NodeType>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node type, replacing any type with the same name.
    ///
    /// Returns the type's id.
    pub fn register(&mut self, node_type: NodeType) -> NodeTypeId {
        let id = node_type.id;
        if let Some(previous) = self.types.insert(id, node_type) {
            tracing::warn!("Node type {:?} replaced a previous registration", previous.name);
        }
        id
    }

    /// Get a node type by ID
    pub fn get(&self, id: NodeTypeId) -> Option<&NodeType> {
        self.types.get(&id)
    }

    /// Get all registered types, in registration order
    pub fn types(&self) -> impl Iterator<Item = &NodeType> {
        self.types.values()
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no types are registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Create a node behaviour from a type ID
    pub fn create(&self, id: NodeTypeId) -> Option<Box<dyn NodeBehavior>> {
        self.get(id).map(NodeType::instantiate)
    }
}
