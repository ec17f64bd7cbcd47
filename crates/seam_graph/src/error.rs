// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types of the graph engine.

use crate::node::NodeId;
use crate::order::OrderKind;
use crate::pin::{PinId, PinType};

/// Error when creating or removing a connection.
///
/// All of these are reported before anything is mutated, so a rejected call
/// leaves the graph untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// A pin was asked to connect to itself
    #[error("Cannot connect pin {0:?} to itself")]
    SamePin(PinId),

    /// Pin is not owned by any registered node
    #[error("Pin not found: {0:?}")]
    PinNotFound(PinId),

    /// Pin types differ
    #[error("Pins must be of the same type: {output} -> {input}")]
    TypeMismatch {
        /// Type of the output pin
        output: PinType,
        /// Type of the input pin
        input: PinType,
    },

    /// Both pins are inputs, or both are outputs
    #[error("Connections must be made from an output to an input")]
    DirectionMismatch,

    /// The input pin is already fed by another output
    #[error("Input pin {input:?} is already connected to {output:?}")]
    InputAlreadyConnected {
        /// The input pin
        input: PinId,
        /// The output currently feeding it
        output: PinId,
    },

    /// This exact link already exists
    #[error("Pins are already connected: {output:?} -> {input:?}")]
    AlreadyConnected {
        /// Output side of the link
        output: PinId,
        /// Input side of the link
        input: PinId,
    },

    /// The link would make a node depend on itself
    #[error("Connecting {parent:?} -> {child:?} would create a cycle")]
    CycleDetected {
        /// Node owning the output pin
        parent: NodeId,
        /// Node owning the input pin
        child: NodeId,
    },

    /// Disconnect was asked to remove a link that does not exist
    #[error("Pins are not connected: {output:?} -> {input:?}")]
    NotConnected {
        /// Output side of the link
        output: PinId,
        /// Input side of the link
        input: PinId,
    },
}

/// A broken internal invariant, found by
/// [`GraphEngine::verify_invariants`](crate::engine::GraphEngine::verify_invariants).
///
/// These are never expected in a correct engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// Pin index entries are out of order
    #[error("Pin index is not sorted by pin")]
    UnsortedPinIndex,

    /// Pin index disagrees with the pin arena
    #[error("Pin index maps {pin:?} to {indexed:?}, but the pin belongs to {owner:?}")]
    PinIndexMismatch {
        /// The pin
        pin: PinId,
        /// Node stored in the index, if any
        indexed: Option<NodeId>,
        /// Node owning the pin
        owner: NodeId,
    },

    /// Parent and child lists disagree
    #[error(
        "Adjacency asymmetry between {parent:?} and {child:?}: \
         parent lists {child_count} links, child lists {parent_count}"
    )]
    AdjacencyAsymmetry {
        /// Parent node
        parent: NodeId,
        /// Child node
        child: NodeId,
        /// Count on the parent's child entry
        child_count: u32,
        /// Count on the child's parent entry
        parent_count: u32,
    },

    /// Adjacency count does not match the number of links
    #[error("{parent:?} -> {child:?} records {recorded} connections but {actual} links exist")]
    ConnectionCountMismatch {
        /// Parent node
        parent: NodeId,
        /// Child node
        child: NodeId,
        /// Count stored in the adjacency
        recorded: u32,
        /// Links actually present
        actual: u32,
    },

    /// Fan-out lists and the link list disagree
    #[error("Link {output:?} -> {input:?} is missing from the output's fan-out")]
    FanOutMismatch {
        /// Output side of the link
        output: PinId,
        /// Input side of the link
        input: PinId,
    },

    /// A cached order does not follow from its parents
    #[error("{kind:?} order of {node:?} is {actual}, expected {expected}")]
    StaleOrder {
        /// Which layering
        kind: OrderKind,
        /// The node
        node: NodeId,
        /// Cached value
        actual: i32,
        /// Value derived from the parents
        expected: i32,
    },
}

/// Error loading engine or host settings
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Settings file could not be read
    #[error("Failed to read settings file {}: {source}", path.display())]
    Io {
        /// Path that was read
        path: std::path::PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Settings are not valid RON
    #[error("Invalid settings: {0}")]
    Parse(#[from] ron::error::SpannedError),
}
