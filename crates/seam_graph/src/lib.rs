// SPDX-License-Identifier: MIT OR Apache-2.0
//! Dataflow node graph engine for `seam`.
//!
//! This crate keeps a live graph of nodes wired together by typed pins and
//! evaluates it frame by frame:
//! - Typed input/output pins with a sorted pin-to-node index
//! - Connection validation, reference-counted node adjacency, cycle rejection
//! - Cached update and draw orders, repaired incrementally on every topology change
//! - Frame scheduling that only evaluates the ancestors of visible nodes
//!
//! ## Architecture
//!
//! A single [`GraphEngine`] owns every node and pin in dense arenas and hands
//! out integer handles ([`NodeId`], [`PinId`]). Node behaviour is supplied by
//! the host through the [`NodeBehavior`] trait, usually via a [`NodeRegistry`].

pub mod config;
pub mod connection;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod frame;
pub mod node;
pub mod order;
pub mod pin;
pub mod pin_index;
pub mod store;

pub use config::EngineConfig;
pub use connection::Link;
pub use diagnostics::{GraphDiagnostics, NodeDiagnostics};
pub use engine::GraphEngine;
pub use error::{ConfigError, ConnectionError, InvariantViolation};
pub use frame::{FrameScheduler, FrameStats};
pub use node::{
    Adjacent, Node, NodeBehavior, NodeId, NodeRegistry, NodeType, NodeTypeId, UpdateResult,
    INVALID_ORDER,
};
pub use order::OrderKind;
pub use pin::{Pin, PinDirection, PinId, PinSpec, PinType};
pub use pin_index::PinIndex;
pub use store::NodeStore;
