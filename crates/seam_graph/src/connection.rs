// SPDX-License-Identifier: MIT OR Apache-2.0
//! Connections (links) between pins.
//!
//! A [`Link`] is one physical connection from an output pin to an input pin.
//! Node-level adjacency aggregates every link between the same two nodes into
//! one parent/child entry with a connection count, so the traversal order only
//! has to be recalculated when the first link between two nodes appears or
//! the last one goes away.

use crate::engine::GraphEngine;
use crate::error::ConnectionError;
use crate::node::{add_adjacent, remove_adjacent, NodeId};
use crate::pin::{PinDirection, PinId};
use serde::{Deserialize, Serialize};

/// A single directed edge from an output pin to an input pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    /// Source (output) pin
    pub output: PinId,
    /// Target (input) pin
    pub input: PinId,
}

impl Link {
    /// Check if this link involves a specific pin
    pub fn involves_pin(&self, pin: PinId) -> bool {
        self.output == pin || self.input == pin
    }
}

/// A validated pair of pins with their owners
#[derive(Debug, Clone, Copy)]
struct Endpoints {
    link: Link,
    parent: NodeId,
    child: NodeId,
}

impl GraphEngine {
    /// Validate two pins and sort them into output and input.
    ///
    /// The pins may be given in either order.
    fn endpoints(&self, pin_a: PinId, pin_b: PinId) -> Result<Endpoints, ConnectionError> {
        if pin_a == pin_b {
            return Err(ConnectionError::SamePin(pin_a));
        }

        let node_a = self
            .pin_index
            .resolve(pin_a)
            .ok_or(ConnectionError::PinNotFound(pin_a))?;
        let node_b = self
            .pin_index
            .resolve(pin_b)
            .ok_or(ConnectionError::PinNotFound(pin_b))?;
        let a = self.store.pin(pin_a).ok_or(ConnectionError::PinNotFound(pin_a))?;
        let b = self.store.pin(pin_b).ok_or(ConnectionError::PinNotFound(pin_b))?;

        let (output, input, parent, child) = match (a.direction, b.direction) {
            (PinDirection::Output, PinDirection::Input) => (a, b, node_a, node_b),
            (PinDirection::Input, PinDirection::Output) => (b, a, node_b, node_a),
            _ => return Err(ConnectionError::DirectionMismatch),
        };

        if output.pin_type != input.pin_type {
            return Err(ConnectionError::TypeMismatch {
                output: output.pin_type,
                input: input.pin_type,
            });
        }

        Ok(Endpoints {
            link: Link {
                output: output.id,
                input: input.id,
            },
            parent,
            child,
        })
    }

    /// Connect an output pin to an input pin.
    ///
    /// On failure nothing is modified. When this is the first link between the
    /// two nodes, the traversal order of the child's subgraph is recalculated.
    /// The child is marked dirty either way, since one of its inputs changed.
    pub fn connect(&mut self, pin_a: PinId, pin_b: PinId) -> Result<Link, ConnectionError> {
        let Endpoints {
            link,
            parent,
            child,
        } = self.endpoints(pin_a, pin_b)?;

        if self.links.contains(&link) {
            return Err(ConnectionError::AlreadyConnected {
                output: link.output,
                input: link.input,
            });
        }
        if let Some(existing) = self.links.iter().find(|l| l.input == link.input) {
            return Err(ConnectionError::InputAlreadyConnected {
                input: link.input,
                output: existing.output,
            });
        }
        if self.store.reaches(child, parent) {
            return Err(ConnectionError::CycleDetected { parent, child });
        }

        self.store.get_pin_mut(link.output).connections.push(link.input);
        self.links.push(link);

        let is_new_child = add_adjacent(&mut self.store.get_mut(parent).children, child);
        let is_new_parent = add_adjacent(&mut self.store.get_mut(child).parents, parent);
        let rearranged = is_new_child || is_new_parent;
        if rearranged {
            self.store.recalculate_traversal_order(child, true, true);
        }
        self.store.mark_dirty(child);

        tracing::debug!(
            ?parent,
            ?child,
            output = ?link.output,
            input = ?link.input,
            rearranged,
            "Connected pins"
        );
        self.check_invariants();
        Ok(link)
    }

    /// Remove the link between two pins.
    ///
    /// When this was the last link between the two nodes, the adjacency entries
    /// are dropped and the child's subgraph gets its traversal order
    /// recalculated. The child is marked dirty either way.
    pub fn disconnect(&mut self, pin_a: PinId, pin_b: PinId) -> Result<(), ConnectionError> {
        let Endpoints {
            link,
            parent,
            child,
        } = self.endpoints(pin_a, pin_b)?;

        let position = self
            .links
            .iter()
            .position(|l| *l == link)
            .ok_or(ConnectionError::NotConnected {
                output: link.output,
                input: link.input,
            })?;
        self.links.remove(position);

        let fan_out = &mut self.store.get_pin_mut(link.output).connections;
        match fan_out.iter().position(|&pin| pin == link.input) {
            Some(index) => {
                fan_out.remove(index);
            }
            None => panic!("link {link:?} is missing from its output's fan-out"),
        }

        let removed_child = remove_adjacent(&mut self.store.get_mut(parent).children, child);
        let Some(removed_child) = removed_child else {
            panic!("{parent:?} has no child entry for {child:?} while a link exists");
        };
        let removed_parent = remove_adjacent(&mut self.store.get_mut(child).parents, parent);
        let Some(removed_parent) = removed_parent else {
            panic!("{child:?} has no parent entry for {parent:?} while a link exists");
        };
        assert_eq!(
            removed_child, removed_parent,
            "connection counts between {parent:?} and {child:?} disagree"
        );

        let rearranged = removed_child || removed_parent;
        if rearranged {
            self.store.recalculate_traversal_order(child, true, true);
        }
        self.store.mark_dirty(child);

        tracing::debug!(
            ?parent,
            ?child,
            output = ?link.output,
            input = ?link.input,
            rearranged,
            "Disconnected pins"
        );
        self.check_invariants();
        Ok(())
    }

    /// Whether a link exists between the two pins, in either argument order
    pub fn is_connected(&self, pin_a: PinId, pin_b: PinId) -> bool {
        self.links.iter().any(|l| {
            (l.output == pin_a && l.input == pin_b) || (l.output == pin_b && l.input == pin_a)
        })
    }

    /// All links, in creation order
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Number of links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Links touching a specific pin
    pub fn links_for_pin(&self, pin: PinId) -> impl Iterator<Item = &Link> {
        self.links.iter().filter(move |l| l.involves_pin(pin))
    }

    /// Number of links from `parent` into `child`, as recorded by the adjacency
    pub fn connection_count(&self, parent: NodeId, child: NodeId) -> u32 {
        self.store
            .node(parent)
            .and_then(|node| node.children().iter().find(|c| c.node == child))
            .map_or(0, |c| c.connection_count)
    }
}
