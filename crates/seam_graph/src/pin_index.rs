// SPDX-License-Identifier: MIT OR Apache-2.0
//! Sorted pin-to-node lookup table.

use crate::node::NodeId;
use crate::pin::PinId;

/// One `(pin, owning node)` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinToNode {
    /// The pin
    pub pin: PinId,
    /// Node owning the pin
    pub node: NodeId,
}

/// Maps pin handles to the node owning them.
///
/// Entries are kept sorted by pin handle so lookups are a binary search.
/// Nodes are added far less often than pins are resolved, so registration
/// simply appends and re-sorts the whole table.
#[derive(Debug, Clone, Default)]
pub struct PinIndex {
    entries: Vec<PinToNode>,
}

impl PinIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every pin of a newly registered node
    pub fn register(&mut self, node: NodeId, pins: impl IntoIterator<Item = PinId>) {
        self.entries
            .extend(pins.into_iter().map(|pin| PinToNode { pin, node }));
        self.entries.sort_unstable_by_key(|entry| entry.pin);
    }

    /// Find the node owning `pin`
    pub fn resolve(&self, pin: PinId) -> Option<NodeId> {
        debug_assert!(self.is_sorted(), "pin index read while unsorted");
        self.entries
            .binary_search_by_key(&pin, |entry| entry.pin)
            .ok()
            .map(|position| self.entries[position].node)
    }

    /// Whether entries are in strictly increasing pin order
    pub fn is_sorted(&self) -> bool {
        self.entries.windows(2).all(|w| w[0].pin < w[1].pin)
    }

    /// All entries, sorted by pin
    pub fn entries(&self) -> &[PinToNode] {
        &self.entries
    }

    /// Number of indexed pins
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_after_out_of_order_registration() {
        let mut index = PinIndex::new();
        index.register(NodeId(1), [PinId(9), PinId(4)]);
        index.register(NodeId(0), [PinId(2), PinId(7)]);

        assert!(index.is_sorted());
        assert_eq!(index.len(), 4);
        assert_eq!(index.resolve(PinId(2)), Some(NodeId(0)));
        assert_eq!(index.resolve(PinId(4)), Some(NodeId(1)));
        assert_eq!(index.resolve(PinId(7)), Some(NodeId(0)));
        assert_eq!(index.resolve(PinId(9)), Some(NodeId(1)));
    }

    #[test]
    fn test_resolve_unknown_pin() {
        let mut index = PinIndex::new();
        assert_eq!(index.resolve(PinId(0)), None);

        index.register(NodeId(0), [PinId(0), PinId(2)]);
        assert_eq!(index.resolve(PinId(1)), None);
        assert_eq!(index.resolve(PinId(3)), None);
    }
}
