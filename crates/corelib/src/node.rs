//! Node abstractions for the Chord ring.
//!
//! Nodes are the participants of the ring. They are identified by a compact
//! `NodeId`, which also serves as the node's handle inside the ring's arena:
//! predecessor, successor and finger links are stored as `NodeId`s, never as
//! references.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::finger::FingerTable;

/// Identifier of a node in the ring's identifier space.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        NodeId(id)
    }
}

/// A participant of the ring and the key/value data it currently owns.
///
/// A node created with [`Node::new`] is detached: it has no predecessor and an
/// empty finger table. Only a [`ChordRing`](crate::ring::ChordRing) links it
/// into the successor chain and moves data into it.
#[derive(Clone, Debug)]
pub struct Node<V> {
    id: NodeId,
    pub(crate) predecessor: Option<NodeId>,
    pub(crate) fingers: FingerTable,
    pub(crate) data: BTreeMap<u64, V>,
}

impl<V> Node<V> {
    /// Construct a detached node.
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            predecessor: None,
            fingers: FingerTable::detached(),
            data: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The node immediately counter-clockwise, if attached.
    pub fn predecessor(&self) -> Option<NodeId> {
        self.predecessor
    }

    /// The node immediately clockwise (finger 0), if attached.
    pub fn successor(&self) -> Option<NodeId> {
        self.fingers.successor()
    }

    pub fn fingers(&self) -> &FingerTable {
        &self.fingers
    }

    /// Keys held by this node, with their values.
    pub fn data(&self) -> &BTreeMap<u64, V> {
        &self.data
    }

    /// True if the node is not linked into any ring.
    pub fn is_detached(&self) -> bool {
        self.predecessor.is_none() && self.fingers.successor().is_none()
    }

    /// Drops the ring links, keeping identifier and data.
    pub(crate) fn detach(&mut self) {
        self.predecessor = None;
        self.fingers = FingerTable::detached();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_is_detached() {
        let node: Node<String> = Node::new(7);
        assert_eq!(node.id(), NodeId(7));
        assert!(node.is_detached());
        assert_eq!(node.successor(), None);
        assert_eq!(node.predecessor(), None);
        assert!(node.data().is_empty());
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId(20).to_string(), "N20");
    }
}
