//! Finger table of a Chord node.
//!
//! Entry `i` is meant to hold the owner of `(n + 2^i) mod 2^m`. Entry 0 is the
//! successor and is the only entry the ring's structure depends on; the others
//! are routing shortcuts that may go stale between stabilizations.

use std::ops::Index;

use crate::node::NodeId;

/// Fixed-size table of `m` optional node handles.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FingerTable {
    fingers: Vec<Option<NodeId>>,
}

impl FingerTable {
    /// Table of `size` entries, all empty.
    pub fn new(size: usize) -> Self {
        Self {
            fingers: vec![None; size],
        }
    }

    /// Empty table used by nodes that are not part of a ring.
    pub(crate) fn detached() -> Self {
        Self::default()
    }

    /// Table of `size` entries with only the successor set.
    pub fn with_successor(size: usize, successor: NodeId) -> Self {
        let mut table = Self::new(size);
        table.set(0, successor);
        table
    }

    /// Finger 0.
    pub fn successor(&self) -> Option<NodeId> {
        self.get(0)
    }

    /// getter; out-of-range indices read as empty
    pub fn get(&self, index: usize) -> Option<NodeId> {
        self.fingers.get(index).copied().flatten()
    }

    /// setter; out-of-range indices are ignored
    pub fn set(&mut self, index: usize, id: NodeId) {
        if let Some(slot) = self.fingers.get_mut(index) {
            *slot = Some(id);
        }
    }

    /// Number of slots (the ring order once attached).
    pub fn len(&self) -> usize {
        self.fingers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingers.is_empty()
    }

    /// Number of populated slots.
    pub fn populated(&self) -> usize {
        self.fingers.iter().flatten().count()
    }

    /// Iterate `(index, entry)` from the highest index down.
    pub fn iter_rev(&self) -> impl Iterator<Item = (usize, NodeId)> + '_ {
        self.fingers
            .iter()
            .enumerate()
            .rev()
            .filter_map(|(i, f)| f.map(|id| (i, id)))
    }

    pub fn list(&self) -> &[Option<NodeId>] {
        &self.fingers
    }
}

impl Index<usize> for FingerTable {
    type Output = Option<NodeId>;

    fn index(&self, index: usize) -> &Self::Output {
        self.fingers.get(index).unwrap_or(&None)
    }
}
