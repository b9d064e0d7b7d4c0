//! Membership changes: join with data migration, leave with data handoff.
//!
//! Neither operation repairs the fingers of other nodes; call
//! [`ChordRing::stabilize`] for that. Both keep the successor chain and the
//! predecessor links consistent, which is all routing needs to stay correct.

use tracing::{debug, info};

use super::ring::ChordRing;
use crate::error::{Error, Result};
use crate::finger::FingerTable;
use crate::node::{Node, NodeId};

/// Result of [`ChordRing::join`].
#[derive(Debug)]
pub enum JoinOutcome<V> {
    /// The node is now a member and took over `migrated` keys.
    Joined { id: NodeId, migrated: usize },
    /// A member with the same identifier exists; the ring is unchanged and
    /// the rejected node is handed back.
    AlreadyPresent(Node<V>),
}

impl<V> JoinOutcome<V> {
    pub fn is_joined(&self) -> bool {
        matches!(self, Self::Joined { .. })
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::AlreadyPresent(_))
    }

    /// Number of keys moved into the new node (0 for a duplicate).
    pub fn migrated(&self) -> usize {
        match self {
            Self::Joined { migrated, .. } => *migrated,
            Self::AlreadyPresent(_) => 0,
        }
    }
}

impl<V> ChordRing<V> {
    /// Joins `node` to the ring.
    ///
    /// The current owner of the node's identifier gives up the keys that the
    /// new node is now strictly closer to; the node is spliced in as the
    /// owner's predecessor and its fingers are built. Joining an empty ring
    /// makes the node its only member. Entries the node already carries are
    /// re-homed to their owners afterwards.
    pub fn join(&mut self, mut node: Node<V>) -> Result<JoinOutcome<V>> {
        let id = node.id();
        if !self.space.contains(id.0) {
            return Err(Error::IdentifierOutOfRange {
                id: id.0,
                size: self.space.size(),
            });
        }

        let Some(entry) = self.entry else {
            info!(node = %id, keys = node.data.len(), "node founded empty ring");
            metrics::counter!("chord_joins_total").increment(1);
            self.found(node);
            return Ok(JoinOutcome::Joined { id, migrated: 0 });
        };

        let owner = self.lookup(entry, id.0)?;
        if owner == id {
            info!(node = %id, "node already present, join ignored");
            metrics::counter!("chord_duplicate_joins_total").increment(1);
            return Ok(JoinOutcome::AlreadyPresent(node));
        }

        // Resolve both neighbours before anything moves.
        let old_predecessor = self.predecessor(owner)?;
        if !self.nodes.contains_key(&old_predecessor) {
            return Err(Error::UnknownNode(old_predecessor));
        }

        let carried = std::mem::take(&mut node.data);
        let space = self.space;
        let owner_node = self.node_mut(owner)?;

        // One key set drives both the copy and the delete.
        let migrating: Vec<u64> = owner_node
            .data
            .keys()
            .copied()
            .filter(|&key| space.distance(key, id.0) < space.distance(key, owner.0))
            .collect();
        for key in &migrating {
            if let Some(value) = owner_node.data.remove(key) {
                node.data.insert(*key, value);
            }
        }

        owner_node.predecessor = Some(id);
        node.predecessor = Some(old_predecessor);
        node.fingers = FingerTable::with_successor(space.order() as usize, owner);
        self.nodes.insert(id, node);
        self.node_mut(old_predecessor)?.fingers.set(0, id);

        self.rebuild_fingers(id)?;

        let migrated = migrating.len();
        info!(
            node = %id,
            successor = %owner,
            predecessor = %old_predecessor,
            migrated,
            "node joined"
        );
        metrics::counter!("chord_joins_total").increment(1);
        metrics::counter!("chord_keys_migrated_total").increment(migrated as u64);

        if !carried.is_empty() {
            debug!(node = %id, keys = carried.len(), "re-homing carried entries");
            for (key, value) in carried {
                self.insert(key, value)?;
            }
        }

        Ok(JoinOutcome::Joined { id, migrated })
    }

    /// Removes node `id` from the ring and returns it detached.
    ///
    /// All of its data moves to its successor. When it is the last node the
    /// ring becomes empty and the returned node keeps its data; it can found
    /// the ring again through [`join`](Self::join).
    pub fn leave(&mut self, id: NodeId) -> Result<Node<V>> {
        let successor = self.successor(id)?;

        if successor == id {
            let mut node = self.nodes.remove(&id).ok_or(Error::UnknownNode(id))?;
            node.detach();
            self.entry = None;
            info!(node = %id, keys = node.data.len(), "last node left, ring is empty");
            metrics::counter!("chord_leaves_total").increment(1);
            return Ok(node);
        }

        let predecessor = self.predecessor(id)?;
        let mut node = self.nodes.remove(&id).ok_or(Error::UnknownNode(id))?;
        let handed_off = node.data.len();

        let heir = self.node_mut(successor)?;
        heir.data.append(&mut node.data);
        heir.predecessor = Some(predecessor);
        self.node_mut(predecessor)?.fingers.set(0, successor);

        if self.entry == Some(id) {
            self.entry = Some(successor);
            debug!(entry = %successor, "entry node reassigned");
        }

        node.detach();
        info!(node = %id, successor = %successor, handed_off, "node left");
        metrics::counter!("chord_leaves_total").increment(1);
        Ok(node)
    }
}
