//! Ring upkeep: finger stabilization, membership accounting and invariant
//! checks.

use tracing::debug;

use super::ring::ChordRing;
use crate::error::{Error, Result};

impl<V> ChordRing<V> {
    /// Rebuilds the finger table of every node, walking the successor chain
    /// once around from the entry node.
    ///
    /// The successor chain must already be correct; only shortcut fingers are
    /// refreshed. A no-op on an empty ring.
    pub fn stabilize(&mut self) -> Result<()> {
        let Some(entry) = self.entry else {
            return Ok(());
        };

        let mut current = entry;
        let mut visited = 0;
        loop {
            self.rebuild_fingers(current)?;
            visited += 1;
            current = self.successor(current)?;
            if current == entry {
                break;
            }
            if visited >= self.nodes.len() {
                return Err(Error::Inconsistent(format!(
                    "successor chain from {} does not close after {} nodes",
                    entry, visited
                )));
            }
        }

        debug!(nodes = visited, "ring stabilized");
        metrics::counter!("chord_stabilize_total").increment(1);
        Ok(())
    }

    /// Number of nodes on the successor chain from the entry node back to
    /// itself; 0 for an empty ring.
    pub fn node_count(&self) -> usize {
        self.ids().len()
    }

    /// Checks ring closure, predecessor/successor agreement, finger table
    /// sizes and that every stored key sits on its owner.
    pub fn validate(&self) -> Result<()> {
        let Some(entry) = self.entry else {
            if self.nodes.is_empty() {
                return Ok(());
            }
            return Err(Error::Inconsistent(format!(
                "no entry node but {} nodes in the arena",
                self.nodes.len()
            )));
        };
        if !self.nodes.contains_key(&entry) {
            return Err(Error::Inconsistent(format!("entry {} is not live", entry)));
        }

        let ids = self.ids();
        if ids.len() != self.nodes.len() {
            return Err(Error::Inconsistent(format!(
                "successor chain visits {} of {} nodes",
                ids.len(),
                self.nodes.len()
            )));
        }
        let last = ids[ids.len() - 1];
        if self.successor(last)? != entry {
            return Err(Error::Inconsistent(format!(
                "successor chain does not return to {}",
                entry
            )));
        }

        let topology = self.topology();
        let order = self.space.order() as usize;
        for node in self.nodes.values() {
            let id = node.id();
            let successor = self.successor_link(node)?;
            let predecessor = self.predecessor(id)?;
            if self.successor(predecessor)? != id {
                return Err(Error::Inconsistent(format!(
                    "predecessor {} of {} does not point back",
                    predecessor, id
                )));
            }
            if topology.successor_of(id) != Some(successor) {
                return Err(Error::Inconsistent(format!(
                    "successor of {} is {}, expected {:?}",
                    id,
                    successor,
                    topology.successor_of(id)
                )));
            }
            if node.fingers.len() != order {
                return Err(Error::Inconsistent(format!(
                    "{} has {} fingers, expected {}",
                    id,
                    node.fingers.len(),
                    order
                )));
            }
            for key in node.data.keys() {
                if topology.owner_of(*key) != Some(id) {
                    return Err(Error::Inconsistent(format!(
                        "key {} held by {} but owned by {:?}",
                        key,
                        id,
                        topology.owner_of(*key)
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::node::{Node, NodeId};
    use crate::ring::ChordRing;

    fn ring_0_8_16() -> ChordRing<u8> {
        let mut ring = ChordRing::new(5).unwrap();
        for id in [8, 16] {
            ring.join(Node::new(id)).unwrap();
        }
        ring
    }

    #[test]
    fn test_node_count_tracks_membership() {
        let mut ring: ChordRing<()> = ChordRing::new(6).unwrap();
        assert_eq!(ring.node_count(), 1);
        for id in [40, 5, 33, 17] {
            ring.join(Node::new(id)).unwrap();
        }
        assert_eq!(ring.node_count(), 5);
        ring.leave(NodeId(33)).unwrap();
        assert_eq!(ring.node_count(), 4);
        for id in [0, 5, 17, 40] {
            ring.leave(NodeId(id)).unwrap();
        }
        assert_eq!(ring.node_count(), 0);
    }

    #[test]
    fn test_stabilize_refreshes_stale_fingers() {
        let mut ring: ChordRing<()> = ChordRing::new(5).unwrap();
        ring.join(Node::new(20)).unwrap();
        // founder's fingers still all point at itself
        assert_eq!(ring.fingers(NodeId(0)).unwrap()[4], Some(NodeId(0)));

        ring.stabilize().unwrap();
        // 0 + 16 is owned by 20
        assert_eq!(ring.fingers(NodeId(0)).unwrap()[4], Some(NodeId(20)));
        assert!(ring.validate().is_ok());
    }

    #[test]
    fn test_stabilize_twice_is_stable() {
        let mut ring: ChordRing<()> = ChordRing::new(6).unwrap();
        for id in [7, 50, 23, 31, 62] {
            ring.join(Node::new(id)).unwrap();
        }
        ring.leave(NodeId(23)).unwrap();

        ring.stabilize().unwrap();
        let first: Vec<_> = ring
            .iter()
            .map(|n| n.fingers().clone())
            .collect();
        ring.stabilize().unwrap();
        let second: Vec<_> = ring
            .iter()
            .map(|n| n.fingers().clone())
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_stabilize_empty_ring() {
        let mut ring: ChordRing<()> = ChordRing::new(3).unwrap();
        ring.leave(NodeId(0)).unwrap();
        assert!(ring.stabilize().is_ok());
        assert!(ring.validate().is_ok());
    }

    #[test]
    fn test_validate_detects_misplaced_key() {
        let mut ring: ChordRing<u8> = ChordRing::new(5).unwrap();
        ring.join(Node::new(16)).unwrap();
        // plant key 20 on node 16 behind the ring's back
        ring.nodes.get_mut(&NodeId(16)).unwrap().data.insert(20, 1);
        assert!(ring.validate().is_err());
    }

    #[test]
    fn test_stabilize_rejects_open_chain() {
        let mut ring = ring_0_8_16();
        // 0 -> 8 -> 16 -> 8 never returns to the entry node
        ring.nodes.get_mut(&NodeId(16)).unwrap().fingers.set(0, NodeId(8));
        assert!(matches!(ring.stabilize(), Err(Error::Inconsistent(_))));
    }

    #[test]
    fn test_validate_detects_wrong_predecessor() {
        let mut ring = ring_0_8_16();
        assert!(ring.validate().is_ok());
        ring.nodes.get_mut(&NodeId(16)).unwrap().predecessor = Some(NodeId(0));
        assert!(matches!(ring.validate(), Err(Error::Inconsistent(_))));
    }

    #[test]
    fn test_validate_detects_skipped_successor() {
        let mut ring = ring_0_8_16();
        // 0 -> 16 closes the chain without 8
        ring.nodes.get_mut(&NodeId(0)).unwrap().fingers.set(0, NodeId(16));
        assert!(matches!(ring.validate(), Err(Error::Inconsistent(_))));
    }
}
