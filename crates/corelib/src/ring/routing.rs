//! Key routing over finger tables.
//!
//! A lookup walks from a start node towards the key. At each node:
//!
//! 1. if the node's id is the key's id, the node owns the key;
//! 2. if the key is no closer to the successor than to the node itself, the
//!    node is the key's clockwise predecessor and the successor owns it;
//! 3. otherwise hop to the furthest-reaching finger that does not overshoot
//!    the key.
//!
//! Every hop strictly shrinks the clockwise distance to the key, so a lookup
//! visits each node at most once. Stale fingers only cost extra hops; the
//! answer depends on successor links alone.

use tracing::{debug, trace};

use super::ring::ChordRing;
use crate::error::{Error, Result};
use crate::finger::FingerTable;
use crate::node::{Node, NodeId};

/// Outcome of a lookup: the owner and every node visited on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Target identifier (`key mod 2^m`).
    pub target: u64,
    /// Node that owns the key.
    pub owner: NodeId,
    /// Visited nodes, starting with the start node and ending with the owner.
    pub path: Vec<NodeId>,
}

impl Route {
    /// Number of hops taken.
    pub fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

impl<V> ChordRing<V> {
    /// Clockwise distance from identifier `a` to identifier `b`.
    #[inline]
    pub fn distance(&self, a: u64, b: u64) -> u64 {
        self.space.distance(a, b)
    }

    /// Node that owns `key`, routing from `start`.
    pub fn lookup(&self, start: NodeId, key: u64) -> Result<NodeId> {
        self.route(start, key).map(|route| route.owner)
    }

    /// Node that owns `key`, routing from the entry node.
    pub fn owner_of(&self, key: u64) -> Result<NodeId> {
        let entry = self.entry.ok_or(Error::EmptyRing)?;
        self.lookup(entry, key)
    }

    /// Like [`lookup`](Self::lookup) but returns the full path.
    pub fn route(&self, start: NodeId, key: u64) -> Result<Route> {
        if self.entry.is_none() {
            return Err(Error::EmptyRing);
        }
        let target = self.space.canonical(key);
        let mut current = self.node_ref(start)?;
        let mut path = vec![start];

        let owner = loop {
            let id = current.id();
            if id.0 == target {
                break id;
            }

            let successor = self.successor_link(current)?;
            if self.space.distance(id.0, target) <= self.space.distance(successor.0, target) {
                if successor != id {
                    path.push(successor);
                }
                break successor;
            }

            // Strictly closer to `target` than `id`, so the walk terminates
            // even over a corrupted successor chain.
            let next = self.closest_preceding(current, target, successor);
            trace!(from = %id, to = %next, target, "hop");
            path.push(next);
            current = self.node_ref(next)?;
        };

        let route = Route {
            target,
            owner,
            path,
        };
        debug!(start = %start, key, owner = %owner, hops = route.hops(), "lookup");
        metrics::counter!("chord_lookups_total").increment(1);
        metrics::histogram!("chord_lookup_hops").record(route.hops() as f64);
        Ok(route)
    }

    /// Furthest-reaching live finger of `node` that does not pass `target`,
    /// or `successor` when no finger qualifies.
    fn closest_preceding(&self, node: &Node<V>, target: u64, successor: NodeId) -> NodeId {
        let id = node.id();
        let limit = self.space.distance(id.0, target);
        node.fingers
            .iter_rev()
            .map(|(_, finger)| finger)
            .find(|finger| {
                *finger != id
                    && self.nodes.contains_key(finger)
                    && self.space.distance(id.0, finger.0) <= limit
            })
            .unwrap_or(successor)
    }

    /// Recomputes fingers `1..m` of `id` by looking up `id + 2^i` from the
    /// entry node. Finger 0, the successor, is kept as is.
    pub fn rebuild_fingers(&mut self, id: NodeId) -> Result<()> {
        let entry = self.entry.ok_or(Error::EmptyRing)?;
        let successor = self.successor(id)?;
        let order = self.space.order();

        let mut table = FingerTable::with_successor(order as usize, successor);
        for i in 1..order {
            let start = self.space.finger_start(id.0, i);
            table.set(i as usize, self.lookup(entry, start)?);
        }
        trace!(node = %id, fingers = ?table.list(), "fingers rebuilt");
        self.node_mut(id)?.fingers = table;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::node::{Node, NodeId};
    use crate::ring::{ChordRing, RingBuilder};

    fn ring_2_9_20() -> ChordRing<()> {
        RingBuilder::new()
            .with_order(5)
            .add_nodes([2, 9, 20])
            .without_founder()
            .build()
            .unwrap()
    }

    #[test]
    fn test_lookup_owners() {
        let ring = ring_2_9_20();
        for (key, owner) in [(0, 2), (2, 2), (3, 9), (9, 9), (10, 20), (20, 20), (21, 2), (31, 2)] {
            for start in [2, 9, 20] {
                assert_eq!(
                    ring.lookup(NodeId(start), key).unwrap(),
                    NodeId(owner),
                    "key {} from {}",
                    key,
                    start
                );
            }
        }
    }

    #[test]
    fn test_route_path() {
        let ring = ring_2_9_20();
        let route = ring.route(NodeId(2), 15).unwrap();
        assert_eq!(route.target, 15);
        assert_eq!(route.owner, NodeId(20));
        assert_eq!(route.path.first(), Some(&NodeId(2)));
        assert_eq!(route.path.last(), Some(&NodeId(20)));
        assert!(route.hops() >= 1);

        // start node owns its own id: zero hops
        let route = ring.route(NodeId(9), 9).unwrap();
        assert_eq!(route.path, vec![NodeId(9)]);
        assert_eq!(route.hops(), 0);
    }

    #[test]
    fn test_rebuilt_fingers() {
        let ring = ring_2_9_20();
        // node 2: starts 3, 4, 6, 10, 18
        let fingers: Vec<_> = ring.fingers(NodeId(2)).unwrap().list().to_vec();
        assert_eq!(
            fingers,
            vec![
                Some(NodeId(9)),
                Some(NodeId(9)),
                Some(NodeId(9)),
                Some(NodeId(20)),
                Some(NodeId(20)),
            ]
        );
        // node 20: starts 21, 22, 24, 28, 4
        let fingers: Vec<_> = ring.fingers(NodeId(20)).unwrap().list().to_vec();
        assert_eq!(
            fingers,
            vec![
                Some(NodeId(2)),
                Some(NodeId(2)),
                Some(NodeId(2)),
                Some(NodeId(2)),
                Some(NodeId(9)),
            ]
        );
    }

    #[test]
    fn test_lookup_errors() {
        let mut ring: ChordRing<()> = ChordRing::new(4).unwrap();
        assert_eq!(
            ring.lookup(NodeId(5), 1),
            Err(Error::UnknownNode(NodeId(5)))
        );
        ring.leave(NodeId(0)).unwrap();
        assert_eq!(ring.lookup(NodeId(0), 1), Err(Error::EmptyRing));
        assert_eq!(ring.owner_of(1), Err(Error::EmptyRing));
    }

    #[test]
    fn test_lookup_terminates_on_broken_chain() {
        let mut ring = ring_2_9_20();
        // 9 skips 20 and points back at 2
        ring.nodes.get_mut(&NodeId(9)).unwrap().fingers.set(0, NodeId(2));
        for key in 0..32 {
            for start in ring.ids() {
                let route = ring.route(start, key).unwrap();
                assert!(route.path.len() <= ring.len() + 1, "key {} from {}", key, start);
            }
        }
        assert_eq!(ring.lookup(NodeId(2), 15).unwrap(), NodeId(2));
    }

    #[test]
    fn test_lookup_with_stale_fingers() {
        let mut ring = ring_2_9_20();
        // fingers of 2 and 20 still point at 9 after it leaves
        ring.leave(NodeId(9)).unwrap();
        ring.join(Node::new(14)).unwrap();
        for key in 0..32 {
            let expected = ring.topology().owner_of(key).unwrap();
            for start in ring.ids() {
                assert_eq!(ring.lookup(start, key).unwrap(), expected);
            }
        }
    }
}
