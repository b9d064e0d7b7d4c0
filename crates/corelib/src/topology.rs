//! Ring topology views.
//!
//! A [`Topology`] is a sorted snapshot of live identifiers. It answers
//! ownership questions by direct search instead of routing, which makes it
//! the reference that lookups and stored data are checked against.

use std::fmt;

use crate::node::NodeId;
use crate::space::IdSpace;

/// The half-open arc `(start, end]` owned by `owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRange {
    pub start: u64,
    pub end: u64,
    pub owner: NodeId,
}

impl KeyRange {
    /// Number of identifiers in the arc.
    pub fn len(&self, space: &IdSpace) -> u64 {
        match space.distance(self.start, self.end) {
            // a lone node owns the whole circle
            0 => space.size(),
            d => d,
        }
    }

    pub fn contains(&self, space: &IdSpace, key: u64) -> bool {
        if self.start == self.end {
            return true;
        }
        let offset = space.distance(self.start, key);
        offset != 0 && offset <= self.len(space)
    }
}

impl fmt::Display for KeyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}] -> {}", self.start, self.end, self.owner)
    }
}

/// Sorted snapshot of the live node identifiers.
#[derive(Debug, Clone)]
pub struct Topology {
    space: IdSpace,
    ids: Vec<NodeId>,
}

impl Topology {
    pub fn new(space: IdSpace, ids: impl IntoIterator<Item = NodeId>) -> Self {
        let mut ids: Vec<NodeId> = ids.into_iter().collect();
        ids.sort();
        ids.dedup();
        Self { space, ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifiers in ascending order.
    pub fn ids(&self) -> &[NodeId] {
        &self.ids
    }

    /// Clockwise-nearest node at or after the key's identifier.
    pub fn owner_of(&self, key: u64) -> Option<NodeId> {
        if self.ids.is_empty() {
            return None;
        }
        let target = self.space.canonical(key);
        let idx = self.ids.partition_point(|id| id.0 < target);
        Some(self.ids[idx % self.ids.len()])
    }

    /// Next node clockwise after `id`.
    pub fn successor_of(&self, id: NodeId) -> Option<NodeId> {
        self.owner_of(id.0.wrapping_add(1))
    }

    /// Next node counter-clockwise before `id`.
    pub fn predecessor_of(&self, id: NodeId) -> Option<NodeId> {
        if self.ids.is_empty() {
            return None;
        }
        let idx = self.ids.partition_point(|other| other.0 < id.0);
        let prev = (idx + self.ids.len() - 1) % self.ids.len();
        Some(self.ids[prev])
    }

    /// The arc owned by each node, in ascending owner order.
    pub fn ranges(&self) -> Vec<KeyRange> {
        let n = self.ids.len();
        (0..n)
            .map(|i| KeyRange {
                start: self.ids[(i + n - 1) % n].0,
                end: self.ids[i].0,
                owner: self.ids[i],
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topology(ids: &[u64]) -> Topology {
        Topology::new(IdSpace::new(5).unwrap(), ids.iter().map(|&id| NodeId(id)))
    }

    #[test]
    fn test_owner_of_wraps() {
        let topo = topology(&[20, 2, 9]);
        assert_eq!(topo.owner_of(2), Some(NodeId(2)));
        assert_eq!(topo.owner_of(3), Some(NodeId(9)));
        assert_eq!(topo.owner_of(15), Some(NodeId(20)));
        assert_eq!(topo.owner_of(21), Some(NodeId(2)));
        assert_eq!(topo.owner_of(32 + 9), Some(NodeId(9)));
        assert_eq!(topology(&[]).owner_of(1), None);
    }

    #[test]
    fn test_neighbours() {
        let topo = topology(&[2, 9, 20]);
        assert_eq!(topo.successor_of(NodeId(20)), Some(NodeId(2)));
        assert_eq!(topo.successor_of(NodeId(2)), Some(NodeId(9)));
        assert_eq!(topo.predecessor_of(NodeId(2)), Some(NodeId(20)));
        assert_eq!(topo.predecessor_of(NodeId(20)), Some(NodeId(9)));

        let single = topology(&[7]);
        assert_eq!(single.successor_of(NodeId(7)), Some(NodeId(7)));
        assert_eq!(single.predecessor_of(NodeId(7)), Some(NodeId(7)));
    }

    #[test]
    fn test_ranges_partition_space() {
        let space = IdSpace::new(5).unwrap();
        let topo = topology(&[2, 9, 20]);
        let ranges = topo.ranges();
        assert_eq!(ranges[0].to_string(), "(20, 2] -> N2");
        let total: u64 = ranges.iter().map(|r| r.len(&space)).sum();
        assert_eq!(total, space.size());

        for key in 0..32 {
            let holders: Vec<_> = ranges.iter().filter(|r| r.contains(&space, key)).collect();
            assert_eq!(holders.len(), 1, "key {}", key);
            assert_eq!(Some(holders[0].owner), topo.owner_of(key));
        }

        let whole = topology(&[7]).ranges();
        assert_eq!(whole[0].len(&space), 32);
        assert!(whole[0].contains(&space, 7));
        assert!(whole[0].contains(&space, 8));
    }
}
