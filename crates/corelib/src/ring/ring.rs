//! Ring data structure: node arena, entry node and the key/value surface.

use std::collections::HashMap;

use crate::config::RingConfig;
use crate::error::{Error, Result};
use crate::finger::FingerTable;
use crate::node::{Node, NodeId};
use crate::space::IdSpace;
use crate::topology::Topology;

/// A Chord ring over the identifier space `[0, 2^m)`.
///
/// Nodes live in an arena keyed by their identifier; predecessor, successor
/// and finger links are identifiers into that arena. `entry` is any live node
/// and is `None` only when the last node has left.
///
/// # Example
///
/// ```rust
/// use chord_core::{ChordRing, Node, NodeId};
///
/// let mut ring: ChordRing<&str> = ChordRing::new(5).unwrap();
/// ring.join(Node::new(9)).unwrap();
/// ring.join(Node::new(20)).unwrap();
/// ring.stabilize().unwrap();
///
/// assert_eq!(ring.node_count(), 3);
/// assert_eq!(ring.owner_of(15).unwrap(), NodeId(20));
/// ```
#[derive(Debug, Clone)]
pub struct ChordRing<V> {
    pub(crate) space: IdSpace,
    pub(crate) nodes: HashMap<NodeId, Node<V>>,
    pub(crate) entry: Option<NodeId>,
}

impl<V> ChordRing<V> {
    /// Creates a ring of order `order` with a single founding node at
    /// identifier 0. The founding node is a normal member: it is counted,
    /// owns keys and may leave.
    pub fn new(order: u32) -> Result<Self> {
        let space = IdSpace::new(order)?;
        let mut ring = Self {
            space,
            nodes: HashMap::new(),
            entry: None,
        };
        ring.found(Node::new(0u64));
        Ok(ring)
    }

    pub fn from_config(config: &RingConfig) -> Result<Self> {
        let space = config.validate()?;
        Self::new(space.order())
    }

    /// Installs `node` as the only member of an empty ring.
    pub(crate) fn found(&mut self, mut node: Node<V>) {
        let id = node.id();
        let mut fingers = FingerTable::new(self.space.order() as usize);
        for i in 0..fingers.len() {
            fingers.set(i, id);
        }
        node.predecessor = Some(id);
        node.fingers = fingers;
        self.nodes.insert(id, node);
        self.entry = Some(id);
    }

    pub fn space(&self) -> IdSpace {
        self.space
    }

    pub fn order(&self) -> u32 {
        self.space.order()
    }

    pub fn size(&self) -> u64 {
        self.space.size()
    }

    /// Starting point for lookups and traversals.
    pub fn entry(&self) -> Option<NodeId> {
        self.entry
    }

    /// Number of live nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node<V>> {
        self.nodes.get(&id)
    }

    pub fn successor(&self, id: NodeId) -> Result<NodeId> {
        self.successor_link(self.node_ref(id)?)
    }

    pub fn predecessor(&self, id: NodeId) -> Result<NodeId> {
        self.node_ref(id)?
            .predecessor
            .ok_or_else(|| Error::Inconsistent(format!("{} has no predecessor", id)))
    }

    pub fn fingers(&self, id: NodeId) -> Result<&FingerTable> {
        Ok(&self.node_ref(id)?.fingers)
    }

    /// Live node identifiers in successor order, starting at the entry node.
    pub fn ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::with_capacity(self.nodes.len());
        let Some(entry) = self.entry else {
            return ids;
        };
        let mut current = entry;
        while ids.len() < self.nodes.len() {
            ids.push(current);
            match self.successor(current) {
                Ok(next) if next != entry => current = next,
                _ => break,
            }
        }
        ids
    }

    /// Live nodes in successor order, starting at the entry node.
    pub fn iter(&self) -> impl Iterator<Item = &Node<V>> + '_ {
        self.ids().into_iter().filter_map(move |id| self.nodes.get(&id))
    }

    /// Sorted snapshot of the live identifiers.
    pub fn topology(&self) -> Topology {
        Topology::new(self.space, self.nodes.keys().copied())
    }

    /// Stores `value` under `key` on the key's owner.
    pub fn insert(&mut self, key: u64, value: V) -> Result<Option<V>> {
        let owner = self.owner_of(key)?;
        Ok(self.node_mut(owner)?.data.insert(key, value))
    }

    pub fn get(&self, key: u64) -> Result<Option<&V>> {
        let owner = self.owner_of(key)?;
        Ok(self.node_ref(owner)?.data.get(&key))
    }

    pub fn remove(&mut self, key: u64) -> Result<Option<V>> {
        let owner = self.owner_of(key)?;
        Ok(self.node_mut(owner)?.data.remove(&key))
    }

    /// Total number of keys held across all nodes.
    pub fn data_len(&self) -> usize {
        self.nodes.values().map(|n| n.data.len()).sum()
    }

    pub(crate) fn node_ref(&self, id: NodeId) -> Result<&Node<V>> {
        self.nodes.get(&id).ok_or(Error::UnknownNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node<V>> {
        self.nodes.get_mut(&id).ok_or(Error::UnknownNode(id))
    }

    pub(crate) fn successor_link(&self, node: &Node<V>) -> Result<NodeId> {
        node.fingers
            .successor()
            .ok_or_else(|| Error::Inconsistent(format!("{} has no successor", node.id())))
    }
}

/// Builder for a populated, stabilized ring.
///
/// ```rust
/// use chord_core::ring::RingBuilder;
///
/// let ring = RingBuilder::new()
///     .with_order(5)
///     .add_node(9)
///     .add_node(20)
///     .build::<String>()
///     .unwrap();
/// assert_eq!(ring.node_count(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RingBuilder {
    config: RingConfig,
    nodes: Vec<u64>,
    without_founder: bool,
}

impl RingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RingConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.config.order = order;
        self
    }

    pub fn add_node(mut self, id: u64) -> Self {
        self.nodes.push(id);
        self
    }

    pub fn add_nodes(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.nodes.extend(ids);
        self
    }

    /// Removes the founding node at identifier 0 once the other nodes are in,
    /// unless 0 was itself listed.
    pub fn without_founder(mut self) -> Self {
        self.without_founder = true;
        self
    }

    /// Joins every listed node (duplicates are skipped) and stabilizes.
    pub fn build<V>(self) -> Result<ChordRing<V>> {
        let mut ring = ChordRing::from_config(&self.config)?;
        for id in &self.nodes {
            ring.join(Node::new(*id))?;
        }
        let founder = NodeId(0);
        if self.without_founder && !self.nodes.contains(&founder.0) && ring.len() > 1 {
            ring.leave(founder)?;
        }
        ring.stabilize()?;
        Ok(ring)
    }
}
