//! Core library for the Chord ring.
//!
//! This crate provides the pieces of a Chord-style distributed hash table
//! running in a single process:
//! - Circular identifier space and clockwise distance
//! - Nodes and their finger tables
//! - The ring: lookup, join, leave, stabilization
//! - Topology snapshots for ownership queries
//! - Ring configuration

pub mod config;
pub mod error;
pub mod finger;
pub mod node;
pub mod ring;
pub mod space;
pub mod topology;

pub use config::RingConfig;
pub use error::{Error, Result};
pub use finger::FingerTable;
pub use node::{Node, NodeId};
pub use ring::{ChordRing, JoinOutcome, Ring, RingBuilder, Route};
pub use space::IdSpace;
pub use topology::{KeyRange, Topology};
