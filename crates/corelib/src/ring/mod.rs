//! Chord ring implementation.
//!
//! The ring owns every live node in an arena keyed by [`NodeId`] and runs
//! all cross-node algorithms: routing, membership changes and finger
//! maintenance.
//!
//! [`NodeId`]: crate::node::NodeId

pub mod maintenance;
pub mod membership;
pub mod ring;
pub mod routing;

pub use membership::JoinOutcome;
pub use ring::{ChordRing, RingBuilder};
pub use routing::Route;

/// Alias for the main ring type (used by lib.rs).
pub type Ring<V> = ChordRing<V>;
