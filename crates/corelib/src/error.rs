//! Error types for the core library.

use crate::node::NodeId;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
///
/// Joining an identifier that is already on the ring is not an error; see
/// [`JoinOutcome::AlreadyPresent`](crate::ring::JoinOutcome::AlreadyPresent).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Ring order outside the supported `1..=63` range
    #[error("Invalid ring order: {0} (expected 1..=63)")]
    InvalidOrder(u32),
    /// Node identifier does not fit the identifier space
    #[error("Identifier {id} is outside the identifier space of size {size}")]
    IdentifierOutOfRange { id: u64, size: u64 },
    /// Operation needs at least one live node
    #[error("Ring is empty")]
    EmptyRing,
    /// Identifier is not a live member of the ring
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),
    /// A structural invariant does not hold
    #[error("Ring inconsistent: {0}")]
    Inconsistent(String),
    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}
