use thiserror::Error;

use crate::graph::{Facing, NodeId};

/// Convenient result alias for the conduit library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when an operation names a node that is not part of the network.
    #[error("node {id} is not part of this network")]
    UnknownNode { id: NodeId },

    /// Raised when a routing sweep starts from a node that is not a destination.
    #[error("node {id} is not a registered destination")]
    NotDestination { id: NodeId },

    /// Raised when attempting to link a node to itself.
    #[error("node {id} cannot be linked to itself")]
    SelfLink { id: NodeId },

    /// Raised when a facing already links to a different neighbour.
    #[error("facing {facing} of node {id} is already linked to node {existing}")]
    FacingOccupied {
        id: NodeId,
        facing: Facing,
        existing: NodeId,
    },

    /// Raised when two nodes are already linked through another facing.
    #[error("node {id} is already linked to node {other} through facing {facing}")]
    AlreadyLinked {
        id: NodeId,
        other: NodeId,
        facing: Facing,
    },

    /// Raised when a facing name cannot be parsed.
    #[error("unknown facing: {name}")]
    UnknownFacing { name: String },

    /// Raised when a router strategy name cannot be parsed.
    #[error("unknown router strategy: {name} (expected dijkstra, cached or multi-cached)")]
    UnknownRouter { name: String },

    /// Raised when a topology file references a node name it never declared.
    #[error("topology references undeclared node: {name}")]
    UnknownTopologyNode { name: String },

    /// Raised when a topology file declares the same node name twice.
    #[error("topology declares node {name} more than once")]
    DuplicateTopologyNode { name: String },

    /// Raised when a topology file is structurally valid JSON but not a usable network.
    #[error("invalid topology: {message}")]
    InvalidTopology { message: String },

    /// Raised when a thread panicked while holding the network lock.
    #[error("network lock was poisoned by a panicking thread")]
    Poisoned,

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON parsing errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
