//! Error types for graph-store operations.

use thiserror::Error;

use crate::ids::NodeId;

/// Errors that can occur while mutating or querying the topic graph.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Expansion referenced a parent that is not in the graph.
    ///
    /// The expansion state machine pre-validates parents, so hitting this
    /// indicates a caller bug rather than a user-visible condition.
    #[error("parent node not found: {0}")]
    ParentNotFound(NodeId),

    /// A node lookup failed.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// Expansion attempted to merge zero children.
    ///
    /// An empty child set must never be recorded as a real expansion.
    #[error("expansion produced no children")]
    EmptyExpansion,

    /// A derived child id already exists in the graph.
    #[error("node already exists: {0}")]
    DuplicateNode(NodeId),
}
