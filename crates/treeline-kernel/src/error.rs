//! Error types for kernel operations.

use thiserror::Error;
use treeline_graph::{GraphError, NodeId};

/// Errors surfaced by the canvas kernel.
///
/// Collaborator and content failures are recoverable: the kernel has already
/// rolled its state back to the last valid shape before returning one, so
/// callers only need to display the message and allow a retry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KernelError {
    /// The content generator failed (network, timeout, provider error).
    #[error("content generator failed: {0}")]
    Collaborator(String),

    /// The content generator answered, but the payload was unusable
    /// (no sub-topics, no valid questions). Never merged as success.
    #[error("malformed content: {0}")]
    MalformedContent(String),

    /// An operation referenced a node that is not on the canvas.
    ///
    /// Callers are expected to pre-validate ids; this is a caller bug, not
    /// a user-visible condition.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// No cached tree exists for the requested concept.
    #[error("concept not found: {0}")]
    ConceptNotFound(String),

    /// A graph-store invariant was violated.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Result type for kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;
