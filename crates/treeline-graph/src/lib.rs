//! Topic graph, tidy tree layout, and concept rehydration for Treeline.
//!
//! This crate is the pure, synchronous half of the knowledge-exploration
//! canvas: it owns the node/edge data model, the in-memory graph store, the
//! deterministic tree layout engine, and the rebuild path for previously
//! explored concept trees. Nothing here performs I/O or holds locks; the
//! async kernel crate drives these types from a single-writer owner.
//!
//! # Design notes
//!
//! - Node ids are deterministic (`root`, `<parent>-<i>`) so a tree can be
//!   reconstructed from a cached concept tree with identical identity.
//! - The layout engine recomputes every position from scratch per call;
//!   unchanged subtrees still receive identical coordinates, so repeated
//!   layouts never introduce jitter.
//! - Structural queries are adjacency-map based; nodes carry no child
//!   pointers, because ids are referenced from several owners at once.

mod error;
pub mod ids;
mod layout;
mod node;
mod rehydrate;
mod store;

pub use error::GraphError;
pub use ids::{EdgeId, NodeId, ROOT_ID};
pub use layout::{layout, LayoutParams};
pub use node::{Edge, NodeContent, Position, Quiz, TopicNode, QUIZ_OPTIONS};
pub use rehydrate::{concept_tree_of, rehydrate, ConceptTree, Rehydrated};
pub use store::{AddOutcome, ChildSpec, TopicGraph};

/// Result type for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;
