//! Typed identifiers for topic nodes and edges.
//!
//! Ids are deterministic: the root node uses a reserved id, and each child
//! derives its id from the parent id plus an ordinal index. Re-expanding the
//! same tree therefore always produces the same ids, with no global counter.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved id for the canvas root node.
pub const ROOT_ID: &str = "root";

/// Identifier for a topic node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// The reserved root id.
    pub fn root() -> Self {
        Self(ROOT_ID.to_string())
    }

    /// Derive the id of a parent's `index`-th child.
    ///
    /// Same parent and index always produce the same id. Derived ids are
    /// strictly longer than the parent id, so a child can never collide with
    /// any of its ancestors.
    pub fn child_of(parent: &NodeId, index: usize) -> Self {
        Self(format!("{}-{}", parent.0, index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_ID
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identifier for a parent→child edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    /// Edge ids are derived from their endpoints, one edge per child.
    pub fn between(source: &NodeId, target: &NodeId) -> Self {
        Self(format!("e{}-{}", source.0, target.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
