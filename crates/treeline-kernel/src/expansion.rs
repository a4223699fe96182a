//! Expansion bookkeeping: per-node phase, the single-flight guard, and the
//! learned set with its cascade rule.
//!
//! Phases are derived, not stored: a node is `Expanding` while the global
//! guard names it, `Expanded` once the expanded set or the graph's own edges
//! say it has children, and `Unexpanded` otherwise. A failed expansion
//! therefore reverts to `Unexpanded` simply by clearing the guard.

use std::collections::HashSet;

use serde::Serialize;
use strum::Display;
use treeline_graph::{NodeId, TopicGraph};

/// Derived expansion phase of a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum NodePhase {
    Unexpanded,
    Expanding,
    Expanded,
}

/// Expansion and learned state for the whole canvas.
#[derive(Debug, Clone, Default)]
pub struct ExpansionState {
    expanded: HashSet<NodeId>,
    learned: HashSet<NodeId>,
    in_flight: Option<NodeId>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State for a rehydrated canvas: expansion pre-populated, nothing
    /// learned, nothing in flight.
    pub fn with_expanded(expanded: HashSet<NodeId>) -> Self {
        Self {
            expanded,
            learned: HashSet::new(),
            in_flight: None,
        }
    }

    pub fn phase(&self, graph: &TopicGraph, id: &NodeId) -> NodePhase {
        if self.in_flight.as_ref() == Some(id) {
            NodePhase::Expanding
        } else if self.is_expanded(graph, id) {
            NodePhase::Expanded
        } else {
            NodePhase::Unexpanded
        }
    }

    /// A node counts as expanded if it was recorded as such or if the graph
    /// already has edges sourcing from it (rehydrated trees, idempotency).
    pub fn is_expanded(&self, graph: &TopicGraph, id: &NodeId) -> bool {
        self.expanded.contains(id) || graph.has_children(id)
    }

    pub fn in_flight(&self) -> Option<&NodeId> {
        self.in_flight.as_ref()
    }

    /// Claim the single expansion slot for `id`. Returns false if any
    /// expansion (this node's or another's) is already in flight.
    pub fn try_begin(&mut self, id: &NodeId) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        self.in_flight = Some(id.clone());
        true
    }

    /// Record a successful expansion and release the slot.
    pub fn finish(&mut self, id: &NodeId) {
        self.expanded.insert(id.clone());
        if self.in_flight.as_ref() == Some(id) {
            self.in_flight = None;
        }
    }

    /// Release the slot without marking anything expanded; the node reverts
    /// to `Unexpanded` so the user can retry.
    pub fn abort(&mut self, id: &NodeId) {
        if self.in_flight.as_ref() == Some(id) {
            self.in_flight = None;
        }
    }

    pub fn is_learned(&self, id: &NodeId) -> bool {
        self.learned.contains(id)
    }

    pub fn learned(&self) -> &HashSet<NodeId> {
        &self.learned
    }

    /// Mark `id` and all of its current descendants learned, in one update.
    ///
    /// Returns the ids that were newly added; empty means the node was
    /// already learned and nothing changed.
    pub fn mark_learned(&mut self, graph: &TopicGraph, id: &NodeId) -> Vec<NodeId> {
        if self.learned.contains(id) {
            return Vec::new();
        }

        let mut newly = Vec::new();
        if self.learned.insert(id.clone()) {
            newly.push(id.clone());
        }
        for descendant in graph.descendants_of(id) {
            if self.learned.insert(descendant.clone()) {
                newly.push(descendant);
            }
        }
        tracing::debug!(node = %id, count = newly.len(), "marked learned");
        newly
    }
}
