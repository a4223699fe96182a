//! In-memory topic graph store.
//!
//! The authoritative, mutable representation of nodes and edges. Nodes are
//! kept in insertion order so every traversal (and therefore every layout
//! pass) is deterministic. Structural queries are index-based: children are
//! resolved through an adjacency map rebuilt incrementally on mutation, not
//! through owned child pointers, because nodes are referenced by id from the
//! expansion machine, the quiz session, and rehydration alike.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::error::GraphError;
use crate::ids::NodeId;
use crate::node::{Edge, NodeContent, Position, Quiz, TopicNode};
use crate::Result;

/// Traversal circuit-breaker. The graph is acyclic by construction (child
/// ids derive from parent ids), so this only guards against future bugs.
const MAX_TRAVERSAL: usize = 4096;

/// Payload for one child added during expansion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChildSpec {
    pub label: String,
    pub fact: Option<String>,
    pub quiz: Option<Quiz>,
}

impl ChildSpec {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }
}

/// Result of an `add_children` call.
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// Children were created; ids are in sibling order.
    Added(Vec<NodeId>),
    /// The parent already had children; nothing was changed.
    AlreadyExpanded,
}

/// The topic forest: nodes, edges, and a derived children index.
#[derive(Debug, Clone, Default)]
pub struct TopicGraph {
    nodes: IndexMap<NodeId, TopicNode>,
    edges: Vec<Edge>,
    children: HashMap<NodeId, Vec<NodeId>>,
}

impl TopicGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the graph to a single root node for `topic`.
    ///
    /// All previous nodes, edges, and adjacency are discarded.
    pub fn seed_root(&mut self, topic: impl Into<String>) -> NodeId {
        let id = NodeId::root();
        self.nodes.clear();
        self.edges.clear();
        self.children.clear();
        self.nodes.insert(id.clone(), TopicNode::new(id.clone(), topic));
        id
    }

    // ========================================================================
    // Structural mutation
    // ========================================================================

    /// Append children under `parent`, one node and one edge per entry.
    ///
    /// A parent that already has children is left untouched
    /// (`AddOutcome::AlreadyExpanded`), which is what makes expansion
    /// idempotent at the store level. New children start at the parent's
    /// position; the layout pass that follows every merge assigns real ones.
    pub fn add_children(&mut self, parent: &NodeId, specs: Vec<ChildSpec>) -> Result<AddOutcome> {
        let parent_node = self
            .nodes
            .get(parent)
            .ok_or_else(|| GraphError::ParentNotFound(parent.clone()))?;

        if specs.is_empty() {
            return Err(GraphError::EmptyExpansion);
        }
        if self.has_children(parent) {
            tracing::debug!(parent = %parent, "add_children on expanded parent, ignoring");
            return Ok(AddOutcome::AlreadyExpanded);
        }

        let parent_label = parent_node.label.clone();
        let parent_position = parent_node.position;

        let mut ids = Vec::with_capacity(specs.len());
        for (index, spec) in specs.into_iter().enumerate() {
            let id = NodeId::child_of(parent, index);
            if self.nodes.contains_key(&id) {
                return Err(GraphError::DuplicateNode(id));
            }
            let mut node = TopicNode::new(id.clone(), spec.label);
            node.position = parent_position;
            node.content = NodeContent {
                fact: spec.fact,
                quiz: spec.quiz,
                parent_topic: Some(parent_label.clone()),
            };
            self.nodes.insert(id.clone(), node);
            self.edges.push(Edge::connect(parent.clone(), id.clone()));
            self.children.entry(parent.clone()).or_default().push(id.clone());
            ids.push(id);
        }

        Ok(AddOutcome::Added(ids))
    }

    /// Cache a fetched fact onto a node. Never touches positions or edges.
    pub fn set_fact(&mut self, id: &NodeId, fact: impl Into<String>) -> Result<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;
        node.content.fact = Some(fact.into());
        Ok(())
    }

    pub(crate) fn set_position(&mut self, id: &NodeId, position: Position) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.position = position;
        }
    }

    /// Replace a node's content wholesale. Rehydration-only; expansion
    /// merges content through `add_children` and `set_fact`.
    pub(crate) fn set_content(&mut self, id: &NodeId, content: NodeContent) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.content = content;
        }
    }

    /// Insert a node with no incoming edge, creating an extra root.
    ///
    /// Normal flows keep a single tree; this exists so layout tests can
    /// exercise the multi-root robustness path.
    #[cfg(test)]
    pub(crate) fn insert_detached(&mut self, id: NodeId, label: &str) {
        self.nodes.insert(id.clone(), TopicNode::new(id, label));
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn get(&self, id: &NodeId) -> Option<&TopicNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn has_children(&self, id: &NodeId) -> bool {
        self.children.get(id).is_some_and(|c| !c.is_empty())
    }

    /// Immediate children of a node, in sibling order.
    pub fn children_of(&self, id: &NodeId) -> &[NodeId] {
        self.children.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// All transitive descendants of a node (excluding the node itself),
    /// in depth-first sibling order.
    pub fn descendants_of(&self, id: &NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children_of(id).iter().rev().cloned().collect();
        let mut visited = HashSet::new();

        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue; // cycle — skip
            }
            if visited.len() > MAX_TRAVERSAL {
                tracing::warn!("descendants_of hit traversal limit ({MAX_TRAVERSAL}), truncating");
                break;
            }
            for child in self.children_of(&current).iter().rev() {
                stack.push(child.clone());
            }
            result.push(current);
        }

        result
    }

    /// Nodes with no incoming edge, in insertion order.
    ///
    /// Normal flows keep exactly one root; the layout engine tolerates more.
    pub fn roots_of(&self) -> Vec<NodeId> {
        let targets: HashSet<&NodeId> = self.edges.iter().map(|e| &e.target).collect();
        self.nodes
            .keys()
            .filter(|id| !targets.contains(id))
            .cloned()
            .collect()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TopicNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
