//! Plain data model: nodes, edges, positions, and quiz payloads.

use serde::{Deserialize, Serialize};

use crate::ids::{EdgeId, NodeId};

/// Screen-space position of a node. Written only by the layout engine.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

/// Expected number of answer options per question.
pub const QUIZ_OPTIONS: usize = 4;

impl Quiz {
    /// A question is usable only with exactly four options and an in-range
    /// correct index.
    pub fn is_well_formed(&self) -> bool {
        !self.question.trim().is_empty()
            && self.options.len() == QUIZ_OPTIONS
            && self.correct_index < self.options.len()
    }
}

/// Cached per-node content, opaque to the layout engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeContent {
    /// Short "fun fact" string, filled in lazily by the fact-fetch workflow.
    #[serde(default)]
    pub fact: Option<String>,
    /// Quiz payload attached at expansion time, if the generator provided one.
    #[serde(default)]
    pub quiz: Option<Quiz>,
    /// Label of the node this one was expanded from.
    #[serde(default)]
    pub parent_topic: Option<String>,
}

/// A labeled point in the topic tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicNode {
    pub id: NodeId,
    pub label: String,
    pub position: Position,
    pub content: NodeContent,
}

impl TopicNode {
    pub fn new(id: NodeId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            position: Position::default(),
            content: NodeContent::default(),
        }
    }
}

/// Directed parent→child relation. Created exactly once per child.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
}

impl Edge {
    pub fn connect(source: NodeId, target: NodeId) -> Self {
        Self {
            id: EdgeId::between(&source, &target),
            source,
            target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz(options: usize, correct: usize) -> Quiz {
        Quiz {
            question: "Which one?".to_string(),
            options: (0..options).map(|i| format!("option {i}")).collect(),
            correct_index: correct,
        }
    }

    #[test]
    fn test_quiz_well_formed() {
        assert!(quiz(4, 0).is_well_formed());
        assert!(quiz(4, 3).is_well_formed());
    }

    #[test]
    fn test_quiz_rejects_bad_shapes() {
        assert!(!quiz(3, 0).is_well_formed());
        assert!(!quiz(5, 0).is_well_formed());
        assert!(!quiz(4, 4).is_well_formed());
        let mut q = quiz(4, 0);
        q.question = "   ".to_string();
        assert!(!q.is_well_formed());
    }

    #[test]
    fn test_edge_connect_derives_id() {
        let edge = Edge::connect(NodeId::root(), NodeId::from("root-0"));
        assert_eq!(edge.id.as_str(), "eroot-root-0");
    }
}
