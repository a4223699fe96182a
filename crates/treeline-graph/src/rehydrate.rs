//! Rebuilding a canvas from a cached concept tree.
//!
//! The concept store hands back a flat nested structure (label, optional
//! fact, optional quiz, children). Rehydration replays it into a fresh
//! `TopicGraph` using the deterministic id scheme, pre-marks every node that
//! has children as expanded, and runs one full layout pass so the rendering
//! layer can draw immediately.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::ids::NodeId;
use crate::layout::{layout, LayoutParams};
use crate::node::{NodeContent, Quiz};
use crate::store::{AddOutcome, ChildSpec, TopicGraph};
use crate::Result;

/// Flat tree shape exchanged with the concept store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptTree {
    pub label: String,
    #[serde(default)]
    pub fact: Option<String>,
    #[serde(default)]
    pub quiz: Option<Quiz>,
    #[serde(default)]
    pub children: Vec<ConceptTree>,
}

impl ConceptTree {
    /// A bare, never-expanded concept.
    pub fn leaf(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            fact: None,
            quiz: None,
            children: Vec::new(),
        }
    }
}

/// A reconstructed canvas: the graph plus the expansion set implied by it.
#[derive(Debug, Clone)]
pub struct Rehydrated {
    pub graph: TopicGraph,
    /// Every node that has children, pre-marked so the expansion machine
    /// treats them as terminal.
    pub expanded: HashSet<NodeId>,
}

/// Rebuild a graph from `tree` and lay it out.
pub fn rehydrate(tree: &ConceptTree, params: &LayoutParams) -> Result<Rehydrated> {
    let mut graph = TopicGraph::new();
    let root = graph.seed_root(&tree.label);
    graph.set_content(
        &root,
        NodeContent {
            fact: tree.fact.clone(),
            quiz: tree.quiz.clone(),
            parent_topic: None,
        },
    );

    let mut expanded = HashSet::new();
    rebuild_children(&mut graph, &root, tree, &mut expanded)?;

    layout(&mut graph, params);
    tracing::debug!(
        nodes = graph.node_count(),
        expanded = expanded.len(),
        "rehydrated concept tree"
    );
    Ok(Rehydrated { graph, expanded })
}

fn rebuild_children(
    graph: &mut TopicGraph,
    parent: &NodeId,
    tree: &ConceptTree,
    expanded: &mut HashSet<NodeId>,
) -> Result<()> {
    if tree.children.is_empty() {
        return Ok(());
    }

    let specs: Vec<ChildSpec> = tree
        .children
        .iter()
        .map(|child| ChildSpec {
            label: child.label.clone(),
            fact: child.fact.clone(),
            quiz: child.quiz.clone(),
        })
        .collect();

    let ids = match graph.add_children(parent, specs)? {
        AddOutcome::Added(ids) => ids,
        // Unreachable on a freshly-built graph; tolerate rather than panic.
        AddOutcome::AlreadyExpanded => return Ok(()),
    };
    expanded.insert(parent.clone());

    for (id, child) in ids.iter().zip(&tree.children) {
        rebuild_children(graph, id, child, expanded)?;
    }
    Ok(())
}

/// Export the current graph as a concept tree rooted at `root`.
///
/// Inverse of [`rehydrate`]; used to persist the canvas back into the
/// concept store after each structural change.
pub fn concept_tree_of(graph: &TopicGraph, root: &NodeId) -> Option<ConceptTree> {
    let node = graph.get(root)?;
    let children = graph
        .children_of(root)
        .iter()
        .filter_map(|child| concept_tree_of(graph, child))
        .collect();
    Some(ConceptTree {
        label: node.label.clone(),
        fact: node.content.fact.clone(),
        quiz: node.content.quiz.clone(),
        children,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> ConceptTree {
        ConceptTree {
            label: "Biology".to_string(),
            fact: Some("Life is everywhere.".to_string()),
            quiz: None,
            children: vec![
                ConceptTree {
                    label: "Cells".to_string(),
                    fact: None,
                    quiz: None,
                    children: vec![
                        ConceptTree::leaf("Organelles"),
                        ConceptTree::leaf("Membranes"),
                    ],
                },
                ConceptTree::leaf("Genetics"),
                ConceptTree::leaf("Ecology"),
                ConceptTree::leaf("Evolution"),
            ],
        }
    }

    #[test]
    fn test_rehydrate_rebuilds_deterministic_ids() {
        let rehydrated = rehydrate(&sample_tree(), &LayoutParams::default()).unwrap();
        let graph = &rehydrated.graph;

        assert_eq!(graph.node_count(), 7);
        assert_eq!(graph.get(&NodeId::from("root")).unwrap().label, "Biology");
        assert_eq!(graph.get(&NodeId::from("root-0")).unwrap().label, "Cells");
        assert_eq!(
            graph.get(&NodeId::from("root-0-1")).unwrap().label,
            "Membranes"
        );
    }

    #[test]
    fn test_rehydrate_marks_only_parents_expanded() {
        let rehydrated = rehydrate(&sample_tree(), &LayoutParams::default()).unwrap();

        assert!(rehydrated.expanded.contains(&NodeId::from("root")));
        assert!(rehydrated.expanded.contains(&NodeId::from("root-0")));
        assert_eq!(rehydrated.expanded.len(), 2);
        assert!(!rehydrated.expanded.contains(&NodeId::from("root-1")));
    }

    #[test]
    fn test_rehydrate_runs_layout() {
        let params = LayoutParams::default();
        let rehydrated = rehydrate(&sample_tree(), &params).unwrap();
        let graph = &rehydrated.graph;

        // Rows by depth.
        assert_eq!(
            graph.get(&NodeId::from("root")).unwrap().position.y,
            params.origin.y
        );
        assert_eq!(
            graph.get(&NodeId::from("root-0-0")).unwrap().position.y,
            params.origin.y + 2.0 * params.level_spacing
        );
        // Siblings actually spread out.
        let x0 = graph.get(&NodeId::from("root-0")).unwrap().position.x;
        let x1 = graph.get(&NodeId::from("root-1")).unwrap().position.x;
        assert!(x1 - x0 >= params.node_width);
    }

    #[test]
    fn test_concept_tree_round_trip() {
        let tree = sample_tree();
        let rehydrated = rehydrate(&tree, &LayoutParams::default()).unwrap();
        let exported = concept_tree_of(&rehydrated.graph, &NodeId::root()).unwrap();
        assert_eq!(exported, tree);
    }

    #[test]
    fn test_rehydrate_carries_facts() {
        let rehydrated = rehydrate(&sample_tree(), &LayoutParams::default()).unwrap();
        assert_eq!(
            rehydrated
                .graph
                .get(&NodeId::from("root"))
                .unwrap()
                .content
                .fact
                .as_deref(),
            Some("Life is everywhere.")
        );
    }
}
