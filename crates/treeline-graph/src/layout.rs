//! Tidy tree layout over the topic graph.
//!
//! Every call recomputes every position from scratch. Incremental
//! repositioning was rejected early: as the tree grows asymmetrically, a
//! partially relaid tree can leave stale overlaps between bands that were
//! computed against an older shape. A full pass is O(nodes) and the graph
//! stays small enough that determinism matters more than reuse.
//!
//! Two passes:
//! 1. post-order: subtree width per node (sum of child widths plus gaps,
//!    floored at one node width), memoized for the duration of the call;
//! 2. pre-order: each node is centered inside the `[start_x, start_x+width]`
//!    band allocated to it, children consume adjacent sub-bands left to
//!    right, and `y` is fixed per depth level.

use std::collections::HashMap;

use crate::ids::NodeId;
use crate::node::Position;
use crate::store::TopicGraph;

/// Layout tuning. Defaults keep sibling labels up to ~20 characters from
/// visually colliding.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutParams {
    /// Horizontal space reserved for a single node.
    pub node_width: f64,
    /// Gap between adjacent sibling bands.
    pub sibling_gap: f64,
    /// Vertical distance between depth levels.
    pub level_spacing: f64,
    /// Extra separation between trees when the graph has multiple roots.
    pub tree_gap: f64,
    /// Where the (first) root lands: the root row's center.
    pub origin: Position,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            node_width: 172.0,
            sibling_gap: 28.0,
            level_spacing: 150.0,
            tree_gap: 120.0,
            origin: Position::new(400.0, 50.0),
        }
    }
}

/// Recompute every node position in `graph`.
///
/// Positions are a pure function of graph shape and `params`: nodes whose
/// subtree did not change still get identical coordinates on repeated calls.
pub fn layout(graph: &mut TopicGraph, params: &LayoutParams) {
    let roots = graph.roots_of();
    if roots.is_empty() {
        return;
    }

    let mut widths: HashMap<NodeId, f64> = HashMap::with_capacity(graph.node_count());
    for root in &roots {
        measure(graph, root, params, &mut widths);
    }

    // First root centered on the origin; additional roots continue rightward.
    let mut start_x = params.origin.x - widths[&roots[0]] / 2.0;
    for root in &roots {
        place(graph, root, start_x, params.origin.y, params, &widths);
        start_x += widths[root] + params.tree_gap;
    }
}

/// Post-order subtree width. Memoized in `widths` for this layout call; the
/// graph is read-only during layout so entries never go stale.
fn measure(
    graph: &TopicGraph,
    id: &NodeId,
    params: &LayoutParams,
    widths: &mut HashMap<NodeId, f64>,
) -> f64 {
    if let Some(w) = widths.get(id) {
        return *w;
    }

    let children: Vec<NodeId> = graph.children_of(id).to_vec();
    let width = if children.is_empty() {
        params.node_width
    } else {
        let sum: f64 = children
            .iter()
            .map(|child| measure(graph, child, params, widths))
            .sum();
        let gaps = params.sibling_gap * (children.len() - 1) as f64;
        (sum + gaps).max(params.node_width)
    };

    widths.insert(id.clone(), width);
    width
}

/// Pre-order placement: center the node in its band, then hand each child
/// its own sub-band.
fn place(
    graph: &mut TopicGraph,
    id: &NodeId,
    start_x: f64,
    y: f64,
    params: &LayoutParams,
    widths: &HashMap<NodeId, f64>,
) {
    let width = widths[id];
    graph.set_position(id, Position::new(start_x + width / 2.0, y));

    let children: Vec<NodeId> = graph.children_of(id).to_vec();
    let mut child_x = start_x;
    for child in &children {
        place(
            graph,
            child,
            child_x,
            y + params.level_spacing,
            params,
            widths,
        );
        child_x += widths[child] + params.sibling_gap;
    }
}
