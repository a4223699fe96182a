//! Read-only canvas views for the rendering layer.
//!
//! The renderer never touches live state: it receives this snapshot (plus
//! the kernel's mutator entry points) and nothing else.

use serde::Serialize;
use strum::Display;
use treeline_graph::{EdgeId, NodeId, Position};

use crate::expansion::NodePhase;
use crate::quiz::QuizView;

/// Which mode the canvas is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum GameMode {
    Browsing,
    Quiz,
}

/// One node as the renderer sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub id: NodeId,
    pub label: String,
    pub position: Position,
    pub fact: Option<String>,
    pub phase: NodePhase,
    pub learned: bool,
}

/// One edge as the renderer sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeView {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
}

/// Full read-only view of the canvas.
#[derive(Debug, Clone, Serialize)]
pub struct CanvasSnapshot {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
    /// The node currently mid-expansion, if any.
    pub expanding: Option<NodeId>,
    pub mode: GameMode,
    /// Present exactly while `mode` is [`GameMode::Quiz`].
    pub quiz: Option<QuizView>,
    /// Last recoverable failure, for an error indicator; cleared when the
    /// next operation starts.
    pub last_error: Option<String>,
}
