//! Expansion and mastery-quiz state machines for the Treeline canvas.
//!
//! This crate is the async half of the knowledge-exploration core. It owns
//! every piece of mutable canvas state behind a single-writer kernel,
//! consumes two collaborators through traits (a content generator and a
//! concept/cache store), and exposes a read-only snapshot plus the mutator
//! entry points the rendering layer drives:
//!
//! - [`CanvasKernel::set_root_topic`] / [`CanvasKernel::open_concept`]
//! - [`CanvasKernel::expand_node`] (single-flight, idempotent)
//! - [`CanvasKernel::fetch_fact`] (read-through, never blocks expansion)
//! - [`CanvasKernel::mark_learned`] (cascades; root entry into the quiz)
//! - [`CanvasKernel::answer`] / [`CanvasKernel::retry_quiz`] /
//!   [`CanvasKernel::exit_quiz`]
//!
//! Collaborator failures are recoverable by construction: the kernel rolls
//! back to the last valid state and records an error indicator; nothing
//! propagates to the rendering layer as a fault.

mod concepts;
mod content;
mod error;
mod expansion;
mod kernel;
mod quiz;
mod snapshot;

pub use concepts::{hover_key, mastery_key, scout_key, ConceptStore, MemoryConceptStore};
pub use content::{
    normalize_quiz_set, normalize_subtopics, ContentGenerator, SubTopic, QUIZ_SET_LEN,
    SUBTOPICS_PER_EXPANSION,
};
pub use error::{KernelError, Result};
pub use expansion::{ExpansionState, NodePhase};
pub use kernel::{CanvasKernel, ExpandOutcome, Pacing};
pub use quiz::{
    AnswerJudgment, QuizPhase, QuizSession, QuizView, Resolution, WARMTH_MAX, WARMTH_START,
    WARMTH_STEP,
};
pub use snapshot::{CanvasSnapshot, EdgeView, GameMode, NodeView};
