//! Content-generation collaborator interface.
//!
//! The canvas never talks to a model provider directly; it consumes this
//! trait and defensively normalizes whatever comes back. A malformed or
//! partial payload degrades to an explicit error — zero children must never
//! be merged as if they were a real expansion.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use treeline_graph::Quiz;

use crate::error::{KernelError, Result};

/// Number of sub-topics an expansion is expected to produce.
pub const SUBTOPICS_PER_EXPANSION: usize = 4;

/// Number of questions a mastery quiz set is expected to contain
/// (one general question plus up to four child-topic questions).
pub const QUIZ_SET_LEN: usize = 5;

/// One generated sub-topic: a label plus optional enrichments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubTopic {
    pub label: String,
    #[serde(default)]
    pub fact: Option<String>,
    #[serde(default)]
    pub quiz: Option<Quiz>,
}

impl SubTopic {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }
}

/// External generator of topic content.
///
/// Implementations wrap whatever backend produces the material; the kernel
/// only sees these three calls and treats every failure as recoverable.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Produce sub-topics for `topic`. Four are expected; see
    /// [`normalize_subtopics`] for how deviations are handled.
    async fn expand(&self, topic: &str) -> Result<Vec<SubTopic>>;

    /// Produce a short fun-fact string for `topic`.
    async fn fact(&self, topic: &str) -> Result<String>;

    /// Produce a mastery quiz set: one general question on `parent_topic`
    /// plus one per child topic, five expected in total.
    async fn quiz_set(&self, parent_topic: &str, child_topics: &[String]) -> Result<Vec<Quiz>>;
}

/// Normalize a generator expansion to at most four usable sub-topics.
///
/// Blank labels and malformed attached quizzes are dropped, surplus entries
/// are truncated, and an empty result is an error so the caller can revert
/// the expansion instead of corrupting layout invariants.
pub fn normalize_subtopics(topic: &str, raw: Vec<SubTopic>) -> Result<Vec<SubTopic>> {
    let received = raw.len();
    let mut subtopics: Vec<SubTopic> = raw
        .into_iter()
        .filter_map(|mut sub| {
            sub.label = sub.label.trim().to_string();
            if sub.label.is_empty() {
                tracing::warn!(topic, "dropping sub-topic with blank label");
                return None;
            }
            if let Some(quiz) = &sub.quiz {
                if !quiz.is_well_formed() {
                    tracing::warn!(topic, label = %sub.label, "dropping malformed sub-topic quiz");
                    sub.quiz = None;
                }
            }
            Some(sub)
        })
        .collect();

    if subtopics.is_empty() {
        return Err(KernelError::MalformedContent(format!(
            "expansion of \"{topic}\" produced no usable sub-topics"
        )));
    }
    if subtopics.len() > SUBTOPICS_PER_EXPANSION {
        tracing::warn!(
            topic,
            received,
            "truncating expansion to {SUBTOPICS_PER_EXPANSION} sub-topics"
        );
        subtopics.truncate(SUBTOPICS_PER_EXPANSION);
    } else if subtopics.len() < SUBTOPICS_PER_EXPANSION {
        tracing::warn!(
            topic,
            received,
            kept = subtopics.len(),
            "expansion returned fewer than {SUBTOPICS_PER_EXPANSION} sub-topics"
        );
    }
    Ok(subtopics)
}

/// Normalize a generator quiz set to at most five well-formed questions.
pub fn normalize_quiz_set(parent_topic: &str, raw: Vec<Quiz>) -> Result<Vec<Quiz>> {
    let received = raw.len();
    let mut quizzes: Vec<Quiz> = raw.into_iter().filter(Quiz::is_well_formed).collect();

    if quizzes.is_empty() {
        return Err(KernelError::MalformedContent(format!(
            "quiz set for \"{parent_topic}\" contained no usable questions"
        )));
    }
    if quizzes.len() > QUIZ_SET_LEN {
        tracing::warn!(
            parent_topic,
            received,
            "truncating quiz set to {QUIZ_SET_LEN} questions"
        );
        quizzes.truncate(QUIZ_SET_LEN);
    } else if quizzes.len() < QUIZ_SET_LEN {
        tracing::warn!(
            parent_topic,
            received,
            kept = quizzes.len(),
            "quiz set shorter than the expected {QUIZ_SET_LEN} questions"
        );
    }
    Ok(quizzes)
}
