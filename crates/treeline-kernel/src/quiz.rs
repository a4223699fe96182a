//! Mastery-quiz session and state machine.
//!
//! A session exists only between entry (root marked learned) and exit. The
//! machine is deliberately explicit: `Loading → Active → Complete | Dead`,
//! with `Dead → Active` via retry, so illegal combinations (dead while
//! browsing, answering while loading) are unrepresentable. Warmth is the
//! one shared resource between scoring and the thermometer affordance; its
//! clamped-integer semantics are preserved exactly. Completion is driven by
//! exhausting the question list — warmth only decides death.
//!
//! Pacing (the feedback-display delay between answering and advancing) is
//! owned by the kernel; this module exposes the synchronous transitions.

use serde::Serialize;
use strum::Display;
use treeline_graph::{NodeId, Quiz};

/// Warmth at session start and after a retry.
pub const WARMTH_START: i32 = 50;
/// Upper warmth clamp.
pub const WARMTH_MAX: i32 = 100;
/// Warmth gained on a correct answer and lost on a wrong one.
pub const WARMTH_STEP: i32 = 15;

/// Phase of a live quiz session. "Idle" is the absence of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
pub enum QuizPhase {
    /// Waiting for the generator to produce the question set.
    Loading,
    /// Questions underway.
    Active,
    /// Every question answered without freezing; terminal until exit.
    Complete,
    /// Warmth hit zero; terminal until retry or exit.
    Dead,
}

/// Immediate result of an answer, surfaced while feedback is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnswerJudgment {
    pub correct: bool,
    pub warmth: i32,
}

/// What happened when the feedback delay elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Moved on to the question at this index.
    Advanced(usize),
    /// Ran out of questions; the session is complete.
    Completed,
    /// Warmth reached zero; the session froze.
    Died,
}

/// Rendering-layer view of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizView {
    pub phase: QuizPhase,
    pub question: Option<Quiz>,
    pub question_index: usize,
    pub total_questions: usize,
    pub warmth: i32,
    pub correct_answers: usize,
}

/// A mastery-quiz session over a learned root's children.
#[derive(Debug, Clone)]
pub struct QuizSession {
    id: u64,
    parent_node: NodeId,
    parent_topic: String,
    child_topics: Vec<String>,
    quizzes: Vec<Quiz>,
    phase: QuizPhase,
    current: usize,
    correct_answers: usize,
    warmth: i32,
    /// Set between `answer` and `resolve_feedback`; answers arriving while
    /// feedback is on screen are ignored.
    awaiting_feedback: bool,
}

impl QuizSession {
    /// A new session in `Loading`, before the question set has arrived.
    pub fn loading(
        id: u64,
        parent_node: NodeId,
        parent_topic: impl Into<String>,
        child_topics: Vec<String>,
    ) -> Self {
        Self {
            id,
            parent_node,
            parent_topic: parent_topic.into(),
            child_topics,
            quizzes: Vec::new(),
            phase: QuizPhase::Loading,
            current: 0,
            correct_answers: 0,
            warmth: WARMTH_START,
            awaiting_feedback: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    pub fn warmth(&self) -> i32 {
        self.warmth
    }

    pub fn correct_answers(&self) -> usize {
        self.correct_answers
    }

    pub fn question_index(&self) -> usize {
        self.current
    }

    pub fn parent_node(&self) -> &NodeId {
        &self.parent_node
    }

    pub fn parent_topic(&self) -> &str {
        &self.parent_topic
    }

    pub fn child_topics(&self) -> &[String] {
        &self.child_topics
    }

    pub fn current_question(&self) -> Option<&Quiz> {
        if self.phase == QuizPhase::Active {
            self.quizzes.get(self.current)
        } else {
            None
        }
    }

    /// Install the fetched question set: `Loading → Active(0)`.
    pub fn activate(&mut self, quizzes: Vec<Quiz>) -> bool {
        if self.phase != QuizPhase::Loading || quizzes.is_empty() {
            return false;
        }
        self.quizzes = quizzes;
        self.phase = QuizPhase::Active;
        true
    }

    /// Judge an answer and apply warmth. Returns `None` when the answer must
    /// be ignored: not active, feedback already pending, or no question.
    pub fn answer(&mut self, selected: usize) -> Option<AnswerJudgment> {
        if self.phase != QuizPhase::Active || self.awaiting_feedback {
            return None;
        }
        let question = self.quizzes.get(self.current)?;

        let correct = selected == question.correct_index;
        if correct {
            self.warmth = (self.warmth + WARMTH_STEP).min(WARMTH_MAX);
            self.correct_answers += 1;
        } else {
            self.warmth = (self.warmth - WARMTH_STEP).max(0);
        }
        self.awaiting_feedback = true;

        tracing::debug!(
            session = self.id,
            question = self.current,
            correct,
            warmth = self.warmth,
            "answer judged"
        );
        Some(AnswerJudgment {
            correct,
            warmth: self.warmth,
        })
    }

    /// Conclude the feedback window: die at zero warmth, otherwise advance
    /// (completing after the final question). Death is checked first so a
    /// freeze on the last question still counts as a freeze.
    pub fn resolve_feedback(&mut self) -> Option<Resolution> {
        if self.phase != QuizPhase::Active || !self.awaiting_feedback {
            return None;
        }
        self.awaiting_feedback = false;

        if self.warmth == 0 {
            self.phase = QuizPhase::Dead;
            tracing::info!(session = self.id, "quiz session froze");
            return Some(Resolution::Died);
        }

        self.current += 1;
        if self.current >= self.quizzes.len() {
            self.phase = QuizPhase::Complete;
            tracing::info!(
                session = self.id,
                correct = self.correct_answers,
                total = self.quizzes.len(),
                "quiz session complete"
            );
            Some(Resolution::Completed)
        } else {
            Some(Resolution::Advanced(self.current))
        }
    }

    /// Restart a dead session with the same already-fetched question set.
    pub fn retry(&mut self) -> bool {
        if self.phase != QuizPhase::Dead {
            return false;
        }
        self.phase = QuizPhase::Active;
        self.current = 0;
        self.correct_answers = 0;
        self.warmth = WARMTH_START;
        self.awaiting_feedback = false;
        true
    }

    pub fn view(&self) -> QuizView {
        QuizView {
            phase: self.phase,
            question: self.current_question().cloned(),
            question_index: self.current,
            total_questions: self.quizzes.len(),
            warmth: self.warmth,
            correct_answers: self.correct_answers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(correct: usize) -> Quiz {
        Quiz {
            question: "Pick one".to_string(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_index: correct,
        }
    }

    fn active_session(questions: usize) -> QuizSession {
        let mut session = QuizSession::loading(
            1,
            NodeId::root(),
            "Biology",
            vec!["Cells".into(), "Genetics".into()],
        );
        assert!(session.activate((0..questions).map(|_| question(0)).collect()));
        session
    }

    #[test]
    fn test_session_starts_loading_at_half_warmth() {
        let session = QuizSession::loading(1, NodeId::root(), "Biology", Vec::new());
        assert_eq!(session.phase(), QuizPhase::Loading);
        assert_eq!(session.warmth(), WARMTH_START);
        assert!(session.current_question().is_none());
    }

    #[test]
    fn test_answers_move_warmth_in_steps() {
        let mut session = active_session(5);

        let judged = session.answer(0).unwrap();
        assert!(judged.correct);
        assert_eq!(judged.warmth, 65);
        session.resolve_feedback().unwrap();

        let judged = session.answer(3).unwrap();
        assert!(!judged.correct);
        assert_eq!(judged.warmth, 50);
    }

    #[test]
    fn test_warmth_clamps_at_hundred() {
        let mut session = active_session(5);
        for _ in 0..4 {
            session.answer(0).unwrap();
            session.resolve_feedback().unwrap();
        }
        assert_eq!(session.warmth(), WARMTH_MAX);
    }

    #[test]
    fn test_answer_ignored_while_feedback_pending() {
        let mut session = active_session(5);
        session.answer(0).unwrap();
        assert!(session.answer(0).is_none(), "second answer must be ignored");
        session.resolve_feedback().unwrap();
        assert!(session.answer(0).is_some());
    }

    #[test]
    fn test_completion_after_every_question() {
        // Property: N questions, N non-fatal answers, Complete, with
        // correct_answers counting the hits.
        let mut session = active_session(5);
        let picks = [0usize, 1, 0, 2, 0]; // right, wrong, right, wrong, right

        let mut last = None;
        for pick in picks {
            session.answer(pick).unwrap();
            last = session.resolve_feedback();
        }

        assert_eq!(last, Some(Resolution::Completed));
        assert_eq!(session.phase(), QuizPhase::Complete);
        assert_eq!(session.correct_answers(), 3);
        assert!(session.answer(0).is_none(), "complete sessions take no answers");
    }

    #[test]
    fn test_four_wrong_answers_freeze_before_question_five() {
        let mut session = active_session(5);

        for expected in [35, 20, 5, 0] {
            let judged = session.answer(1).unwrap();
            assert_eq!(judged.warmth, expected);
            if expected > 0 {
                assert!(matches!(
                    session.resolve_feedback(),
                    Some(Resolution::Advanced(_))
                ));
            }
        }

        assert_eq!(session.resolve_feedback(), Some(Resolution::Died));
        assert_eq!(session.phase(), QuizPhase::Dead);
        assert_eq!(session.question_index(), 3, "question five never shown");
        assert!(session.answer(0).is_none());
    }

    #[test]
    fn test_retry_restores_start_state_and_question_set() {
        let mut session = active_session(5);
        for _ in 0..4 {
            session.answer(1).unwrap();
            session.resolve_feedback().unwrap();
        }
        assert_eq!(session.phase(), QuizPhase::Dead);

        assert!(session.retry());
        assert_eq!(session.phase(), QuizPhase::Active);
        assert_eq!(session.warmth(), WARMTH_START);
        assert_eq!(session.question_index(), 0);
        assert_eq!(session.correct_answers(), 0);
        assert_eq!(session.view().total_questions, 5, "same set, no refetch");
    }

    #[test]
    fn test_retry_only_from_dead() {
        let mut session = active_session(5);
        assert!(!session.retry());
        session.answer(0).unwrap();
        assert!(!session.retry());
    }

    #[test]
    fn test_death_on_final_question_beats_completion() {
        // Warmth reaching zero on the last answer freezes the session even
        // though the question list is exhausted.
        let mut session = active_session(4);
        session.answer(1).unwrap(); // 35
        session.resolve_feedback().unwrap();
        session.answer(1).unwrap(); // 20
        session.resolve_feedback().unwrap();
        session.answer(1).unwrap(); // 5
        session.resolve_feedback().unwrap();

        let judged = session.answer(1).unwrap(); // 0 on question 4 of 4
        assert_eq!(judged.warmth, 0);
        assert_eq!(session.resolve_feedback(), Some(Resolution::Died));
        assert_eq!(session.phase(), QuizPhase::Dead);
    }

    #[test]
    fn test_activate_requires_loading() {
        let mut session = active_session(2);
        assert!(!session.activate(vec![question(0)]));

        let mut loading = QuizSession::loading(2, NodeId::root(), "Biology", Vec::new());
        assert!(!loading.activate(Vec::new()), "empty sets never activate");
    }

    #[test]
    fn test_view_reflects_progress() {
        let mut session = active_session(5);
        session.answer(0).unwrap();
        session.resolve_feedback().unwrap();

        let view = session.view();
        assert_eq!(view.phase, QuizPhase::Active);
        assert_eq!(view.question_index, 1);
        assert_eq!(view.total_questions, 5);
        assert_eq!(view.warmth, 65);
        assert_eq!(view.correct_answers, 1);
        assert!(view.question.is_some());
    }
}
