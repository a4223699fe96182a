//! Scripted collaborators for kernel integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use treeline_graph::Quiz;
use treeline_kernel::{ContentGenerator, KernelError, Result, SubTopic};

/// Route kernel tracing into the test harness when `RUST_LOG` is set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A well-formed question whose first option is correct.
pub fn question(text: &str) -> Quiz {
    Quiz {
        question: text.to_string(),
        options: vec![
            "right".to_string(),
            "wrong".to_string(),
            "wrong".to_string(),
            "wrong".to_string(),
        ],
        correct_index: 0,
    }
}

/// Deterministic content generator with failure injection, optional
/// latency, and per-endpoint call counters.
#[derive(Default)]
pub struct ScriptedGenerator {
    expansions: Mutex<HashMap<String, Vec<SubTopic>>>,
    fail_expand: AtomicBool,
    fail_fact: AtomicBool,
    fail_quiz: AtomicBool,
    delay: Mutex<Option<Duration>>,
    expand_calls: AtomicUsize,
    fact_calls: AtomicUsize,
    quiz_calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the expansion for one topic; unscripted topics get four
    /// derived sub-topics.
    pub fn script_expansion(&self, topic: &str, subtopics: Vec<SubTopic>) {
        self.expansions
            .lock()
            .unwrap()
            .insert(topic.to_string(), subtopics);
    }

    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn fail_expand(&self, fail: bool) {
        self.fail_expand.store(fail, Ordering::SeqCst);
    }

    pub fn fail_fact(&self, fail: bool) {
        self.fail_fact.store(fail, Ordering::SeqCst);
    }

    pub fn fail_quiz(&self, fail: bool) {
        self.fail_quiz.store(fail, Ordering::SeqCst);
    }

    pub fn expand_calls(&self) -> usize {
        self.expand_calls.load(Ordering::SeqCst)
    }

    pub fn fact_calls(&self) -> usize {
        self.fact_calls.load(Ordering::SeqCst)
    }

    pub fn quiz_calls(&self) -> usize {
        self.quiz_calls.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ContentGenerator for ScriptedGenerator {
    async fn expand(&self, topic: &str) -> Result<Vec<SubTopic>> {
        self.expand_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if self.fail_expand.load(Ordering::SeqCst) {
            return Err(KernelError::Collaborator("scripted expand failure".into()));
        }
        if let Some(scripted) = self.expansions.lock().unwrap().get(topic) {
            return Ok(scripted.clone());
        }
        Ok((1..=4)
            .map(|i| SubTopic::labeled(format!("{topic} branch {i}")))
            .collect())
    }

    async fn fact(&self, topic: &str) -> Result<String> {
        self.fact_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if self.fail_fact.load(Ordering::SeqCst) {
            return Err(KernelError::Collaborator("scripted fact failure".into()));
        }
        Ok(format!("A curious detail about {topic}."))
    }

    async fn quiz_set(&self, parent_topic: &str, child_topics: &[String]) -> Result<Vec<Quiz>> {
        self.quiz_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        if self.fail_quiz.load(Ordering::SeqCst) {
            return Err(KernelError::Collaborator("scripted quiz failure".into()));
        }
        let mut quizzes = vec![question(&format!("About {parent_topic}?"))];
        quizzes.extend(
            child_topics
                .iter()
                .take(4)
                .map(|child| question(&format!("About {child}?"))),
        );
        Ok(quizzes)
    }
}
