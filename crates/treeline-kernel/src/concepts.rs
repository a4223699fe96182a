//! Response cache and concept store collaborator.
//!
//! The kernel short-circuits generator calls through this store and uses it
//! to re-open previously explored topics. Keys are namespaced per workflow
//! (`scout:` expansion, `hover:` fun facts, `mastery:` quiz sets) and
//! normalized so "Biology " and "biology" share an entry. Store failures are
//! non-critical by contract: `set` cannot report one, and a `get` miss just
//! means the generator gets called.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use treeline_graph::{ConceptTree, Quiz};

use crate::content::SubTopic;

/// Key-value store with concept-tree persistence and root-topic listing.
#[async_trait]
pub trait ConceptStore: Send + Sync {
    /// Fetch a cached collaborator response.
    async fn get(&self, key: &str) -> Option<Value>;

    /// Cache a collaborator response. Failures are swallowed by
    /// implementations; caching is best-effort.
    async fn set(&self, key: &str, value: Value);

    /// Topics that were explored as a root and never observed as someone
    /// else's child.
    async fn list_root_concepts(&self) -> Vec<String>;

    /// The saved tree for a previously explored topic.
    async fn concept_tree(&self, topic: &str) -> Option<ConceptTree>;

    /// Persist the current tree for `topic`.
    async fn save_concept_tree(&self, topic: &str, tree: &ConceptTree);
}

fn normalize_topic(topic: &str) -> String {
    topic.trim().to_lowercase()
}

/// Cache key for an expansion response.
pub fn scout_key(topic: &str) -> String {
    format!("scout:{}", normalize_topic(topic))
}

/// Cache key for a fun-fact response.
pub fn hover_key(topic: &str) -> String {
    format!("hover:{}", normalize_topic(topic))
}

/// Cache key for a mastery quiz set. Child order does not matter: the key
/// sorts them so the same family always maps to the same entry.
pub fn mastery_key(topic: &str, child_topics: &[String]) -> String {
    let mut children: Vec<String> = child_topics.iter().map(|c| normalize_topic(c)).collect();
    children.sort();
    format!("mastery:{}:{}", normalize_topic(topic), children.join(","))
}

/// Cached shape of an expansion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ScoutDoc {
    pub sub_topics: Vec<SubTopic>,
}

/// Cached shape of a fun-fact response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct HoverDoc {
    pub fun_fact: String,
}

/// Cached shape of a mastery quiz-set response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct MasteryDoc {
    pub quizzes: Vec<Quiz>,
}

/// In-memory concept store.
///
/// The default backend for tests and single-process use; a database-backed
/// implementation plugs in behind the same trait.
#[derive(Debug, Default)]
pub struct MemoryConceptStore {
    entries: DashMap<String, Value>,
    trees: DashMap<String, ConceptTree>,
}

impl MemoryConceptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConceptStore for MemoryConceptStore {
    async fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    async fn set(&self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    async fn list_root_concepts(&self) -> Vec<String> {
        // A topic is a root concept unless some saved tree contains it as a
        // descendant.
        let mut child_labels: Vec<String> = Vec::new();
        for entry in self.trees.iter() {
            collect_child_labels(entry.value(), &mut child_labels);
        }

        let mut roots: Vec<String> = self
            .trees
            .iter()
            .filter(|entry| !child_labels.contains(&normalize_topic(&entry.value().label)))
            .map(|entry| entry.value().label.clone())
            .collect();
        roots.sort();
        roots
    }

    async fn concept_tree(&self, topic: &str) -> Option<ConceptTree> {
        self.trees
            .get(&normalize_topic(topic))
            .map(|entry| entry.value().clone())
    }

    async fn save_concept_tree(&self, topic: &str, tree: &ConceptTree) {
        self.trees.insert(normalize_topic(topic), tree.clone());
    }
}

fn collect_child_labels(tree: &ConceptTree, out: &mut Vec<String>) {
    for child in &tree.children {
        out.push(normalize_topic(&child.label));
        collect_child_labels(child, out);
    }
}
