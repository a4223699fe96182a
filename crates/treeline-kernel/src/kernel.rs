//! The canvas kernel: single-writer owner of all mutable canvas state.
//!
//! UI handlers and async callbacks alike funnel through this struct. All
//! state lives behind one `parking_lot::Mutex` that is never held across an
//! await; every operation that suspends (collaborator calls, pacing timers)
//! captures the canvas epoch first and revalidates it after resuming, so a
//! reset that happened mid-flight silently drops the stale result instead
//! of corrupting the new canvas.
//!
//! Pacing transitions (quiz entry after the learn animation, feedback
//! display between answers) are spawned, cancellable timer tasks owned by
//! the kernel — not ambient side effects — so tests drive them on virtual
//! time.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use treeline_graph::{
    concept_tree_of, layout, rehydrate, AddOutcome, ChildSpec, ConceptTree, LayoutParams, NodeId,
    Quiz, TopicGraph,
};

use crate::concepts::{
    hover_key, mastery_key, scout_key, ConceptStore, HoverDoc, MasteryDoc, ScoutDoc,
};
use crate::content::{normalize_quiz_set, normalize_subtopics, ContentGenerator, SubTopic};
use crate::error::{KernelError, Result};
use crate::expansion::ExpansionState;
use crate::quiz::{AnswerJudgment, QuizSession};
use crate::snapshot::{CanvasSnapshot, EdgeView, GameMode, NodeView};

/// Shown when the fact collaborator fails; cached on the node so a flaky
/// backend is not re-hit on every hover.
const FALLBACK_FACT: &str = "No fun fact is available for this topic right now.";

/// Fixed delays used to pace UI transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pacing {
    /// Learn-animation settle time between marking the root learned and
    /// entering the quiz.
    pub quiz_entry: Duration,
    /// How long answer feedback stays on screen before the quiz advances.
    pub feedback: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            quiz_entry: Duration::from_millis(600),
            feedback: Duration::from_millis(900),
        }
    }
}

/// Result of an `expand_node` call.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpandOutcome {
    /// Children merged and the canvas relaid; ids in sibling order.
    Expanded(Vec<NodeId>),
    /// The node already had children; nothing changed.
    AlreadyExpanded,
    /// Another expansion is in flight; this request was ignored.
    Busy,
    /// The canvas was reset while the collaborator was thinking; the result
    /// was dropped.
    Stale,
}

#[derive(Debug, Default)]
struct Timers {
    quiz_entry: Option<JoinHandle<()>>,
    feedback: Option<JoinHandle<()>>,
}

impl Timers {
    fn cancel_feedback(&mut self) {
        if let Some(handle) = self.feedback.take() {
            handle.abort();
        }
    }

    fn cancel_all(&mut self) {
        if let Some(handle) = self.quiz_entry.take() {
            handle.abort();
        }
        self.cancel_feedback();
    }
}

/// Everything mutable, owned by exactly one mutex.
struct CanvasState {
    graph: TopicGraph,
    expansion: ExpansionState,
    quiz: Option<QuizSession>,
    /// Bumped on every canvas reset; in-flight work from a previous epoch
    /// is discarded when it lands.
    epoch: u64,
    next_session_id: u64,
    last_error: Option<String>,
    timers: Timers,
}

impl CanvasState {
    fn empty() -> Self {
        Self {
            graph: TopicGraph::new(),
            expansion: ExpansionState::new(),
            quiz: None,
            epoch: 0,
            next_session_id: 1,
            last_error: None,
            timers: Timers::default(),
        }
    }
}

/// The knowledge-exploration canvas core.
///
/// Generic over its two collaborators; see [`ContentGenerator`] and
/// [`ConceptStore`]. Cloning is cheap (shared state), which is how pacing
/// timer tasks keep a handle on the canvas.
pub struct CanvasKernel<G, S> {
    state: Arc<Mutex<CanvasState>>,
    content: Arc<G>,
    concepts: Arc<S>,
    layout: LayoutParams,
    pacing: Pacing,
}

impl<G, S> Clone for CanvasKernel<G, S> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            content: Arc::clone(&self.content),
            concepts: Arc::clone(&self.concepts),
            layout: self.layout.clone(),
            pacing: self.pacing.clone(),
        }
    }
}

impl<G, S> CanvasKernel<G, S>
where
    G: ContentGenerator + 'static,
    S: ConceptStore + 'static,
{
    pub fn new(content: Arc<G>, concepts: Arc<S>) -> Self {
        Self::with_config(content, concepts, LayoutParams::default(), Pacing::default())
    }

    pub fn with_config(
        content: Arc<G>,
        concepts: Arc<S>,
        layout: LayoutParams,
        pacing: Pacing,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(CanvasState::empty())),
            content,
            concepts,
            layout,
            pacing,
        }
    }

    // ========================================================================
    // Canvas lifecycle
    // ========================================================================

    /// Reset the canvas to a fresh single-node tree for `topic`.
    ///
    /// Any in-flight expansion or quiz from the previous canvas is orphaned
    /// by the epoch bump and will be dropped when it lands.
    pub async fn set_root_topic(&self, topic: &str) -> NodeId {
        let root = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            state.epoch += 1;
            state.timers.cancel_all();
            state.quiz = None;
            state.expansion = ExpansionState::new();
            state.last_error = None;
            let root = state.graph.seed_root(topic);
            layout(&mut state.graph, &self.layout);
            tracing::info!(topic, epoch = state.epoch, "canvas reset to new root topic");
            root
        };

        // Register the topic so concept listings include never-expanded
        // roots, without clobbering a tree saved by an earlier session.
        if self.concepts.concept_tree(topic).await.is_none() {
            self.concepts
                .save_concept_tree(topic, &ConceptTree::leaf(topic))
                .await;
        }
        root
    }

    /// Rebuild a previously explored canvas from the concept store.
    pub async fn open_concept(&self, topic: &str) -> Result<NodeId> {
        let tree = self
            .concepts
            .concept_tree(topic)
            .await
            .ok_or_else(|| KernelError::ConceptNotFound(topic.to_string()))?;
        let rehydrated = rehydrate(&tree, &self.layout)?;

        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.epoch += 1;
        state.timers.cancel_all();
        state.quiz = None;
        state.last_error = None;
        state.graph = rehydrated.graph;
        state.expansion = ExpansionState::with_expanded(rehydrated.expanded);
        tracing::info!(topic, epoch = state.epoch, "canvas rehydrated from concept store");
        Ok(NodeId::root())
    }

    /// Topics explored as roots and never seen as someone else's child.
    pub async fn list_concepts(&self) -> Vec<String> {
        self.concepts.list_root_concepts().await
    }

    // ========================================================================
    // Expansion
    // ========================================================================

    /// Expand `id` into its sub-topics.
    ///
    /// Exactly one successful children-merge can ever happen per node:
    /// repeats are `AlreadyExpanded`, concurrent requests are `Busy`, and a
    /// collaborator failure reverts the node so the user can click again.
    pub async fn expand_node(&self, id: &NodeId) -> Result<ExpandOutcome> {
        let (topic, epoch) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            let node = state
                .graph
                .get(id)
                .ok_or_else(|| KernelError::NodeNotFound(id.clone()))?;
            let topic = node.label.clone();

            if state.expansion.is_expanded(&state.graph, id) {
                return Ok(ExpandOutcome::AlreadyExpanded);
            }
            if !state.expansion.try_begin(id) {
                tracing::debug!(node = %id, "expansion already in flight, ignoring request");
                return Ok(ExpandOutcome::Busy);
            }
            state.last_error = None;
            (topic, state.epoch)
        };

        let subtopics = match self.fetch_subtopics(&topic).await {
            Ok(subtopics) => subtopics,
            Err(err) => {
                let mut guard = self.state.lock();
                guard.expansion.abort(id);
                guard.last_error = Some(err.to_string());
                tracing::warn!(node = %id, error = %err, "expansion failed, node reverted");
                return Err(err);
            }
        };

        let outcome = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            if state.epoch != epoch || !state.graph.contains(id) {
                state.expansion.abort(id);
                tracing::debug!(node = %id, "dropping stale expansion result");
                return Ok(ExpandOutcome::Stale);
            }

            let specs: Vec<ChildSpec> = subtopics
                .iter()
                .map(|sub| ChildSpec {
                    label: sub.label.clone(),
                    fact: sub.fact.clone(),
                    quiz: sub.quiz.clone(),
                })
                .collect();
            match state.graph.add_children(id, specs) {
                Ok(AddOutcome::Added(ids)) => {
                    state.expansion.finish(id);
                    layout(&mut state.graph, &self.layout);
                    tracing::info!(node = %id, children = ids.len(), "node expanded");
                    ExpandOutcome::Expanded(ids)
                }
                Ok(AddOutcome::AlreadyExpanded) => {
                    state.expansion.finish(id);
                    ExpandOutcome::AlreadyExpanded
                }
                Err(err) => {
                    state.expansion.abort(id);
                    state.last_error = Some(err.to_string());
                    return Err(err.into());
                }
            }
        };

        self.persist_tree().await;
        Ok(outcome)
    }

    /// Fetch (or recall) the fun fact for a node.
    ///
    /// A fact already cached on the node returns without suspension. A
    /// collaborator failure degrades to a fallback string; it never blocks
    /// or reverts anything else.
    pub async fn fetch_fact(&self, id: &NodeId) -> Result<String> {
        let (topic, epoch) = {
            let guard = self.state.lock();
            let node = guard
                .graph
                .get(id)
                .ok_or_else(|| KernelError::NodeNotFound(id.clone()))?;
            if let Some(fact) = &node.content.fact {
                return Ok(fact.clone());
            }
            (node.label.clone(), guard.epoch)
        };

        let key = hover_key(&topic);
        let cached = match self.concepts.get(&key).await {
            Some(value) => match serde_json::from_value::<HoverDoc>(value) {
                Ok(doc) => Some(doc.fun_fact),
                Err(err) => {
                    tracing::warn!(topic, error = %err, "unreadable cached fact, regenerating");
                    None
                }
            },
            None => None,
        };

        let fact = match cached {
            Some(fact) => fact,
            None => match self.content.fact(&topic).await {
                Ok(fact) => {
                    match serde_json::to_value(HoverDoc {
                        fun_fact: fact.clone(),
                    }) {
                        Ok(value) => self.concepts.set(&key, value).await,
                        Err(err) => {
                            tracing::warn!(topic, error = %err, "failed to encode fact for cache")
                        }
                    }
                    fact
                }
                Err(err) => {
                    tracing::warn!(topic, error = %err, "fact fetch failed, using fallback");
                    FALLBACK_FACT.to_string()
                }
            },
        };

        let mut guard = self.state.lock();
        if guard.epoch == epoch && guard.graph.contains(id) {
            let _ = guard.graph.set_fact(id, fact.clone());
        }
        Ok(fact)
    }

    /// Mark a node (and its current descendants) learned.
    ///
    /// Marking the designated root additionally schedules the mastery quiz
    /// after the learn-animation delay. Returns the newly learned ids;
    /// empty means the node was already learned.
    pub async fn mark_learned(&self, id: &NodeId) -> Result<Vec<NodeId>> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if !state.graph.contains(id) {
            return Err(KernelError::NodeNotFound(id.clone()));
        }

        let newly = state.expansion.mark_learned(&state.graph, id);
        if newly.is_empty() {
            return Ok(newly);
        }

        if id.is_root() && state.quiz.is_none() {
            let kernel = self.clone();
            let epoch = state.epoch;
            let delay = self.pacing.quiz_entry;
            state.timers.quiz_entry = Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                kernel.begin_quiz(epoch).await;
            }));
            tracing::info!(delay = ?delay, "root learned, mastery quiz scheduled");
        }
        Ok(newly)
    }

    // ========================================================================
    // Mastery quiz
    // ========================================================================

    /// Submit an answer for the current question.
    ///
    /// Returns `None` when there is nothing to answer: browsing mode, quiz
    /// still loading, terminal phase, or feedback already on screen. On
    /// `Some`, the resolution (advance / complete / death) fires after the
    /// feedback delay.
    pub fn answer(&self, selected: usize) -> Option<AnswerJudgment> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let session = state.quiz.as_mut()?;
        let judged = session.answer(selected)?;
        let session_id = session.id();

        let kernel = self.clone();
        let epoch = state.epoch;
        let delay = self.pacing.feedback;
        state.timers.feedback = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            kernel.conclude_feedback(epoch, session_id);
        }));
        Some(judged)
    }

    /// Restart a dead quiz with the same question set.
    pub fn retry_quiz(&self) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let retried = state.quiz.as_mut().is_some_and(QuizSession::retry);
        if retried {
            state.timers.cancel_feedback();
        }
        retried
    }

    /// Leave the quiz and return to browsing. Allowed from any quiz phase;
    /// mid-quiz progress is discarded, not scored.
    pub fn exit_quiz(&self) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.quiz.take().is_some() {
            state.timers.cancel_all();
            tracing::info!("quiz exited, back to browsing");
            true
        } else {
            false
        }
    }

    // ========================================================================
    // Read surface
    // ========================================================================

    pub fn mode(&self) -> GameMode {
        if self.state.lock().quiz.is_some() {
            GameMode::Quiz
        } else {
            GameMode::Browsing
        }
    }

    /// Read-only view of the whole canvas for the rendering layer.
    pub fn snapshot(&self) -> CanvasSnapshot {
        let guard = self.state.lock();
        let state = &*guard;

        let nodes = state
            .graph
            .nodes()
            .map(|node| NodeView {
                id: node.id.clone(),
                label: node.label.clone(),
                position: node.position,
                fact: node.content.fact.clone(),
                phase: state.expansion.phase(&state.graph, &node.id),
                learned: state.expansion.is_learned(&node.id),
            })
            .collect();
        let edges = state
            .graph
            .edges()
            .iter()
            .map(|edge| EdgeView {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
            })
            .collect();

        CanvasSnapshot {
            nodes,
            edges,
            expanding: state.expansion.in_flight().cloned(),
            mode: if state.quiz.is_some() {
                GameMode::Quiz
            } else {
                GameMode::Browsing
            },
            quiz: state.quiz.as_ref().map(QuizSession::view),
            last_error: state.last_error.clone(),
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Expansion content, via the response cache when possible.
    async fn fetch_subtopics(&self, topic: &str) -> Result<Vec<SubTopic>> {
        let key = scout_key(topic);
        if let Some(value) = self.concepts.get(&key).await {
            match serde_json::from_value::<ScoutDoc>(value) {
                Ok(doc) => {
                    tracing::debug!(topic, "expansion served from cache");
                    return normalize_subtopics(topic, doc.sub_topics);
                }
                Err(err) => {
                    tracing::warn!(topic, error = %err, "unreadable cached expansion, regenerating")
                }
            }
        }

        let raw = self.content.expand(topic).await?;
        let subtopics = normalize_subtopics(topic, raw)?;
        match serde_json::to_value(ScoutDoc {
            sub_topics: subtopics.clone(),
        }) {
            Ok(value) => self.concepts.set(&key, value).await,
            Err(err) => {
                tracing::warn!(topic, error = %err, "failed to encode expansion for cache")
            }
        }
        Ok(subtopics)
    }

    /// Quiz-set content, via the response cache when possible.
    async fn fetch_quiz_set(&self, parent_topic: &str, child_topics: &[String]) -> Result<Vec<Quiz>> {
        let key = mastery_key(parent_topic, child_topics);
        if let Some(value) = self.concepts.get(&key).await {
            match serde_json::from_value::<MasteryDoc>(value) {
                Ok(doc) => {
                    tracing::debug!(parent_topic, "quiz set served from cache");
                    return normalize_quiz_set(parent_topic, doc.quizzes);
                }
                Err(err) => {
                    tracing::warn!(parent_topic, error = %err, "unreadable cached quiz set, regenerating")
                }
            }
        }

        let raw = self.content.quiz_set(parent_topic, child_topics).await?;
        let quizzes = normalize_quiz_set(parent_topic, raw)?;
        match serde_json::to_value(MasteryDoc {
            quizzes: quizzes.clone(),
        }) {
            Ok(value) => self.concepts.set(&key, value).await,
            Err(err) => {
                tracing::warn!(parent_topic, error = %err, "failed to encode quiz set for cache")
            }
        }
        Ok(quizzes)
    }

    /// Timer-driven quiz entry: create the loading session, fetch the set,
    /// activate it — or fall back to browsing on failure.
    async fn begin_quiz(&self, epoch: u64) {
        let (session_id, parent_topic, child_topics) = {
            let mut guard = self.state.lock();
            let state = &mut *guard;
            if state.epoch != epoch || state.quiz.is_some() {
                return;
            }
            let root = NodeId::root();
            let Some(node) = state.graph.get(&root) else {
                return;
            };
            let parent_topic = node.label.clone();
            let child_topics: Vec<String> = state
                .graph
                .children_of(&root)
                .iter()
                .filter_map(|child| state.graph.get(child))
                .map(|child| child.label.clone())
                .collect();

            let session_id = state.next_session_id;
            state.next_session_id += 1;
            state.quiz = Some(QuizSession::loading(
                session_id,
                root,
                parent_topic.clone(),
                child_topics.clone(),
            ));
            tracing::info!(session = session_id, topic = %parent_topic, "quiz session loading");
            (session_id, parent_topic, child_topics)
        };

        let fetched = self.fetch_quiz_set(&parent_topic, &child_topics).await;

        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.epoch != epoch {
            return;
        }
        let Some(session) = state.quiz.as_mut().filter(|s| s.id() == session_id) else {
            return;
        };
        match fetched {
            Ok(quizzes) => {
                if session.activate(quizzes) {
                    tracing::info!(session = session_id, "quiz session active");
                } else {
                    state.quiz = None;
                }
            }
            Err(err) => {
                tracing::warn!(session = session_id, error = %err, "quiz set failed, back to browsing");
                state.last_error = Some(err.to_string());
                state.quiz = None;
            }
        }
    }

    /// Timer-driven end of the feedback window.
    fn conclude_feedback(&self, epoch: u64, session_id: u64) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.epoch != epoch {
            return;
        }
        let Some(session) = state.quiz.as_mut().filter(|s| s.id() == session_id) else {
            return;
        };
        if let Some(resolution) = session.resolve_feedback() {
            tracing::debug!(session = session_id, ?resolution, "feedback window closed");
        }
    }

    /// Persist the current tree so the concept can be re-opened later.
    /// Best-effort: a failure to export is logged, never surfaced.
    async fn persist_tree(&self) {
        let tree = {
            let guard = self.state.lock();
            let roots = guard.graph.roots_of();
            roots
                .first()
                .and_then(|root| concept_tree_of(&guard.graph, root))
        };
        if let Some(tree) = tree {
            self.concepts.save_concept_tree(&tree.label, &tree).await;
        }
    }
}
