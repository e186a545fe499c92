//! Query routing and collaborative refinement.
//!
//! [`CollaborationOrchestrator::route_query`] drives one query through the run state machine
//! and returns its transcript as a live [`ChunkStream`]:
//!
//! ```text
//! Categorizing ──parse error──────────────────────────────▶ Failed
//!      │
//!      ▼
//! Dispatching ──no collaboration──▶ one agent ──────────────▶ Done (Answer)
//!      │
//!      ▼ collaboration
//! Iterating: A(query) ─▶ B(A's reply) ─▶ … ─▶ satisfaction check
//!      ▲                                           │
//!      └─────── not satisfied, iteration < max ────┤
//!                                                  ├─ satisfied ─▶ Done (FinalAnswerReached)
//!                                                  └─ cap hit ───▶ Done (MaxIterationsReached)
//! ```
//!
//! Collaborators form a relay: each one receives the previous collaborator's reply, never
//! the original query (except the first of round one). Every round ends with one
//! satisfaction check on the newline-joined replies of that round, which also become the
//! input of the next round.
//!
//! The stream is lazy. Nothing happens until it is polled, every chunk is handed out
//! before the next model call starts, and dropping the stream abandons the run. A
//! [`CancellationToken`] passed to
//! [`route_query_with_cancellation`](CollaborationOrchestrator::route_query_with_cancellation)
//! ends a run early with a [`OutputChunk::Cancelled`] chunk.
//!
//! # Example
//!
//! ```rust,no_run
//! use agentrelay::{AgentRegistry, CollaborationOrchestrator, QueryCategorizer, RouterConfig};
//! use agentrelay::clients::claude::{ClaudeClient, Model};
//! use futures_util::StreamExt;
//! use std::sync::Arc;
//!
//! # async {
//! let client = Arc::new(ClaudeClient::new_with_model_enum("key", Model::ClaudeSonnet45));
//! let orchestrator = CollaborationOrchestrator::new(
//!     AgentRegistry::with_default_personas(client.clone(), None),
//!     QueryCategorizer::new(client),
//! )
//! .with_config(RouterConfig { max_iterations: 3, ..RouterConfig::default() });
//!
//! let mut chunks = orchestrator.route_query("Write and explain a quicksort", None);
//! while let Some(chunk) = chunks.next().await {
//!     println!("{}", chunk);
//! }
//! # };
//! ```

use crate::agentrelay::agent_id::AgentRef;
use crate::agentrelay::categorizer::QueryCategorizer;
use crate::agentrelay::chunk::{ChunkStream, OutputChunk};
use crate::agentrelay::client_wrapper::ImageRef;
use crate::agentrelay::clients::common::preview;
use crate::agentrelay::config::RouterConfig;
use crate::agentrelay::event::{EventHandler, OrchestrationEvent, RunOutcome};
use crate::agentrelay::parsing::{parse_categorization, parse_satisfaction, CategorizationResult};
use crate::agentrelay::registry::AgentRegistry;
use chrono::{DateTime, Utc};
use futures_util::stream;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Routes queries to agents and runs collaboration rounds.
///
/// The registry and categorizer are shared read-only across every run started from this
/// orchestrator; each run owns its own collaboration state.
pub struct CollaborationOrchestrator {
    registry: Arc<AgentRegistry>,
    categorizer: Arc<QueryCategorizer>,
    config: RouterConfig,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl CollaborationOrchestrator {
    pub fn new(registry: AgentRegistry, categorizer: QueryCategorizer) -> Self {
        Self {
            registry: Arc::new(registry),
            categorizer: Arc::new(categorizer),
            config: RouterConfig::default(),
            event_handler: None,
        }
    }

    /// Build from components that are already shared with other orchestrators.
    ///
    /// Event handlers attached later are not propagated into shared components.
    pub fn from_shared(registry: Arc<AgentRegistry>, categorizer: Arc<QueryCategorizer>) -> Self {
        Self {
            registry,
            categorizer,
            config: RouterConfig::default(),
            event_handler: None,
        }
    }

    pub fn with_config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach an [`EventHandler`]. The handler is also propagated to every agent in the
    /// registry and to the categorizer, so agent-level events flow through it too.
    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        match Arc::get_mut(&mut self.registry) {
            Some(registry) => registry.set_event_handler(Arc::clone(&handler)),
            None => log::warn!("Agent registry is shared; agent events will not reach the handler"),
        }
        match Arc::get_mut(&mut self.categorizer) {
            Some(categorizer) => categorizer.set_event_handler(Arc::clone(&handler)),
            None => log::warn!("Categorizer is shared; its events will not reach the handler"),
        }
        self.event_handler = Some(handler);
        self
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    /// Route `query` (and an optional image) and stream the transcript.
    pub fn route_query(&self, query: impl Into<String>, image: Option<ImageRef>) -> ChunkStream {
        self.route_query_with_cancellation(query, image, CancellationToken::new())
    }

    /// Like [`route_query`](Self::route_query); cancelling `cancel` ends the run with
    /// [`OutputChunk::Cancelled`] at the next step or during an in-flight call.
    pub fn route_query_with_cancellation(
        &self,
        query: impl Into<String>,
        image: Option<ImageRef>,
        cancel: CancellationToken,
    ) -> ChunkStream {
        let run = Run {
            run_id: uuid::Uuid::new_v4().to_string(),
            query: query.into(),
            image,
            registry: Arc::clone(&self.registry),
            categorizer: Arc::clone(&self.categorizer),
            event_handler: self.event_handler.clone(),
            cancel,
            max_iterations: self.config.effective_max_iterations(),
            started_at: Utc::now(),
            iterations: 0,
            pending: VecDeque::new(),
            phase: Phase::Start,
        };

        Box::pin(stream::unfold(run, |mut run| async move {
            loop {
                if let Some(chunk) = run.pending.pop_front() {
                    return Some((chunk, run));
                }
                if matches!(run.phase, Phase::Finished) {
                    return None;
                }
                run.step().await;
            }
        }))
    }
}

/// State of one collaboration round sequence.
#[derive(Debug)]
struct CollaborationState {
    iteration: usize,
    collaborators: Vec<AgentRef>,
    /// Index of the next collaborator to call in this round.
    cursor: usize,
    /// Whether the processing chunk for `collaborators[cursor]` was already emitted.
    announced: bool,
    current_response: String,
    per_agent_responses: Vec<String>,
}

impl CollaborationState {
    fn new(collaborators: Vec<AgentRef>, query: String) -> Self {
        Self {
            iteration: 1,
            collaborators,
            cursor: 0,
            announced: false,
            current_response: query,
            per_agent_responses: Vec::new(),
        }
    }

    fn next_round(&mut self, combined: String) {
        self.iteration += 1;
        self.cursor = 0;
        self.announced = false;
        self.current_response = combined;
        self.per_agent_responses.clear();
    }
}

enum Phase {
    Start,
    Categorizing,
    Dispatching(CategorizationResult),
    Collaborating(CollaborationState),
    Finished,
}

struct Run {
    run_id: String,
    query: String,
    image: Option<ImageRef>,
    registry: Arc<AgentRegistry>,
    categorizer: Arc<QueryCategorizer>,
    event_handler: Option<Arc<dyn EventHandler>>,
    cancel: CancellationToken,
    max_iterations: usize,
    started_at: DateTime<Utc>,
    iterations: usize,
    pending: VecDeque<OutputChunk>,
    phase: Phase,
}

impl Run {
    async fn emit(&self, event: OrchestrationEvent) {
        if let Some(handler) = &self.event_handler {
            handler.on_orchestration_event(&event).await;
        }
    }

    /// Advance the state machine by one step, queueing the chunks it produces.
    async fn step(&mut self) {
        let phase = std::mem::replace(&mut self.phase, Phase::Finished);

        if let Phase::Start = phase {
            log::info!(
                "Run {} started: {}",
                self.run_id,
                preview(&self.query, 80)
            );
            self.emit(OrchestrationEvent::RunStarted {
                run_id: self.run_id.clone(),
                started_at: self.started_at,
                query_preview: preview(&self.query, 120),
                with_image: self.image.is_some(),
            })
            .await;
        }

        if self.cancel.is_cancelled() {
            self.finish(OutputChunk::Cancelled, RunOutcome::Cancelled).await;
            return;
        }

        match phase {
            Phase::Start => {
                self.pending.push_back(OutputChunk::Categorizing);
                self.phase = Phase::Categorizing;
            }
            Phase::Categorizing => self.categorize().await,
            Phase::Dispatching(parsed) => self.dispatch(parsed).await,
            Phase::Collaborating(state) => self.collaborate(state).await,
            Phase::Finished => {}
        }
    }

    async fn categorize(&mut self) {
        let categorizer = Arc::clone(&self.categorizer);
        let reply = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            reply = categorizer.categorize(&self.query) => Some(reply),
        };

        let raw = match reply {
            None => return self.finish(OutputChunk::Cancelled, RunOutcome::Cancelled).await,
            Some(Err(e)) => {
                return self
                    .finish(OutputChunk::Failed(e.to_string()), RunOutcome::Failed)
                    .await
            }
            Some(Ok(raw)) => raw,
        };

        self.pending
            .push_back(OutputChunk::CategorizationOutput(raw.clone()));

        match parse_categorization(&raw) {
            Ok(parsed) => {
                log::info!(
                    "Run {} categorized as {} (collaboration: {})",
                    self.run_id,
                    parsed.category,
                    parsed.collaboration_required
                );
                self.emit(OrchestrationEvent::CategorizationParsed {
                    run_id: self.run_id.clone(),
                    category: parsed.category.clone(),
                    collaboration_required: parsed.collaboration_required,
                    collaborators: parsed.initial_collaborators.clone(),
                })
                .await;
                self.phase = Phase::Dispatching(parsed);
            }
            Err(e) => {
                log::warn!("Run {}: {}", self.run_id, e.reason());
                self.emit(OrchestrationEvent::ResponseMalformed {
                    run_id: self.run_id.clone(),
                    kind: e.kind(),
                    reason: e.reason().to_string(),
                })
                .await;
                self.finish(OutputChunk::Failed(e.to_string()), RunOutcome::Failed)
                    .await;
            }
        }
    }

    async fn dispatch(&mut self, parsed: CategorizationResult) {
        if parsed.collaboration_required {
            self.pending.push_back(OutputChunk::CollaborationStarted {
                collaborators: parsed.initial_collaborators.clone(),
            });
            let state = CollaborationState::new(parsed.initial_collaborators, self.query.clone());
            self.start_iteration(&state).await;
            self.phase = Phase::Collaborating(state);
            return;
        }

        self.emit(OrchestrationEvent::SingleDispatch {
            run_id: self.run_id.clone(),
            agent: parsed.category.clone(),
        })
        .await;

        let registry = Arc::clone(&self.registry);
        let answer = registry
            .interact_with_cancellation(
                &parsed.category,
                &self.query,
                self.image.as_ref(),
                &self.cancel,
            )
            .await;

        match answer {
            Some(text) => self.finish(OutputChunk::Answer(text), RunOutcome::Answered).await,
            None => self.finish(OutputChunk::Cancelled, RunOutcome::Cancelled).await,
        }
    }

    async fn start_iteration(&mut self, state: &CollaborationState) {
        self.iterations = state.iteration;
        log::info!("Run {} iteration {}", self.run_id, state.iteration);
        self.pending.push_back(OutputChunk::IterationStarted {
            iteration: state.iteration,
        });
        self.emit(OrchestrationEvent::IterationStarted {
            run_id: self.run_id.clone(),
            iteration: state.iteration,
            max_iterations: self.max_iterations,
        })
        .await;
    }

    async fn collaborate(&mut self, mut state: CollaborationState) {
        if state.cursor < state.collaborators.len() {
            let agent = state.collaborators[state.cursor].clone();

            // Announce first so the processing chunk reaches the caller before the call.
            if !state.announced {
                state.announced = true;
                self.pending.push_back(OutputChunk::AgentProcessing { agent });
                self.phase = Phase::Collaborating(state);
                return;
            }

            let registry = Arc::clone(&self.registry);
            let reply = registry
                .interact_with_cancellation(
                    &agent,
                    &state.current_response,
                    self.image.as_ref(),
                    &self.cancel,
                )
                .await;
            let Some(response) = reply else {
                return self.finish(OutputChunk::Cancelled, RunOutcome::Cancelled).await;
            };

            self.emit(OrchestrationEvent::CollaboratorResponded {
                run_id: self.run_id.clone(),
                iteration: state.iteration,
                agent: agent.clone(),
                response_length: response.len(),
            })
            .await;

            state.current_response = response.clone();
            state.per_agent_responses.push(response.clone());
            state.cursor += 1;
            state.announced = false;
            self.pending
                .push_back(OutputChunk::AgentResponse { agent, response });
            self.phase = Phase::Collaborating(state);
            return;
        }

        let combined = state.per_agent_responses.join("\n");
        let categorizer = Arc::clone(&self.categorizer);
        let reply = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            reply = categorizer.check_satisfaction(&combined) => Some(reply),
        };

        let raw = match reply {
            None => return self.finish(OutputChunk::Cancelled, RunOutcome::Cancelled).await,
            Some(Err(e)) => {
                return self
                    .finish(OutputChunk::Failed(e.to_string()), RunOutcome::Failed)
                    .await
            }
            Some(Ok(raw)) => raw,
        };
        self.pending
            .push_back(OutputChunk::SatisfactionCheck(raw.clone()));

        let verdict = match parse_satisfaction(&raw) {
            Ok(verdict) => verdict,
            Err(e) => {
                log::warn!("Run {}: {}", self.run_id, e.reason());
                self.emit(OrchestrationEvent::ResponseMalformed {
                    run_id: self.run_id.clone(),
                    kind: e.kind(),
                    reason: e.reason().to_string(),
                })
                .await;
                return self
                    .finish(OutputChunk::Failed(e.to_string()), RunOutcome::Failed)
                    .await;
            }
        };

        self.emit(OrchestrationEvent::SatisfactionChecked {
            run_id: self.run_id.clone(),
            iteration: state.iteration,
            satisfied: verdict.satisfied,
        })
        .await;

        if verdict.satisfied {
            return self
                .finish(OutputChunk::FinalAnswerReached, RunOutcome::Satisfied)
                .await;
        }
        if state.iteration >= self.max_iterations {
            log::warn!(
                "Run {} still unsatisfied after {} iterations",
                self.run_id,
                state.iteration
            );
            return self
                .finish(
                    OutputChunk::MaxIterationsReached {
                        iterations: state.iteration,
                    },
                    RunOutcome::MaxIterationsReached,
                )
                .await;
        }

        log::debug!("Run {} next steps: {}", self.run_id, verdict.next_steps);
        state.next_round(combined);
        self.start_iteration(&state).await;
        self.phase = Phase::Collaborating(state);
    }

    /// Queue the terminal chunk and close the run.
    async fn finish(&mut self, terminal: OutputChunk, outcome: RunOutcome) {
        self.pending.push_back(terminal);
        self.phase = Phase::Finished;

        let elapsed_ms = (Utc::now() - self.started_at).num_milliseconds();
        log::info!(
            "Run {} finished: {:?} after {} iteration(s) in {}ms",
            self.run_id,
            outcome,
            self.iterations,
            elapsed_ms
        );
        self.emit(OrchestrationEvent::RunCompleted {
            run_id: self.run_id.clone(),
            outcome,
            iterations: self.iterations,
            elapsed_ms,
        })
        .await;
    }
}
