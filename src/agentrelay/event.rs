//! Agent and Orchestration event system.
//!
//! Provides a callback-based observability layer for agents and orchestration runs.
//! Implement [`EventHandler`] to receive real-time notifications about:
//!
//! - **Agent calls**: when a persona starts and finishes a model call, with token usage
//! - **Retrieval**: how many documents the Inquiry persona pulled in
//! - **Run lifecycle**: categorization, dispatch, collaboration iterations, satisfaction
//!   checks, and the terminal outcome
//!
//! Both trait methods have default no-op implementations, so you only override what you
//! care about. The handler is wrapped in `Arc<dyn EventHandler>` and shared: when registered
//! on a [`CollaborationOrchestrator`](crate::orchestration::CollaborationOrchestrator) it is
//! also handed to every agent of its registry and to its categorizer.
//!
//! Events are a side channel. The chunk stream returned by `route_query` is the user-facing
//! transcript; events carry structured data (run ids, token counts, timings) for logs and
//! metrics.
//!
//! # Example
//!
//! ```rust,no_run
//! use agentrelay::event::{AgentEvent, EventHandler, OrchestrationEvent};
//! use async_trait::async_trait;
//!
//! struct MyHandler;
//!
//! #[async_trait]
//! impl EventHandler for MyHandler {
//!     async fn on_agent_event(&self, event: &AgentEvent) {
//!         if let AgentEvent::ResponseCompleted { agent_name, response_length, .. } = event {
//!             println!("{} answered ({} chars)", agent_name, response_length);
//!         }
//!     }
//!     async fn on_orchestration_event(&self, event: &OrchestrationEvent) {
//!         println!("Run: {:?}", event);
//!     }
//! }
//! ```

use crate::agentrelay::agent_id::AgentRef;
use crate::agentrelay::client_wrapper::TokenUsage;
use crate::agentrelay::parsing::ResponseKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Events emitted by an [`Agent`](crate::Agent) or the categorizer around each model call.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// Fired before the prompt is sent to the model.
    ResponseStarted {
        /// Persona id (e.g. `"Coding"`), or `"Categorizer"`.
        agent_id: String,
        agent_name: String,
        /// First ~120 characters of the input.
        input_preview: String,
        /// Whether an image is attached to this call.
        with_image: bool,
    },

    /// Fired when the model returned a response.
    ResponseCompleted {
        agent_id: String,
        agent_name: String,
        /// Usage reported by the client, or `None` if the provider did not report it.
        tokens_used: Option<TokenUsage>,
        response_length: usize,
    },

    /// Fired when the model call (or a step before it) failed.
    ResponseFailed {
        agent_id: String,
        agent_name: String,
        error: String,
    },

    /// Fired after a retrieval-backed persona ran its hybrid search.
    RetrievalCompleted {
        agent_id: String,
        agent_name: String,
        /// Number of documents injected into the prompt (0 when the search failed).
        documents: usize,
    },
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A single agent answered.
    Answered,
    /// Collaborators reported satisfaction.
    Satisfied,
    /// The iteration cap was hit before satisfaction.
    MaxIterationsReached,
    /// The run was cancelled through its token.
    Cancelled,
    /// Categorizer output could not be parsed.
    Failed,
}

/// Events emitted by the [`CollaborationOrchestrator`](crate::orchestration::CollaborationOrchestrator).
///
/// Every variant carries the `run_id` generated when the run started, so handlers can
/// separate concurrent queries.
#[derive(Debug, Clone)]
pub enum OrchestrationEvent {
    RunStarted {
        run_id: String,
        started_at: DateTime<Utc>,
        query_preview: String,
        with_image: bool,
    },

    /// The categorizer output parsed cleanly.
    CategorizationParsed {
        run_id: String,
        category: AgentRef,
        collaboration_required: bool,
        collaborators: Vec<AgentRef>,
    },

    /// A categorizer reply could not be parsed; `kind` says which one.
    ResponseMalformed {
        run_id: String,
        kind: ResponseKind,
        reason: String,
    },

    /// The query went to a single agent.
    SingleDispatch {
        run_id: String,
        agent: AgentRef,
    },

    IterationStarted {
        run_id: String,
        iteration: usize,
        max_iterations: usize,
    },

    CollaboratorResponded {
        run_id: String,
        iteration: usize,
        agent: AgentRef,
        response_length: usize,
    },

    SatisfactionChecked {
        run_id: String,
        iteration: usize,
        satisfied: bool,
    },

    RunCompleted {
        run_id: String,
        outcome: RunOutcome,
        iterations: usize,
        elapsed_ms: i64,
    },
}

/// Receives [`AgentEvent`]s and [`OrchestrationEvent`]s.
///
/// Handlers are awaited inline, so keep them quick; push heavy work onto a channel.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Called for every [`AgentEvent`]. Default: no-op.
    async fn on_agent_event(&self, _event: &AgentEvent) {}

    /// Called for every [`OrchestrationEvent`]. Default: no-op.
    async fn on_orchestration_event(&self, _event: &OrchestrationEvent) {}
}
