//! # agentrelay
//!
//! agentrelay routes a free-text user query to specialised LLM personas and, when a query needs
//! more than one of them, runs a relay of agents that refine each other's answers until they
//! report satisfaction.
//!
//! The crate provides layered abstractions for:
//!
//! * **Agents**: one [`Agent`] type parameterised by a [`PersonaConfig`] (instruction template,
//!   image forwarding, document retrieval) and an injected [`ClientWrapper`]
//! * **Registry**: [`AgentRegistry`], the fixed mapping from [`AgentId`] to agent, whose
//!   `interact` never fails: unknown names and agent errors come back as readable text
//! * **Categorization**: [`QueryCategorizer`] asks a model which persona fits and whether
//!   collaboration is needed; [`parsing`] decodes its labelled free-text replies
//! * **Orchestration**: [`CollaborationOrchestrator`] drives the run state machine and streams
//!   the transcript as [`OutputChunk`]s, bounded by [`RouterConfig::max_iterations`] and an
//!   optional cancellation token
//! * **Provider Flexibility**: [`ClientWrapper`] implemented for OpenAI, Anthropic Claude, and
//!   any synchronous SDK through [`clients::blocking`]
//!
//! ## Getting Started
//!
//! ```rust,no_run
//! use agentrelay::{AgentRegistry, CollaborationOrchestrator, QueryCategorizer};
//! use agentrelay::clients::claude::{ClaudeClient, Model};
//! use futures_util::StreamExt;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     agentrelay::init_logger();
//!
//!     let key = std::env::var("ANTHROPIC_KEY")?;
//!     let agents = Arc::new(ClaudeClient::new_with_model_enum(&key, Model::ClaudeSonnet45));
//!     let judge = Arc::new(ClaudeClient::new_with_model_enum(&key, Model::ClaudeHaiku45));
//!
//!     let orchestrator = CollaborationOrchestrator::new(
//!         AgentRegistry::with_default_personas(agents, None),
//!         QueryCategorizer::new(judge),
//!     );
//!
//!     let mut chunks = orchestrator.route_query("How can I improve my leadership skills?", None);
//!     while let Some(chunk) = chunks.next().await {
//!         println!("{}", chunk);
//!     }
//!     Ok(())
//! }
//! ```

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// Applications embedding agentrelay can opt in to `RUST_LOG` driven diagnostics without
/// choosing a logging backend upfront.
///
/// ```rust
/// agentrelay::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

// Import the top-level `agentrelay` module.
pub mod agentrelay;

// Re-exporting key items for easier external access.
pub use agentrelay::agent::{Agent, AgentError, AgentResponse};
pub use agentrelay::agent_id::{AgentId, AgentRef};
pub use agentrelay::client_wrapper;
pub use agentrelay::client_wrapper::{ClientWrapper, ImageRef, Message, Role, TokenUsage};
pub use agentrelay::clients;
pub use agentrelay::config::RouterConfig;
pub use agentrelay::persona::PersonaConfig;
pub use agentrelay::registry::{AgentRegistry, UNKNOWN_AGENT_MESSAGE};
pub use agentrelay::retrieval::DocumentRetriever;

pub use agentrelay::categorizer::QueryCategorizer;
pub use agentrelay::chunk::{collect_transcript, ChunkStream, OutputChunk};
pub use agentrelay::event;
pub use agentrelay::event::{AgentEvent, EventHandler, OrchestrationEvent, RunOutcome};
pub use agentrelay::orchestration;
pub use agentrelay::orchestration::CollaborationOrchestrator;
pub use agentrelay::parsing;
pub use agentrelay::{
    agent, agent_id, categorizer, chunk, config, persona, registry, retrieval, worker_pool,
};
