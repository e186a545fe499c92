//! Route one query through the agents and print the transcript as it streams.
//!
//! ```text
//! ANTHROPIC_KEY=... cargo run --example route_query -- "How can I improve my leadership skills?"
//! OPENAI_KEY=...    cargo run --example route_query -- "Write and test a CSV parser" --max-iterations 3
//! ANTHROPIC_KEY=... cargo run --example route_query -- "What is in this picture?" --image photo.jpg
//! ```
//!
//! Press Ctrl-C to cancel a run; the stream ends with a cancellation chunk.

use agentrelay::client_wrapper::{ClientWrapper, ImageRef};
use agentrelay::clients::claude::{self, ClaudeClient};
use agentrelay::clients::openai::{self, OpenAIClient};
use agentrelay::{AgentRegistry, CollaborationOrchestrator, QueryCategorizer, RouterConfig};
use clap::Parser;
use futures_util::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Route a query through the persona agents and stream the transcript
#[derive(Parser, Debug)]
#[command(name = "route_query", about)]
struct Args {
    /// The query to route (words are joined with spaces)
    #[arg(required = true)]
    query: Vec<String>,

    /// Image to hand to the visual agent
    #[arg(long, value_name = "PATH")]
    image: Option<PathBuf>,

    /// Cap on collaboration rounds
    #[arg(long, value_name = "N")]
    max_iterations: Option<usize>,
}

/// Agents get the stronger model, the categorizer the faster one.
fn clients_from_env() -> Result<(Arc<dyn ClientWrapper>, Arc<dyn ClientWrapper>), Box<dyn std::error::Error>> {
    if let Ok(key) = std::env::var("ANTHROPIC_KEY") {
        return Ok((
            Arc::new(ClaudeClient::new_with_model_enum(&key, claude::Model::ClaudeSonnet45)),
            Arc::new(ClaudeClient::new_with_model_enum(&key, claude::Model::ClaudeHaiku45)),
        ));
    }
    if let Ok(key) = std::env::var("OPENAI_KEY") {
        return Ok((
            Arc::new(OpenAIClient::new_with_model_enum(&key, openai::Model::GPT41)),
            Arc::new(OpenAIClient::new_with_model_enum(&key, openai::Model::GPT41Mini)),
        ));
    }
    Err("set ANTHROPIC_KEY or OPENAI_KEY".into())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    agentrelay::init_logger();

    let args = Args::parse();
    let (agent_client, categorizer_client) = clients_from_env()?;

    let mut config = RouterConfig::default();
    if let Some(max) = args.max_iterations {
        config.max_iterations = max;
    }

    let orchestrator = CollaborationOrchestrator::new(
        AgentRegistry::with_default_personas(agent_client, None),
        QueryCategorizer::new(categorizer_client),
    )
    .with_config(config);

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let mut chunks = orchestrator.route_query_with_cancellation(
        args.query.join(" "),
        args.image.map(ImageRef::new),
        cancel,
    );
    while let Some(chunk) = chunks.next().await {
        println!("{}", chunk);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_join_query_and_read_flags() {
        let args = Args::try_parse_from([
            "route_query",
            "What",
            "is",
            "this?",
            "--image",
            "photo.jpg",
            "--max-iterations",
            "3",
        ])
        .unwrap();
        assert_eq!(args.query.join(" "), "What is this?");
        assert_eq!(args.image, Some(PathBuf::from("photo.jpg")));
        assert_eq!(args.max_iterations, Some(3));
    }

    #[test]
    fn test_args_reject_missing_query_and_bad_numbers() {
        assert!(Args::try_parse_from(["route_query"]).is_err());
        assert!(Args::try_parse_from(["route_query", "hi", "--max-iterations", "many"]).is_err());
    }
}
