//! Output chunks streamed by an orchestration run.
//!
//! Each [`OutputChunk`] is one incremental piece of the user-visible transcript. Chunks carry
//! structured data for programmatic consumers and render, through `Display`, to the markdown
//! fragments a chat UI shows. Exactly one terminal chunk (see [`OutputChunk::is_terminal`])
//! ends every run.

use crate::agentrelay::agent_id::AgentRef;
use futures_util::stream::{Stream, StreamExt};
use std::fmt;
use std::pin::Pin;

/// The live, non-restartable output of one run.
pub type ChunkStream = Pin<Box<dyn Stream<Item = OutputChunk> + Send>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputChunk {
    /// Emitted before the categorizer is called.
    Categorizing,
    /// Raw categorizer reply, shown before it is parsed.
    CategorizationOutput(String),
    CollaborationStarted { collaborators: Vec<AgentRef> },
    IterationStarted { iteration: usize },
    AgentProcessing { agent: AgentRef },
    AgentResponse { agent: AgentRef, response: String },
    /// Raw satisfaction-check reply, shown before it is parsed.
    SatisfactionCheck(String),

    /// Terminal: the single dispatched agent's reply (or routing/failure text).
    Answer(String),
    /// Terminal: collaborators reported satisfaction.
    FinalAnswerReached,
    /// Terminal: the iteration cap was hit while still unsatisfied.
    MaxIterationsReached { iterations: usize },
    /// Terminal: the run's cancellation token fired.
    Cancelled,
    /// Terminal: categorization or satisfaction output could not be used.
    Failed(String),
}

impl OutputChunk {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OutputChunk::Answer(_)
                | OutputChunk::FinalAnswerReached
                | OutputChunk::MaxIterationsReached { .. }
                | OutputChunk::Cancelled
                | OutputChunk::Failed(_)
        )
    }
}

impl fmt::Display for OutputChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputChunk::Categorizing => f.write_str("Performing query categorization...\n"),
            OutputChunk::CategorizationOutput(raw) => {
                write!(f, "**Categorization Output:** {}", raw)
            }
            OutputChunk::CollaborationStarted { collaborators } => {
                let names: Vec<String> = collaborators.iter().map(ToString::to_string).collect();
                write!(
                    f,
                    "**Collaboration Required. Initial Collaborators:** [{}]",
                    names.join(", ")
                )
            }
            OutputChunk::IterationStarted { iteration } => {
                write!(f, "\n**--- Collaboration Iteration {} ---**", iteration)
            }
            OutputChunk::AgentProcessing { agent } => {
                write!(f, "\n**Agent {} processing...**", agent)
            }
            OutputChunk::AgentResponse { agent, response } => {
                write!(f, "\n**Agent {} Response:** {}", agent, response)
            }
            OutputChunk::SatisfactionCheck(raw) => write!(f, "**Satisfaction Check:** {}", raw),
            OutputChunk::Answer(text) => f.write_str(text),
            OutputChunk::FinalAnswerReached => f.write_str("\n**--- Final Answer Reached ---**"),
            OutputChunk::MaxIterationsReached { iterations } => write!(
                f,
                "\n**--- Maximum Iterations Reached ({}) ---**",
                iterations
            ),
            OutputChunk::Cancelled => f.write_str("\n**--- Run Cancelled ---**"),
            OutputChunk::Failed(error) => write!(f, "Failed to handle query routing: {}", error),
        }
    }
}

/// Drain `stream` into the transcript a chat UI would show: every chunk followed by a newline.
pub async fn collect_transcript(mut stream: ChunkStream) -> String {
    let mut transcript = String::new();
    while let Some(chunk) = stream.next().await {
        transcript.push_str(&chunk.to_string());
        transcript.push('\n');
    }
    transcript
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agentrelay::agent_id::AgentId;
    use futures_util::stream;

    #[test]
    fn test_chunk_text() {
        let coding = AgentRef::Known(AgentId::Coding);
        assert_eq!(
            OutputChunk::CollaborationStarted {
                collaborators: vec![AgentRef::Known(AgentId::Solution), coding.clone()]
            }
            .to_string(),
            "**Collaboration Required. Initial Collaborators:** [Solution, Coding]"
        );
        assert_eq!(
            OutputChunk::AgentResponse {
                agent: coding,
                response: "fn main() {}".to_string()
            }
            .to_string(),
            "\n**Agent Coding Response:** fn main() {}"
        );
    }

    #[test]
    fn test_only_end_states_are_terminal() {
        assert!(OutputChunk::Answer(String::new()).is_terminal());
        assert!(OutputChunk::Cancelled.is_terminal());
        assert!(!OutputChunk::SatisfactionCheck(String::new()).is_terminal());
        assert!(!OutputChunk::IterationStarted { iteration: 1 }.is_terminal());
    }

    #[tokio::test]
    async fn test_collect_transcript_keeps_order() {
        let chunks = vec![
            OutputChunk::Categorizing,
            OutputChunk::Answer("done".to_string()),
        ];
        let transcript = collect_transcript(Box::pin(stream::iter(chunks))).await;
        assert_eq!(transcript, "Performing query categorization...\n\ndone\n");
    }
}
