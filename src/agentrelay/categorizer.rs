//! Query categorizer.
//!
//! The categorizer is a distinguished model call used for two things only: classifying a
//! query (which persona, whether collaboration is needed, who collaborates) and judging
//! whether a collaboration round produced a satisfying answer. It returns the model's raw
//! text; decoding lives in [`parsing`](crate::parsing) so the orchestrator can show the raw
//! text to the user before parsing it.

use crate::agentrelay::agent::AgentError;
use crate::agentrelay::agent_id::AgentId;
use crate::agentrelay::client_wrapper::{ClientWrapper, Message};
use crate::agentrelay::clients::common::preview;
use crate::agentrelay::event::{AgentEvent, EventHandler};
use std::sync::Arc;

const CATEGORIZER_ID: &str = "Categorizer";

/// Wraps the client used for categorization and satisfaction checks.
pub struct QueryCategorizer {
    client: Arc<dyn ClientWrapper>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl QueryCategorizer {
    pub fn new(client: Arc<dyn ClientWrapper>) -> Self {
        Self {
            client,
            event_handler: None,
        }
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    pub fn set_event_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.event_handler = Some(handler);
    }

    /// The prompt asking the model to classify `query`.
    pub fn categorize_prompt(query: &str) -> String {
        let available = AgentId::ALL
            .iter()
            .map(AgentId::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "You are a query categorizer. Analyze the following query and determine:\n\
             1. Which type of agent is most suited to handle it. Choose only from the given list of available agents. Available Agents: [{available}].\n\
             2. If the query requires collaboration between multiple agents.\n\
             3. Provide a reason and recommend initial collaborators.\n\
             Query: {query}\n\
             Provide your response in the format:\n\
             Category: <AgentType>\n\
             Collaboration: <Yes/No>\n\
             Reason: <Short explanation>\n\
             InitialCollaborators: [<AgentType1>, <AgentType2>, ...]. Include all required participating agents if Collaboration is 'Yes'."
        )
    }

    /// The prompt asking whether the combined round output is good enough.
    pub fn satisfaction_prompt(combined: &str) -> String {
        format!(
            "You are collaborating agents. Here is the combined response:\n\
             {combined}\n\n\
             Are you satisfied with this response? If not, list the areas that need further improvement and additional iterations required.\n\
             Provide your answer in the format:\n\
             Satisfied: <Yes/No>\n\
             NextSteps: <List of improvements or refinements>"
        )
    }

    /// Ask the model to classify `query`. Returns the raw model text.
    pub async fn categorize(&self, query: &str) -> Result<String, AgentError> {
        self.ask(&Self::categorize_prompt(query), query).await
    }

    /// Ask the model whether `combined` is satisfying. Returns the raw model text.
    pub async fn check_satisfaction(&self, combined: &str) -> Result<String, AgentError> {
        self.ask(&Self::satisfaction_prompt(combined), combined).await
    }

    async fn emit(&self, event: AgentEvent) {
        if let Some(handler) = &self.event_handler {
            handler.on_agent_event(&event).await;
        }
    }

    async fn ask(&self, prompt: &str, input: &str) -> Result<String, AgentError> {
        self.emit(AgentEvent::ResponseStarted {
            agent_id: CATEGORIZER_ID.to_string(),
            agent_name: CATEGORIZER_ID.to_string(),
            input_preview: preview(input, 120),
            with_image: false,
        })
        .await;

        match self.client.send_message(&[Message::user(prompt)], None).await {
            Ok(reply) => {
                let tokens_used = self.client.get_last_usage().await;
                let text = reply.content.to_string();
                log::debug!("Categorizer replied: {}", preview(&text, 200));
                self.emit(AgentEvent::ResponseCompleted {
                    agent_id: CATEGORIZER_ID.to_string(),
                    agent_name: CATEGORIZER_ID.to_string(),
                    tokens_used,
                    response_length: text.len(),
                })
                .await;
                Ok(text)
            }
            Err(e) => {
                log::error!("Categorizer call to {} failed: {}", self.client.model_name(), e);
                self.emit(AgentEvent::ResponseFailed {
                    agent_id: CATEGORIZER_ID.to_string(),
                    agent_name: CATEGORIZER_ID.to_string(),
                    error: e.to_string(),
                })
                .await;
                Err(AgentError::Client(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categorize_prompt_lists_agents_and_query() {
        let prompt = QueryCategorizer::categorize_prompt("Sort a list");
        assert!(prompt.contains(
            "Available Agents: [Reflection, Solution, Inquiry, Guidance, Visual, Coding, Analytics, Reasoning]."
        ));
        assert!(prompt.contains("\nQuery: Sort a list\n"));
        assert!(prompt.contains("\nCategory: <AgentType>\nCollaboration: <Yes/No>\n"));
    }

    #[test]
    fn test_satisfaction_prompt_embeds_combined_response() {
        let prompt = QueryCategorizer::satisfaction_prompt("a\nb");
        assert!(prompt.contains("combined response:\na\nb\n\nAre you satisfied"));
        assert!(prompt.ends_with("NextSteps: <List of improvements or refinements>"));
    }
}
