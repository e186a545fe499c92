//! Agent registry.
//!
//! The registry is the fixed `AgentId -> Agent` mapping built once at startup and shared
//! read-only (behind an `Arc`) by every orchestration run. It is also the single dispatch
//! entry point: [`AgentRegistry::interact`] never fails. Unknown names come back as
//! [`UNKNOWN_AGENT_MESSAGE`] and agent errors come back as readable failure text, so the
//! orchestrator can thread whatever it gets forward.
//!
//! ```rust,no_run
//! use agentrelay::{AgentRef, AgentRegistry};
//! use agentrelay::clients::openai::{Model, OpenAIClient};
//! use std::sync::Arc;
//!
//! # async {
//! let client = Arc::new(OpenAIClient::new_with_model_enum("key", Model::GPT41Mini));
//! let registry = AgentRegistry::with_default_personas(client, None);
//!
//! let answer = registry
//!     .interact(&AgentRef::parse("Guidance"), "How do I run better meetings?", None)
//!     .await;
//! println!("{}", answer);
//! # };
//! ```

use crate::agentrelay::agent::{Agent, AgentError};
use crate::agentrelay::agent_id::{AgentId, AgentRef};
use crate::agentrelay::client_wrapper::{ClientWrapper, ImageRef};
use crate::agentrelay::event::EventHandler;
use crate::agentrelay::persona::PersonaConfig;
use crate::agentrelay::retrieval::DocumentRetriever;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Returned by [`AgentRegistry::interact`] for names that do not resolve to a registered agent.
pub const UNKNOWN_AGENT_MESSAGE: &str = "Unknown agent type. Please choose from: Reflection, Solution, Inquiry, Guidance, Visual, Coding, Analytics, or Reasoning.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two agents were registered under the same id.
    DuplicateAgent(AgentId),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateAgent(id) => {
                write!(f, "Agent '{}' is already registered", id)
            }
        }
    }
}

impl Error for RegistryError {}

/// Fixed mapping from [`AgentId`] to [`Agent`].
pub struct AgentRegistry {
    agents: HashMap<AgentId, Agent>,
}

impl AgentRegistry {
    pub fn builder() -> AgentRegistryBuilder {
        AgentRegistryBuilder::default()
    }

    /// Register every built-in persona against one shared client. The retriever, if any,
    /// is handed to the personas that use retrieval.
    pub fn with_default_personas(
        client: Arc<dyn ClientWrapper>,
        retriever: Option<Arc<dyn DocumentRetriever>>,
    ) -> Self {
        let agents = AgentId::ALL
            .iter()
            .map(|&id| {
                let persona = PersonaConfig::default_for(id);
                let mut agent = Agent::new(persona, Arc::clone(&client));
                if agent.persona().uses_retrieval {
                    if let Some(retriever) = &retriever {
                        agent = agent.with_retriever(Arc::clone(retriever));
                    }
                }
                (id, agent)
            })
            .collect();
        Self { agents }
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    /// Registered ids, in canonical order.
    pub fn ids(&self) -> Vec<AgentId> {
        AgentId::ALL
            .iter()
            .copied()
            .filter(|id| self.agents.contains_key(id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Attach `handler` to every registered agent.
    pub fn set_event_handler(&mut self, handler: Arc<dyn EventHandler>) {
        for agent in self.agents.values_mut() {
            agent.set_event_handler(Arc::clone(&handler));
        }
    }

    fn resolve(&self, agent: &AgentRef) -> Option<&Agent> {
        agent.known().and_then(|id| self.get(id))
    }

    /// Dispatch `input` to `agent`. Never fails.
    pub async fn interact(
        &self,
        agent: &AgentRef,
        input: &str,
        image: Option<&ImageRef>,
    ) -> String {
        let Some(target) = self.resolve(agent) else {
            log::warn!("No agent registered for '{}'", agent);
            return UNKNOWN_AGENT_MESSAGE.to_string();
        };
        match target.respond(input, image).await {
            Ok(response) => response.content,
            Err(e) => failure_text(target.id, &e),
        }
    }

    /// Like [`interact`](AgentRegistry::interact), but returns `None` if `cancel` fires
    /// before the agent answers.
    pub async fn interact_with_cancellation(
        &self,
        agent: &AgentRef,
        input: &str,
        image: Option<&ImageRef>,
        cancel: &CancellationToken,
    ) -> Option<String> {
        if cancel.is_cancelled() {
            return None;
        }
        let Some(target) = self.resolve(agent) else {
            log::warn!("No agent registered for '{}'", agent);
            return Some(UNKNOWN_AGENT_MESSAGE.to_string());
        };
        match target.respond_with_cancellation(input, image, cancel).await {
            Ok(response) => Some(response.content),
            Err(AgentError::Cancelled) => None,
            Err(e) => Some(failure_text(target.id, &e)),
        }
    }
}

fn failure_text(id: AgentId, error: &AgentError) -> String {
    format!("Agent {} failed: {}", id, error)
}

/// Builder for a registry with hand-picked agents (e.g. one model per persona).
#[derive(Default)]
pub struct AgentRegistryBuilder {
    agents: Vec<Agent>,
}

impl AgentRegistryBuilder {
    pub fn with_agent(mut self, agent: Agent) -> Self {
        self.agents.push(agent);
        self
    }

    pub fn build(self) -> Result<AgentRegistry, RegistryError> {
        let mut agents = HashMap::with_capacity(self.agents.len());
        for agent in self.agents {
            let id = agent.id;
            if agents.insert(id, agent).is_some() {
                return Err(RegistryError::DuplicateAgent(id));
            }
        }
        Ok(AgentRegistry { agents })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agentrelay::client_wrapper::Message;
    use async_trait::async_trait;

    struct EchoClient;

    #[async_trait]
    impl ClientWrapper for EchoClient {
        async fn send_message(
            &self,
            messages: &[Message],
            _image: Option<&ImageRef>,
        ) -> Result<Message, Box<dyn Error + Send + Sync>> {
            Ok(Message::assistant(messages[0].content.as_ref()))
        }

        fn model_name(&self) -> &str {
            "echo"
        }
    }

    #[test]
    fn test_duplicate_agent_rejected() {
        let client: Arc<dyn ClientWrapper> = Arc::new(EchoClient);
        let result = AgentRegistry::builder()
            .with_agent(Agent::new(PersonaConfig::default_for(AgentId::Coding), client.clone()))
            .with_agent(Agent::new(PersonaConfig::default_for(AgentId::Coding), client))
            .build();
        assert_eq!(
            result.err(),
            Some(RegistryError::DuplicateAgent(AgentId::Coding))
        );
    }

    #[test]
    fn test_default_personas_cover_every_id() {
        let registry = AgentRegistry::with_default_personas(Arc::new(EchoClient), None);
        assert_eq!(registry.ids(), AgentId::ALL.to_vec());
        assert_eq!(
            registry.get(AgentId::Visual).map(|a| a.name.as_str()),
            Some("Visual Agent")
        );
    }

    #[tokio::test]
    async fn test_unregistered_known_id_gets_sentinel() {
        let registry = AgentRegistry::builder()
            .with_agent(Agent::new(
                PersonaConfig::default_for(AgentId::Coding),
                Arc::new(EchoClient),
            ))
            .build()
            .unwrap();
        let text = registry
            .interact(&AgentRef::Known(AgentId::Guidance), "hi", None)
            .await;
        assert_eq!(text, UNKNOWN_AGENT_MESSAGE);
    }
}
