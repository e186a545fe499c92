//! Agent System
//!
//! This module provides the [`Agent`] struct: one persona wrapping a language-model call.
//! All personas share this single type; what differs between them is the
//! [`PersonaConfig`] (instruction template, image forwarding, retrieval) and the client
//! handle injected at construction time, which also decides the model the persona uses.
//!
//! Agents hold no per-call mutable state, so one instance can serve any number of
//! concurrent queries through a shared [`AgentRegistry`](crate::registry::AgentRegistry).
//!
//! # Example
//!
//! ```rust,no_run
//! use agentrelay::{Agent, AgentId, PersonaConfig};
//! use agentrelay::clients::claude::{ClaudeClient, Model};
//! use std::sync::Arc;
//!
//! # async {
//! let client = Arc::new(ClaudeClient::new_with_model_enum("key", Model::ClaudeHaiku45));
//! let agent = Agent::new(PersonaConfig::default_for(AgentId::Coding), client);
//!
//! let reply = agent.respond("Write a binary search in Rust", None).await.unwrap();
//! println!("{}", reply.content);
//! # };
//! ```

use crate::agentrelay::agent_id::AgentId;
use crate::agentrelay::client_wrapper::{ClientWrapper, ImageRef, Message, TokenUsage};
use crate::agentrelay::clients::common::preview;
use crate::agentrelay::event::{AgentEvent, EventHandler};
use crate::agentrelay::persona::PersonaConfig;
use crate::agentrelay::retrieval::{format_documents, DocumentRetriever};
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Response body returned after asking an agent to generate content.
#[derive(Debug, Clone)]
pub struct AgentResponse {
    /// Text produced by the model.
    pub content: String,
    /// Token usage reported by the client for this call, if any.
    pub tokens_used: Option<TokenUsage>,
}

/// Errors raised by a single agent call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// The invocation client returned an error.
    Client(String),
    /// The call was abandoned because its cancellation token fired.
    Cancelled,
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::Client(msg) => write!(f, "Model invocation failed: {}", msg),
            AgentError::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl Error for AgentError {}

/// Text shown in the `{documents}` slot when no search results are available.
pub const NO_DOCUMENTS: &str = "(no documents retrieved)";

/// One persona bound to an invocation client.
pub struct Agent {
    /// Which persona this is.
    pub id: AgentId,
    /// Human-readable display name for logging and transcripts.
    pub name: String,
    persona: PersonaConfig,
    client: Arc<dyn ClientWrapper>,
    retriever: Option<Arc<dyn DocumentRetriever>>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl Agent {
    /// Create an agent for `persona`, calling the model behind `client`.
    pub fn new(persona: PersonaConfig, client: Arc<dyn ClientWrapper>) -> Self {
        Self {
            id: persona.id,
            name: persona.name.clone(),
            persona,
            client,
            retriever: None,
            event_handler: None,
        }
    }

    /// Attach the document retriever used when the persona has `uses_retrieval` set.
    pub fn with_retriever(mut self, retriever: Arc<dyn DocumentRetriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn with_event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    pub fn set_event_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.event_handler = Some(handler);
    }

    pub fn persona(&self) -> &PersonaConfig {
        &self.persona
    }

    pub fn client(&self) -> &Arc<dyn ClientWrapper> {
        &self.client
    }

    async fn emit(&self, event: AgentEvent) {
        if let Some(handler) = &self.event_handler {
            handler.on_agent_event(&event).await;
        }
    }

    /// Fetch documents for retrieval personas. Failures degrade to [`NO_DOCUMENTS`].
    async fn documents_for(&self, input: &str) -> Option<String> {
        if !self.persona.uses_retrieval {
            return None;
        }

        let Some(retriever) = &self.retriever else {
            log::warn!(
                "Agent '{}' uses retrieval but has no retriever configured",
                self.name
            );
            self.emit(AgentEvent::RetrievalCompleted {
                agent_id: self.id.to_string(),
                agent_name: self.name.clone(),
                documents: 0,
            })
            .await;
            return Some(NO_DOCUMENTS.to_string());
        };

        let (rendered, count) = match retriever.hybrid_search(input).await {
            Ok(docs) if docs.is_empty() => (NO_DOCUMENTS.to_string(), 0),
            Ok(docs) => (format_documents(&docs), docs.len()),
            Err(e) => {
                log::warn!("Agent '{}' hybrid search failed: {}", self.name, e);
                (NO_DOCUMENTS.to_string(), 0)
            }
        };

        self.emit(AgentEvent::RetrievalCompleted {
            agent_id: self.id.to_string(),
            agent_name: self.name.clone(),
            documents: count,
        })
        .await;

        Some(rendered)
    }

    /// Produce a response to `input`.
    ///
    /// The image is only forwarded when the persona accepts images.
    pub async fn respond(
        &self,
        input: &str,
        image: Option<&ImageRef>,
    ) -> Result<AgentResponse, AgentError> {
        let image = if self.persona.accepts_image { image } else { None };

        self.emit(AgentEvent::ResponseStarted {
            agent_id: self.id.to_string(),
            agent_name: self.name.clone(),
            input_preview: preview(input, 120),
            with_image: image.is_some(),
        })
        .await;

        let documents = self.documents_for(input).await;
        let prompt = self.persona.render(input, documents.as_deref());

        log::debug!(
            "Agent '{}' calling model {} ({} chars)",
            self.name,
            self.client.model_name(),
            prompt.len()
        );

        match self.client.send_message(&[Message::user(&prompt)], image).await {
            Ok(message) => {
                let tokens_used = self.client.get_last_usage().await;
                let content = message.content.to_string();
                self.emit(AgentEvent::ResponseCompleted {
                    agent_id: self.id.to_string(),
                    agent_name: self.name.clone(),
                    tokens_used: tokens_used.clone(),
                    response_length: content.len(),
                })
                .await;
                Ok(AgentResponse {
                    content,
                    tokens_used,
                })
            }
            Err(e) => {
                log::error!("Agent '{}' model call failed: {}", self.name, e);
                self.emit(AgentEvent::ResponseFailed {
                    agent_id: self.id.to_string(),
                    agent_name: self.name.clone(),
                    error: e.to_string(),
                })
                .await;
                Err(AgentError::Client(e.to_string()))
            }
        }
    }

    /// [`respond`](Agent::respond), abandoned as soon as `cancel` fires.
    pub async fn respond_with_cancellation(
        &self,
        input: &str,
        image: Option<&ImageRef>,
        cancel: &CancellationToken,
    ) -> Result<AgentResponse, AgentError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AgentError::Cancelled),
            result = self.respond(input, image) => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    struct RecordingClient {
        images: bool,
        prompts: Mutex<Vec<(String, bool)>>,
    }

    #[async_trait]
    impl ClientWrapper for RecordingClient {
        async fn send_message(
            &self,
            messages: &[Message],
            image: Option<&ImageRef>,
        ) -> Result<Message, Box<dyn Error + Send + Sync>> {
            self.prompts
                .lock()
                .await
                .push((messages[0].content.to_string(), image.is_some()));
            Ok(Message::assistant("ok"))
        }

        fn model_name(&self) -> &str {
            "recording"
        }

        fn supports_images(&self) -> bool {
            self.images
        }
    }

    fn recording() -> Arc<RecordingClient> {
        Arc::new(RecordingClient {
            images: true,
            prompts: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn test_image_only_forwarded_to_visual_persona() {
        let client = recording();
        let image = ImageRef::new("/tmp/photo.jpg");

        let coding = Agent::new(PersonaConfig::default_for(AgentId::Coding), client.clone());
        let visual = Agent::new(PersonaConfig::default_for(AgentId::Visual), client.clone());
        coding.respond("x", Some(&image)).await.unwrap();
        visual.respond("y", Some(&image)).await.unwrap();

        let prompts = client.prompts.lock().await;
        assert!(!prompts[0].1);
        assert!(prompts[1].1);
        assert!(prompts[1].0.contains("Description: y"));
    }

    #[tokio::test]
    async fn test_retrieval_persona_without_retriever_still_answers() {
        let client = recording();
        let inquiry = Agent::new(PersonaConfig::default_for(AgentId::Inquiry), client.clone());
        let response = inquiry.respond("best beaches?", None).await.unwrap();
        assert_eq!(response.content, "ok");

        let prompts = client.prompts.lock().await;
        assert!(prompts[0].0.contains(NO_DOCUMENTS));
        assert!(prompts[0].0.contains("Question: best beaches?"));
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let client = recording();
        let agent = Agent::new(PersonaConfig::default_for(AgentId::Solution), client.clone());
        let token = CancellationToken::new();
        token.cancel();

        let result = agent.respond_with_cancellation("x", None, &token).await;
        assert_eq!(result.unwrap_err(), AgentError::Cancelled);
        assert!(client.prompts.lock().await.is_empty());
    }
}
