//! The `OpenAIClient` struct implements `ClientWrapper` for OpenAI’s Chat API (and any
//! OpenAI-compatible endpoint), capturing both the assistant response and detailed token
//! usage for cost tracking.
//!
//! The chat completions surface used here is text-only: an attached image is logged and
//! dropped. Use [`ClaudeClient`](crate::clients::claude::ClaudeClient) for the Visual persona.
//!
//! # Example
//!
//! ```rust,no_run
//! use agentrelay::clients::openai::{OpenAIClient, Model};
//! use agentrelay::client_wrapper::{ClientWrapper, Message};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let secret_key = std::env::var("OPENAI_KEY")?;
//!     let client = OpenAIClient::new_with_model_enum(&secret_key, Model::GPT41Mini);
//!
//!     let resp = client.send_message(&[Message::user("Hello!")], None).await?;
//!     println!("Assistant: {}", resp.content);
//!
//!     if let Some(usage) = client.get_last_usage().await {
//!         println!("Tokens total: {}", usage.total_tokens);
//!     }
//!     Ok(())
//! }
//! ```
use std::error::Error;

use async_trait::async_trait;
use openai_rust2 as openai_rust;

use crate::agentrelay::client_wrapper::{ClientWrapper, ImageRef, Message, TokenUsage};
use crate::agentrelay::clients::common::{send_and_track, to_openai_messages};
use crate::agentrelay::clients::http_pool::get_http_client;
use tokio::sync::Mutex;

const OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Model identifiers commonly used for persona agents.
#[allow(non_camel_case_types)]
pub enum Model {
    /// `gpt-4o` – Omni model.
    GPT4o,
    /// `gpt-4o-mini` – cost effective GPT-4o derivative.
    GPT4oMini,
    /// `gpt-4.1` – general availability GPT-4.1.
    GPT41,
    /// `gpt-4.1-mini` – reduced cost GPT-4.1 tier.
    GPT41Mini,
    /// `gpt-4.1-nano` – ultra low cost GPT-4.1 derivative.
    GPT41Nano,
    /// `o4-mini` – low-latency reasoning tier.
    O4Mini,
}

/// Convert a [`Model`] variant into the string identifier expected by the REST API.
pub fn model_to_string(model: Model) -> String {
    match model {
        Model::GPT4o => "gpt-4o".to_string(),
        Model::GPT4oMini => "gpt-4o-mini".to_string(),
        Model::GPT41 => "gpt-4.1".to_string(),
        Model::GPT41Mini => "gpt-4.1-mini".to_string(),
        Model::GPT41Nano => "gpt-4.1-nano".to_string(),
        Model::O4Mini => "o4-mini".to_string(),
    }
}

/// Client wrapper for OpenAI's Chat Completions API.
pub struct OpenAIClient {
    /// Underlying SDK client pointing at the REST endpoint.
    client: openai_rust::Client,
    /// Model name that will be injected into each request.
    model: String,
    /// Storage for the token usage returned by the most recent request.
    token_usage: Mutex<Option<TokenUsage>>,
}

impl OpenAIClient {
    /// Construct a new client using the provided API key and [`Model`] variant.
    pub fn new_with_model_enum(secret_key: &str, model: Model) -> Self {
        Self::new_with_model_string(secret_key, &model_to_string(model))
    }

    /// Construct a new client using the provided API key and explicit model name.
    pub fn new_with_model_string(secret_key: &str, model_name: &str) -> Self {
        OpenAIClient {
            client: openai_rust::Client::new_with_client(
                secret_key,
                get_http_client(OPENAI_BASE_URL),
            ),
            model: model_name.to_string(),
            token_usage: Mutex::new(None),
        }
    }

    /// Construct a client targeting a custom OpenAI compatible base URL.
    pub fn new_with_base_url(secret_key: &str, model_name: &str, base_url: &str) -> Self {
        OpenAIClient {
            client: openai_rust::Client::new_with_client_and_base_url(
                secret_key,
                get_http_client(base_url),
                base_url,
            ),
            model: model_name.to_string(),
            token_usage: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ClientWrapper for OpenAIClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn send_message(
        &self,
        messages: &[Message],
        image: Option<&ImageRef>,
    ) -> Result<Message, Box<dyn Error + Send + Sync>> {
        if let Some(image) = image {
            log::warn!(
                "OpenAIClient::send_message(...): model {} is used text-only, ignoring image {}",
                self.model,
                image
            );
        }

        let content = send_and_track(
            &self.client,
            &self.model,
            to_openai_messages(messages),
            Some("/v1/chat/completions".to_string()),
            &self.token_usage,
        )
        .await?;

        Ok(Message::assistant(content))
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        Some(&self.token_usage)
    }
}
