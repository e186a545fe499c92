//! Anthropic Claude client speaking the native Messages API.
//!
//! Unlike the OpenAI-compatible surface, the Messages API accepts base64 image blocks, so
//! this is the client to hand to the Visual persona. Text-only requests use a sampling
//! temperature of 0.7; requests carrying an image leave the provider default in place.
//!
//! # Example
//!
//! ```rust,no_run
//! use agentrelay::client_wrapper::{ClientWrapper, ImageRef, Message};
//! use agentrelay::clients::claude::{ClaudeClient, Model};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let key = std::env::var("ANTHROPIC_KEY")?;
//!     let client = ClaudeClient::new_with_model_enum(&key, Model::ClaudeSonnet45);
//!     let image = ImageRef::new("diagram.jpg");
//!     let reply = client
//!         .send_message(&[Message::user("Describe this diagram.")], Some(&image))
//!         .await?;
//!     println!("{}", reply.content);
//!     Ok(())
//! }
//! ```

use crate::agentrelay::client_wrapper::{ClientWrapper, ImageRef, Message, Role, TokenUsage};
use crate::agentrelay::clients::http_pool::get_http_client;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;
use tokio::sync::Mutex;

const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: usize = 8192;
const TEXT_TEMPERATURE: f32 = 0.7;

/// Anthropic Claude models commonly assigned to personas.
pub enum Model {
    /// `claude-opus-4-1` – deepest reasoning tier.
    ClaudeOpus41,
    /// `claude-sonnet-4-5` – balanced reasoning, vision capable.
    ClaudeSonnet45,
    /// `claude-sonnet-4-0` – previous Sonnet generation.
    ClaudeSonnet4,
    /// `claude-haiku-4-5` – fastest tier, good for categorization.
    ClaudeHaiku45,
    /// `claude-3-5-haiku-latest` – previous fast tier.
    ClaudeHaiku35,
}

/// Convert a [`Model`] variant into its public string identifier.
fn model_to_string(model: Model) -> String {
    match model {
        Model::ClaudeOpus41 => "claude-opus-4-1".to_string(),
        Model::ClaudeSonnet45 => "claude-sonnet-4-5".to_string(),
        Model::ClaudeSonnet4 => "claude-sonnet-4-0".to_string(),
        Model::ClaudeHaiku45 => "claude-haiku-4-5".to_string(),
        Model::ClaudeHaiku35 => "claude-3-5-haiku-latest".to_string(),
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<RequestMessage>,
}

#[derive(Serialize)]
struct RequestMessage {
    role: &'static str,
    content: Vec<ContentBlock>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentBlock {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: String,
    data: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
    usage: Option<ResponseUsage>,
}

#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ResponseUsage {
    input_tokens: usize,
    output_tokens: usize,
}

/// Client wrapper for Anthropic's Messages API.
pub struct ClaudeClient {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
    model: String,
    max_tokens: usize,
    token_usage: Mutex<Option<TokenUsage>>,
}

impl ClaudeClient {
    /// Create a client from an API key and strongly typed model variant.
    pub fn new_with_model_enum(secret_key: &str, model: Model) -> Self {
        Self::new_with_model_str(secret_key, &model_to_string(model))
    }

    /// Create a client from an API key and explicit model string.
    pub fn new_with_model_str(secret_key: &str, model_name: &str) -> Self {
        Self::new_with_base_url(secret_key, model_name, ANTHROPIC_BASE_URL)
    }

    /// Create a client pointing at a custom Claude-compatible base URL.
    pub fn new_with_base_url(secret_key: &str, model_name: &str, base_url: &str) -> Self {
        ClaudeClient {
            http: get_http_client(base_url),
            secret_key: secret_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model_name.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            token_usage: Mutex::new(None),
        }
    }

    /// Override the completion budget (defaults to 8192 tokens).
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    async fn build_request<'a>(
        &'a self,
        messages: &[Message],
        image: Option<&ImageRef>,
    ) -> Result<MessagesRequest<'a>, Box<dyn Error + Send + Sync>> {
        let mut system_parts = Vec::new();
        let mut request_messages = Vec::with_capacity(messages.len());
        for msg in messages {
            match msg.role {
                Role::System => system_parts.push(msg.content.to_string()),
                Role::User => request_messages.push(RequestMessage {
                    role: "user",
                    content: vec![ContentBlock::Text {
                        text: msg.content.to_string(),
                    }],
                }),
                Role::Assistant => request_messages.push(RequestMessage {
                    role: "assistant",
                    content: vec![ContentBlock::Text {
                        text: msg.content.to_string(),
                    }],
                }),
            }
        }

        if let Some(image) = image {
            let data = image
                .load_base64()
                .await
                .map_err(|e| format!("failed to read image {}: {}", image, e))?;
            match request_messages.iter_mut().rev().find(|m| m.role == "user") {
                // The image block goes first so the text can refer to it.
                Some(last_user) => last_user.content.insert(
                    0,
                    ContentBlock::Image {
                        source: ImageSource {
                            kind: "base64",
                            media_type: image.media_type.clone(),
                            data,
                        },
                    },
                ),
                None => return Err("cannot attach an image without a user message".into()),
            }
        }

        Ok(MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: if image.is_some() {
                None
            } else {
                Some(TEXT_TEMPERATURE)
            },
            system: if system_parts.is_empty() {
                None
            } else {
                Some(system_parts.join("\n\n"))
            },
            messages: request_messages,
        })
    }
}

#[async_trait]
impl ClientWrapper for ClaudeClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn supports_images(&self) -> bool {
        true
    }

    async fn send_message(
        &self,
        messages: &[Message],
        image: Option<&ImageRef>,
    ) -> Result<Message, Box<dyn Error + Send + Sync>> {
        let request = self.build_request(messages, image).await?;

        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.secret_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!(
                "ClaudeClient::send_message(...): Anthropic API Error {}: {}",
                status,
                body
            );
            return Err(format!("Anthropic API returned {}: {}", status, body).into());
        }

        let parsed: MessagesResponse = response.json().await?;

        if let Some(usage) = &parsed.usage {
            *self.token_usage.lock().await = Some(TokenUsage {
                input_tokens: usage.input_tokens,
                output_tokens: usage.output_tokens,
                total_tokens: usage.input_tokens + usage.output_tokens,
            });
        }

        let text = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(Message::assistant(text))
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        Some(&self.token_usage)
    }
}
