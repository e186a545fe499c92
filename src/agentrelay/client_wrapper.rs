//! The provider-neutral client interface: messages, images, token usage and the
//! [`ClientWrapper`] trait every model backend implements.

use async_trait::async_trait;
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// A ClientWrapper is a wrapper around a specific cloud LLM service.
/// It provides a common interface to interact with the LLMs.
/// It does not keep track of any conversation: every agent call in this crate is a
/// single-shot prompt, so the wrapper only has to turn messages (and an optional image)
/// into one assistant reply.
// src/client_wrapper

/// Represents the possible roles for a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Role {
    System,
    // set by the developer to steer the model's responses
    User,
    // a message sent by a human user (or app user)
    Assistant, // lets the model know the content was generated as a response to a user message
}

/// How many tokens were spent on prompt vs. completion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub total_tokens: usize,
}

/// Represents a generic message to be sent to an LLM.
#[derive(Clone, Debug)]
pub struct Message {
    /// The role associated with the message.
    pub role: Role,
    /// The actual content of the message. Stored as `Arc<str>` so cloning is cheap.
    pub content: Arc<str>,
}

impl Message {
    /// Convenience constructor for a user-role message.
    pub fn user(content: impl AsRef<str>) -> Self {
        Message {
            role: Role::User,
            content: Arc::from(content.as_ref()),
        }
    }

    /// Convenience constructor for an assistant-role message.
    pub fn assistant(content: impl AsRef<str>) -> Self {
        Message {
            role: Role::Assistant,
            content: Arc::from(content.as_ref()),
        }
    }
}

/// Reference to an image attached to a user query.
///
/// The image stays on disk until a client that supports vision input reads it;
/// clients without vision support ignore it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRef {
    /// Location of the image on the local filesystem.
    pub path: PathBuf,
    /// MIME type sent along with the encoded bytes.
    pub media_type: String,
}

impl ImageRef {
    /// Reference a JPEG image (the media type the chat UI uploads by default).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ImageRef {
            path: path.into(),
            media_type: "image/jpeg".to_string(),
        }
    }

    /// Override the media type (e.g. `"image/png"`).
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = media_type.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the image and return its base64 (standard alphabet) encoding.
    pub async fn load_base64(&self) -> std::io::Result<String> {
        use base64::Engine;
        let bytes = tokio::fs::read(&self.path).await?;
        Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path.display(), self.media_type)
    }
}

/// Trait defining the interface to interact with various LLM services.
#[async_trait]
pub trait ClientWrapper: Send + Sync {
    /// Send a message to the LLM and get a response.
    /// - `messages`: The messages to send in the request.
    /// - `image`: An optional image to attach to the last user message. Clients that
    ///   cannot send images log a warning and ignore it.
    async fn send_message(
        &self,
        messages: &[Message],
        image: Option<&ImageRef>,
    ) -> Result<Message, Box<dyn Error + Send + Sync>>;

    /// Name of the model this client talks to.
    fn model_name(&self) -> &str;

    /// Whether `send_message` forwards images to the model.
    fn supports_images(&self) -> bool {
        false
    }

    /// Hook to retrieve usage from the *last* send_message() call.
    /// Default impl reads the slot exposed by [`ClientWrapper::usage_slot`].
    async fn get_last_usage(&self) -> Option<TokenUsage> {
        match self.usage_slot() {
            Some(slot) => slot.lock().await.clone(),
            None => None,
        }
    }

    fn usage_slot(&self) -> Option<&Mutex<Option<TokenUsage>>> {
        // ClientWrapper implementations supporting TokenUsage tracking should return a Mutex<Option<TokenUsage>> by overriding this method.
        None
    }
}
