//! Adapter that turns a synchronous model SDK into a [`ClientWrapper`].
//!
//! Implement [`BlockingInvoker`] for the SDK handle and wrap it in [`BlockingClient`]; every
//! `send_message` call is executed on the shared [`WorkerPool`] so the async scheduler is
//! never blocked while the SDK waits on the network.
//!
//! ```rust
//! use agentrelay::client_wrapper::{ClientWrapper, ImageRef, Message};
//! use agentrelay::clients::blocking::{BlockingClient, BlockingInvoker};
//! use agentrelay::worker_pool::WorkerPool;
//! use std::error::Error;
//!
//! struct Echo;
//!
//! impl BlockingInvoker for Echo {
//!     fn invoke(
//!         &self,
//!         prompt: &str,
//!         _image: Option<&ImageRef>,
//!     ) -> Result<String, Box<dyn Error + Send + Sync>> {
//!         Ok(prompt.to_uppercase())
//!     }
//!
//!     fn model_name(&self) -> &str {
//!         "echo"
//!     }
//! }
//!
//! # #[tokio::main]
//! # async fn main() {
//! let client = BlockingClient::new(Echo, WorkerPool::new(2));
//! let reply = client.send_message(&[Message::user("hi")], None).await.unwrap();
//! assert_eq!(&*reply.content, "HI");
//! # }
//! ```

use crate::agentrelay::client_wrapper::{ClientWrapper, ImageRef, Message, Role};
use crate::agentrelay::worker_pool::WorkerPool;
use async_trait::async_trait;
use std::error::Error;
use std::sync::Arc;

/// A synchronous `invoke(prompt, image?) -> text` model call.
pub trait BlockingInvoker: Send + Sync + 'static {
    fn invoke(
        &self,
        prompt: &str,
        image: Option<&ImageRef>,
    ) -> Result<String, Box<dyn Error + Send + Sync>>;

    fn model_name(&self) -> &str;

    fn supports_images(&self) -> bool {
        false
    }
}

/// [`ClientWrapper`] over a [`BlockingInvoker`], executed on a bounded [`WorkerPool`].
pub struct BlockingClient<I: BlockingInvoker> {
    invoker: Arc<I>,
    pool: WorkerPool,
}

impl<I: BlockingInvoker> BlockingClient<I> {
    pub fn new(invoker: I, pool: WorkerPool) -> Self {
        Self {
            invoker: Arc::new(invoker),
            pool,
        }
    }
}

/// Flatten a message list into the single prompt a blocking `invoke` accepts.
///
/// A lone user message is passed through untouched; longer histories are labelled by role.
fn flatten_prompt(messages: &[Message]) -> String {
    if let [only] = messages {
        if only.role == Role::User {
            return only.content.to_string();
        }
    }
    messages
        .iter()
        .map(|m| {
            let label = match m.role {
                Role::System => "System",
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            format!("{}: {}", label, m.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl<I: BlockingInvoker> ClientWrapper for BlockingClient<I> {
    async fn send_message(
        &self,
        messages: &[Message],
        image: Option<&ImageRef>,
    ) -> Result<Message, Box<dyn Error + Send + Sync>> {
        let prompt = flatten_prompt(messages);
        let image = image.cloned();
        let invoker = Arc::clone(&self.invoker);

        let text = self
            .pool
            .run(move || invoker.invoke(&prompt, image.as_ref()))
            .await??;

        Ok(Message::assistant(text))
    }

    fn model_name(&self) -> &str {
        self.invoker.model_name()
    }

    fn supports_images(&self) -> bool {
        self.invoker.supports_images()
    }
}
