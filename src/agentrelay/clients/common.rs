use crate::agentrelay::client_wrapper::{Message, Role, TokenUsage};
use openai_rust::chat;
use openai_rust2 as openai_rust;
use std::error::Error;
use tokio::sync::Mutex;

/// Convert crate messages into the format expected by openai_rust.
pub fn to_openai_messages(messages: &[Message]) -> Vec<chat::Message> {
    let mut formatted = Vec::with_capacity(messages.len());
    for msg in messages {
        formatted.push(chat::Message {
            role: match msg.role {
                Role::System => "system".to_owned(),
                Role::User => "user".to_owned(),
                Role::Assistant => "assistant".to_owned(),
            },
            content: msg.content.to_string(),
        });
    }
    formatted
}

/// Send a chat request, record its usage, and return the assistant’s content.
pub async fn send_and_track(
    api: &openai_rust::Client,
    model: &str,
    formatted_msgs: Vec<chat::Message>,
    url_path: Option<String>,
    usage_slot: &Mutex<Option<TokenUsage>>,
) -> Result<String, Box<dyn Error + Send + Sync>> {
    let chat_arguments = chat::ChatArguments::new(model, formatted_msgs);

    let response = api.create_chat(chat_arguments, url_path).await;

    match response {
        Ok(response) => {
            let usage = TokenUsage {
                input_tokens: response.usage.prompt_tokens as usize,
                output_tokens: response.usage.completion_tokens as usize,
                total_tokens: response.usage.total_tokens as usize,
            };

            // Store it for get_last_usage()
            *usage_slot.lock().await = Some(usage);

            match response.choices.first() {
                Some(choice) => Ok(choice.message.content.clone()),
                None => Err("OpenAI API returned no choices".into()),
            }
        }
        Err(err) => {
            log::error!(
                "agentrelay::clients::common::send_and_track(...): OpenAI API Error: {}",
                err
            );
            Err(err.to_string().into())
        }
    }
}

/// First `max_chars` characters of `text`, for log lines.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}
