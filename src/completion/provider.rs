//! Request and response shapes of the supported completion providers.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::types::{MessageRole, Turn};

use super::{CompletionError, CompletionResult};

const CHAT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const PROMPT_API_BASE_URL: &str = "https://api-inference.huggingface.co/models";

/// Payload shape spoken by the configured completion endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Provider {
    /// OpenAI-style chat completions: the whole window as role/content messages.
    #[default]
    #[strum(to_string = "chat", serialize = "openai")]
    Chat,
    /// Hugging Face style text generation: only the latest user message.
    #[strum(to_string = "prompt", serialize = "huggingface")]
    Prompt,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
}

#[derive(Debug, Serialize)]
struct PromptRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Generation {
    generated_text: String,
}

impl Provider {
    #[must_use]
    pub fn default_model(self) -> &'static str {
        match self {
            Provider::Chat => "gpt-3.5-turbo",
            Provider::Prompt => "gpt2",
        }
    }

    /// Endpoint used when none is configured explicitly.
    #[must_use]
    pub fn default_endpoint(self, model: &str) -> String {
        match self {
            Provider::Chat => CHAT_API_URL.to_string(),
            Provider::Prompt => format!("{PROMPT_API_BASE_URL}/{model}"),
        }
    }

    /// Serialize the window into this provider's request body.
    pub(crate) fn request_body(
        self,
        model: &str,
        window: &[Turn],
    ) -> Result<serde_json::Value, CompletionError> {
        let body = match self {
            Provider::Chat => serde_json::to_value(ChatRequest {
                model,
                messages: window,
            }),
            Provider::Prompt => {
                let latest = window
                    .iter()
                    .rev()
                    .find(|turn| turn.role() == MessageRole::User)
                    .ok_or_else(|| {
                        CompletionError::Response("No user message to send".to_string())
                    })?;
                serde_json::to_value(PromptRequest {
                    inputs: latest.content(),
                })
            }
        };
        body.map_err(|e| CompletionError::Response(format!("Failed to encode request: {e}")))
    }

    /// Pull the generated text out of a successful response body.
    pub(crate) fn extract_text(self, body: &str) -> CompletionResult {
        match self {
            Provider::Chat => {
                let response: ChatResponse = serde_json::from_str(body).map_err(|e| {
                    CompletionError::Response(format!("Malformed chat response: {e}"))
                })?;
                response
                    .choices
                    .into_iter()
                    .next()
                    .ok_or_else(|| CompletionError::Response("No choices in response".to_string()))?
                    .message
                    .content
                    .ok_or_else(|| CompletionError::Response("Choice has no content".to_string()))
            }
            Provider::Prompt => {
                let generations: Vec<Generation> = serde_json::from_str(body).map_err(|e| {
                    CompletionError::Response(format!("Malformed generation response: {e}"))
                })?;
                generations
                    .into_iter()
                    .next()
                    .map(|generation| generation.generated_text)
                    .ok_or_else(|| CompletionError::Response("No generations in response".to_string()))
            }
        }
    }
}
