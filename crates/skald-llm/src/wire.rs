//! Chat-completion request and response bodies, and reply parsing.

use serde::{Deserialize, Serialize};
use skald_core::service::{ReasoningResponse, ServiceError};

/// Body of a `POST /chat/completions` request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    /// Model name, e.g. `gpt-4o-mini`.
    pub model: String,
    /// The conversation, system prompt first.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: f32,
}

/// One message of a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system`, `user` or `assistant`.
    pub role: String,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// A system instruction.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_owned(),
            content: content.into(),
        }
    }

    /// A user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_owned(),
            content: content.into(),
        }
    }
}

/// Body of a chat-completion response. Fields the client does not use are
/// ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    /// Completions in the order the service ranked them.
    pub choices: Vec<Choice>,
}

/// One completion.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    /// The assistant's reply.
    pub message: ChatMessage,
}

impl ChatCompletionResponse {
    /// Content of the first choice.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Malformed` when the response has no choices.
    pub fn into_content(self) -> Result<String, ServiceError> {
        self.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ServiceError::Malformed("response has no choices".to_owned()))
    }
}

#[derive(Deserialize)]
struct ChoiceReply {
    chosen_action: String,
    #[serde(default, alias = "rationale_text")]
    rationale: String,
}

/// Parses the model's choice from `content`.
///
/// Models often wrap JSON in a markdown fence or surround it with chatter, so
/// the outermost `{ ... }` span is extracted before parsing.
///
/// # Errors
///
/// Returns `ServiceError::Malformed` when no JSON object with a non-empty
/// `chosen_action` can be found.
pub fn parse_choice(content: &str) -> Result<ReasoningResponse, ServiceError> {
    let json = extract_object(content)
        .ok_or_else(|| ServiceError::Malformed("reply contains no JSON object".to_owned()))?;
    let reply: ChoiceReply =
        serde_json::from_str(json).map_err(|e| ServiceError::Malformed(e.to_string()))?;
    let chosen_action = reply.chosen_action.trim().to_owned();
    if chosen_action.is_empty() {
        return Err(ServiceError::Malformed("chosen_action is empty".to_owned()));
    }
    Ok(ReasoningResponse {
        chosen_action,
        rationale_text: reply.rationale.trim().to_owned(),
    })
}

fn extract_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (start < end).then(|| &content[start..=end])
}
