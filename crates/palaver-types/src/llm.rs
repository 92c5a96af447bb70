//! Text generation request types for Palaver.

use serde::{Deserialize, Serialize};

use crate::chat::MessageRole;

/// One prior exchange entry handed to the generation provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: MessageRole,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Model,
            content: content.into(),
        }
    }
}

/// Request to a text-generation provider.
///
/// `turns` is the full ordered transcript, ending with the new user message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub turns: Vec<Turn>,
    /// Optional free-form context supplied by the client.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Map<String, serde_json::Value>>,
}

impl GenerationRequest {
    /// Content of the most recent user turn, if any.
    pub fn latest_user_message(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == MessageRole::User)
            .map(|t| t.content.as_str())
    }

    /// Render the transcript as role-prefixed lines (`USER: ...`, `MODEL: ...`),
    /// preceded by a `Context: {...}` line when context was supplied.
    pub fn transcript(&self) -> String {
        let mut parts = Vec::with_capacity(self.turns.len() + 1);
        if let Some(context) = self.context.as_ref().filter(|c| !c.is_empty()) {
            parts.push(format!(
                "Context: {}",
                serde_json::Value::Object(context.clone())
            ));
        }
        for turn in &self.turns {
            parts.push(format!(
                "{}: {}",
                turn.role.to_string().to_uppercase(),
                turn.content
            ));
        }
        parts.join("\n")
    }
}

/// Errors from text-generation provider operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("rate limited")]
    RateLimited,

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("provider returned no content")]
    EmptyResponse,

    #[error("generation timed out after {0:?}")]
    Timeout(std::time::Duration),
}
