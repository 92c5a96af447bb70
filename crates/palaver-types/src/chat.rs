//! Chat and message types for Palaver.
//!
//! A chat is a conversation thread owned by exactly one user. Messages
//! belong to exactly one chat and alternate between the user and the model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::user::UserId;

/// Title given to chats created without one. Title derivation only ever
/// replaces this exact value.
pub const DEFAULT_CHAT_TITLE: &str = "New Chat";

/// Maximum number of characters kept when deriving a title from a message.
pub const DERIVED_TITLE_MAX_CHARS: usize = 50;

/// Author of a chat message.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (role IN ('user', 'model'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Model,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Model => write!(f, "model"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(MessageRole::User),
            "model" => Ok(MessageRole::Model),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A conversation thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: Uuid,
    pub owner_user_id: UserId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    /// Refreshed on every message append and title edit.
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    /// Whether the title is still the one assigned at creation.
    pub fn has_default_title(&self) -> bool {
        self.title == DEFAULT_CHAT_TITLE
    }
}

/// A chat as shown in listings, with its message count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSummary {
    #[serde(flatten)]
    pub chat: Chat,
    pub message_count: u32,
}

/// A chat together with its full transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatWithMessages {
    #[serde(flatten)]
    pub chat: Chat,
    pub messages: Vec<ChatMessage>,
}

/// A single immutable message within a chat.
///
/// Messages are ordered by `created_at` (then `id`) within a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub chat_id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Result of one completed chat turn: the persisted user message and the
/// persisted model reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub user_message: ChatMessage,
    pub ai_message: ChatMessage,
}
