//! Chat service: owner-scoped chat CRUD and the chat turn orchestrator.
//!
//! A turn moves through these stages:
//!
//! `received -> validated -> user_message_persisted -> generation_requested
//!  -> generation_completed | generation_failed -> model_message_persisted
//!  -> chat_metadata_updated -> committed`
//!
//! Validation (empty content, chat ownership) happens before anything is
//! written, so a rejected turn leaves no trace. Once the user message is
//! stored the turn always tries to store a model message as well; a
//! generation failure becomes the model message's text. Only a storage
//! failure can stop a turn after that point, and it is logged as a dangling
//! user message.

use palaver_types::chat::{
    Chat, ChatMessage, ChatSummary, ChatTurn, ChatWithMessages, DEFAULT_CHAT_TITLE, MessageRole,
};
use palaver_types::error::{ChatError, RepositoryError};
use palaver_types::llm::{GenerationRequest, Turn};
use palaver_types::time;
use palaver_types::user::UserId;
use tracing::{Instrument, debug, error, info};
use uuid::Uuid;

use crate::chat::repository::ChatRepository;
use crate::chat::title::derive_title;
use crate::llm::generation::GenerationClient;

/// Orchestrates chat lifecycle and chat turns.
///
/// Generic over `ChatRepository` to maintain clean architecture
/// (palaver-core never depends on palaver-infra).
pub struct ChatService<C: ChatRepository> {
    chat_repo: C,
    generation: GenerationClient,
}

impl<C: ChatRepository> ChatService<C> {
    /// Create a new chat service.
    pub fn new(chat_repo: C, generation: GenerationClient) -> Self {
        Self {
            chat_repo,
            generation,
        }
    }

    /// Access the generation client.
    pub fn generation(&self) -> &GenerationClient {
        &self.generation
    }

    // --- Chat CRUD ---

    /// List the owner's chats, most recently updated first.
    pub async fn list_chats(&self, owner: &UserId) -> Result<Vec<ChatSummary>, ChatError> {
        Ok(self.chat_repo.list_chats_for_owner(owner).await?)
    }

    /// Create an empty chat. A missing or blank title becomes "New Chat".
    pub async fn create_chat(
        &self,
        owner: &UserId,
        title: Option<String>,
    ) -> Result<Chat, ChatError> {
        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_CHAT_TITLE.to_string());

        let now = time::now();
        let chat = Chat {
            id: Uuid::now_v7(),
            owner_user_id: *owner,
            title,
            created_at: now,
            updated_at: now,
        };

        let chat = self.chat_repo.create_chat(&chat).await?;
        info!(chat_id = %chat.id, user_id = %owner, "Chat created");
        Ok(chat)
    }

    /// Get an owned chat with its transcript.
    pub async fn get_chat(
        &self,
        owner: &UserId,
        chat_id: &Uuid,
    ) -> Result<ChatWithMessages, ChatError> {
        let chat = self.owned_chat(owner, chat_id).await?;
        let messages = self.chat_repo.list_messages(chat_id).await?;
        Ok(ChatWithMessages { chat, messages })
    }

    /// Rename an owned chat. The title is trimmed and must not be blank.
    pub async fn update_chat_title(
        &self,
        owner: &UserId,
        chat_id: &Uuid,
        title: &str,
    ) -> Result<Chat, ChatError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ChatError::BadRequest("title cannot be empty".to_string()));
        }

        let mut chat = self.owned_chat(owner, chat_id).await?;
        chat.title = title.to_string();
        chat.updated_at = time::now();
        self.chat_repo.update_chat(&chat).await?;

        info!(chat_id = %chat_id, "Chat title updated");
        Ok(chat)
    }

    /// Delete an owned chat together with all of its messages.
    pub async fn delete_chat(&self, owner: &UserId, chat_id: &Uuid) -> Result<(), ChatError> {
        self.chat_repo.delete_chat(chat_id, owner).await?;
        info!(chat_id = %chat_id, user_id = %owner, "Chat deleted");
        Ok(())
    }

    // --- Chat turn ---

    /// Run one chat turn: persist the user's message, generate a reply,
    /// persist the reply, and update the chat's metadata.
    ///
    /// Returns exactly the two persisted messages. Fails with
    /// `EmptyMessage` or `NotFound` before any write, and with
    /// `StorageUnavailable` if the store fails mid-turn.
    pub async fn send_message(
        &self,
        owner: &UserId,
        chat_id: &Uuid,
        content: &str,
        context: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> Result<ChatTurn, ChatError> {
        let span = tracing::info_span!("chat_turn", chat_id = %chat_id, user_id = %owner);
        self.run_turn(owner, chat_id, content, context)
            .instrument(span)
            .await
    }

    async fn run_turn(
        &self,
        owner: &UserId,
        chat_id: &Uuid,
        content: &str,
        context: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> Result<ChatTurn, ChatError> {
        debug!(stage = "received");
        let content = content.trim();
        if content.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let mut chat = self.owned_chat(owner, chat_id).await?;
        let history = self.chat_repo.list_messages(chat_id).await?;
        debug!(stage = "validated", history_len = history.len());

        let user_message = new_message(*chat_id, MessageRole::User, content.to_string());
        self.chat_repo.append_message(&user_message).await?;
        debug!(stage = "user_message_persisted", message_id = %user_message.id);

        let mut turns: Vec<Turn> = history
            .iter()
            .map(|m| Turn {
                role: m.role,
                content: m.content.clone(),
            })
            .collect();
        turns.push(Turn::user(content));
        let request = GenerationRequest { turns, context };

        debug!(stage = "generation_requested");
        let outcome = self.generation.generate(&request).await;
        if outcome.failed {
            debug!(stage = "generation_failed");
        } else {
            debug!(stage = "generation_completed");
        }

        let ai_message = new_message(*chat_id, MessageRole::Model, outcome.content);
        self.chat_repo
            .append_message(&ai_message)
            .await
            .map_err(|e| dangling(&user_message, "model_message_persisted", e))?;
        debug!(stage = "model_message_persisted", message_id = %ai_message.id);

        chat.updated_at = time::now();
        if chat.has_default_title() && history.is_empty() {
            chat.title = derive_title(content);
        }
        self.chat_repo
            .update_chat(&chat)
            .await
            .map_err(|e| dangling(&user_message, "chat_metadata_updated", e))?;
        debug!(stage = "chat_metadata_updated", title = %chat.title);

        info!(
            stage = "committed",
            generation_failed = outcome.failed,
            "Chat turn committed"
        );

        Ok(ChatTurn {
            user_message,
            ai_message,
        })
    }

    async fn owned_chat(&self, owner: &UserId, chat_id: &Uuid) -> Result<Chat, ChatError> {
        self.chat_repo
            .get_chat_for_owner(chat_id, owner)
            .await?
            .ok_or(ChatError::NotFound)
    }
}

fn new_message(chat_id: Uuid, role: MessageRole, content: String) -> ChatMessage {
    ChatMessage {
        id: Uuid::now_v7(),
        chat_id,
        role,
        content,
        created_at: time::now(),
    }
}

/// Report a storage failure that happened after the user message was
/// stored. The user message is left without a reply.
fn dangling(user_message: &ChatMessage, stage: &str, e: RepositoryError) -> ChatError {
    error!(
        chat_id = %user_message.chat_id,
        user_message_id = %user_message.id,
        stage,
        error = %e,
        "Chat turn aborted after user message was persisted; transcript has a dangling user message"
    );
    ChatError::StorageUnavailable(e.to_string())
}
