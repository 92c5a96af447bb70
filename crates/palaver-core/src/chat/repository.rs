//! ChatRepository trait definition.
//!
//! Provides owner-scoped CRUD for chats and append/list for messages.
//! Follows the same RPITIT pattern as UserRepository.

use palaver_types::chat::{Chat, ChatMessage, ChatSummary};
use palaver_types::error::RepositoryError;
use palaver_types::user::UserId;
use uuid::Uuid;

/// Repository trait for chat and message persistence.
///
/// Every method taking an `owner` must apply the owner filter in the
/// storage query itself, never by filtering results in memory.
pub trait ChatRepository: Send + Sync {
    /// Create a new chat.
    fn create_chat(
        &self,
        chat: &Chat,
    ) -> impl std::future::Future<Output = Result<Chat, RepositoryError>> + Send;

    /// Get a chat if it exists and belongs to `owner`.
    fn get_chat_for_owner(
        &self,
        chat_id: &Uuid,
        owner: &UserId,
    ) -> impl std::future::Future<Output = Result<Option<Chat>, RepositoryError>> + Send;

    /// List the owner's chats, most recently updated first.
    fn list_chats_for_owner(
        &self,
        owner: &UserId,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSummary>, RepositoryError>> + Send;

    /// Persist `title` and `updated_at` of a chat, scoped to
    /// `chat.owner_user_id`. Returns `NotFound` if no owned row matched.
    fn update_chat(
        &self,
        chat: &Chat,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete an owned chat and all of its messages. Returns `NotFound` if
    /// no owned row matched.
    fn delete_chat(
        &self,
        chat_id: &Uuid,
        owner: &UserId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Append a message to a chat.
    fn append_message(
        &self,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Messages of a chat, ordered by created_at ASC (then id).
    fn list_messages(
        &self,
        chat_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// Number of messages stored for a chat id (including orphans, if any).
    fn count_messages(
        &self,
        chat_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<u32, RepositoryError>> + Send;
}
