//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `palaver-core` using sqlx with split
//! read/write pools. Every owner-scoped statement carries the owner in its
//! WHERE clause.

use palaver_core::chat::repository::ChatRepository;
use palaver_types::chat::{Chat, ChatMessage, ChatSummary, MessageRole};
use palaver_types::error::RepositoryError;
use palaver_types::user::UserId;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, map_sqlx_error, parse_datetime};

/// SQLite-backed implementation of `ChatRepository`.
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row types for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ChatRow {
    id: String,
    owner_user_id: String,
    title: String,
    created_at: String,
    updated_at: String,
}

impl ChatRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_user_id: row.try_get("owner_user_id")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_chat(self) -> Result<Chat, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid chat id: {e}")))?;
        let owner_user_id: UserId = self
            .owner_user_id
            .parse()
            .map_err(|e| RepositoryError::Query(format!("invalid owner_user_id: {e}")))?;

        Ok(Chat {
            id,
            owner_user_id,
            title: self.title,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

struct MessageRow {
    id: String,
    chat_id: String,
    role: String,
    content: String,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            chat_id: row.try_get("chat_id")?,
            role: row.try_get("role")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?;
        let chat_id = Uuid::parse_str(&self.chat_id)
            .map_err(|e| RepositoryError::Query(format!("invalid chat_id: {e}")))?;
        let role: MessageRole = self
            .role
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(ChatMessage {
            id,
            chat_id,
            role,
            content: self.content,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn row_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(e.to_string())
}

// ---------------------------------------------------------------------------
// ChatRepository implementation
// ---------------------------------------------------------------------------

impl ChatRepository for SqliteChatRepository {
    async fn create_chat(&self, chat: &Chat) -> Result<Chat, RepositoryError> {
        sqlx::query(
            r#"INSERT INTO chats (id, owner_user_id, title, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(chat.id.to_string())
        .bind(chat.owner_user_id.to_string())
        .bind(&chat.title)
        .bind(format_datetime(&chat.created_at))
        .bind(format_datetime(&chat.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_error)?;

        Ok(chat.clone())
    }

    async fn get_chat_for_owner(
        &self,
        chat_id: &Uuid,
        owner: &UserId,
    ) -> Result<Option<Chat>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chats WHERE id = ? AND owner_user_id = ?")
            .bind(chat_id.to_string())
            .bind(owner.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => Ok(Some(ChatRow::from_row(&row).map_err(row_err)?.into_chat()?)),
            None => Ok(None),
        }
    }

    async fn list_chats_for_owner(&self, owner: &UserId) -> Result<Vec<ChatSummary>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT c.*,
                      (SELECT COUNT(*) FROM messages m WHERE m.chat_id = c.id) AS message_count
               FROM chats c
               WHERE c.owner_user_id = ?
               ORDER BY c.updated_at DESC, c.id DESC"#,
        )
        .bind(owner.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(map_sqlx_error)?;

        let mut chats = Vec::with_capacity(rows.len());
        for row in &rows {
            let message_count: i64 = row.try_get("message_count").map_err(row_err)?;
            let chat = ChatRow::from_row(row).map_err(row_err)?.into_chat()?;
            chats.push(ChatSummary {
                chat,
                message_count: message_count as u32,
            });
        }

        Ok(chats)
    }

    async fn update_chat(&self, chat: &Chat) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE chats SET title = ?, updated_at = ? WHERE id = ? AND owner_user_id = ?",
        )
        .bind(&chat.title)
        .bind(format_datetime(&chat.updated_at))
        .bind(chat.id.to_string())
        .bind(chat.owner_user_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete_chat(&self, chat_id: &Uuid, owner: &UserId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.writer.begin().await.map_err(map_sqlx_error)?;

        // Messages first, in the same transaction, so no orphan survives even
        // on a connection without foreign key enforcement.
        sqlx::query(
            r#"DELETE FROM messages
               WHERE chat_id IN (SELECT id FROM chats WHERE id = ? AND owner_user_id = ?)"#,
        )
        .bind(chat_id.to_string())
        .bind(owner.to_string())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let result = sqlx::query("DELETE FROM chats WHERE id = ? AND owner_user_id = ?")
            .bind(chat_id.to_string())
            .bind(owner.to_string())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(map_sqlx_error)?;
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn append_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO messages (id, chat_id, role, content, created_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(message.id.to_string())
        .bind(message.chat_id.to_string())
        .bind(message.role.to_string())
        .bind(&message.content)
        .bind(format_datetime(&message.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn list_messages(&self, chat_id: &Uuid) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM messages WHERE chat_id = ? ORDER BY created_at ASC, id ASC")
            .bind(chat_id.to_string())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(map_sqlx_error)?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            messages.push(MessageRow::from_row(row).map_err(row_err)?.into_message()?);
        }

        Ok(messages)
    }

    async fn count_messages(&self, chat_id: &Uuid) -> Result<u32, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM messages WHERE chat_id = ?")
            .bind(chat_id.to_string())
            .fetch_one(&self.pool.reader)
            .await
            .map_err(map_sqlx_error)?;

        let count: i64 = row.try_get("cnt").map_err(row_err)?;
        Ok(count as u32)
    }
}
