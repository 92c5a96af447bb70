//! SQLite login session repository implementation.

use palaver_core::repository::session::SessionRepository;
use palaver_types::error::RepositoryError;
use palaver_types::session::Session;
use palaver_types::user::UserId;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, map_sqlx_error, parse_datetime};

/// SQLite-backed implementation of `SessionRepository`.
pub struct SqliteSessionRepository {
    pool: DatabasePool,
}

impl SqliteSessionRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Remove every session whose expiry has passed. Returns the number of
    /// rows deleted.
    pub async fn purge_expired(&self) -> Result<u64, RepositoryError> {
        let now = format_datetime(&chrono::Utc::now());
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected())
    }
}

fn session_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Session, RepositoryError> {
    let get = |col: &str| -> Result<String, RepositoryError> {
        row.try_get(col)
            .map_err(|e| RepositoryError::Query(e.to_string()))
    };

    let id = Uuid::parse_str(&get("id")?)
        .map_err(|e| RepositoryError::Query(format!("invalid session id: {e}")))?;
    let user_id: UserId = get("user_id")?
        .parse()
        .map_err(|e| RepositoryError::Query(format!("invalid user_id: {e}")))?;

    Ok(Session {
        id,
        token_hash: get("token_hash")?,
        user_id,
        created_at: parse_datetime(&get("created_at")?)?,
        expires_at: parse_datetime(&get("expires_at")?)?,
    })
}

impl SessionRepository for SqliteSessionRepository {
    async fn create_session(&self, session: &Session) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO sessions (id, token_hash, user_id, created_at, expires_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(session.id.to_string())
        .bind(&session.token_hash)
        .bind(session.user_id.to_string())
        .bind(format_datetime(&session.created_at))
        .bind(format_datetime(&session.expires_at))
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<Session>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(map_sqlx_error)?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn delete_session(&self, session_id: &Uuid) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(session_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }
}
