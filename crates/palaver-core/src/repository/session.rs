//! Session repository trait definition.

use palaver_types::error::RepositoryError;
use palaver_types::session::Session;
use uuid::Uuid;

/// Repository trait for login session persistence.
pub trait SessionRepository: Send + Sync {
    /// Store a new session.
    fn create_session(
        &self,
        session: &Session,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Find a session by the keyed hash of its token.
    fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl std::future::Future<Output = Result<Option<Session>, RepositoryError>> + Send;

    /// Delete a session. Deleting an absent session is not an error.
    fn delete_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
