//! User repository trait definition.

use palaver_types::error::RepositoryError;
use palaver_types::user::{User, UserId};

/// Repository trait for user persistence.
///
/// Implementations live in palaver-infra (e.g., SqliteUserRepository).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait UserRepository: Send + Sync {
    /// Look up a user by the identity provider's subject id.
    fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Get a user by its unique ID.
    fn get_user(
        &self,
        id: &UserId,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Create a new user. Returns `RepositoryError::Conflict` if the
    /// external id is already taken.
    fn create_user(
        &self,
        user: &User,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;
}
