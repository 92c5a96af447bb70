//! IdentityVerifier trait definition.

use palaver_types::error::IdentityError;
use palaver_types::identity::{IdentityProviderKind, VerifiedIdentity};

/// Validates an opaque bearer token issued by an external identity provider.
///
/// Verification is pure: no user records are created or touched. Every
/// token defect (bad signature, issuer, audience, expiry, malformed input)
/// is reported as `IdentityError::InvalidCredential`.
///
/// Implementations live in palaver-infra (e.g., `JwksIdentityVerifier`).
pub trait IdentityVerifier: Send + Sync {
    /// Which provider this verifier accepts tokens from.
    fn provider(&self) -> IdentityProviderKind;

    /// Verify a token and extract the caller's identity.
    fn verify(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<VerifiedIdentity, IdentityError>> + Send;
}
