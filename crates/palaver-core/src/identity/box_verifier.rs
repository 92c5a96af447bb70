//! BoxIdentityVerifier -- object-safe dynamic dispatch wrapper for IdentityVerifier.
//!
//! 1. Define an object-safe `IdentityVerifierDyn` trait with boxed futures
//! 2. Blanket-impl `IdentityVerifierDyn` for all `T: IdentityVerifier`
//! 3. `BoxIdentityVerifier` wraps `Box<dyn IdentityVerifierDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use palaver_types::error::IdentityError;
use palaver_types::identity::{IdentityProviderKind, VerifiedIdentity};

use super::verifier::IdentityVerifier;

/// Object-safe version of [`IdentityVerifier`] with boxed futures.
pub trait IdentityVerifierDyn: Send + Sync {
    fn provider(&self) -> IdentityProviderKind;

    fn verify_boxed<'a>(
        &'a self,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<VerifiedIdentity, IdentityError>> + Send + 'a>>;
}

impl<T: IdentityVerifier> IdentityVerifierDyn for T {
    fn provider(&self) -> IdentityProviderKind {
        IdentityVerifier::provider(self)
    }

    fn verify_boxed<'a>(
        &'a self,
        token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<VerifiedIdentity, IdentityError>> + Send + 'a>> {
        Box::pin(self.verify(token))
    }
}

/// Type-erased identity verifier for runtime provider selection.
pub struct BoxIdentityVerifier {
    inner: Box<dyn IdentityVerifierDyn + Send + Sync>,
}

impl BoxIdentityVerifier {
    /// Wrap a concrete `IdentityVerifier` in a type-erased box.
    pub fn new<T: IdentityVerifier + 'static>(verifier: T) -> Self {
        Self {
            inner: Box::new(verifier),
        }
    }

    pub fn provider(&self) -> IdentityProviderKind {
        self.inner.provider()
    }

    pub async fn verify(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        self.inner.verify_boxed(token).await
    }
}
