//! Identity provider token verification.
//!
//! [`verifier_registry`] builds the set of enabled verifiers from
//! configuration: a provider is enabled exactly when its client or project id
//! is set.

pub mod jwks;

use palaver_core::identity::box_verifier::BoxIdentityVerifier;
use palaver_core::identity::registry::VerifierRegistry;
use palaver_types::config::IdentityConfig;

use self::jwks::JwksIdentityVerifier;

/// Registry holding a verifier for every configured identity provider.
pub fn verifier_registry(config: &IdentityConfig) -> VerifierRegistry {
    let mut registry = VerifierRegistry::new();

    if let Some(client_id) = non_blank(config.google_client_id.as_deref()) {
        registry.register(BoxIdentityVerifier::new(JwksIdentityVerifier::google(client_id)));
    }
    if let Some(project_id) = non_blank(config.firebase_project_id.as_deref()) {
        registry.register(BoxIdentityVerifier::new(JwksIdentityVerifier::firebase(
            project_id,
        )));
    }

    registry
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
