//! Verifier registry for runtime provider lookup.

use std::collections::HashMap;

use palaver_types::identity::IdentityProviderKind;

use super::box_verifier::BoxIdentityVerifier;

/// Registry of configured identity verifiers, indexed by provider.
///
/// A provider without a registered verifier is disabled.
pub struct VerifierRegistry {
    verifiers: HashMap<IdentityProviderKind, BoxIdentityVerifier>,
}

impl VerifierRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            verifiers: HashMap::new(),
        }
    }

    /// Register a verifier under its own provider kind, replacing any
    /// previous one.
    pub fn register(&mut self, verifier: BoxIdentityVerifier) {
        self.verifiers.insert(verifier.provider(), verifier);
    }

    /// Look up the verifier for a provider.
    pub fn get(&self, provider: IdentityProviderKind) -> Option<&BoxIdentityVerifier> {
        self.verifiers.get(&provider)
    }

    /// Whether a verifier is registered for the provider.
    pub fn is_enabled(&self, provider: IdentityProviderKind) -> bool {
        self.verifiers.contains_key(&provider)
    }
}

impl Default for VerifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}
