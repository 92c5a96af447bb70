//! Session token port.

/// Mints opaque session tokens and derives the keyed hash that is stored
/// in place of the token.
///
/// Implementations live in palaver-infra (e.g., `HmacSessionTokens`).
pub trait SessionTokens: Send + Sync {
    /// Generate a fresh, unguessable token.
    fn generate(&self) -> String;

    /// Keyed hash of a token (lowercase hex). Deterministic for a given key.
    fn hash(&self, token: &str) -> String;
}
