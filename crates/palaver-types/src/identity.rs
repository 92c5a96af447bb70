//! Identity provider types.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Identity providers whose tokens can bootstrap a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityProviderKind {
    /// Google Sign-In OAuth ID tokens.
    Google,
    /// Firebase Authentication ID tokens.
    Firebase,
}

impl fmt::Display for IdentityProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityProviderKind::Google => write!(f, "google"),
            IdentityProviderKind::Firebase => write!(f, "firebase"),
        }
    }
}

impl FromStr for IdentityProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "google" => Ok(IdentityProviderKind::Google),
            "firebase" => Ok(IdentityProviderKind::Firebase),
            other => Err(format!("unsupported identity provider: '{other}'")),
        }
    }
}

/// Claims extracted from a token that passed signature, issuer, audience,
/// and expiry checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub provider: IdentityProviderKind,
    /// The token's `sub` claim.
    pub external_id: String,
    pub email: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
}
