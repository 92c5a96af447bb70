//! Cryptographic operations for Palaver.
//!
//! - `HmacSessionTokens`: CSPRNG session tokens, stored as HMAC-SHA256 digests

pub mod session_token;
