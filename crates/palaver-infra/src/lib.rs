//! Infrastructure layer for Palaver.
//!
//! Contains implementations of the ports defined in `palaver-core`: SQLite
//! storage, JWKS-backed identity verification, the Gemini provider, and
//! session token hashing.

pub mod crypto;
pub mod identity;
pub mod llm;
pub mod sqlite;
