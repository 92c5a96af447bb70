//! Shared domain types for Palaver.
//!
//! This crate contains the core domain types used across the Palaver chat
//! backend: User, Chat, ChatMessage, verified identities, sessions, generation
//! requests, server configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror, secrecy.

pub mod chat;
pub mod config;
pub mod error;
pub mod identity;
pub mod llm;
pub mod session;
pub mod time;
pub mod user;
