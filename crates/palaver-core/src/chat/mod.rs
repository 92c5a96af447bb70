//! Chats, messages, and the chat turn orchestrator.
//!
//! This module defines the `ChatRepository` trait that the infrastructure
//! layer implements, the title-derivation rule, and `ChatService`, which
//! runs owner-scoped chat CRUD and the send-message turn.

pub mod repository;
pub mod service;
pub mod title;
