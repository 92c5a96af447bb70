//! Business logic and repository trait definitions for Palaver.
//!
//! This crate defines the "ports" (repository, identity verifier, and LLM
//! provider traits) that the infrastructure layer implements, plus the
//! services built on them: login/session resolution and the chat turn
//! orchestrator. It depends only on `palaver-types` -- never on
//! `palaver-infra` or any database/IO crate.

pub mod auth;
pub mod chat;
pub mod identity;
pub mod llm;
pub mod repository;
