//! Google Gemini text-generation provider.
//!
//! [`GeminiProvider`] implements the
//! [`LlmProvider`](palaver_core::llm::provider::LlmProvider) trait against the
//! Generative Language API `generateContent` endpoint.

pub mod client;
pub mod types;

pub use client::GeminiProvider;
