//! LlmProvider trait definition.
//!
//! This is the core abstraction that all text-generation providers implement.

use palaver_types::llm::{GenerationRequest, LlmError};

/// Trait for text-generation backends (Gemini, the offline stub, etc.).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in palaver-infra (e.g., `GeminiProvider`) or in
/// this crate when they need no IO (`StubProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "gemini", "stub").
    fn name(&self) -> &str;

    /// Generate the model's reply to the transcript in `request`.
    fn complete(
        &self,
        request: &GenerationRequest,
    ) -> impl std::future::Future<Output = Result<String, LlmError>> + Send;
}
