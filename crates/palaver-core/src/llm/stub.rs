//! Deterministic offline provider.
//!
//! Used whenever no provider credential is configured, so the server runs
//! locally and in tests without network access. The reply embeds the latest
//! user message verbatim and is byte-identical for identical input.

use palaver_types::llm::{GenerationRequest, LlmError};

use super::provider::LlmProvider;

/// Label that opens every stub reply.
pub const STUB_LABEL: &str = "[Stub Response]";

/// Offline provider producing a fixed-shape reply.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubProvider;

impl StubProvider {
    pub fn new() -> Self {
        Self
    }

    /// Render the stub reply for a given latest user message.
    pub fn render(latest_user_message: &str) -> String {
        format!(
            "{STUB_LABEL}\n\n{latest_user_message}\n\n- Focus on fundamentals.\n- Practice daily.\n- Review mistakes."
        )
    }
}

impl LlmProvider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        Ok(Self::render(request.latest_user_message().unwrap_or("")))
    }
}
