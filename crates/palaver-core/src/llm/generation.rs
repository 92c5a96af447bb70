//! Generation client: the boundary between the chat turn and the provider.
//!
//! `GenerationClient::generate` never returns an error. Provider failures
//! and timeouts become reply text so the turn can still persist its model
//! message and the transcript shows what happened.

use std::time::{Duration, Instant};

use palaver_types::llm::{GenerationRequest, LlmError};
use tracing::Instrument;

use super::box_provider::BoxLlmProvider;
use super::stub::StubProvider;

/// Prefix of the reply text recorded when generation fails.
pub const GENERATION_ERROR_PREFIX: &str = "Error generating AI response:";

/// Outcome of one generation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutcome {
    /// Text to persist as the model message.
    pub content: String,
    /// True when `content` is an error report rather than a model reply.
    pub failed: bool,
}

/// Timeout-bounded wrapper around the configured provider.
pub struct GenerationClient {
    provider: BoxLlmProvider,
    timeout: Duration,
    enabled: bool,
}

impl GenerationClient {
    /// Wrap a real provider. `enabled()` reports true.
    pub fn new(provider: BoxLlmProvider, timeout: Duration) -> Self {
        Self {
            provider,
            timeout,
            enabled: true,
        }
    }

    /// Client backed by the deterministic stub. `enabled()` reports false.
    pub fn stub() -> Self {
        Self {
            provider: BoxLlmProvider::new(StubProvider::new()),
            timeout: Duration::from_secs(60),
            enabled: false,
        }
    }

    /// Whether a real provider (not the stub) is configured.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Run the provider, converting failure and timeout into reply text.
    pub async fn generate(&self, request: &GenerationRequest) -> GenerationOutcome {
        let span = tracing::info_span!(
            "generate",
            gen_ai.operation.name = "chat",
            gen_ai.provider.name = %self.provider.name(),
            turns = request.turns.len(),
        );

        async {
            let start = Instant::now();
            let result = match tokio::time::timeout(self.timeout, self.provider.complete(request))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(LlmError::Timeout(self.timeout)),
            };
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match result {
                Ok(content) => {
                    tracing::debug!(elapsed_ms, "generation completed");
                    GenerationOutcome {
                        content,
                        failed: false,
                    }
                }
                Err(e) => {
                    tracing::warn!(elapsed_ms, error = %e, "generation failed");
                    GenerationOutcome {
                        content: format!("{GENERATION_ERROR_PREFIX} {e}"),
                        failed: true,
                    }
                }
            }
        }
        .instrument(span)
        .await
    }
}
