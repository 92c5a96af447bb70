//! Text-generation provider implementations.
//!
//! Contains [`GeminiProvider`](gemini::GeminiProvider), the concrete
//! [`LlmProvider`](palaver_core::llm::provider::LlmProvider) for Google
//! Gemini, and [`generation_client`], which picks Gemini or the offline stub
//! from configuration.

pub mod gemini;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use palaver_core::llm::box_provider::BoxLlmProvider;
use palaver_core::llm::generation::GenerationClient;
use palaver_types::config::GenerationConfig;

use self::gemini::GeminiProvider;

/// Build the generation client: Gemini when an API key is configured,
/// otherwise the deterministic stub.
pub fn generation_client(config: &GenerationConfig) -> GenerationClient {
    match config
        .api_key
        .as_ref()
        .filter(|k| !k.expose_secret().trim().is_empty())
    {
        Some(key) => {
            let key = SecretString::from(key.expose_secret().to_string());
            let provider = GeminiProvider::new(key, config.model_name.clone());
            GenerationClient::new(
                BoxLlmProvider::new(provider),
                Duration::from_secs(config.timeout_secs),
            )
        }
        None => GenerationClient::stub(),
    }
}
