//! GeminiProvider -- concrete [`LlmProvider`] implementation for Google Gemini.
//!
//! The whole transcript is sent as a single user content part; Gemini sees
//! the same role-prefixed text the stub echoes.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and only exposed when
//! building the request header.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use palaver_core::llm::provider::LlmProvider;
use palaver_types::llm::{GenerationRequest, LlmError};

use super::types::{Content, GenerateContentRequest, GenerateContentResponse, Part};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Google Gemini provider.
///
/// Deliberately not `Debug`.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    /// Create a provider for `model` (e.g. "gemini-1.5-flash").
    ///
    /// The HTTP client carries its own timeout as a backstop; the generation
    /// client's timeout is normally the one that fires first.
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
        }
    }

    /// Override the base URL (useful for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn to_gemini_request(request: &GenerationRequest) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(request.transcript()),
                }],
            }],
        }
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&Self::to_gemini_request(request))
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                401 | 403 => LlmError::AuthenticationFailed,
                429 => LlmError::RateLimited,
                _ => LlmError::Provider {
                    message: format!("HTTP {status}: {error_body}"),
                },
            });
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            LlmError::Deserialization(format!("failed to parse response: {e}"))
        })?;

        if let Some(text) = body.text() {
            return Ok(text);
        }

        match body.prompt_feedback.and_then(|f| f.block_reason) {
            Some(reason) => Err(LlmError::Provider {
                message: format!("prompt blocked: {reason}"),
            }),
            None => Err(LlmError::EmptyResponse),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palaver_types::llm::Turn;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// One-shot HTTP server: answers the first request with `status` and
    /// `body`, and hands back the raw request text.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf);
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let content_length = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            let (k, v) = l.split_once(':')?;
                            k.eq_ignore_ascii_case("content-length")
                                .then(|| v.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if buf.len() >= head_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
        });

        (format!("http://{addr}"), rx)
    }

    fn provider(base_url: &str) -> GeminiProvider {
        GeminiProvider::new(SecretString::from("test-key-not-real"), "gemini-1.5-flash")
            .with_base_url(base_url)
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            turns: vec![Turn::user("Explain recursion")],
            context: None,
        }
    }

    #[test]
    fn test_provider_name_and_url() {
        let p = provider("https://example.test/");
        assert_eq!(p.name(), "gemini");
        assert_eq!(
            p.url(),
            "https://example.test/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[tokio::test]
    async fn test_complete_success() {
        let (base, rx) = serve_once(
            "200 OK",
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"A function calling itself."}]}}]}"#,
        )
        .await;

        let text = provider(&base).complete(&request()).await.unwrap();
        assert_eq!(text, "A function calling itself.");

        let raw = rx.await.unwrap();
        assert!(raw.starts_with("POST /v1beta/models/gemini-1.5-flash:generateContent"));
        assert!(raw.to_lowercase().contains("x-goog-api-key: test-key-not-real"));
        assert!(raw.contains("USER: Explain recursion"));
    }

    #[tokio::test]
    async fn test_complete_maps_http_errors() {
        let (base, _rx) = serve_once("429 Too Many Requests", r#"{"error":{}}"#).await;
        assert!(matches!(
            provider(&base).complete(&request()).await,
            Err(LlmError::RateLimited)
        ));

        let (base, _rx) = serve_once("403 Forbidden", r#"{"error":{}}"#).await;
        assert!(matches!(
            provider(&base).complete(&request()).await,
            Err(LlmError::AuthenticationFailed)
        ));

        let (base, _rx) = serve_once("500 Internal Server Error", "boom").await;
        match provider(&base).complete(&request()).await {
            Err(LlmError::Provider { message }) => assert!(message.contains("boom")),
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_empty_and_blocked() {
        let (base, _rx) = serve_once("200 OK", r#"{"candidates":[]}"#).await;
        assert!(matches!(
            provider(&base).complete(&request()).await,
            Err(LlmError::EmptyResponse)
        ));

        let (base, _rx) =
            serve_once("200 OK", r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).await;
        match provider(&base).complete(&request()).await {
            Err(LlmError::Provider { message }) => assert_eq!(message, "prompt blocked: SAFETY"),
            other => panic!("expected blocked error, got {other:?}"),
        }
    }
}
