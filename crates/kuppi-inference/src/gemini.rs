//! Gemini `generateContent` backend.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use kuppi_core::{defaults, Error, GenerationBackend, Result};

/// Generation slower than this is logged as a warning.
const SLOW_GENERATION_MS: u64 = 30_000;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// Google Gemini text generation over REST.
pub struct GeminiBackend {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    gen_timeout_secs: u64,
}

impl GeminiBackend {
    pub fn with_config(
        base_url: String,
        api_key: Option<String>,
        model: String,
        gen_timeout_secs: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(gen_timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "gemini",
            model = %model,
            configured = api_key.is_some(),
            "Initializing Gemini backend"
        );

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
            model,
            gen_timeout_secs,
        })
    }

    /// Create from `GEMINI_API_KEY`, `GEMINI_MODEL`, `GEMINI_BASE_URL` and
    /// `GEN_TIMEOUT_SECS`.
    ///
    /// A missing key is not an error here; generation calls fail instead.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| defaults::GEMINI_BASE_URL.to_string());
        let api_key = std::env::var("GEMINI_API_KEY").ok();
        let model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| defaults::GEN_MODEL.to_string());
        let gen_timeout_secs = std::env::var("GEN_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::GEN_TIMEOUT_SECS);

        Self::with_config(base_url, api_key, model, gen_timeout_secs)
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Inference("GEMINI_API_KEY is not configured".to_string()))?;
        let start = Instant::now();

        debug!(
            subsystem = "inference",
            component = "gemini",
            op = "generate",
            prompt_len = prompt.len(),
            "Starting generation"
        );

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", api_key)
            .timeout(Duration::from_secs(self.gen_timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "Gemini returned {}: {}",
                status, body
            )));
        }

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse response: {}", e)))?;

        let text: String = result
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .ok_or_else(|| Error::Inference("Gemini returned no candidates".to_string()))?;

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            subsystem = "inference",
            component = "gemini",
            op = "generate",
            response_len = text.len(),
            duration_ms = elapsed,
            "Generation complete"
        );
        if elapsed > SLOW_GENERATION_MS {
            warn!(
                duration_ms = elapsed,
                prompt_len = prompt.len(),
                slow = true,
                "Slow generation operation"
            );
        }
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: "hello" }],
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
    }

    #[test]
    fn test_response_parts_are_joined() {
        let parsed: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"foo "},{"text":"bar"}]}}]}"#,
        )
        .unwrap();
        let text: String = parsed.candidates[0]
            .content
            .as_ref()
            .unwrap()
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect();
        assert_eq!(text, "foo bar");
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let backend = GeminiBackend::with_config(
            "http://127.0.0.1:9".to_string(),
            None,
            "gemini-2.0-flash".to_string(),
            1,
        )
        .unwrap();
        assert!(!backend.is_configured());
        assert!(matches!(
            backend.generate("hi").await,
            Err(Error::Inference(msg)) if msg.contains("GEMINI_API_KEY")
        ));
    }

    #[test]
    fn test_empty_key_counts_as_missing() {
        let backend = GeminiBackend::with_config(
            "http://localhost/".to_string(),
            Some(String::new()),
            "m".to_string(),
            1,
        )
        .unwrap();
        assert!(!backend.is_configured());
        assert_eq!(backend.base_url, "http://localhost");
        assert_eq!(backend.model_name(), "m");
    }
}
