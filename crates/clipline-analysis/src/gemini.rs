//! Gemini HTTP client.
//!
//! The analyzer sends one text prompt per job and expects a JSON object back.
//! Gemini responses are classified into the provider error taxonomy here, at
//! the boundary; nothing downstream ever sees a raw HTTP status.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use clipline_models::{ProviderError, ProviderResult};

use crate::prompt::{build_analysis_prompt, strip_code_fence};
use crate::provider::{AnalysisProvider, AnalyzeHints, CandidateSegment};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Models tried in order until one answers.
const MODEL_FALLBACK: &[&str] = &["gemini-2.5-flash", "gemini-2.5-flash-lite", "gemini-2.5-pro"];

/// Raw Gemini text-generation client.
///
/// Shared by the analysis provider and the subtitle transcriber.
#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: String,
}

impl GeminiClient {
    /// Create a client from the `GEMINI_API_KEY` env var.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| ProviderError::invalid_input("GEMINI_API_KEY not configured"))?;
        Self::new(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against an explicit endpoint (tests point this at a mock).
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| ProviderError::transient(format!("HTTP client build failed: {e}")))?;
        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            client,
        })
    }

    /// Send a prompt expecting a JSON text answer, trying each fallback model.
    pub async fn generate(&self, prompt: &str) -> ProviderResult<String> {
        let mut last_error = None;

        for model in MODEL_FALLBACK {
            match self.call_model(model, prompt).await {
                Ok(text) => {
                    info!(model, "Gemini call succeeded");
                    return Ok(text);
                }
                Err(e) => {
                    warn!(model, "Gemini call failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ProviderError::transient("no Gemini models configured")))
    }

    async fn call_model(&self, model: &str, prompt: &str) -> ProviderResult<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, &body));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::transient(format!("malformed Gemini response: {e}")))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| ProviderError::transient("empty Gemini response"))
    }
}

/// Classify a transport-level reqwest error.
fn classify_request_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() || e.is_connect() {
        ProviderError::transient(format!("Gemini request failed: {e}"))
    } else if e.is_body() || e.is_decode() {
        ProviderError::transient(format!("Gemini response unreadable: {e}"))
    } else {
        ProviderError::transient(format!("Gemini request error: {e}"))
    }
}

/// Classify an HTTP status into the provider taxonomy.
fn classify_status(status: StatusCode, body: &str) -> ProviderError {
    let lowered = body.to_lowercase();
    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            // 429 with a quota message means the budget is gone for good;
            // a plain 429 is rate limiting and worth retrying.
            if lowered.contains("quota") {
                ProviderError::quota_exceeded(format!("Gemini quota exhausted: {status}"))
            } else {
                ProviderError::transient(format!("Gemini rate limited: {status}"))
            }
        }
        StatusCode::FORBIDDEN => ProviderError::quota_exceeded(format!("Gemini refused: {status}")),
        s if s.is_client_error() => {
            ProviderError::invalid_input(format!("Gemini rejected request: {s}"))
        }
        s => ProviderError::transient(format!("Gemini server error: {s}")),
    }
}

/// Analysis provider backed by Gemini.
pub struct GeminiAnalyzer {
    client: GeminiClient,
}

/// Provider response shape.
#[derive(Debug, Deserialize)]
struct MomentsResponse {
    #[serde(default)]
    highlighted_moments: Vec<CandidateSegment>,
}

impl GeminiAnalyzer {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    pub fn from_env() -> ProviderResult<Self> {
        Ok(Self::new(GeminiClient::from_env()?))
    }

    /// Parse the provider's JSON answer, tolerating markdown fences.
    fn parse_moments(text: &str) -> ProviderResult<Vec<CandidateSegment>> {
        let cleaned = strip_code_fence(text);
        let parsed: MomentsResponse = serde_json::from_str(cleaned)
            .map_err(|e| ProviderError::transient(format!("unparseable moments JSON: {e}")))?;
        Ok(parsed.highlighted_moments)
    }
}

#[async_trait]
impl AnalysisProvider for GeminiAnalyzer {
    async fn analyze(
        &self,
        video: &Path,
        hints: &AnalyzeHints,
    ) -> ProviderResult<Vec<CandidateSegment>> {
        if !video.exists() {
            return Err(ProviderError::invalid_input(format!(
                "source video missing: {}",
                video.display()
            )));
        }

        let prompt = build_analysis_prompt(hints);
        let text = self.client.generate(&prompt).await?;
        Self::parse_moments(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gemini_body(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        })
    }

    #[test]
    fn test_parse_moments_with_fence() {
        let text = "```json\n{\"highlighted_moments\":[{\"start_time\":1.0,\"end_time\":9.0,\"title\":\"Hook\",\"score\":0.8,\"rationale\":\"strong open\"}]}\n```";
        let moments = GeminiAnalyzer::parse_moments(text).unwrap();
        assert_eq!(moments.len(), 1);
        assert_eq!(moments[0].title, "Hook");
    }

    #[test]
    fn test_parse_garbage_is_transient() {
        let err = GeminiAnalyzer::parse_moments("not json at all").unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_rate_limit_classified_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"/models/.*"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let client = GeminiClient::new("key", server.uri()).unwrap();
        let err = client.generate("hi").await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_quota_message_classified_quota() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"/models/.*"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded for project"))
            .mount(&server)
            .await;

        let client = GeminiClient::new("key", server.uri()).unwrap();
        let err = client.generate("hi").await.unwrap_err();
        assert!(matches!(err, ProviderError::QuotaExceeded(_)));
    }

    #[tokio::test]
    async fn test_bad_request_classified_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"/models/.*"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
            .mount(&server)
            .await;

        let client = GeminiClient::new("key", server.uri()).unwrap();
        let err = client.generate("hi").await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_successful_generation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path_regex(r"/models/.*"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(gemini_body("{\"ok\":true}")),
            )
            .mount(&server)
            .await;

        let client = GeminiClient::new("key", server.uri()).unwrap();
        assert_eq!(client.generate("hi").await.unwrap(), "{\"ok\":true}");
    }
}
