/// LLM Client: the single point of entry for all generative-model calls.
///
/// No other module talks to the provider directly. The pipeline sees only the
/// `GenerationClient` trait; `GeminiClient` is the production implementation.
///
/// Model and temperature are hardcoded so every execution context behaves identically.
/// This client never retries: retry policy lives in `alignment::retry`.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

#[cfg(test)]
pub mod scripted;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
/// The model used for every alignment call.
pub const MODEL: &str = "gemini-1.5-flash";
pub const TEMPERATURE: f32 = 0.7;
const RESPONSE_MIME_TYPE: &str = "application/json";

/// Classified failure of a single generation call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("Provider API key is not configured")]
    MissingCredential,

    #[error("Provider rejected credential (status {status}): {message}")]
    Auth { status: u16, message: String },

    #[error("Provider rate limit (status {status}): {message}")]
    RateLimit { status: u16, message: String },

    #[error("Provider call failed: {0}")]
    Transient(String),
}

/// Seam between the pipeline and the generative-model provider.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Submits `prompt` with a JSON response `schema` and returns the raw response text.
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<String, GenerationError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
    response_schema: &'a Value,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    details: Vec<ProviderErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    reason: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// Gemini `generateContent` client. Credential and endpoint are fixed at construction.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    api_base: String,
}

impl GeminiClient {
    /// `attempt_timeout` bounds each HTTP round trip; a timeout is a transient failure.
    pub fn new(
        api_key: Option<String>,
        api_base: impl Into<String>,
        attempt_timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(attempt_timeout)
            .build()
            .map_err(|e| GenerationError::Transient(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{MODEL}:generateContent", self.api_base)
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GenerationError::MissingCredential)?;

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: RESPONSE_MIME_TYPE,
                response_schema: schema,
                temperature: TEMPERATURE,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Gemini API returned {}: {}", status, body);
            return Err(classify_provider_error(status, &body));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Transient(format!("Unreadable provider response: {e}")))?;

        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "Gemini call succeeded: prompt_tokens={}, output_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        parsed.text().ok_or_else(|| {
            let reason = parsed
                .candidates
                .first()
                .and_then(|c| c.finish_reason.clone())
                .unwrap_or_else(|| "no candidates".to_string());
            GenerationError::Transient(format!("Provider returned empty content ({reason})"))
        })
    }
}

/// Maps a non-success provider response to an error kind using the HTTP status and the
/// structured error body, never free-text matching.
pub fn classify_provider_error(status: StatusCode, body: &str) -> GenerationError {
    let parsed = serde_json::from_str::<ProviderError>(body).ok().map(|e| e.error);
    let code = status.as_u16();

    let (message, provider_status, key_invalid) = match &parsed {
        Some(err) => (
            err.message.clone(),
            err.status.as_str(),
            err.details
                .iter()
                .any(|d| d.reason.as_deref() == Some("API_KEY_INVALID")),
        ),
        None => (body.to_string(), "", false),
    };

    if status == StatusCode::TOO_MANY_REQUESTS || provider_status == "RESOURCE_EXHAUSTED" {
        return GenerationError::RateLimit {
            status: code,
            message,
        };
    }

    if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || matches!(provider_status, "UNAUTHENTICATED" | "PERMISSION_DENIED")
        || key_invalid
    {
        return GenerationError::Auth {
            status: code,
            message,
        };
    }

    GenerationError::Transient(format!("status {code}: {message}"))
}
