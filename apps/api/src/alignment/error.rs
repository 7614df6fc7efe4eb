//! Error taxonomy for the alignment pipeline.
//!
//! Per-attempt failures (`AttemptError`) feed the retry coordinator; terminal failures
//! (`AlignmentError`) are what callers see. Every terminal failure maps to a stable code
//! and a short user-facing message, shared by the HTTP surface and the CLI.

use thiserror::Error;

use crate::llm_client::GenerationError;

/// Characters of raw model output kept for diagnostics.
pub const RAW_SNIPPET_CHARS: usize = 200;

/// The model output could not be read as JSON, even after brace extraction.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Failed to parse model response as JSON ({message}). Raw response: {snippet}...")]
pub struct DecodeError {
    pub message: String,
    pub snippet: String,
}

impl DecodeError {
    pub fn new(source: &serde_json::Error, raw: &str) -> Self {
        Self {
            message: source.to_string(),
            snippet: raw.chars().take(RAW_SNIPPET_CHARS).collect(),
        }
    }
}

/// The decoded JSON is structurally broken.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("Model response missing required field `{0}`")]
    MissingField(&'static str),

    #[error("Model response field `{field}` must be {expected}")]
    WrongKind {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Model response does not match the result contract: {0}")]
    Contract(String),
}

/// Why a single generate → decode → validate attempt failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttemptError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Terminal outcome of a failed alignment.
#[derive(Debug, Error)]
pub enum AlignmentError {
    /// Missing or out-of-range input. Never sent to the provider.
    #[error("{0}")]
    Validation(String),

    /// No provider credential configured.
    #[error("Provider API key is not configured")]
    Config,

    #[error("Provider rejected the API key: {message}")]
    AuthRejected { message: String },

    #[error("Provider rate limit persisted after {attempts} attempts")]
    RateLimited { attempts: u32 },

    #[error("Alignment failed after {attempts} attempts: {last}")]
    Failed { attempts: u32, last: AttemptError },
}

impl AlignmentError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            AlignmentError::Validation(_) => "VALIDATION_ERROR",
            AlignmentError::Config => "MISSING_API_KEY",
            AlignmentError::AuthRejected { .. } => "INVALID_KEY",
            AlignmentError::RateLimited { .. } => "RATE_LIMIT",
            AlignmentError::Failed { .. } => "INTERNAL_ERROR",
        }
    }

    /// Short human-readable message. Retry mechanics stay hidden.
    pub fn user_message(&self) -> String {
        match self {
            AlignmentError::Validation(msg) => msg.clone(),
            AlignmentError::Config => "Gemini API key not configured. \
                Please set the GEMINI_API_KEY environment variable."
                .to_string(),
            AlignmentError::AuthRejected { .. } => "Invalid Gemini API key. \
                Please check your API key at https://aistudio.google.com/app/apikey"
                .to_string(),
            AlignmentError::RateLimited { .. } => {
                "Gemini API rate limit reached. Please wait a moment and try again.".to_string()
            }
            AlignmentError::Failed { last, .. } => format!("Internal server error: {last}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_keeps_200_char_prefix() {
        let raw = "x".repeat(500);
        let source = serde_json::from_str::<serde_json::Value>(&raw).unwrap_err();
        let err = DecodeError::new(&source, &raw);
        assert_eq!(err.snippet.chars().count(), RAW_SNIPPET_CHARS);
        assert!(err.to_string().contains("Raw response: xxx"));
    }

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(AlignmentError::Validation("x".into()).code(), "VALIDATION_ERROR");
        assert_eq!(AlignmentError::Config.code(), "MISSING_API_KEY");
        assert_eq!(
            AlignmentError::AuthRejected { message: "bad".into() }.code(),
            "INVALID_KEY"
        );
        assert_eq!(AlignmentError::RateLimited { attempts: 3 }.code(), "RATE_LIMIT");
        assert_eq!(
            AlignmentError::Failed {
                attempts: 3,
                last: SchemaError::MissingField("matchedSkills").into(),
            }
            .code(),
            "INTERNAL_ERROR"
        );
    }

    #[test]
    fn test_failed_message_carries_last_diagnostic() {
        let err = AlignmentError::Failed {
            attempts: 3,
            last: SchemaError::MissingField("improvements").into(),
        };
        assert!(err.user_message().starts_with("Internal server error: "));
        assert!(err.user_message().contains("improvements"));
    }
}
