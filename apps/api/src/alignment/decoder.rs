//! Resilient decoding of raw model output.
//!
//! Models occasionally wrap valid JSON in commentary or markdown fences even with a
//! response schema set. Recovery is best effort: whole text first, then the span from the
//! first `{` to the last `}`.

use serde_json::Value;
use tracing::{debug, warn};

use crate::alignment::error::DecodeError;

/// Parses raw model text as JSON, falling back to the outermost-brace span.
///
/// On failure the error carries the original (whole-text) parse error and a prefix of
/// the raw text.
pub fn decode_model_output(raw: &str) -> Result<Value, DecodeError> {
    let first_error = match serde_json::from_str::<Value>(raw) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    warn!(
        "Model output is not bare JSON ({first_error}); raw length {}",
        raw.len()
    );

    if let Some(candidate) = outermost_braces(raw) {
        if let Ok(value) = serde_json::from_str::<Value>(candidate) {
            debug!("Recovered JSON object from surrounding text");
            return Ok(value);
        }
    }

    Err(DecodeError::new(&first_error, raw))
}

/// Returns the greedy `{ ... }` span: first opening brace through last closing brace.
fn outermost_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
