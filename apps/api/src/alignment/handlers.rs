//! Axum route handlers for the Alignment API.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::alignment::error::AlignmentError;
use crate::alignment::history::{HistoryRecord, HISTORY_PREFIX};
use crate::alignment::models::{
    resolve_resume_text, AlignedResumeResult, AlignmentRequest, ResumeFields,
    DEFAULT_ALIGNMENT_LEVEL, MAX_ALIGNMENT_LEVEL,
};
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Body of `POST /align`. Every field is optional at the wire level so that missing
/// inputs produce our own 400 instead of an extractor rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignBody {
    pub resume_text: Option<String>,
    pub job_description: Option<String>,
    pub alignment_level: Option<i64>,
    pub template_style: Option<String>,
    pub resume_fields: Option<ResumeFields>,
}

impl AlignBody {
    pub fn into_request(self) -> Result<AlignmentRequest, AlignmentError> {
        let level = match self.alignment_level {
            None => DEFAULT_ALIGNMENT_LEVEL,
            Some(level) => u8::try_from(level)
                .ok()
                .filter(|l| *l <= MAX_ALIGNMENT_LEVEL)
                .ok_or_else(|| {
                    AlignmentError::Validation(format!(
                        "alignmentLevel must be between 0 and {MAX_ALIGNMENT_LEVEL}"
                    ))
                })?,
        };

        Ok(AlignmentRequest {
            resume_text: resolve_resume_text(
                self.resume_text.as_deref(),
                self.resume_fields.as_ref(),
            ),
            job_description: self.job_description.unwrap_or_default(),
            alignment_level: level,
            template_style: self.template_style,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryRecord>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /align
///
/// Runs the alignment pipeline and returns the aligned result as-is.
pub async fn handle_align(
    State(state): State<AppState>,
    payload: Result<Json<AlignBody>, JsonRejection>,
) -> Result<Json<AlignedResumeResult>, AppError> {
    let Json(body) = payload?;
    let request = body.into_request()?;

    let outcome = state.pipeline.align(&request).await?;

    Ok(Json(outcome.result))
}

/// GET /history
///
/// Lists every stored alignment, oldest first. No pagination.
pub async fn handle_history(
    State(state): State<AppState>,
) -> Result<Json<HistoryResponse>, AppError> {
    let history = state.history.list_by_prefix(HISTORY_PREFIX).await?;
    Ok(Json(HistoryResponse { history }))
}
