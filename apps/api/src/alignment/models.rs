//! Alignment data contract: request inputs and the result shape shared with the model.
//!
//! The result types mirror the response schema in `alignment::schema` field for field.
//! `[INFERRED]` / `[ENHANCED]` markers inside text fields are carried verbatim.

use serde::{Deserialize, Serialize};

use crate::alignment::error::AlignmentError;

/// Alignment level used when a caller does not send one (the UI slider default).
pub const DEFAULT_ALIGNMENT_LEVEL: u8 = 50;
pub const MAX_ALIGNMENT_LEVEL: u8 = 100;

// ────────────────────────────────────────────────────────────────────────────
// Request
// ────────────────────────────────────────────────────────────────────────────

/// Input to the alignment pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentRequest {
    pub resume_text: String,
    pub job_description: String,
    /// 0 – 100
    pub alignment_level: u8,
    /// Display hint only. Rendered into the prompt, never changes the schema.
    pub template_style: Option<String>,
}

impl AlignmentRequest {
    pub fn new(
        resume_text: impl Into<String>,
        job_description: impl Into<String>,
        alignment_level: u8,
    ) -> Self {
        Self {
            resume_text: resume_text.into(),
            job_description: job_description.into(),
            alignment_level,
            template_style: None,
        }
    }

    pub fn with_template_style(mut self, style: impl Into<String>) -> Self {
        self.template_style = Some(style.into());
        self
    }

    /// Rejects requests that must never reach the provider.
    pub fn validate(&self) -> Result<(), AlignmentError> {
        if self.resume_text.trim().is_empty() || self.job_description.trim().is_empty() {
            return Err(AlignmentError::Validation(
                "Missing required fields: resumeText and jobDescription".to_string(),
            ));
        }
        if self.alignment_level > MAX_ALIGNMENT_LEVEL {
            return Err(AlignmentError::Validation(format!(
                "alignmentLevel must be between 0 and {MAX_ALIGNMENT_LEVEL}"
            )));
        }
        Ok(())
    }
}

/// Structured resume entry, used when the user fills in the form instead of pasting text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeFields {
    pub name: String,
    pub title: String,
    /// Experience bullets, newline separated.
    pub bullets: String,
    pub education: String,
}

impl ResumeFields {
    /// Flattens the form into the plain-text layout the prompt expects.
    /// Returns `None` when the form carries no name (treated as "not filled in").
    pub fn compose(&self) -> Option<String> {
        if self.name.trim().is_empty() {
            return None;
        }
        Some(format!(
            "{}\n{}\n\nExperience:\n{}\n\nEducation:\n{}",
            self.name, self.title, self.bullets, self.education
        ))
    }
}

/// Picks pasted text first, then the composed form.
pub fn resolve_resume_text(resume_text: Option<&str>, fields: Option<&ResumeFields>) -> String {
    match resume_text {
        Some(text) if !text.trim().is_empty() => text.to_string(),
        _ => fields.and_then(ResumeFields::compose).unwrap_or_default(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Result
// ────────────────────────────────────────────────────────────────────────────

/// The rewritten resume body. All five fields are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedResume {
    pub name: String,
    pub title: String,
    pub summary: String,
    pub experience: Vec<String>,
    pub education: String,
}

/// Full output contract of a successful alignment.
///
/// `suggested_additions` and `company_insights` default to empty when the model omits them;
/// the validator has already rejected responses missing the other three.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignedResumeResult {
    pub aligned_resume: AlignedResume,
    pub matched_skills: Vec<String>,
    #[serde(default)]
    pub suggested_additions: Vec<String>,
    pub improvements: Vec<String>,
    #[serde(default)]
    pub company_insights: String,
}
