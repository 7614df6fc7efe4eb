// Prompt text for the alignment call.
// The JSON shape shown to the model here must stay in sync with `alignment::schema`.

use std::fmt;

use crate::alignment::models::AlignmentRequest;

/// Levels at or above this are `Aggressive`.
pub const AGGRESSIVE_THRESHOLD: u8 = 70;
/// Levels at or above this (and below `AGGRESSIVE_THRESHOLD`) are `Moderate`.
pub const MODERATE_THRESHOLD: u8 = 40;

/// Aggressiveness tier derived from the 0 – 100 alignment level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentStyle {
    Conservative,
    Moderate,
    Aggressive,
}

impl AlignmentStyle {
    pub fn from_level(level: u8) -> Self {
        if level >= AGGRESSIVE_THRESHOLD {
            AlignmentStyle::Aggressive
        } else if level >= MODERATE_THRESHOLD {
            AlignmentStyle::Moderate
        } else {
            AlignmentStyle::Conservative
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlignmentStyle::Conservative => "conservative",
            AlignmentStyle::Moderate => "moderate",
            AlignmentStyle::Aggressive => "aggressive",
        }
    }
}

impl fmt::Display for AlignmentStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const ALIGNMENT_INTRO: &str = "You are an expert resume optimization AI. \
Your job is to align a candidate's resume to a specific job description.";

/// The three-way behavioural guidance, shown to the model regardless of the chosen tier.
pub const STYLE_GUIDANCE: &str = "\
- Conservative: Make minimal changes, preserve original content, add subtle enhancements
- Moderate: Balance between preserving original and optimizing for the job
- Aggressive: Significantly rewrite content to match job requirements, add inferred skills";

/// Human-readable example of the result contract.
pub const RESPONSE_SHAPE: &str = r#"{
  "alignedResume": {
    "name": "string",
    "title": "string",
    "summary": "string (include [INFERRED] tags if you added content not in original)",
    "experience": ["bullet1", "bullet2 [ENHANCED]", ...],
    "education": "string"
  },
  "matchedSkills": ["skill1", "skill2", ...],
  "suggestedAdditions": ["skill1", "skill2", ...],
  "improvements": ["improvement1", "improvement2", ...],
  "companyInsights": "A paragraph about what this company looks for based on the job description"
}"#;

pub const MARKER_RULES: &str = "\
Use [INFERRED] tags for content you created that wasn't in the original resume.
Use [ENHANCED] tags for bullets you significantly improved.";

/// Renders the full instruction string. Deterministic in its inputs.
///
/// User text is spliced in with `format!`, never via placeholder replacement, so braces or
/// placeholder-like text inside a resume cannot rewrite other parts of the prompt.
pub fn build_alignment_prompt(request: &AlignmentRequest) -> String {
    let style = AlignmentStyle::from_level(request.alignment_level);

    let template_line = match request.template_style.as_deref() {
        Some(label) if !label.trim().is_empty() => format!("\nTemplate Style: {label}\n"),
        _ => String::new(),
    };

    format!(
        "{ALIGNMENT_INTRO}\n\n\
         Alignment style: {style}\n\
         {STYLE_GUIDANCE}\n\
         {template_line}\n\
         Original Resume:\n{resume}\n\n\
         Job Description:\n{jd}\n\n\
         Alignment Level: {level}%\n\n\
         Please optimize this resume for the job description and return a JSON object \
         with the following structure:\n\
         {RESPONSE_SHAPE}\n\n\
         {MARKER_RULES}",
        resume = request.resume_text,
        jd = request.job_description,
        level = request.alignment_level,
    )
}
