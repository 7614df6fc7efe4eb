//! Machine-checked response schema sent with every generation request.
//!
//! Uses the provider's OpenAPI-subset schema dialect (object / array / string only).
//! Must describe the same contract as `AlignedResumeResult` and `prompts::RESPONSE_SHAPE`.

use serde_json::{json, Value};

pub const ALIGNED_RESUME_FIELDS: [&str; 5] = ["name", "title", "summary", "experience", "education"];

pub const RESULT_FIELDS: [&str; 5] = [
    "alignedResume",
    "matchedSkills",
    "suggestedAdditions",
    "improvements",
    "companyInsights",
];

/// Builds the response schema for the alignment call.
pub fn aligned_resume_schema() -> Value {
    let string_array = json!({ "type": "array", "items": { "type": "string" } });

    json!({
        "type": "object",
        "properties": {
            "alignedResume": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "title": { "type": "string" },
                    "summary": { "type": "string" },
                    "experience": string_array,
                    "education": { "type": "string" }
                },
                "required": ALIGNED_RESUME_FIELDS
            },
            "matchedSkills": string_array,
            "suggestedAdditions": string_array,
            "improvements": string_array,
            "companyInsights": { "type": "string" }
        },
        "required": RESULT_FIELDS
    })
}
