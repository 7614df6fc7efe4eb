//! Result validation: accepts a decoded value only if it satisfies the result contract.

use serde_json::Value;

use crate::alignment::error::SchemaError;
use crate::alignment::models::AlignedResumeResult;

/// Fields whose absence means the response is structurally broken, with the container
/// kind each must have.
const REQUIRED_CONTAINERS: [(&str, Kind); 3] = [
    ("alignedResume", Kind::Object),
    ("matchedSkills", Kind::Array),
    ("improvements", Kind::Array),
];

/// Fields defaulted to empty when absent or null.
const OPTIONAL_FIELDS: [&str; 2] = ["suggestedAdditions", "companyInsights"];

#[derive(Clone, Copy)]
enum Kind {
    Object,
    Array,
}

impl Kind {
    fn matches(self, value: &Value) -> bool {
        match self {
            Kind::Object => value.is_object(),
            Kind::Array => value.is_array(),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Kind::Object => "an object",
            Kind::Array => "an array",
        }
    }
}

/// Checks the decoded value and converts it into the typed result.
///
/// `suggestedAdditions` / `companyInsights` may be absent or null and are defaulted to empty.
/// `matchedSkills` is never defaulted: a response without it is rejected.
pub fn validate_result(mut value: Value) -> Result<AlignedResumeResult, SchemaError> {
    for (field, kind) in REQUIRED_CONTAINERS {
        match value.get(field) {
            None | Some(Value::Null) => return Err(SchemaError::MissingField(field)),
            Some(v) if !kind.matches(v) => {
                return Err(SchemaError::WrongKind {
                    field,
                    expected: kind.describe(),
                })
            }
            Some(_) => {}
        }
    }

    if let Some(obj) = value.as_object_mut() {
        for field in OPTIONAL_FIELDS {
            if obj.get(field).is_some_and(Value::is_null) {
                obj.remove(field);
            }
        }
    }

    serde_json::from_value(value).map_err(|e| SchemaError::Contract(e.to_string()))
}
