//! Engine error taxonomy.
//!
//! Budget exhaustion is deliberately absent: running out of tokens is a
//! soft condition that downgrades the run to `partial`, never an `Err`.

use thiserror::Error;

use crate::llm_client::ProviderError;

/// A model response failed the schema gate. `path` is the first mismatch;
/// `message` carries up to three diagnostics.
#[derive(Debug, Clone, Error)]
#[error("{agent}: schema violation at {path}: {message}")]
pub struct SchemaViolation {
    pub agent: &'static str,
    pub path: String,
    pub message: String,
}

/// Errors the orchestrator surfaces to its caller. Per-job agent failures
/// are isolated into `notes_for_ui` instead; only resume parsing failures,
/// malformed input, and denied quota abort a run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation error: {field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("quota denied: {0}")]
    Quota(String),

    #[error(transparent)]
    Schema(#[from] SchemaViolation),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl EngineError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_violation_display() {
        let violation = SchemaViolation {
            agent: "job_parser",
            path: "$.visa_sponsorship".to_string(),
            message: "expected one of YES, NO, UNKNOWN".to_string(),
        };
        let text = violation.to_string();
        assert!(text.contains("job_parser"));
        assert!(text.contains("$.visa_sponsorship"));
    }

    #[test]
    fn test_validation_error_carries_field() {
        let err = EngineError::validation("resume_text", "must not be empty");
        assert!(err.to_string().contains("resume_text"));
    }
}
