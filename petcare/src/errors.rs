//! Error types for the triage pipeline.
//!
//! The taxonomy follows the pipeline's failure modes: stage failures,
//! sequencing violations on the shared context, malformed input, and the
//! ambient configuration and collaborator errors around them.

use crate::core::PipelineStage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for triage operations.
#[derive(Debug, Error)]
pub enum TriageError {
    /// The free-text description was empty or blank.
    #[error("Input rejected: symptom description is empty")]
    EmptyInput,

    /// A stage could not produce its output.
    #[error("{0}")]
    StageFailed(#[from] StageFailure),

    /// The shared context rejected a write or could not be reconstructed.
    #[error("{0}")]
    Context(#[from] ContextError),

    /// The driver reported a sequencing problem.
    #[error("Sequencing error: {0}")]
    Sequencing(String),

    /// A session ran out of steps before reaching a terminal status.
    #[error("Step limit exceeded: {steps} steps without reaching a terminal status")]
    StepLimitExceeded {
        /// The number of steps taken.
        steps: usize,
    },

    /// The driver could not be assembled.
    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(String),

    /// A configuration error.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TriageError {
    /// Returns a short machine-readable kind for the error.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyInput => "empty_input",
            Self::StageFailed(_) => "stage_failed",
            Self::Context(_) | Self::Sequencing(_) => "sequencing",
            Self::StepLimitExceeded { .. } => "step_limit_exceeded",
            Self::InvalidPipeline(_) => "invalid_pipeline",
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("kind".to_string(), serde_json::json!(self.kind()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        if let Self::StageFailed(failure) = self {
            map.insert("stage".to_string(), serde_json::json!(failure.stage.as_str()));
        }
        map
    }
}

impl From<serde_json::Error> for TriageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// A stage reported that it could not produce its output.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Stage '{stage}' failed: {reason}")]
pub struct StageFailure {
    /// The stage that failed.
    pub stage: PipelineStage,
    /// Why it failed.
    pub reason: String,
}

impl StageFailure {
    /// Creates a new stage failure.
    #[must_use]
    pub fn new(stage: PipelineStage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            reason: reason.into(),
        }
    }
}

/// Errors raised by the shared analysis context.
///
/// Every variant is raised before any field is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// A value arrived for a stage other than the current one.
    #[error("Out of order: expected output for '{expected}', got '{got}'")]
    OutOfOrder {
        /// The stage the context is waiting on.
        expected: PipelineStage,
        /// The stage the value belongs to.
        got: PipelineStage,
    },

    /// A field that is already populated was written again.
    #[error("Data conflict: field '{field}' is already populated")]
    AlreadyPopulated {
        /// The field name.
        field: String,
    },

    /// Vision output was offered for a request without images.
    #[error("Vision analysis is skipped for requests without images")]
    VisionNotExpected,

    /// The context already holds a report.
    #[error("Context is terminal: report already assembled")]
    Terminal,

    /// A reconstructed context has gaps or inconsistent fields.
    #[error("Malformed context: {reason}")]
    Malformed {
        /// What is wrong.
        reason: String,
    },
}

impl ContextError {
    /// Creates a malformed-context error.
    #[must_use]
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}

/// Errors raised by collaborator ports (knowledge source, image analyzer).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    /// The collaborator is not reachable or not configured.
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    /// The collaborator rejected its input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The collaborator failed while processing.
    #[error("{backend} failed: {message}")]
    Backend {
        /// Backend name.
        backend: String,
        /// Failure message.
        message: String,
    },
}

impl PortError {
    /// Creates a backend error.
    #[must_use]
    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value failed validation.
    #[error("Invalid configuration for '{field}': {reason}")]
    Invalid {
        /// The offending field.
        field: String,
        /// Why it is invalid.
        reason: String,
    },

    /// An environment variable could not be parsed.
    #[error("Failed to parse {key}={value}")]
    Parse {
        /// The variable name.
        key: String,
        /// The raw value.
        value: String,
    },

    /// The configuration file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid JSON.
    #[error("Invalid configuration file: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    /// Creates an invalid-value error.
    #[must_use]
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_failure_display() {
        let err = StageFailure::new(PipelineStage::MedicalAnalysis, "knowledge source offline");
        assert_eq!(
            err.to_string(),
            "Stage 'medical_analysis' failed: knowledge source offline"
        );
    }

    #[test]
    fn test_triage_error_kind() {
        assert_eq!(TriageError::EmptyInput.kind(), "empty_input");
        assert_eq!(
            TriageError::from(ContextError::Terminal).kind(),
            "sequencing"
        );
        assert_eq!(
            TriageError::StepLimitExceeded { steps: 8 }.kind(),
            "step_limit_exceeded"
        );
    }

    #[test]
    fn test_triage_error_to_dict() {
        let err = TriageError::from(StageFailure::new(PipelineStage::SymptomIntake, "no symptoms"));
        let dict = err.to_dict();

        assert_eq!(dict.get("kind").unwrap(), "stage_failed");
        assert_eq!(dict.get("stage").unwrap(), "symptom_intake");
    }

    #[test]
    fn test_context_error_messages() {
        let err = ContextError::OutOfOrder {
            expected: PipelineStage::SymptomIntake,
            got: PipelineStage::TriageScoring,
        };
        assert!(err.to_string().contains("symptom_intake"));
        assert!(err.to_string().contains("triage_scoring"));

        let err = ContextError::AlreadyPopulated {
            field: "symptom_data".to_string(),
        };
        assert!(err.to_string().contains("symptom_data"));
    }

    #[test]
    fn test_port_error_backend() {
        let err = PortError::backend("rule-based", "table empty");
        assert_eq!(err.to_string(), "rule-based failed: table empty");
    }
}
