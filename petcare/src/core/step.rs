//! Result of a single driver call.

use super::{PipelineStage, StageValue, StepStatus};
use crate::domain::TriageReport;
use crate::errors::{ContextError, StageFailure, TriageError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classifies why a step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepErrorKind {
    /// The context has no usable free-text input.
    EmptyInput,
    /// The selected stage could not produce output.
    StageFailed,
    /// The produced value could not be merged into the context.
    Sequencing,
}

impl fmt::Display for StepErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "empty_input"),
            Self::StageFailed => write!(f, "stage_failed"),
            Self::Sequencing => write!(f, "sequencing"),
        }
    }
}

/// Error descriptor attached to a failed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepError {
    /// The failure class.
    pub kind: StepErrorKind,
    /// The stage involved, if one was selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<PipelineStage>,
    /// Human-readable message.
    pub message: String,
}

impl StepError {
    /// Empty or blank user input.
    #[must_use]
    pub fn empty_input() -> Self {
        Self {
            kind: StepErrorKind::EmptyInput,
            stage: None,
            message: "symptom description is empty".to_string(),
        }
    }

    /// A stage reported failure.
    #[must_use]
    pub fn stage_failed(stage: PipelineStage, reason: impl Into<String>) -> Self {
        Self {
            kind: StepErrorKind::StageFailed,
            stage: Some(stage),
            message: reason.into(),
        }
    }

    /// The context rejected the stage output.
    #[must_use]
    pub fn sequencing(stage: PipelineStage, err: &ContextError) -> Self {
        Self {
            kind: StepErrorKind::Sequencing,
            stage: Some(stage),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage {
            Some(stage) => write!(f, "{} at {}: {}", self.kind, stage, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl From<StepError> for TriageError {
    fn from(err: StepError) -> Self {
        match (err.kind, err.stage) {
            (StepErrorKind::EmptyInput, _) => Self::EmptyInput,
            (StepErrorKind::StageFailed, Some(stage)) => {
                Self::StageFailed(StageFailure::new(stage, err.message))
            }
            _ => Self::Sequencing(err.message),
        }
    }
}

/// What one `advance` call reports back to its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Progress status.
    pub status: StepStatus,

    /// The stage that ran; `None` when nothing was executed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<PipelineStage>,

    /// The freshly produced field (or the existing report on a terminal no-op).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<StageValue>,

    /// Error descriptor for failed steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StepError>,

    /// Wall time spent in the stage.
    #[serde(default)]
    pub duration_ms: f64,
}

impl StepResult {
    /// A stage ran and more stages remain.
    #[must_use]
    pub fn in_progress(stage: PipelineStage, value: StageValue) -> Self {
        Self {
            status: StepStatus::InProgress,
            stage: Some(stage),
            value: Some(value),
            error: None,
            duration_ms: 0.0,
        }
    }

    /// Report assembly ran and the report is now populated.
    #[must_use]
    pub fn complete(value: StageValue) -> Self {
        Self {
            status: StepStatus::Complete,
            stage: Some(PipelineStage::ReportAssembly),
            value: Some(value),
            error: None,
            duration_ms: 0.0,
        }
    }

    /// The context was already terminal; nothing ran.
    #[must_use]
    pub fn already_complete(report: Option<TriageReport>) -> Self {
        Self {
            status: StepStatus::Complete,
            stage: None,
            value: report.map(StageValue::Report),
            error: None,
            duration_ms: 0.0,
        }
    }

    /// The step failed; nothing was merged.
    #[must_use]
    pub fn failed(error: StepError) -> Self {
        Self {
            status: StepStatus::Failed,
            stage: error.stage,
            value: None,
            error: Some(error),
            duration_ms: 0.0,
        }
    }

    /// Sets the duration.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Returns true for `in_progress`.
    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        self.status == StepStatus::InProgress
    }

    /// Returns true for `complete`.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == StepStatus::Complete
    }

    /// Returns true for `failed`.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.status == StepStatus::Failed
    }

    /// Returns true if no stage was executed by this call.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.stage.is_none() && self.error.is_none()
    }

    /// Returns the report carried by a complete step.
    #[must_use]
    pub fn report(&self) -> Option<&TriageReport> {
        self.value.as_ref().and_then(StageValue::as_report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_in_progress_step() {
        let step = StepResult::in_progress(
            PipelineStage::SymptomIntake,
            fixtures::symptom_data().into(),
        )
        .with_duration_ms(1.5);

        assert!(step.is_in_progress());
        assert!(!step.is_noop());
        assert_eq!(step.duration_ms, 1.5);
    }

    #[test]
    fn test_failed_step_carries_stage() {
        let step = StepResult::failed(StepError::stage_failed(
            PipelineStage::MedicalAnalysis,
            "no candidates",
        ));

        assert!(step.is_failed());
        assert_eq!(step.stage, Some(PipelineStage::MedicalAnalysis));
        assert!(step.value.is_none());
    }

    #[test]
    fn test_already_complete_is_noop() {
        let step = StepResult::already_complete(Some(fixtures::report()));
        assert!(step.is_complete());
        assert!(step.is_noop());
        assert!(step.report().is_some());
    }

    #[test]
    fn test_step_error_display() {
        let err = StepError::stage_failed(PipelineStage::TriageScoring, "missing medical data");
        assert_eq!(
            err.to_string(),
            "stage_failed at triage_scoring: missing medical data"
        );
        assert_eq!(
            StepError::empty_input().to_string(),
            "empty_input: symptom description is empty"
        );
    }

    #[test]
    fn test_step_error_into_triage_error() {
        let err: TriageError = StepError::empty_input().into();
        assert!(matches!(err, TriageError::EmptyInput));

        let err: TriageError =
            StepError::stage_failed(PipelineStage::SymptomIntake, "no symptoms").into();
        assert!(matches!(err, TriageError::StageFailed(_)));

        let err: TriageError =
            StepError::sequencing(PipelineStage::SymptomIntake, &ContextError::Terminal).into();
        assert!(matches!(err, TriageError::Sequencing(_)));
    }

    #[test]
    fn test_status_serialization() {
        let step = StepResult::failed(StepError::empty_input());
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"]["kind"], "empty_input");
    }
}
