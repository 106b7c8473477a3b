//! Stage tags and status enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The stages of the triage pipeline, in execution order.
///
/// The shared context carries one of these as its cursor. `Done` marks a
/// context whose report has been assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Extract structured symptoms from free text.
    SymptomIntake,
    /// Derive visual findings from supplied images.
    VisionAnalysis,
    /// Correlate symptoms and findings with candidate conditions.
    MedicalAnalysis,
    /// Compute urgency level and score.
    TriageScoring,
    /// Produce home-care guidance.
    CarePlanGeneration,
    /// Combine everything into the final report.
    ReportAssembly,
    /// Terminal marker; no stage remains.
    Done,
}

impl Default for PipelineStage {
    fn default() -> Self {
        Self::SymptomIntake
    }
}

impl PipelineStage {
    /// All executable stages in fixed order.
    pub const ORDER: [Self; 6] = [
        Self::SymptomIntake,
        Self::VisionAnalysis,
        Self::MedicalAnalysis,
        Self::TriageScoring,
        Self::CarePlanGeneration,
        Self::ReportAssembly,
    ];

    /// Returns the snake_case stage name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SymptomIntake => "symptom_intake",
            Self::VisionAnalysis => "vision_analysis",
            Self::MedicalAnalysis => "medical_analysis",
            Self::TriageScoring => "triage_scoring",
            Self::CarePlanGeneration => "care_plan_generation",
            Self::ReportAssembly => "report_assembly",
            Self::Done => "done",
        }
    }

    /// Returns the context field this stage produces.
    #[must_use]
    pub fn field_name(self) -> Option<&'static str> {
        match self {
            Self::SymptomIntake => Some("symptom_data"),
            Self::VisionAnalysis => Some("vision_data"),
            Self::MedicalAnalysis => Some("medical_data"),
            Self::TriageScoring => Some("triage_data"),
            Self::CarePlanGeneration => Some("careplan_data"),
            Self::ReportAssembly => Some("report"),
            Self::Done => None,
        }
    }

    /// Returns the stage that follows this one.
    ///
    /// Vision analysis is only part of the sequence when images were supplied.
    #[must_use]
    pub fn next(self, has_images: bool) -> Self {
        match self {
            Self::SymptomIntake if has_images => Self::VisionAnalysis,
            Self::SymptomIntake | Self::VisionAnalysis => Self::MedicalAnalysis,
            Self::MedicalAnalysis => Self::TriageScoring,
            Self::TriageScoring => Self::CarePlanGeneration,
            Self::CarePlanGeneration => Self::ReportAssembly,
            Self::ReportAssembly | Self::Done => Self::Done,
        }
    }

    /// Returns the stages a request runs through, in order.
    #[must_use]
    pub fn sequence(has_images: bool) -> Vec<Self> {
        Self::ORDER
            .into_iter()
            .filter(|stage| has_images || *stage != Self::VisionAnalysis)
            .collect()
    }

    /// Returns true for the terminal marker.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress status reported by one driver call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// More stages remain.
    InProgress,
    /// The report is populated.
    Complete,
    /// The selected stage could not produce output, or input was rejected.
    Failed,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => write!(f, "in_progress"),
            Self::Complete => write!(f, "complete"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl StepStatus {
    /// Returns true if no further driver calls should be made.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

/// Outcome reported by a stage alongside its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum StageOutcome {
    /// The stage produced its field.
    Ok,
    /// The stage could not produce its field.
    Failed(String),
}

impl StageOutcome {
    /// Returns true for `Ok`.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Returns the failure reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Ok => None,
            Self::Failed(reason) => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display() {
        assert_eq!(PipelineStage::SymptomIntake.to_string(), "symptom_intake");
        assert_eq!(PipelineStage::CarePlanGeneration.to_string(), "care_plan_generation");
        assert_eq!(PipelineStage::Done.to_string(), "done");
    }

    #[test]
    fn test_next_skips_vision_without_images() {
        assert_eq!(
            PipelineStage::SymptomIntake.next(false),
            PipelineStage::MedicalAnalysis
        );
        assert_eq!(
            PipelineStage::SymptomIntake.next(true),
            PipelineStage::VisionAnalysis
        );
        assert_eq!(
            PipelineStage::VisionAnalysis.next(true),
            PipelineStage::MedicalAnalysis
        );
        assert_eq!(PipelineStage::ReportAssembly.next(false), PipelineStage::Done);
        assert_eq!(PipelineStage::Done.next(true), PipelineStage::Done);
    }

    #[test]
    fn test_sequence() {
        assert_eq!(PipelineStage::sequence(false).len(), 5);
        assert_eq!(PipelineStage::sequence(true).len(), 6);
        assert!(!PipelineStage::sequence(false).contains(&PipelineStage::VisionAnalysis));
    }

    #[test]
    fn test_field_names() {
        assert_eq!(PipelineStage::TriageScoring.field_name(), Some("triage_data"));
        assert_eq!(PipelineStage::ReportAssembly.field_name(), Some("report"));
        assert_eq!(PipelineStage::Done.field_name(), None);
    }

    #[test]
    fn test_step_status_serialize() {
        let json = serde_json::to_string(&StepStatus::InProgress).unwrap();
        assert_eq!(json, r#""in_progress""#);

        let status: StepStatus = serde_json::from_str(r#""complete""#).unwrap();
        assert_eq!(status, StepStatus::Complete);
        assert!(status.is_terminal());
        assert!(!StepStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_stage_outcome_serialize() {
        let json = serde_json::to_value(StageOutcome::Failed("bad input".into())).unwrap();
        assert_eq!(json, serde_json::json!({"outcome": "failed", "reason": "bad input"}));
        assert_eq!(StageOutcome::Failed("x".into()).reason(), Some("x"));
        assert!(StageOutcome::Ok.is_ok());
    }
}
