//! Stage values and stage output with factory methods.

use super::{PipelineStage, StageOutcome};
use crate::domain::{CarePlanData, MedicalData, SymptomData, TriageData, TriageReport, VisionData};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The single field a stage produces.
///
/// Serialized externally tagged by field name, e.g. `{"symptom_data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageValue {
    /// Output of symptom intake.
    #[serde(rename = "symptom_data")]
    Symptom(SymptomData),
    /// Output of vision analysis.
    #[serde(rename = "vision_data")]
    Vision(VisionData),
    /// Output of medical analysis.
    #[serde(rename = "medical_data")]
    Medical(MedicalData),
    /// Output of triage scoring.
    #[serde(rename = "triage_data")]
    Triage(TriageData),
    /// Output of care-plan generation.
    #[serde(rename = "careplan_data")]
    CarePlan(CarePlanData),
    /// Output of report assembly.
    #[serde(rename = "report")]
    Report(TriageReport),
}

impl StageValue {
    /// Returns the stage that produces this value.
    #[must_use]
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::Symptom(_) => PipelineStage::SymptomIntake,
            Self::Vision(_) => PipelineStage::VisionAnalysis,
            Self::Medical(_) => PipelineStage::MedicalAnalysis,
            Self::Triage(_) => PipelineStage::TriageScoring,
            Self::CarePlan(_) => PipelineStage::CarePlanGeneration,
            Self::Report(_) => PipelineStage::ReportAssembly,
        }
    }

    /// Returns the context field name this value is stored under.
    #[must_use]
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Symptom(_) => "symptom_data",
            Self::Vision(_) => "vision_data",
            Self::Medical(_) => "medical_data",
            Self::Triage(_) => "triage_data",
            Self::CarePlan(_) => "careplan_data",
            Self::Report(_) => "report",
        }
    }

    /// Returns the report, if this is a report value.
    #[must_use]
    pub fn as_report(&self) -> Option<&TriageReport> {
        match self {
            Self::Report(report) => Some(report),
            _ => None,
        }
    }
}

impl From<SymptomData> for StageValue {
    fn from(data: SymptomData) -> Self {
        Self::Symptom(data)
    }
}

impl From<VisionData> for StageValue {
    fn from(data: VisionData) -> Self {
        Self::Vision(data)
    }
}

impl From<MedicalData> for StageValue {
    fn from(data: MedicalData) -> Self {
        Self::Medical(data)
    }
}

impl From<TriageData> for StageValue {
    fn from(data: TriageData) -> Self {
        Self::Triage(data)
    }
}

impl From<CarePlanData> for StageValue {
    fn from(data: CarePlanData) -> Self {
        Self::CarePlan(data)
    }
}

impl From<TriageReport> for StageValue {
    fn from(report: TriageReport) -> Self {
        Self::Report(report)
    }
}

/// The output of one stage run: the produced field plus an outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutput {
    /// The produced value (absent on failure).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<StageValue>,

    /// Whether the stage succeeded.
    #[serde(flatten)]
    pub outcome: StageOutcome,

    /// Additional metadata.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl StageOutput {
    /// Creates a successful output.
    #[must_use]
    pub fn ok(value: impl Into<StageValue>) -> Self {
        Self {
            value: Some(value.into()),
            outcome: StageOutcome::Ok,
            metadata: HashMap::new(),
        }
    }

    /// Creates a failure output with a reason.
    #[must_use]
    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            value: None,
            outcome: StageOutcome::Failed(reason.into()),
            metadata: HashMap::new(),
        }
    }

    /// Adds a single metadata entry.
    #[must_use]
    pub fn add_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Returns true if the output indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Returns true if the output indicates failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !self.outcome.is_ok()
    }

    /// Returns the failure reason, if any.
    #[must_use]
    pub fn failure_reason(&self) -> Option<&str> {
        self.outcome.reason()
    }

    /// Splits the output into its value and outcome.
    #[must_use]
    pub fn into_parts(self) -> (Option<StageValue>, StageOutcome) {
        (self.value, self.outcome)
    }
}
