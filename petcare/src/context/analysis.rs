//! The shared analysis context threaded through every stage.

use crate::core::{PipelineStage, StageValue};
use crate::domain::{CarePlanData, MedicalData, SymptomData, TriageData, TriageReport, VisionData};
use crate::errors::ContextError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;
use uuid::Uuid;

/// Per-request record of everything the pipeline has produced so far.
///
/// The context carries an explicit cursor naming the next stage to run.
/// Fields can only be written through [`AnalysisContext::commit`], which
/// enforces the fixed stage order and never overwrites a populated field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ContextParts")]
pub struct AnalysisContext {
    request_id: Uuid,
    user_input: String,
    image_refs: Vec<String>,
    stage: PipelineStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    symptom_data: Option<SymptomData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vision_data: Option<VisionData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    medical_data: Option<MedicalData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    triage_data: Option<TriageData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    careplan_data: Option<CarePlanData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<TriageReport>,
}

impl AnalysisContext {
    /// Creates a fresh context for one triage request.
    #[must_use]
    pub fn new(user_input: impl Into<String>, image_refs: Vec<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            user_input: user_input.into(),
            image_refs,
            stage: PipelineStage::SymptomIntake,
            symptom_data: None,
            vision_data: None,
            medical_data: None,
            triage_data: None,
            careplan_data: None,
            report: None,
        }
    }

    /// Sets the request ID.
    #[must_use]
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    /// Rebuilds a context from previously produced parts.
    ///
    /// The cursor is derived from which fields are present. Gaps in the
    /// fixed order, vision data without images, or a declared stage that
    /// disagrees with the derived one are rejected.
    pub fn resume(parts: ContextParts) -> Result<Self, ContextError> {
        Self::try_from(parts)
    }

    /// Returns the request ID.
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Returns the original free-text description.
    #[must_use]
    pub fn user_input(&self) -> &str {
        &self.user_input
    }

    /// Returns the image references.
    #[must_use]
    pub fn image_refs(&self) -> &[String] {
        &self.image_refs
    }

    /// Returns true if images were supplied.
    #[must_use]
    pub fn has_images(&self) -> bool {
        !self.image_refs.is_empty()
    }

    /// Returns the next stage to run, or `Done`.
    #[must_use]
    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// Returns true once the report has been assembled.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }

    /// Returns the symptom data, if intake has run.
    #[must_use]
    pub fn symptom_data(&self) -> Option<&SymptomData> {
        self.symptom_data.as_ref()
    }

    /// Returns the vision data, if vision analysis has run.
    #[must_use]
    pub fn vision_data(&self) -> Option<&VisionData> {
        self.vision_data.as_ref()
    }

    /// Returns the medical data, if medical analysis has run.
    #[must_use]
    pub fn medical_data(&self) -> Option<&MedicalData> {
        self.medical_data.as_ref()
    }

    /// Returns the triage data, if scoring has run.
    #[must_use]
    pub fn triage_data(&self) -> Option<&TriageData> {
        self.triage_data.as_ref()
    }

    /// Returns the care plan, if generation has run.
    #[must_use]
    pub fn careplan_data(&self) -> Option<&CarePlanData> {
        self.careplan_data.as_ref()
    }

    /// Returns the report, if assembled.
    #[must_use]
    pub fn report(&self) -> Option<&TriageReport> {
        self.report.as_ref()
    }

    /// Consumes the context and returns its report.
    #[must_use]
    pub fn into_report(self) -> Option<TriageReport> {
        self.report
    }

    /// Returns true if the field produced by `stage` is populated.
    #[must_use]
    pub fn is_populated(&self, stage: PipelineStage) -> bool {
        match stage {
            PipelineStage::SymptomIntake => self.symptom_data.is_some(),
            PipelineStage::VisionAnalysis => self.vision_data.is_some(),
            PipelineStage::MedicalAnalysis => self.medical_data.is_some(),
            PipelineStage::TriageScoring => self.triage_data.is_some(),
            PipelineStage::CarePlanGeneration => self.careplan_data.is_some(),
            PipelineStage::ReportAssembly => self.report.is_some(),
            PipelineStage::Done => false,
        }
    }

    /// Returns the names of populated fields in stage order.
    #[must_use]
    pub fn populated_fields(&self) -> Vec<&'static str> {
        PipelineStage::ORDER
            .into_iter()
            .filter(|stage| self.is_populated(*stage))
            .filter_map(PipelineStage::field_name)
            .collect()
    }

    /// Returns the stages still to run, in order.
    #[must_use]
    pub fn remaining_stages(&self) -> Vec<PipelineStage> {
        PipelineStage::sequence(self.has_images())
            .into_iter()
            .filter(|stage| *stage >= self.stage)
            .collect()
    }

    /// Stores a stage value and advances the cursor.
    ///
    /// Returns the new cursor. On error nothing is written.
    pub fn commit(&mut self, value: StageValue) -> Result<PipelineStage, ContextError> {
        if self.is_terminal() {
            return Err(ContextError::Terminal);
        }

        let target = value.stage();
        if target == PipelineStage::VisionAnalysis && !self.has_images() {
            return Err(ContextError::VisionNotExpected);
        }
        if self.is_populated(target) {
            return Err(ContextError::AlreadyPopulated {
                field: value.field_name().to_string(),
            });
        }
        if target != self.stage {
            return Err(ContextError::OutOfOrder {
                expected: self.stage,
                got: target,
            });
        }

        match value {
            StageValue::Symptom(data) => self.symptom_data = Some(data),
            StageValue::Vision(data) => self.vision_data = Some(data),
            StageValue::Medical(data) => self.medical_data = Some(data),
            StageValue::Triage(data) => self.triage_data = Some(data),
            StageValue::CarePlan(data) => self.careplan_data = Some(data),
            StageValue::Report(report) => self.report = Some(report),
        }
        self.stage = target.next(self.has_images());
        Ok(self.stage)
    }

    /// SHA-256 hex digest of the canonical JSON form.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        self.digest(serde_json::to_vec(self))
    }

    /// Hashes the serialized form, or a marker naming this request and its
    /// cursor when serialization failed.
    pub(super) fn digest(&self, serialized: Result<Vec<u8>, serde_json::Error>) -> String {
        let mut hasher = Sha256::new();
        match serialized {
            Ok(bytes) => hasher.update(&bytes),
            Err(err) => {
                warn!(
                    request_id = %self.request_id,
                    stage = %self.stage,
                    error = %err,
                    "Context could not be serialized for fingerprinting"
                );
                hasher.update(format!("unserializable:{}:{}", self.request_id, self.stage));
            }
        }
        hex::encode(hasher.finalize())
    }

    /// Converts back into loose parts.
    #[must_use]
    pub fn into_parts(self) -> ContextParts {
        ContextParts {
            request_id: Some(self.request_id),
            user_input: self.user_input,
            image_refs: self.image_refs,
            stage: Some(self.stage),
            symptom_data: self.symptom_data,
            vision_data: self.vision_data,
            medical_data: self.medical_data,
            triage_data: self.triage_data,
            careplan_data: self.careplan_data,
            report: self.report,
        }
    }
}

/// Unvalidated context fields, as they arrive on the wire or from a caller
/// resuming a partially completed request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextParts {
    /// Request ID; generated when absent.
    #[serde(default)]
    pub request_id: Option<Uuid>,
    /// Free-text description.
    #[serde(default)]
    pub user_input: String,
    /// Image references.
    #[serde(default)]
    pub image_refs: Vec<String>,
    /// Declared cursor; checked against the derived one when present.
    #[serde(default)]
    pub stage: Option<PipelineStage>,
    /// Symptom intake output.
    #[serde(default)]
    pub symptom_data: Option<SymptomData>,
    /// Vision analysis output.
    #[serde(default)]
    pub vision_data: Option<VisionData>,
    /// Medical analysis output.
    #[serde(default)]
    pub medical_data: Option<MedicalData>,
    /// Triage scoring output.
    #[serde(default)]
    pub triage_data: Option<TriageData>,
    /// Care-plan output.
    #[serde(default)]
    pub careplan_data: Option<CarePlanData>,
    /// Final report.
    #[serde(default)]
    pub report: Option<TriageReport>,
}

impl ContextParts {
    /// Creates parts for a fresh request.
    #[must_use]
    pub fn new(user_input: impl Into<String>, image_refs: Vec<String>) -> Self {
        Self {
            user_input: user_input.into(),
            image_refs,
            ..Default::default()
        }
    }

    fn is_present(&self, stage: PipelineStage) -> bool {
        match stage {
            PipelineStage::SymptomIntake => self.symptom_data.is_some(),
            PipelineStage::VisionAnalysis => self.vision_data.is_some(),
            PipelineStage::MedicalAnalysis => self.medical_data.is_some(),
            PipelineStage::TriageScoring => self.triage_data.is_some(),
            PipelineStage::CarePlanGeneration => self.careplan_data.is_some(),
            PipelineStage::ReportAssembly => self.report.is_some(),
            PipelineStage::Done => false,
        }
    }

    /// Derives the cursor from field presence in fixed order.
    fn derive_stage(&self) -> Result<PipelineStage, ContextError> {
        let has_images = !self.image_refs.is_empty();
        if !has_images && self.vision_data.is_some() {
            return Err(ContextError::malformed(
                "vision_data present but no image_refs were supplied",
            ));
        }

        let mut cursor = PipelineStage::Done;
        for stage in PipelineStage::sequence(has_images) {
            let present = self.is_present(stage);
            if cursor.is_terminal() {
                if !present {
                    cursor = stage;
                }
            } else if present {
                return Err(ContextError::malformed(format!(
                    "{} present while {} is missing",
                    stage.field_name().unwrap_or("field"),
                    cursor.field_name().unwrap_or("field"),
                )));
            }
        }
        Ok(cursor)
    }
}

impl TryFrom<ContextParts> for AnalysisContext {
    type Error = ContextError;

    fn try_from(parts: ContextParts) -> Result<Self, Self::Error> {
        let stage = parts.derive_stage()?;
        if let Some(declared) = parts.stage {
            if declared != stage {
                return Err(ContextError::malformed(format!(
                    "declared stage {declared} does not match populated fields (expected {stage})"
                )));
            }
        }

        Ok(Self {
            request_id: parts.request_id.unwrap_or_else(Uuid::new_v4),
            user_input: parts.user_input,
            image_refs: parts.image_refs,
            stage,
            symptom_data: parts.symptom_data,
            vision_data: parts.vision_data,
            medical_data: parts.medical_data,
            triage_data: parts.triage_data,
            careplan_data: parts.careplan_data,
            report: parts.report,
        })
    }
}
