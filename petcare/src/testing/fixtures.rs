//! Sample stage values and pre-advanced contexts.

use crate::context::AnalysisContext;
use crate::core::{PipelineStage, StageValue};
use crate::domain::{
    BodySystem, CarePlanData, ConditionCandidate, ConditionSeverity, MedicalData, OwnerSheet,
    SeverityCue, Species, SymptomData, SymptomDuration, TriageData, TriageReport, UrgencyLevel,
    VisionData, VisualFinding,
};
use chrono::{TimeZone, Utc};
use uuid::Uuid;

/// Description used by the sample contexts.
pub const SAMPLE_INPUT: &str = "My dog has been vomiting and lethargic for 2 days";

/// Image reference used by the sample contexts.
pub const SAMPLE_IMAGE: &str = "uploads/vomit-photo.jpg";

/// Sample symptom intake output.
#[must_use]
pub fn symptom_data() -> SymptomData {
    SymptomData {
        species: Some(Species::Dog),
        symptoms: vec!["vomiting".to_string(), "lethargy".to_string()],
        affected_systems: [BodySystem::Gastrointestinal, BodySystem::General]
            .into_iter()
            .collect(),
        severity_cues: [SeverityCue::Lethargy].into_iter().collect(),
        duration: Some(SymptomDuration::new(48, "2 days")),
    }
}

/// Sample vision analysis output.
#[must_use]
pub fn vision_data() -> VisionData {
    VisionData {
        images_analyzed: 1,
        findings: vec![VisualFinding {
            image_ref: SAMPLE_IMAGE.to_string(),
            image_id: "3f1c2a9b0d4e".to_string(),
            label: "vomitus present".to_string(),
            body_system: Some(BodySystem::Gastrointestinal),
            confidence: 0.35,
        }],
        summary: "1 image analysed; 1 abnormal finding".to_string(),
    }
}

/// Sample medical analysis output.
#[must_use]
pub fn medical_data() -> MedicalData {
    MedicalData {
        primary: ConditionCandidate::new(
            "Acute gastroenteritis",
            BodySystem::Gastrointestinal,
            ConditionSeverity::Moderate,
            0.5,
        )
        .with_evidence(vec!["vomiting".to_string(), "lethargy".to_string()]),
        differentials: vec![ConditionCandidate::new(
            "Gastrointestinal foreign body",
            BodySystem::Gastrointestinal,
            ConditionSeverity::Serious,
            0.3,
        )],
        overall_confidence: 0.5,
    }
}

/// Sample triage scoring output.
#[must_use]
pub fn triage_data() -> TriageData {
    let level = UrgencyLevel::Yellow;
    TriageData {
        level,
        risk: level.risk(),
        score: 2.1,
        vet_visit_window: level.vet_visit_window().to_string(),
        rationale: vec!["primary condition Acute gastroenteritis (moderate)".to_string()],
    }
}

/// Sample care-plan output.
#[must_use]
pub fn careplan_data() -> CarePlanData {
    CarePlanData {
        immediate_home_actions: vec![
            "Book a veterinary appointment within 24-48 hours".to_string()
        ],
        things_to_avoid: vec!["Do not force-feed".to_string()],
        monitoring_guide: vec!["Count vomiting episodes".to_string()],
        vet_visit_window: UrgencyLevel::Yellow.vet_visit_window().to_string(),
        care_guide: "Acute gastroenteritis (yellow)".to_string(),
    }
}

/// Sample final report.
#[must_use]
pub fn report() -> TriageReport {
    let careplan = careplan_data();
    TriageReport {
        diagnosis: "Acute gastroenteritis".to_string(),
        risk_level: UrgencyLevel::Yellow.risk(),
        triage_level: UrgencyLevel::Yellow,
        triage_score: 2.1,
        actions: careplan.immediate_home_actions.clone(),
        owner_sheet: OwnerSheet {
            immediate_home_actions: careplan.immediate_home_actions,
            things_to_avoid: careplan.things_to_avoid,
            monitoring_guide: careplan.monitoring_guide,
        },
        care_guide: careplan.care_guide,
        species: Some(Species::Dog),
        differentials: vec!["Gastrointestinal foreign body".to_string()],
        visual_findings: Vec::new(),
        vet_visit_window: careplan.vet_visit_window,
        request_id: Uuid::nil(),
        generated_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().unwrap_or_default(),
    }
}

/// Sample value for any executable stage.
#[must_use]
pub fn value_for(stage: PipelineStage) -> Option<StageValue> {
    match stage {
        PipelineStage::SymptomIntake => Some(symptom_data().into()),
        PipelineStage::VisionAnalysis => Some(vision_data().into()),
        PipelineStage::MedicalAnalysis => Some(medical_data().into()),
        PipelineStage::TriageScoring => Some(triage_data().into()),
        PipelineStage::CarePlanGeneration => Some(careplan_data().into()),
        PipelineStage::ReportAssembly => Some(report().into()),
        PipelineStage::Done => None,
    }
}

/// A fresh context for [`SAMPLE_INPUT`].
#[must_use]
pub fn fresh_context(with_images: bool) -> AnalysisContext {
    let images = if with_images {
        vec![SAMPLE_IMAGE.to_string()]
    } else {
        Vec::new()
    };
    AnalysisContext::new(SAMPLE_INPUT, images)
}

/// A context whose cursor sits at `stage`, with every earlier field
/// populated from the sample values.
#[must_use]
pub fn context_at(stage: PipelineStage, with_images: bool) -> AnalysisContext {
    let mut ctx = fresh_context(with_images);
    while ctx.stage() < stage {
        let Some(value) = value_for(ctx.stage()) else {
            break;
        };
        if ctx.commit(value).is_err() {
            break;
        }
    }
    ctx
}
