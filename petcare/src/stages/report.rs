//! Report assembly: the terminal stage.

use super::{finish, require, TriageStage};
use crate::context::AnalysisContext;
use crate::core::{PipelineStage, StageOutput};
use crate::domain::{OwnerSheet, TriageReport};
use async_trait::async_trait;
use chrono::Utc;

/// Combines every accumulated field into the final report.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportAssemblyStage;

impl ReportAssemblyStage {
    /// Creates the stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn assemble(ctx: &AnalysisContext) -> Result<TriageReport, String> {
        let symptoms = require(ctx.symptom_data(), "symptom_data")?;
        let medical = require(ctx.medical_data(), "medical_data")?;
        let triage = require(ctx.triage_data(), "triage_data")?;
        let careplan = require(ctx.careplan_data(), "careplan_data")?;
        let visual_findings = if ctx.has_images() {
            require(ctx.vision_data(), "vision_data")?.abnormal_labels()
        } else {
            Vec::new()
        };

        Ok(TriageReport {
            diagnosis: medical.primary.name.clone(),
            risk_level: triage.risk,
            triage_level: triage.level,
            triage_score: triage.score,
            actions: careplan.immediate_home_actions.clone(),
            owner_sheet: OwnerSheet {
                immediate_home_actions: careplan.immediate_home_actions.clone(),
                things_to_avoid: careplan.things_to_avoid.clone(),
                monitoring_guide: careplan.monitoring_guide.clone(),
            },
            care_guide: careplan.care_guide.clone(),
            species: symptoms.species,
            differentials: medical.differentials.iter().map(|c| c.name.clone()).collect(),
            visual_findings,
            vet_visit_window: careplan.vet_visit_window.clone(),
            request_id: ctx.request_id(),
            generated_at: Utc::now(),
        })
    }
}

#[async_trait]
impl TriageStage for ReportAssemblyStage {
    fn stage(&self) -> PipelineStage {
        PipelineStage::ReportAssembly
    }

    async fn run(&self, ctx: &AnalysisContext, _original_input: &str) -> StageOutput {
        finish(Self::assemble(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageValue;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_assembles_from_fields() {
        let ctx = fixtures::context_at(PipelineStage::ReportAssembly, true);
        let output = ReportAssemblyStage::new().run(&ctx, "").await;

        let Some(StageValue::Report(report)) = output.into_parts().0 else {
            panic!("expected report");
        };
        assert_eq!(report.diagnosis, "Acute gastroenteritis");
        assert_eq!(report.triage_score, fixtures::triage_data().score);
        assert_eq!(report.actions, fixtures::careplan_data().immediate_home_actions);
        assert_eq!(report.differentials, vec!["Gastrointestinal foreign body"]);
        assert_eq!(report.visual_findings, vec!["vomitus present"]);
        assert_eq!(report.request_id, ctx.request_id());
    }

    #[tokio::test]
    async fn test_missing_vision_fails_when_images_supplied() {
        let ctx = fixtures::context_at(PipelineStage::VisionAnalysis, true);
        let output = ReportAssemblyStage::new().run(&ctx, "").await;
        assert!(output.is_failure());
    }

    #[tokio::test]
    async fn test_missing_careplan_fails() {
        let ctx = fixtures::context_at(PipelineStage::CarePlanGeneration, false);
        let output = ReportAssemblyStage::new().run(&ctx, "").await;
        assert_eq!(output.failure_reason(), Some("careplan_data is not available"));
    }
}
