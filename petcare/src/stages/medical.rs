//! Medical analysis: symptoms and findings to ranked candidate conditions.

use super::{finish, require, TriageStage};
use crate::config::MedicalConfig;
use crate::context::AnalysisContext;
use crate::core::{PipelineStage, StageOutput};
use crate::domain::{ConditionCandidate, MedicalData};
use crate::ports::{KnowledgeQuery, MedicalKnowledge, RuleBasedKnowledge};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Queries a [`MedicalKnowledge`] source and ranks what comes back.
#[derive(Clone)]
pub struct MedicalAnalysisStage {
    knowledge: Arc<dyn MedicalKnowledge>,
    config: MedicalConfig,
}

impl MedicalAnalysisStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(knowledge: Arc<dyn MedicalKnowledge>, config: MedicalConfig) -> Self {
        Self { knowledge, config }
    }

    /// Drops low-confidence candidates, sorts by confidence (ties by name)
    /// and keeps the top `max_candidates`.
    fn rank(&self, mut candidates: Vec<ConditionCandidate>) -> Vec<ConditionCandidate> {
        candidates.retain(|c| c.confidence >= self.config.min_confidence);
        candidates.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });
        candidates.truncate(self.config.max_candidates);
        candidates
    }

    async fn evaluate(
        &self,
        ctx: &AnalysisContext,
        original_input: &str,
    ) -> Result<MedicalData, String> {
        let symptoms = require(ctx.symptom_data(), "symptom_data")?;
        if ctx.has_images() {
            require(ctx.vision_data(), "vision_data")?;
        }

        let query = KnowledgeQuery::from_symptoms(symptoms, ctx.vision_data(), original_input);
        let candidates = self
            .knowledge
            .lookup(&query)
            .await
            .map_err(|e| format!("knowledge lookup failed: {e}"))?;

        let ranked = self.rank(candidates);
        debug!(
            candidates = ranked.len(),
            primary = ranked.first().map(|c| c.name.as_str()),
            "Conditions ranked"
        );
        MedicalData::from_ranked(ranked).ok_or_else(|| "no candidate conditions".to_string())
    }
}

impl Default for MedicalAnalysisStage {
    fn default() -> Self {
        Self::new(Arc::new(RuleBasedKnowledge::new()), MedicalConfig::default())
    }
}

impl fmt::Debug for MedicalAnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MedicalAnalysisStage")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TriageStage for MedicalAnalysisStage {
    fn stage(&self) -> PipelineStage {
        PipelineStage::MedicalAnalysis
    }

    async fn run(&self, ctx: &AnalysisContext, original_input: &str) -> StageOutput {
        finish(self.evaluate(ctx, original_input).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageValue;
    use crate::domain::{BodySystem, ConditionSeverity};
    use crate::errors::PortError;
    use crate::ports::MockMedicalKnowledge;
    use crate::testing::fixtures;
    use pretty_assertions::assert_eq;

    fn candidate(name: &str, confidence: f64) -> ConditionCandidate {
        ConditionCandidate::new(name, BodySystem::General, ConditionSeverity::Mild, confidence)
    }

    fn medical(output: StageOutput) -> MedicalData {
        match output.into_parts() {
            (Some(StageValue::Medical(data)), _) => data,
            other => panic!("expected medical data, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_default_knowledge_on_sample() {
        let ctx = fixtures::context_at(PipelineStage::MedicalAnalysis, false);
        let data = medical(MedicalAnalysisStage::default().run(&ctx, fixtures::SAMPLE_INPUT).await);

        assert_eq!(data.primary.name, "Acute gastroenteritis");
        assert_eq!(data.differentials[0].name, "Gastrointestinal foreign body");
        assert!(data.differentials.len() <= 2);
    }

    #[tokio::test]
    async fn test_ranking_filters_sorts_and_truncates() {
        let mut knowledge = MockMedicalKnowledge::new();
        knowledge.expect_lookup().times(1).returning(|_| {
            Ok(vec![
                candidate("Zeta", 0.4),
                candidate("Alpha", 0.4),
                candidate("Noise", 0.05),
                candidate("Top", 0.9),
                candidate("Fourth", 0.2),
            ])
        });

        let stage = MedicalAnalysisStage::new(Arc::new(knowledge), MedicalConfig::default());
        let ctx = fixtures::context_at(PipelineStage::MedicalAnalysis, false);
        let data = medical(stage.run(&ctx, fixtures::SAMPLE_INPUT).await);

        assert_eq!(data.primary.name, "Top");
        let rest: Vec<_> = data.differentials.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(rest, vec!["Alpha", "Zeta"]);
        assert!((data.overall_confidence - 0.9).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_query_carries_original_text_and_findings() {
        let mut knowledge = MockMedicalKnowledge::new();
        knowledge
            .expect_lookup()
            .withf(|q| q.text == "raw text" && q.visual_findings.len() == 1)
            .times(1)
            .returning(|_| Ok(vec![candidate("Seen", 0.5)]));

        let stage = MedicalAnalysisStage::new(Arc::new(knowledge), MedicalConfig::default());
        let ctx = fixtures::context_at(PipelineStage::MedicalAnalysis, true);
        let data = medical(stage.run(&ctx, "raw text").await);

        assert_eq!(data.primary.name, "Seen");
    }

    #[tokio::test]
    async fn test_nothing_above_threshold_fails() {
        let mut knowledge = MockMedicalKnowledge::new();
        knowledge
            .expect_lookup()
            .returning(|_| Ok(vec![candidate("Faint", 0.01)]));

        let stage = MedicalAnalysisStage::new(Arc::new(knowledge), MedicalConfig::default());
        let ctx = fixtures::context_at(PipelineStage::MedicalAnalysis, false);
        let output = stage.run(&ctx, "").await;

        assert_eq!(output.failure_reason(), Some("no candidate conditions"));
    }

    #[tokio::test]
    async fn test_knowledge_error_fails() {
        let mut knowledge = MockMedicalKnowledge::new();
        knowledge
            .expect_lookup()
            .returning(|_| Err(PortError::backend("vet-kb", "timeout")));

        let stage = MedicalAnalysisStage::new(Arc::new(knowledge), MedicalConfig::default());
        let ctx = fixtures::context_at(PipelineStage::MedicalAnalysis, false);
        let output = stage.run(&ctx, "").await;

        assert!(output.failure_reason().unwrap().contains("vet-kb failed: timeout"));
    }

    #[tokio::test]
    async fn test_missing_symptoms_fails() {
        let ctx = fixtures::fresh_context(false);
        let output = MedicalAnalysisStage::default().run(&ctx, "").await;
        assert_eq!(output.failure_reason(), Some("symptom_data is not available"));
    }
}
