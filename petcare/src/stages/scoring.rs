//! Triage scoring: a deterministic urgency grade.
//!
//! The score starts from the primary condition's severity weighted by its
//! confidence, adds the capped severity-cue weights, then applies duration,
//! multi-system and species modifiers. It is clamped to `0.0..=5.0` and
//! rounded to one decimal before grading. Emergency cues set a floor on the
//! level: one forces at least orange, two or more force red.

use super::{finish, require, TriageStage};
use crate::config::ScoringConfig;
use crate::context::AnalysisContext;
use crate::core::{PipelineStage, StageOutput};
use crate::domain::{MedicalData, SymptomData, TriageData, UrgencyLevel};
use async_trait::async_trait;
use tracing::debug;

const MAX_SCORE: f64 = 5.0;

/// Grades urgency from symptom and medical data.
#[derive(Debug, Clone, Default)]
pub struct TriageScoringStage {
    config: ScoringConfig,
}

impl TriageScoringStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Scores one request. Pure function of its inputs.
    #[must_use]
    pub fn score(&self, symptoms: &SymptomData, medical: &MedicalData) -> TriageData {
        let cfg = &self.config;
        let primary = &medical.primary;
        let mut rationale = vec![format!(
            "primary condition {} ({})",
            primary.name, primary.severity
        )];

        let mut score = primary.severity.base_score() * (0.5 + 0.5 * primary.confidence);

        let cue_total: f64 = symptoms.severity_cues.iter().map(|c| c.weight()).sum();
        if cue_total > 0.0 {
            score += cue_total.min(cfg.cue_cap);
            rationale.push(format!("{} severity cue(s)", symptoms.severity_cues.len()));
        }
        if symptoms
            .duration_hours()
            .is_some_and(|h| h >= cfg.persistent_after_hours)
        {
            score += cfg.persistence_bonus;
            rationale.push("symptoms persisting".to_string());
        }
        if symptoms.affected_systems.len() >= 3 {
            score += cfg.multi_system_bonus;
            rationale.push(format!(
                "{} body systems involved",
                symptoms.affected_systems.len()
            ));
        }
        if let Some(species) = symptoms.species.filter(|s| s.is_small_exotic()) {
            score += cfg.small_species_bonus;
            rationale.push(format!("{species} masks illness until late"));
        }

        let mut score = round1(score.clamp(0.0, MAX_SCORE));
        let mut level = cfg.level_for(score);

        let emergencies: Vec<_> = symptoms.emergency_cues().collect();
        let floor = match emergencies.len() {
            0 => UrgencyLevel::Green,
            1 => UrgencyLevel::Orange,
            _ => UrgencyLevel::Red,
        };
        if floor > level {
            level = floor;
            score = score.max(cfg.floor_for(level));
            rationale.push(format!("emergency signs raise urgency to {level}"));
        }

        TriageData {
            level,
            risk: level.risk(),
            score,
            vet_visit_window: level.vet_visit_window().to_string(),
            rationale,
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[async_trait]
impl TriageStage for TriageScoringStage {
    fn stage(&self) -> PipelineStage {
        PipelineStage::TriageScoring
    }

    async fn run(&self, ctx: &AnalysisContext, _original_input: &str) -> StageOutput {
        let result = require(ctx.symptom_data(), "symptom_data").and_then(|symptoms| {
            let medical = require(ctx.medical_data(), "medical_data")?;
            let data = self.score(symptoms, medical);
            debug!(level = %data.level, score = data.score, "Urgency scored");
            Ok(data)
        });
        finish(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BodySystem, ConditionCandidate, ConditionSeverity, SeverityCue, Species};
    use crate::testing::fixtures;

    fn medical(severity: ConditionSeverity, confidence: f64) -> MedicalData {
        MedicalData::from_ranked(vec![ConditionCandidate::new(
            "Test condition",
            BodySystem::General,
            severity,
            confidence,
        )])
        .unwrap()
    }

    #[test]
    fn test_sample_scores_yellow() {
        let data = TriageScoringStage::default()
            .score(&fixtures::symptom_data(), &fixtures::medical_data());

        assert_eq!(data.level, UrgencyLevel::Yellow);
        assert!((data.score - 2.1).abs() < 1e-9);
        assert_eq!(data.vet_visit_window, "see a vet within 24-48 hours");
    }

    #[test]
    fn test_deterministic() {
        let stage = TriageScoringStage::default();
        let a = stage.score(&fixtures::symptom_data(), &fixtures::medical_data());
        let b = stage.score(&fixtures::symptom_data(), &fixtures::medical_data());
        assert_eq!(a, b);
    }

    #[test]
    fn test_mild_condition_is_green() {
        let symptoms = SymptomData {
            species: Some(Species::Cat),
            symptoms: vec!["sneezing".to_string()],
            affected_systems: [BodySystem::Respiratory].into_iter().collect(),
            ..Default::default()
        };
        let data = TriageScoringStage::default()
            .score(&symptoms, &medical(ConditionSeverity::Mild, 0.4));

        assert_eq!(data.level, UrgencyLevel::Green);
        assert!((data.score - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_single_emergency_cue_forces_orange() {
        let symptoms = SymptomData {
            symptoms: vec!["seizure".to_string()],
            severity_cues: [SeverityCue::Seizure].into_iter().collect(),
            ..Default::default()
        };
        let data = TriageScoringStage::default()
            .score(&symptoms, &medical(ConditionSeverity::Mild, 0.2));

        // 0.6 base + 1.2 cue = 1.8, raised to the orange floor.
        assert_eq!(data.level, UrgencyLevel::Orange);
        assert!((data.score - 3.0).abs() < 1e-9);
        assert!(data.rationale.iter().any(|r| r.contains("emergency")));
    }

    #[test]
    fn test_two_emergency_cues_force_red() {
        let symptoms = SymptomData {
            symptoms: vec!["collapse".to_string(), "pale gums".to_string()],
            severity_cues: [SeverityCue::Collapse, SeverityCue::PaleGums].into_iter().collect(),
            ..Default::default()
        };
        let data = TriageScoringStage::default()
            .score(&symptoms, &medical(ConditionSeverity::Mild, 0.2));

        assert_eq!(data.level, UrgencyLevel::Red);
        assert!(data.score >= 4.0);
    }

    #[test]
    fn test_score_clamped() {
        let symptoms = SymptomData {
            species: Some(Species::Rabbit),
            symptoms: vec!["a".to_string()],
            affected_systems: [
                BodySystem::Gastrointestinal,
                BodySystem::Respiratory,
                BodySystem::Neurological,
            ]
            .into_iter()
            .collect(),
            severity_cues: [SeverityCue::Collapse, SeverityCue::Seizure].into_iter().collect(),
            ..Default::default()
        };
        let data = TriageScoringStage::default()
            .score(&symptoms, &medical(ConditionSeverity::Critical, 0.95));

        assert!((data.score - 5.0).abs() < 1e-9);
        assert_eq!(data.level, UrgencyLevel::Red);
    }

    #[tokio::test]
    async fn test_stage_requires_medical_data() {
        let ctx = fixtures::context_at(PipelineStage::MedicalAnalysis, false);
        let output = TriageScoringStage::default().run(&ctx, "").await;
        assert_eq!(output.failure_reason(), Some("medical_data is not available"));
    }
}
