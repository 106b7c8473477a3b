//! Medical knowledge collaborator.

use crate::domain::{
    BodySystem, ConditionCandidate, ConditionSeverity, SeverityCue, Species, SymptomData,
    VisionData, VisualFinding,
};
use crate::errors::PortError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Everything known about the animal when medical analysis runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeQuery {
    /// Species, if identified.
    pub species: Option<Species>,
    /// Canonical symptom names.
    pub symptoms: Vec<String>,
    /// Affected body systems.
    pub systems: BTreeSet<BodySystem>,
    /// Severity cues.
    pub cues: BTreeSet<SeverityCue>,
    /// Visual findings, empty when no images were supplied.
    pub visual_findings: Vec<VisualFinding>,
    /// The original free-text description.
    pub text: String,
}

impl KnowledgeQuery {
    /// Builds a query from intake output and optional vision output.
    #[must_use]
    pub fn from_symptoms(
        symptoms: &SymptomData,
        vision: Option<&VisionData>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            species: symptoms.species,
            symptoms: symptoms.symptoms.clone(),
            systems: symptoms.affected_systems.clone(),
            cues: symptoms.severity_cues.clone(),
            visual_findings: vision.map(|v| v.findings.clone()).unwrap_or_default(),
            text: text.into(),
        }
    }

    fn finding_systems(&self) -> BTreeSet<BodySystem> {
        self.visual_findings
            .iter()
            .filter_map(|f| f.body_system)
            .collect()
    }
}

/// Maps symptoms to plausible conditions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MedicalKnowledge: Send + Sync {
    /// Returns candidate conditions in no particular order.
    async fn lookup(&self, query: &KnowledgeQuery) -> Result<Vec<ConditionCandidate>, PortError>;
}

struct ConditionRule {
    name: &'static str,
    system: BodySystem,
    severity: ConditionSeverity,
    keywords: &'static [&'static str],
    cues: &'static [SeverityCue],
    species: &'static [Species],
}

impl ConditionRule {
    fn allows(&self, species: Option<Species>) -> bool {
        match species {
            Some(s) if !self.species.is_empty() => self.species.contains(&s),
            _ => true,
        }
    }
}

const CONDITIONS: &[ConditionRule] = &[
    ConditionRule {
        name: "Acute gastroenteritis",
        system: BodySystem::Gastrointestinal,
        severity: ConditionSeverity::Moderate,
        keywords: &["vomiting", "diarrhea", "loss of appetite", "lethargy"],
        cues: &[SeverityCue::RepeatedVomiting, SeverityCue::NotEating],
        species: &[],
    },
    ConditionRule {
        name: "Gastrointestinal foreign body",
        system: BodySystem::Gastrointestinal,
        severity: ConditionSeverity::Serious,
        keywords: &["vomiting", "loss of appetite", "retching", "lethargy"],
        cues: &[SeverityCue::RepeatedVomiting],
        species: &[],
    },
    ConditionRule {
        name: "Gastric dilatation-volvulus",
        system: BodySystem::Gastrointestinal,
        severity: ConditionSeverity::Critical,
        keywords: &["bloated abdomen", "retching", "drooling", "collapse"],
        cues: &[SeverityCue::AbdominalDistension, SeverityCue::Collapse],
        species: &[Species::Dog],
    },
    ConditionRule {
        name: "Toxin ingestion",
        system: BodySystem::Gastrointestinal,
        severity: ConditionSeverity::Critical,
        keywords: &["suspected poisoning", "vomiting", "drooling", "trembling", "seizure"],
        cues: &[SeverityCue::ToxinExposure, SeverityCue::Seizure],
        species: &[],
    },
    ConditionRule {
        name: "Gastrointestinal stasis",
        system: BodySystem::Gastrointestinal,
        severity: ConditionSeverity::Serious,
        keywords: &["reduced droppings", "loss of appetite", "bloated abdomen", "lethargy"],
        cues: &[SeverityCue::NotEating],
        species: &[Species::Rabbit, Species::GuineaPig],
    },
    ConditionRule {
        name: "Upper respiratory infection",
        system: BodySystem::Respiratory,
        severity: ConditionSeverity::Mild,
        keywords: &["sneezing", "nasal discharge", "coughing", "eye discharge"],
        cues: &[],
        species: &[],
    },
    ConditionRule {
        name: "Respiratory distress",
        system: BodySystem::Respiratory,
        severity: ConditionSeverity::Critical,
        keywords: &["breathing difficulty", "coughing", "panting", "pale gums"],
        cues: &[SeverityCue::BreathingDifficulty, SeverityCue::PaleGums],
        species: &[],
    },
    ConditionRule {
        name: "Urethral obstruction",
        system: BodySystem::Urinary,
        severity: ConditionSeverity::Critical,
        keywords: &["straining to urinate", "blood in urine", "vomiting", "lethargy"],
        cues: &[SeverityCue::UrinaryBlockage],
        species: &[Species::Cat, Species::Dog],
    },
    ConditionRule {
        name: "Urinary tract infection",
        system: BodySystem::Urinary,
        severity: ConditionSeverity::Moderate,
        keywords: &[
            "frequent urination",
            "blood in urine",
            "straining to urinate",
            "excessive thirst",
        ],
        cues: &[],
        species: &[],
    },
    ConditionRule {
        name: "Allergic dermatitis",
        system: BodySystem::Dermatological,
        severity: ConditionSeverity::Mild,
        keywords: &["itching", "hair loss", "skin redness"],
        cues: &[],
        species: &[],
    },
    ConditionRule {
        name: "Bleeding wound",
        system: BodySystem::Dermatological,
        severity: ConditionSeverity::Serious,
        keywords: &["wound", "bleeding"],
        cues: &[SeverityCue::Bleeding, SeverityCue::Trauma],
        species: &[],
    },
    ConditionRule {
        name: "Otitis externa",
        system: BodySystem::Otic,
        severity: ConditionSeverity::Mild,
        keywords: &["ear discomfort", "itching"],
        cues: &[],
        species: &[Species::Dog, Species::Cat, Species::Rabbit, Species::Ferret],
    },
    ConditionRule {
        name: "Conjunctivitis",
        system: BodySystem::Ocular,
        severity: ConditionSeverity::Mild,
        keywords: &["eye discharge"],
        cues: &[],
        species: &[],
    },
    ConditionRule {
        name: "Soft tissue or limb injury",
        system: BodySystem::Musculoskeletal,
        severity: ConditionSeverity::Moderate,
        keywords: &["limping", "swelling", "injury"],
        cues: &[SeverityCue::Trauma],
        species: &[],
    },
    ConditionRule {
        name: "Seizure disorder",
        system: BodySystem::Neurological,
        severity: ConditionSeverity::Serious,
        keywords: &["seizure", "trembling", "collapse"],
        cues: &[SeverityCue::Seizure, SeverityCue::Collapse],
        species: &[],
    },
    ConditionRule {
        name: "Dental disease",
        system: BodySystem::Dental,
        severity: ConditionSeverity::Mild,
        keywords: &["bad breath", "dental pain", "drooling", "loss of appetite"],
        cues: &[],
        species: &[],
    },
    ConditionRule {
        name: "Heatstroke",
        system: BodySystem::General,
        severity: ConditionSeverity::Critical,
        keywords: &["overheating", "panting", "collapse", "drooling"],
        cues: &[SeverityCue::Collapse, SeverityCue::BreathingDifficulty],
        species: &[],
    },
    ConditionRule {
        name: "Anaemia or internal bleeding",
        system: BodySystem::Cardiovascular,
        severity: ConditionSeverity::Critical,
        keywords: &["pale gums", "collapse", "lethargy"],
        cues: &[SeverityCue::PaleGums, SeverityCue::Collapse],
        species: &[],
    },
];

const KEYWORD_WEIGHT: f64 = 0.6;
const CUE_WEIGHT: f64 = 0.15;
const CUE_CAP: f64 = 0.3;
const SYSTEM_BONUS: f64 = 0.1;
const FINDING_BONUS: f64 = 0.1;
const MAX_CONFIDENCE: f64 = 0.95;

/// Offline knowledge source backed by a built-in condition table.
///
/// A condition is considered when at least one of its keywords matches and
/// its body system is involved (through symptoms, a severity cue it lists,
/// or a visual finding). When nothing qualifies a single low-confidence
/// "Non-specific illness" candidate is returned.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedKnowledge;

impl RuleBasedKnowledge {
    /// Creates the knowledge source.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn score(rule: &ConditionRule, query: &KnowledgeQuery) -> Option<ConditionCandidate> {
        if !rule.allows(query.species) {
            return None;
        }

        let evidence: Vec<String> = rule
            .keywords
            .iter()
            .filter(|k| query.symptoms.iter().any(|s| s == *k))
            .map(|k| (*k).to_string())
            .collect();
        if evidence.is_empty() {
            return None;
        }

        let cue_hits = rule.cues.iter().filter(|c| query.cues.contains(*c)).count();
        let system_hit = query.systems.contains(&rule.system);
        let finding_hit = query.finding_systems().contains(&rule.system);
        if !(system_hit || finding_hit || cue_hits > 0) {
            return None;
        }

        let needed = rule.keywords.len().min(3);
        #[allow(clippy::cast_precision_loss)]
        let keyword_score = (evidence.len().min(needed) as f64 / needed as f64) * KEYWORD_WEIGHT;
        #[allow(clippy::cast_precision_loss)]
        let cue_score = (cue_hits as f64 * CUE_WEIGHT).min(CUE_CAP);

        let mut confidence = keyword_score + cue_score;
        if system_hit {
            confidence += SYSTEM_BONUS;
        }
        if finding_hit {
            confidence += FINDING_BONUS;
        }

        let confidence = round2(confidence.min(MAX_CONFIDENCE));
        Some(
            ConditionCandidate::new(rule.name, rule.system, rule.severity, confidence)
                .with_evidence(evidence),
        )
    }

    fn fallback(query: &KnowledgeQuery) -> ConditionCandidate {
        ConditionCandidate::new(
            "Non-specific illness",
            BodySystem::General,
            ConditionSeverity::Mild,
            0.2,
        )
        .with_evidence(query.symptoms.clone())
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[async_trait]
impl MedicalKnowledge for RuleBasedKnowledge {
    async fn lookup(&self, query: &KnowledgeQuery) -> Result<Vec<ConditionCandidate>, PortError> {
        if query.symptoms.is_empty() {
            return Err(PortError::InvalidInput("query has no symptoms".to_string()));
        }

        let mut candidates: Vec<ConditionCandidate> = CONDITIONS
            .iter()
            .filter_map(|rule| Self::score(rule, query))
            .collect();
        if candidates.is_empty() {
            candidates.push(Self::fallback(query));
        }
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    fn query(
        species: Option<Species>,
        symptoms: &[&str],
        systems: &[BodySystem],
    ) -> KnowledgeQuery {
        KnowledgeQuery {
            species,
            symptoms: symptoms.iter().map(|s| (*s).to_string()).collect(),
            systems: systems.iter().copied().collect(),
            ..Default::default()
        }
    }

    fn find<'a>(
        candidates: &'a [ConditionCandidate],
        name: &str,
    ) -> Option<&'a ConditionCandidate> {
        candidates.iter().find(|c| c.name == name)
    }

    #[tokio::test]
    async fn test_gastro_sample() {
        let q = KnowledgeQuery::from_symptoms(
            &fixtures::symptom_data(),
            None,
            fixtures::SAMPLE_INPUT,
        );
        let candidates = RuleBasedKnowledge::new().lookup(&q).await.unwrap();

        let gastro = find(&candidates, "Acute gastroenteritis").unwrap();
        assert!((gastro.confidence - 0.5).abs() < 1e-9);
        assert_eq!(gastro.evidence, vec!["vomiting", "lethargy"]);

        assert!(find(&candidates, "Gastrointestinal foreign body").is_some());
        // Urinary system not involved and no blockage cue.
        assert!(find(&candidates, "Urethral obstruction").is_none());
    }

    #[tokio::test]
    async fn test_species_filter() {
        let q = query(
            Some(Species::Cat),
            &["bloated abdomen", "retching"],
            &[BodySystem::Gastrointestinal],
        );
        let candidates = RuleBasedKnowledge::new().lookup(&q).await.unwrap();
        assert!(find(&candidates, "Gastric dilatation-volvulus").is_none());

        let q = KnowledgeQuery {
            species: Some(Species::Dog),
            ..q
        };
        let candidates = RuleBasedKnowledge::new().lookup(&q).await.unwrap();
        assert!(find(&candidates, "Gastric dilatation-volvulus").is_some());
    }

    #[tokio::test]
    async fn test_cues_raise_confidence() {
        let mut q = query(
            None,
            &["straining to urinate"],
            &[BodySystem::Urinary],
        );
        let without = RuleBasedKnowledge::new().lookup(&q).await.unwrap();
        q.cues.insert(SeverityCue::UrinaryBlockage);
        let with = RuleBasedKnowledge::new().lookup(&q).await.unwrap();

        let a = find(&without, "Urethral obstruction").unwrap().confidence;
        let b = find(&with, "Urethral obstruction").unwrap().confidence;
        assert!(b > a);
    }

    #[tokio::test]
    async fn test_visual_finding_bonus() {
        let symptoms = fixtures::symptom_data();
        let plain = KnowledgeQuery::from_symptoms(&symptoms, None, "");
        let seen = KnowledgeQuery::from_symptoms(&symptoms, Some(&fixtures::vision_data()), "");

        let a = RuleBasedKnowledge::new().lookup(&plain).await.unwrap();
        let b = RuleBasedKnowledge::new().lookup(&seen).await.unwrap();

        let a = find(&a, "Acute gastroenteritis").unwrap().confidence;
        let b = find(&b, "Acute gastroenteritis").unwrap().confidence;
        assert!((b - a - FINDING_BONUS).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_confidence_capped() {
        let mut q = query(
            Some(Species::Dog),
            &["bloated abdomen", "retching", "drooling", "collapse"],
            &[BodySystem::Gastrointestinal],
        );
        q.cues = [SeverityCue::AbdominalDistension, SeverityCue::Collapse]
            .into_iter()
            .collect();
        q.visual_findings = fixtures::vision_data().findings;

        let candidates = RuleBasedKnowledge::new().lookup(&q).await.unwrap();
        let gdv = find(&candidates, "Gastric dilatation-volvulus").unwrap();
        assert!((gdv.confidence - MAX_CONFIDENCE).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_fallback_candidate() {
        let q = query(None, &["swelling"], &[BodySystem::General]);
        let candidates = RuleBasedKnowledge::new().lookup(&q).await.unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "Non-specific illness");
        assert_eq!(candidates[0].severity, ConditionSeverity::Mild);
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let err = RuleBasedKnowledge::new()
            .lookup(&KnowledgeQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::InvalidInput(_)));
    }
}
