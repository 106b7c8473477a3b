//! Medical correlation results.

use super::BodySystem;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How serious a candidate condition is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionSeverity {
    /// Usually resolves with home care.
    Mild,
    /// Needs a vet visit.
    Moderate,
    /// Needs prompt veterinary treatment.
    Serious,
    /// Life-threatening.
    Critical,
}

impl ConditionSeverity {
    /// Base urgency score contributed by this severity.
    #[must_use]
    pub fn base_score(self) -> f64 {
        match self {
            Self::Mild => 1.0,
            Self::Moderate => 2.0,
            Self::Serious => 3.0,
            Self::Critical => 4.0,
        }
    }
}

impl fmt::Display for ConditionSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mild => write!(f, "mild"),
            Self::Moderate => write!(f, "moderate"),
            Self::Serious => write!(f, "serious"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// A condition the knowledge source considers plausible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionCandidate {
    /// Condition name.
    pub name: String,
    /// Primary body system.
    pub system: BodySystem,
    /// Severity class.
    pub severity: ConditionSeverity,
    /// Confidence in `0.0..=1.0`.
    pub confidence: f64,
    /// What matched.
    #[serde(default)]
    pub evidence: Vec<String>,
}

impl ConditionCandidate {
    /// Creates a candidate with no evidence.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        system: BodySystem,
        severity: ConditionSeverity,
        confidence: f64,
    ) -> Self {
        Self {
            name: name.into(),
            system,
            severity,
            confidence,
            evidence: Vec::new(),
        }
    }

    /// Adds evidence strings.
    #[must_use]
    pub fn with_evidence(mut self, evidence: Vec<String>) -> Self {
        self.evidence = evidence;
        self
    }
}

/// Ranked candidate conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalData {
    /// The most likely condition.
    pub primary: ConditionCandidate,
    /// Other candidates, most likely first.
    #[serde(default)]
    pub differentials: Vec<ConditionCandidate>,
    /// Confidence of the primary candidate.
    pub overall_confidence: f64,
}

impl MedicalData {
    /// Builds from a ranked, non-empty candidate list.
    #[must_use]
    pub fn from_ranked(mut ranked: Vec<ConditionCandidate>) -> Option<Self> {
        if ranked.is_empty() {
            return None;
        }
        let primary = ranked.remove(0);
        Some(Self {
            overall_confidence: primary.confidence,
            primary,
            differentials: ranked,
        })
    }

    /// Returns the most severe class among all candidates.
    #[must_use]
    pub fn worst_severity(&self) -> ConditionSeverity {
        self.differentials
            .iter()
            .map(|c| c.severity)
            .fold(self.primary.severity, Ord::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(ConditionSeverity::Critical > ConditionSeverity::Serious);
        assert!(ConditionSeverity::Mild < ConditionSeverity::Moderate);
        assert_eq!(ConditionSeverity::Serious.to_string(), "serious");
    }

    #[test]
    fn test_from_ranked() {
        let data = MedicalData::from_ranked(vec![
            ConditionCandidate::new("A", BodySystem::General, ConditionSeverity::Mild, 0.7),
            ConditionCandidate::new("B", BodySystem::General, ConditionSeverity::Critical, 0.3),
        ])
        .unwrap();

        assert_eq!(data.primary.name, "A");
        assert_eq!(data.differentials.len(), 1);
        assert!((data.overall_confidence - 0.7).abs() < f64::EPSILON);
        assert_eq!(data.worst_severity(), ConditionSeverity::Critical);
    }

    #[test]
    fn test_from_ranked_empty() {
        assert!(MedicalData::from_ranked(Vec::new()).is_none());
    }
}
