//! Urgency assessment results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordinal urgency scale, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    /// Monitor at home.
    Green,
    /// See a vet within a day or two.
    Yellow,
    /// See a vet today.
    Orange,
    /// Emergency care now.
    Red,
}

impl UrgencyLevel {
    /// Returns the risk label paired with this level.
    #[must_use]
    pub fn risk(self) -> RiskLevel {
        match self {
            Self::Green => RiskLevel::Low,
            Self::Yellow => RiskLevel::Moderate,
            Self::Orange => RiskLevel::High,
            Self::Red => RiskLevel::Critical,
        }
    }

    /// When the animal should be seen by a veterinarian.
    #[must_use]
    pub fn vet_visit_window(self) -> &'static str {
        match self {
            Self::Green => "monitor at home; see a vet if not improving within 2-3 days",
            Self::Yellow => "see a vet within 24-48 hours",
            Self::Orange => "see a vet today",
            Self::Red => "go to an emergency clinic immediately",
        }
    }

    /// Returns the snake_case name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Orange => "orange",
            Self::Red => "red",
        }
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owner-facing risk label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// Low risk.
    Low,
    /// Moderate risk.
    Moderate,
    /// High risk.
    High,
    /// Critical risk.
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Moderate => write!(f, "moderate"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Urgency level and score for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageData {
    /// Ordinal urgency.
    pub level: UrgencyLevel,
    /// Risk label derived from the level.
    pub risk: RiskLevel,
    /// Numeric score in `0.0..=5.0`, one decimal.
    pub score: f64,
    /// When to see a vet.
    pub vet_visit_window: String,
    /// How the score was reached.
    #[serde(default)]
    pub rationale: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_order() {
        assert!(UrgencyLevel::Red > UrgencyLevel::Orange);
        assert!(UrgencyLevel::Yellow > UrgencyLevel::Green);
        assert_eq!(UrgencyLevel::Orange.max(UrgencyLevel::Yellow), UrgencyLevel::Orange);
    }

    #[test]
    fn test_level_risk() {
        assert_eq!(UrgencyLevel::Green.risk(), RiskLevel::Low);
        assert_eq!(UrgencyLevel::Red.risk(), RiskLevel::Critical);
        assert_eq!(RiskLevel::Moderate.to_string(), "moderate");
    }

    #[test]
    fn test_level_serialize() {
        assert_eq!(serde_json::to_string(&UrgencyLevel::Orange).unwrap(), r#""orange""#);
    }
}
