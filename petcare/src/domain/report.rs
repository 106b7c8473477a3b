//! The final user-facing triage report.
//!
//! Field names follow the wire shape the question-answering service reads
//! (`diagnosis`, `riskLevel`, `triage_level`, `triage_score`, `actions`,
//! `ownerSheet`, `careGuide`).

use super::{RiskLevel, Species, UrgencyLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Owner-facing checklist.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OwnerSheet {
    /// Actions to take now.
    pub immediate_home_actions: Vec<String>,
    /// Contraindicated actions.
    pub things_to_avoid: Vec<String>,
    /// Signs to monitor.
    pub monitoring_guide: Vec<String>,
}

/// The assembled report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageReport {
    /// Primary diagnosis label.
    pub diagnosis: String,
    /// Owner-facing risk level.
    #[serde(rename = "riskLevel")]
    pub risk_level: RiskLevel,
    /// Ordinal urgency level.
    pub triage_level: UrgencyLevel,
    /// Numeric urgency score out of 5.
    pub triage_score: f64,
    /// Recommended immediate actions.
    pub actions: Vec<String>,
    /// Owner checklist.
    #[serde(rename = "ownerSheet")]
    pub owner_sheet: OwnerSheet,
    /// Prose care guide.
    #[serde(rename = "careGuide")]
    pub care_guide: String,
    /// Species, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<Species>,
    /// Other conditions considered.
    #[serde(default)]
    pub differentials: Vec<String>,
    /// Labels of abnormal visual findings.
    #[serde(default)]
    pub visual_findings: Vec<String>,
    /// When to see a vet.
    pub vet_visit_window: String,
    /// The request this report belongs to.
    pub request_id: Uuid,
    /// When the report was assembled.
    pub generated_at: DateTime<Utc>,
}

impl TriageReport {
    /// Contraindicated actions.
    #[must_use]
    pub fn things_to_avoid(&self) -> &[String] {
        &self.owner_sheet.things_to_avoid
    }

    /// Monitoring guide.
    #[must_use]
    pub fn monitoring_guide(&self) -> &[String] {
        &self.owner_sheet.monitoring_guide
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::fixtures;

    #[test]
    fn test_report_wire_names() {
        let report = fixtures::report();
        let json = serde_json::to_value(&report).unwrap();

        for key in [
            "diagnosis",
            "riskLevel",
            "triage_level",
            "triage_score",
            "actions",
            "ownerSheet",
            "careGuide",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(
            json["ownerSheet"]["things_to_avoid"],
            serde_json::json!(report.things_to_avoid())
        );
        assert_eq!(
            json["ownerSheet"]["monitoring_guide"],
            serde_json::json!(report.monitoring_guide())
        );
    }
}
