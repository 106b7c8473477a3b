//! Result types produced by the pipeline stages.

mod careplan;
mod medical;
mod report;
mod symptom;
mod triage;
mod vision;

pub use careplan::CarePlanData;
pub use medical::{ConditionCandidate, ConditionSeverity, MedicalData};
pub use report::{OwnerSheet, TriageReport};
pub use symptom::{BodySystem, SeverityCue, Species, SymptomData, SymptomDuration};
pub use triage::{RiskLevel, TriageData, UrgencyLevel};
pub use vision::{VisionData, VisualFinding};
