//! Home-care recommendations.

use serde::{Deserialize, Serialize};

/// What the owner should do, avoid and watch for.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CarePlanData {
    /// Actions to take now.
    pub immediate_home_actions: Vec<String>,
    /// Contraindicated actions.
    pub things_to_avoid: Vec<String>,
    /// Signs to monitor.
    pub monitoring_guide: Vec<String>,
    /// When to see a vet.
    pub vet_visit_window: String,
    /// Short prose guide.
    pub care_guide: String,
}
