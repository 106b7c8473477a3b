//! Image analysis results.

use super::BodySystem;
use serde::{Deserialize, Serialize};

/// One finding derived from one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualFinding {
    /// The image reference the finding came from.
    pub image_ref: String,
    /// Stable short identifier of the image reference.
    pub image_id: String,
    /// What was seen.
    pub label: String,
    /// The body system involved, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_system: Option<BodySystem>,
    /// Confidence in `0.0..=1.0`.
    pub confidence: f64,
}

/// Visual findings across all supplied images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionData {
    /// Number of images analysed.
    pub images_analyzed: usize,
    /// Findings, in image order.
    pub findings: Vec<VisualFinding>,
    /// One-line summary.
    pub summary: String,
}

impl VisionData {
    /// Returns the labels of findings that point at a body system.
    #[must_use]
    pub fn abnormal_labels(&self) -> Vec<String> {
        self.findings
            .iter()
            .filter(|f| f.body_system.is_some())
            .map(|f| f.label.clone())
            .collect()
    }
}
