//! Collaborator contracts used by the analysis stages.
//!
//! Stages never talk to a knowledge base or an image model directly. They
//! go through these traits so that hosts can plug in real backends while
//! the crate ships deterministic offline defaults.

mod knowledge;
mod vision;

pub use knowledge::{KnowledgeQuery, MedicalKnowledge, RuleBasedKnowledge};
pub use vision::{image_fingerprint, ImageAnalyzer, KeywordImageAnalyzer};

#[cfg(test)]
pub use knowledge::MockMedicalKnowledge;
#[cfg(test)]
pub use vision::MockImageAnalyzer;
