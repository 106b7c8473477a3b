//! Image analysis collaborator.

use crate::domain::{BodySystem, VisualFinding};
use crate::errors::PortError;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// Analyses one image reference.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageAnalyzer: Send + Sync {
    /// Returns the findings for `image_ref`. An image with nothing notable
    /// still yields at least one finding describing that.
    async fn analyze(&self, image_ref: &str) -> Result<Vec<VisualFinding>, PortError>;
}

/// Short stable identifier for an image reference: the first 12 hex
/// characters of its SHA-256 digest.
#[must_use]
pub fn image_fingerprint(image_ref: &str) -> String {
    let digest = Sha256::digest(image_ref.as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(12);
    id
}

const KEYWORD_CONFIDENCE: f64 = 0.35;
const NOTHING_FOUND_CONFIDENCE: f64 = 0.1;

/// (token prefixes, label, body system)
const IMAGE_KEYWORDS: &[(&[&str], &str, BodySystem)] = &[
    (&["vomit", "puke"], "vomitus present", BodySystem::Gastrointestinal),
    (
        &["diarrh", "stool", "poop", "feces", "faeces"],
        "abnormal stool",
        BodySystem::Gastrointestinal,
    ),
    (
        &["wound", "cut", "bite", "bleed", "blood"],
        "open wound or bleeding",
        BodySystem::Dermatological,
    ),
    (&["rash", "skin", "hotspot", "hair", "fur"], "skin lesion", BodySystem::Dermatological),
    (&["eye"], "ocular discharge or redness", BodySystem::Ocular),
    (&["ear"], "ear canal inflammation", BodySystem::Otic),
    (&["gum", "teeth", "tooth", "mouth"], "oral abnormality", BodySystem::Dental),
    (&["urine", "pee"], "abnormal urine", BodySystem::Urinary),
    (&["limp", "leg", "paw"], "limb abnormality", BodySystem::Musculoskeletal),
    (&["swell", "swollen", "lump", "mass"], "swelling", BodySystem::General),
];

/// Offline analyzer that reads hints from the reference name itself.
///
/// A reference such as `uploads/dog-vomit-1.jpg` yields a low-confidence
/// gastrointestinal finding. References with no recognisable hint yield a
/// single "no visible abnormality detected" finding.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordImageAnalyzer;

impl KeywordImageAnalyzer {
    /// Creates the analyzer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn tokens(image_ref: &str) -> Vec<String> {
        let name = image_ref.rsplit('/').next().unwrap_or(image_ref);
        let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
        stem.to_lowercase()
            .split(|c: char| !c.is_ascii_alphabetic())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
impl ImageAnalyzer for KeywordImageAnalyzer {
    async fn analyze(&self, image_ref: &str) -> Result<Vec<VisualFinding>, PortError> {
        let trimmed = image_ref.trim();
        if trimmed.is_empty() {
            return Err(PortError::InvalidInput("image reference is blank".to_string()));
        }

        let image_id = image_fingerprint(trimmed);
        let tokens = Self::tokens(trimmed);

        let mut findings: Vec<VisualFinding> = IMAGE_KEYWORDS
            .iter()
            .filter(|(prefixes, _, _)| {
                tokens
                    .iter()
                    .any(|t| prefixes.iter().any(|p| t.starts_with(p)))
            })
            .map(|(_, label, system)| VisualFinding {
                image_ref: trimmed.to_string(),
                image_id: image_id.clone(),
                label: (*label).to_string(),
                body_system: Some(*system),
                confidence: KEYWORD_CONFIDENCE,
            })
            .collect();

        if findings.is_empty() {
            findings.push(VisualFinding {
                image_ref: trimmed.to_string(),
                image_id,
                label: "no visible abnormality detected".to_string(),
                body_system: None,
                confidence: NOTHING_FOUND_CONFIDENCE,
            });
        }

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_fingerprint_is_stable() {
        let a = image_fingerprint("uploads/cat.jpg");
        assert_eq!(a.len(), 12);
        assert_eq!(a, image_fingerprint("uploads/cat.jpg"));
        assert_ne!(a, image_fingerprint("uploads/dog.jpg"));
    }

    #[tokio::test]
    async fn test_keyword_finding() {
        let findings = KeywordImageAnalyzer::new()
            .analyze("uploads/dog-vomit-1.jpg")
            .await
            .unwrap();

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].label, "vomitus present");
        assert_eq!(findings[0].body_system, Some(BodySystem::Gastrointestinal));
    }

    #[tokio::test]
    async fn test_directory_names_ignored() {
        let findings = KeywordImageAnalyzer::new()
            .analyze("wounds/IMG_0042.png")
            .await
            .unwrap();

        assert_eq!(findings.len(), 1);
        assert!(findings[0].body_system.is_none());
        assert_eq!(findings[0].label, "no visible abnormality detected");
    }

    #[tokio::test]
    async fn test_blank_reference_rejected() {
        let err = KeywordImageAnalyzer::new().analyze("   ").await.unwrap_err();
        assert!(matches!(err, PortError::InvalidInput(_)));
    }
}
