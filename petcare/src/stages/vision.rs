//! Vision analysis: image references to visual findings.

use super::{finish, TriageStage};
use crate::config::VisionConfig;
use crate::context::AnalysisContext;
use crate::core::{PipelineStage, StageOutput};
use crate::domain::VisionData;
use crate::ports::{ImageAnalyzer, KeywordImageAnalyzer};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Runs every image reference through an [`ImageAnalyzer`].
#[derive(Clone)]
pub struct VisionAnalysisStage {
    analyzer: Arc<dyn ImageAnalyzer>,
    config: VisionConfig,
}

impl VisionAnalysisStage {
    /// Creates the stage.
    #[must_use]
    pub fn new(analyzer: Arc<dyn ImageAnalyzer>, config: VisionConfig) -> Self {
        Self { analyzer, config }
    }

    async fn evaluate(&self, image_refs: &[String]) -> Result<VisionData, String> {
        if image_refs.is_empty() {
            return Err("no image references supplied".to_string());
        }
        if image_refs.len() > self.config.max_images {
            return Err(format!(
                "{} images supplied, at most {} are analysed",
                image_refs.len(),
                self.config.max_images
            ));
        }

        let mut findings = Vec::new();
        for image_ref in image_refs {
            let found = self
                .analyzer
                .analyze(image_ref)
                .await
                .map_err(|e| format!("image analysis failed for '{image_ref}': {e}"))?;
            findings.extend(found);
        }

        let abnormal = findings.iter().filter(|f| f.body_system.is_some()).count();
        let summary = format!(
            "{} image{} analysed; {} abnormal finding{}",
            image_refs.len(),
            plural(image_refs.len()),
            abnormal,
            plural(abnormal),
        );
        debug!(images = image_refs.len(), abnormal, "Images analysed");

        Ok(VisionData {
            images_analyzed: image_refs.len(),
            findings,
            summary,
        })
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

impl Default for VisionAnalysisStage {
    fn default() -> Self {
        Self::new(Arc::new(KeywordImageAnalyzer::new()), VisionConfig::default())
    }
}

impl fmt::Debug for VisionAnalysisStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisionAnalysisStage")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TriageStage for VisionAnalysisStage {
    fn stage(&self) -> PipelineStage {
        PipelineStage::VisionAnalysis
    }

    async fn run(&self, ctx: &AnalysisContext, _original_input: &str) -> StageOutput {
        finish(self.evaluate(ctx.image_refs()).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PortError;
    use crate::ports::MockImageAnalyzer;

    fn refs(names: &[&str]) -> AnalysisContext {
        AnalysisContext::new(
            "limping since yesterday",
            names.iter().map(|n| (*n).to_string()).collect(),
        )
    }

    #[tokio::test]
    async fn test_default_analyzer() {
        let ctx = refs(&["uploads/left-paw.jpg", "uploads/IMG_1.jpg"]);
        let output = VisionAnalysisStage::default().run(&ctx, "").await;

        let (value, _) = output.into_parts();
        let Some(crate::core::StageValue::Vision(data)) = value else {
            panic!("expected vision data");
        };
        assert_eq!(data.images_analyzed, 2);
        assert_eq!(data.findings.len(), 2);
        assert_eq!(data.summary, "2 images analysed; 1 abnormal finding");
    }

    #[tokio::test]
    async fn test_no_images_fails() {
        let output = VisionAnalysisStage::default().run(&refs(&[]), "").await;
        assert!(output.is_failure());
    }

    #[tokio::test]
    async fn test_too_many_images_fails() {
        let stage = VisionAnalysisStage::new(
            Arc::new(KeywordImageAnalyzer::new()),
            VisionConfig { max_images: 1 },
        );
        let output = stage.run(&refs(&["a.jpg", "b.jpg"]), "").await;
        assert!(output.failure_reason().unwrap().contains("at most 1"));
    }

    #[tokio::test]
    async fn test_analyzer_error_fails_stage() {
        let mut analyzer = MockImageAnalyzer::new();
        analyzer
            .expect_analyze()
            .times(1)
            .returning(|_| Err(PortError::Unavailable("vision model offline".to_string())));

        let stage = VisionAnalysisStage::new(Arc::new(analyzer), VisionConfig::default());
        let output = stage.run(&refs(&["a.jpg", "b.jpg"]), "").await;

        assert!(output.failure_reason().unwrap().contains("vision model offline"));
    }
}
