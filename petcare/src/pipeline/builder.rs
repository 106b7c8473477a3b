//! Driver builder.

use super::TriageDriver;
use crate::config::TriageConfig;
use crate::core::PipelineStage;
use crate::errors::TriageError;
use crate::events::{self, EventSink};
use crate::ports::{ImageAnalyzer, KeywordImageAnalyzer, MedicalKnowledge, RuleBasedKnowledge};
use crate::stages::{
    CarePlanStage, MedicalAnalysisStage, ReportAssemblyStage, SymptomIntakeStage,
    TriageScoringStage, TriageStage, VisionAnalysisStage,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Builder for [`TriageDriver`].
///
/// Any stage not registered explicitly falls back to the rule-based stage
/// for that position, wired to the configured knowledge base and image
/// analyzer.
#[derive(Default)]
pub struct DriverBuilder {
    stages: BTreeMap<PipelineStage, Arc<dyn TriageStage>>,
    duplicates: Vec<PipelineStage>,
    knowledge: Option<Arc<dyn MedicalKnowledge>>,
    analyzer: Option<Arc<dyn ImageAnalyzer>>,
    sink: Option<Arc<dyn EventSink>>,
    config: TriageConfig,
}

impl DriverBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    #[must_use]
    pub fn with_config(mut self, config: TriageConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a stage for the position it reports.
    #[must_use]
    pub fn with_stage(mut self, stage: Arc<dyn TriageStage>) -> Self {
        let position = stage.stage();
        if self.stages.insert(position, stage).is_some() {
            self.duplicates.push(position);
        }
        self
    }

    /// Sets the knowledge base used by the default medical analysis stage.
    #[must_use]
    pub fn with_knowledge(mut self, knowledge: Arc<dyn MedicalKnowledge>) -> Self {
        self.knowledge = Some(knowledge);
        self
    }

    /// Sets the image analyzer used by the default vision stage.
    #[must_use]
    pub fn with_image_analyzer(mut self, analyzer: Arc<dyn ImageAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    /// Sets the event sink. Defaults to the process-wide sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Builds the driver.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, a stage was
    /// registered twice, or a stage claims the terminal position.
    pub fn build(mut self) -> Result<TriageDriver, TriageError> {
        self.config.validate()?;

        if let Some(stage) = self.duplicates.first() {
            return Err(TriageError::InvalidPipeline(format!(
                "stage '{stage}' registered more than once"
            )));
        }
        if let Some(runner) = self.stages.get(&PipelineStage::Done) {
            return Err(TriageError::InvalidPipeline(format!(
                "stage '{}' registered for the terminal position",
                runner.name()
            )));
        }

        for stage in PipelineStage::ORDER {
            if !self.stages.contains_key(&stage) {
                let runner = default_stage(
                    stage,
                    &self.config,
                    self.knowledge.clone(),
                    self.analyzer.clone(),
                );
                self.stages.insert(stage, runner);
            }
        }

        let sink = self.sink.unwrap_or_else(events::get_event_sink);
        Ok(TriageDriver::from_parts(self.stages, sink, self.config))
    }
}

/// The rule-based stage for `stage`.
pub(crate) fn default_stage(
    stage: PipelineStage,
    config: &TriageConfig,
    knowledge: Option<Arc<dyn MedicalKnowledge>>,
    analyzer: Option<Arc<dyn ImageAnalyzer>>,
) -> Arc<dyn TriageStage> {
    match stage {
        PipelineStage::SymptomIntake => Arc::new(SymptomIntakeStage::new(config.intake.clone())),
        PipelineStage::VisionAnalysis => Arc::new(VisionAnalysisStage::new(
            analyzer.unwrap_or_else(|| Arc::new(KeywordImageAnalyzer::new())),
            config.vision.clone(),
        )),
        PipelineStage::MedicalAnalysis => Arc::new(MedicalAnalysisStage::new(
            knowledge.unwrap_or_else(|| Arc::new(RuleBasedKnowledge::new())),
            config.medical.clone(),
        )),
        PipelineStage::TriageScoring => Arc::new(TriageScoringStage::new(config.scoring.clone())),
        PipelineStage::CarePlanGeneration => Arc::new(CarePlanStage::new()),
        PipelineStage::ReportAssembly | PipelineStage::Done => Arc::new(ReportAssemblyStage::new()),
    }
}
