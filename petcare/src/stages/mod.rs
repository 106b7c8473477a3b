//! The stage contract and the rule-based stage implementations.
//!
//! Each stage reads the fields it needs from the [`AnalysisContext`] plus
//! the original free text, and produces exactly one [`StageValue`]. Stages
//! never write to the context; the driver commits their output.

mod careplan;
mod intake;
mod medical;
mod report;
mod scoring;
mod vision;

pub use careplan::{build_care_plan, CarePlanStage};
pub use intake::SymptomIntakeStage;
pub use medical::MedicalAnalysisStage;
pub use report::ReportAssemblyStage;
pub use scoring::TriageScoringStage;
pub use vision::VisionAnalysisStage;

use crate::context::AnalysisContext;
use crate::core::{PipelineStage, StageOutput, StageValue};
use async_trait::async_trait;
use std::fmt::Debug;

/// One unit of analysis in the fixed pipeline.
#[async_trait]
pub trait TriageStage: Send + Sync + Debug {
    /// The pipeline position this stage fills.
    fn stage(&self) -> PipelineStage;

    /// Name used in logs and events.
    fn name(&self) -> &str {
        self.stage().as_str()
    }

    /// Runs the stage.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The analysis context, read-only
    /// * `original_input` - The caller's original free text
    ///
    /// # Returns
    ///
    /// `ok` with this stage's value, or `failed` with a reason.
    async fn run(&self, ctx: &AnalysisContext, original_input: &str) -> StageOutput;
}

/// A stage backed by a closure.
pub struct FnStage<F>
where
    F: Fn(&AnalysisContext, &str) -> StageOutput + Send + Sync,
{
    stage: PipelineStage,
    name: String,
    func: F,
}

impl<F> FnStage<F>
where
    F: Fn(&AnalysisContext, &str) -> StageOutput + Send + Sync,
{
    /// Creates a closure-backed stage for `stage`.
    pub fn new(stage: PipelineStage, func: F) -> Self {
        Self {
            stage,
            name: stage.as_str().to_string(),
            func,
        }
    }

    /// Overrides the name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<F> Debug for FnStage<F>
where
    F: Fn(&AnalysisContext, &str) -> StageOutput + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage")
            .field("stage", &self.stage)
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl<F> TriageStage for FnStage<F>
where
    F: Fn(&AnalysisContext, &str) -> StageOutput + Send + Sync,
{
    fn stage(&self) -> PipelineStage {
        self.stage
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &AnalysisContext, original_input: &str) -> StageOutput {
        (self.func)(ctx, original_input)
    }
}

/// Converts a stage body's result into a stage output.
pub(crate) fn finish<T: Into<StageValue>>(result: Result<T, String>) -> StageOutput {
    match result {
        Ok(value) => StageOutput::ok(value),
        Err(reason) => StageOutput::fail(reason),
    }
}

/// Reads a prerequisite field or explains which one is missing.
pub(crate) fn require<'a, T>(field: Option<&'a T>, name: &str) -> Result<&'a T, String> {
    field.ok_or_else(|| format!("{name} is not available"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_fn_stage() {
        let stage = FnStage::new(PipelineStage::SymptomIntake, |ctx, _| {
            if ctx.user_input().contains("dog") {
                StageOutput::ok(fixtures::symptom_data())
            } else {
                StageOutput::fail("no dog")
            }
        })
        .with_name("dog_only_intake");

        assert_eq!(stage.name(), "dog_only_intake");
        assert_eq!(stage.stage(), PipelineStage::SymptomIntake);

        let ctx = fixtures::fresh_context(false);
        assert!(stage.run(&ctx, fixtures::SAMPLE_INPUT).await.is_success());

        let other = AnalysisContext::new("my cat sneezes", Vec::new());
        assert!(stage.run(&other, "my cat sneezes").await.is_failure());
    }

    #[test]
    fn test_require() {
        let data = fixtures::symptom_data();
        assert!(require(Some(&data), "symptom_data").is_ok());
        assert_eq!(
            require::<u8>(None, "medical_data").unwrap_err(),
            "medical_data is not available"
        );
    }
}
