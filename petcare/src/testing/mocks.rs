//! Mock stages for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::context::AnalysisContext;
use crate::core::{PipelineStage, StageOutput};
use crate::stages::TriageStage;

/// Returns a configurable output and counts calls.
#[derive(Debug)]
pub struct ScriptedStage {
    stage: PipelineStage,
    output: Mutex<StageOutput>,
    call_count: Mutex<usize>,
    inputs: Mutex<Vec<String>>,
}

impl ScriptedStage {
    /// Creates a scripted stage returning `output`.
    #[must_use]
    pub fn new(stage: PipelineStage, output: StageOutput) -> Self {
        Self {
            stage,
            output: Mutex::new(output),
            call_count: Mutex::new(0),
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// Creates a scripted stage returning the sample value for `stage`.
    #[must_use]
    pub fn sample(stage: PipelineStage) -> Self {
        let output = super::fixtures::value_for(stage)
            .map_or_else(|| StageOutput::fail("no sample value"), StageOutput::ok);
        Self::new(stage, output)
    }

    /// Sets the output to return.
    pub fn set_output(&self, output: StageOutput) {
        *self.output.lock() = output;
    }

    /// Returns the number of times the stage was called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.call_count.lock()
    }

    /// Returns the `original_input` of each call.
    #[must_use]
    pub fn recorded_inputs(&self) -> Vec<String> {
        self.inputs.lock().clone()
    }
}

#[async_trait]
impl TriageStage for ScriptedStage {
    fn stage(&self) -> PipelineStage {
        self.stage
    }

    async fn run(&self, _ctx: &AnalysisContext, original_input: &str) -> StageOutput {
        *self.call_count.lock() += 1;
        self.inputs.lock().push(original_input.to_string());
        self.output.lock().clone()
    }
}

/// Always fails with a fixed reason.
#[derive(Debug, Clone)]
pub struct FailingStage {
    stage: PipelineStage,
    reason: String,
}

impl FailingStage {
    /// Creates a failing stage.
    #[must_use]
    pub fn new(stage: PipelineStage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl TriageStage for FailingStage {
    fn stage(&self) -> PipelineStage {
        self.stage
    }

    async fn run(&self, _ctx: &AnalysisContext, _original_input: &str) -> StageOutput {
        StageOutput::fail(self.reason.clone())
    }
}

/// Shared log of executed stages.
pub type ExecutionLog = Arc<Mutex<Vec<PipelineStage>>>;

/// Wraps a stage and appends its position to a shared log on every call.
#[derive(Debug)]
pub struct RecordingStage {
    inner: Arc<dyn TriageStage>,
    log: ExecutionLog,
}

impl RecordingStage {
    /// Wraps `inner`, logging into `log`.
    #[must_use]
    pub fn new(inner: Arc<dyn TriageStage>, log: ExecutionLog) -> Self {
        Self { inner, log }
    }
}

#[async_trait]
impl TriageStage for RecordingStage {
    fn stage(&self) -> PipelineStage {
        self.inner.stage()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn run(&self, ctx: &AnalysisContext, original_input: &str) -> StageOutput {
        self.log.lock().push(self.inner.stage());
        self.inner.run(ctx, original_input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_scripted_stage_counts_calls() {
        let stage = ScriptedStage::sample(PipelineStage::SymptomIntake);
        let ctx = fixtures::fresh_context(false);

        assert!(stage.run(&ctx, "first").await.is_success());
        stage.set_output(StageOutput::fail("second time unlucky"));
        assert!(stage.run(&ctx, "second").await.is_failure());

        assert_eq!(stage.call_count(), 2);
        assert_eq!(stage.recorded_inputs(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_recording_stage() {
        let log = ExecutionLog::default();
        let stage = RecordingStage::new(
            Arc::new(FailingStage::new(PipelineStage::TriageScoring, "nope")),
            log.clone(),
        );

        let output = stage.run(&fixtures::fresh_context(false), "").await;

        assert_eq!(output.failure_reason(), Some("nope"));
        assert_eq!(*log.lock(), vec![PipelineStage::TriageScoring]);
    }
}
