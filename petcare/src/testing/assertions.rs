//! Test assertions for step results and contexts.

use crate::context::AnalysisContext;
use crate::core::{PipelineStage, StepErrorKind, StepResult, StepStatus};

/// Asserts that the step ran `stage` and more stages remain.
pub fn assert_step_in_progress(result: &StepResult, stage: PipelineStage) {
    assert_eq!(
        result.status,
        StepStatus::InProgress,
        "Expected in_progress, got {:?} (error: {:?})",
        result.status,
        result.error
    );
    assert_eq!(result.stage, Some(stage), "Expected stage {stage}");
    assert!(
        result.value.as_ref().is_some_and(|v| v.stage() == stage),
        "Expected a value produced by {stage}"
    );
}

/// Asserts that the step finished the pipeline with a report.
pub fn assert_step_complete(result: &StepResult) {
    assert_eq!(
        result.status,
        StepStatus::Complete,
        "Expected complete, got {:?} (error: {:?})",
        result.status,
        result.error
    );
    assert!(result.report().is_some(), "Expected a report");
}

/// Asserts that the step failed with `kind`.
pub fn assert_step_failed(result: &StepResult, kind: StepErrorKind) {
    assert_eq!(
        result.status,
        StepStatus::Failed,
        "Expected failed, got {:?}",
        result.status
    );
    let actual = result.error.as_ref().map(|e| e.kind);
    assert_eq!(actual, Some(kind), "Expected error kind {kind}");
    assert!(result.value.is_none(), "Failed steps carry no value");
}

/// Asserts the context's populated fields, in order.
pub fn assert_populated(ctx: &AnalysisContext, expected: &[&str]) {
    assert_eq!(
        ctx.populated_fields(),
        expected,
        "Unexpected populated fields"
    );
}
