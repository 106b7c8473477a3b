//! The orchestration driver.
//!
//! One call to [`TriageDriver::advance`] runs exactly one stage: the one
//! named by the context's cursor. The driver never loops and keeps no state
//! between calls, so calling it twice on an unchanged context re-runs the
//! same stage.

use super::DriverBuilder;
use crate::config::TriageConfig;
use crate::context::AnalysisContext;
use crate::core::{PipelineStage, StageOutcome, StageValue, StepError, StepErrorKind, StepResult};
use crate::events::{self, EventSink};
use crate::observability::{SpanTimer, StepSpanAttributes};
use crate::stages::TriageStage;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Selects, runs and commits one stage per call.
pub struct TriageDriver {
    stages: BTreeMap<PipelineStage, Arc<dyn TriageStage>>,
    sink: Arc<dyn EventSink>,
    config: TriageConfig,
}

impl TriageDriver {
    pub(crate) fn from_parts(
        stages: BTreeMap<PipelineStage, Arc<dyn TriageStage>>,
        sink: Arc<dyn EventSink>,
        config: TriageConfig,
    ) -> Self {
        Self {
            stages,
            sink,
            config,
        }
    }

    /// Returns a builder.
    #[must_use]
    pub fn builder() -> DriverBuilder {
        DriverBuilder::new()
    }

    /// A driver with the rule-based stages and default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut stages = BTreeMap::new();
        let config = TriageConfig::default();
        for stage in PipelineStage::ORDER {
            stages.insert(stage, super::builder::default_stage(stage, &config, None, None));
        }
        Self::from_parts(stages, events::get_event_sink(), config)
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &TriageConfig {
        &self.config
    }

    /// Returns the stage registered for `stage`.
    #[must_use]
    pub fn stage(&self, stage: PipelineStage) -> Option<&Arc<dyn TriageStage>> {
        self.stages.get(&stage)
    }

    /// Stages still to run for `ctx`, in order. Does not run anything.
    #[must_use]
    pub fn plan(&self, ctx: &AnalysisContext) -> Vec<PipelineStage> {
        ctx.remaining_stages()
    }

    /// Runs the next stage and commits its value into `ctx`.
    ///
    /// On a terminal context this is a no-op returning `complete`. A blank
    /// description fails before any stage is selected. On any failure the
    /// context is left exactly as it was.
    pub async fn advance(&self, ctx: &mut AnalysisContext, original_input: &str) -> StepResult {
        let request_id = ctx.request_id().to_string();

        if ctx.is_terminal() {
            debug!(request_id = %request_id, "Context already terminal, nothing to run");
            let attrs = StepSpanAttributes::new(&request_id)
                .with_status("complete")
                .with_populated(&ctx.populated_fields());
            self.sink.try_emit(events::STEP_NOOP, Some(attrs.to_event_data()));
            return StepResult::already_complete(ctx.report().cloned());
        }

        if ctx.user_input().trim().is_empty() {
            let error = StepError::empty_input();
            warn!(request_id = %request_id, "Rejected blank symptom description");
            self.emit_failed(&request_id, &error, ctx, 0.0);
            return StepResult::failed(error);
        }

        let stage = ctx.stage();
        let Some(runner) = self.stages.get(&stage) else {
            let error = StepError {
                kind: StepErrorKind::Sequencing,
                stage: Some(stage),
                message: format!("no stage registered for {stage}"),
            };
            self.emit_failed(&request_id, &error, ctx, 0.0);
            return StepResult::failed(error);
        };

        debug!(request_id = %request_id, stage = %stage, runner = runner.name(), "Selected stage");
        self.sink.try_emit(
            events::STEP_STARTED,
            Some(
                StepSpanAttributes::new(&request_id)
                    .with_stage(stage.as_str())
                    .with_status("started")
                    .to_event_data(),
            ),
        );

        let timer = SpanTimer::start(runner.name());
        let output = runner.run(ctx, original_input).await;
        let duration_ms = timer.finish();

        let (value, next) = match Self::merge(ctx, stage, output.into_parts()) {
            Ok(merged) => merged,
            Err(error) => {
                warn!(
                    request_id = %request_id,
                    stage = %stage,
                    kind = %error.kind,
                    duration_ms,
                    "Step failed: {}", error.message
                );
                self.emit_failed(&request_id, &error, ctx, duration_ms);
                return StepResult::failed(error).with_duration_ms(duration_ms);
            }
        };

        let result = if next.is_terminal() {
            StepResult::complete(value)
        } else {
            StepResult::in_progress(stage, value)
        };

        info!(
            request_id = %request_id,
            stage = %stage,
            status = %result.status,
            next = %next,
            duration_ms,
            "Step completed"
        );
        let attrs = StepSpanAttributes::new(&request_id)
            .with_stage(stage.as_str())
            .with_status(result.status.to_string())
            .with_duration_ms(duration_ms)
            .with_populated(&ctx.populated_fields());
        self.sink
            .try_emit(events::STEP_COMPLETED, Some(attrs.to_event_data()));

        result.with_duration_ms(duration_ms)
    }

    /// Validates a stage's output and commits it. Nothing is written unless
    /// every check passes.
    fn merge(
        ctx: &mut AnalysisContext,
        stage: PipelineStage,
        (value, outcome): (Option<StageValue>, StageOutcome),
    ) -> Result<(StageValue, PipelineStage), StepError> {
        let value = match (outcome, value) {
            (StageOutcome::Failed(reason), _) => return Err(StepError::stage_failed(stage, reason)),
            (StageOutcome::Ok, None) => {
                return Err(StepError::stage_failed(stage, "stage returned no value"))
            }
            (StageOutcome::Ok, Some(value)) if value.stage() != stage => {
                return Err(StepError::stage_failed(
                    stage,
                    format!("stage returned {} instead of its own field", value.field_name()),
                ))
            }
            (StageOutcome::Ok, Some(value)) => value,
        };

        let next = ctx
            .commit(value.clone())
            .map_err(|err| StepError::sequencing(stage, &err))?;
        Ok((value, next))
    }

    fn emit_failed(
        &self,
        request_id: &str,
        error: &StepError,
        ctx: &AnalysisContext,
        duration_ms: f64,
    ) {
        let mut attrs = StepSpanAttributes::new(request_id)
            .with_status("failed")
            .with_error(error.kind.to_string(), error.message.clone())
            .with_duration_ms(duration_ms)
            .with_populated(&ctx.populated_fields());
        if let Some(stage) = error.stage {
            attrs = attrs.with_stage(stage.as_str());
        }
        self.sink.try_emit(events::STEP_FAILED, Some(attrs.to_event_data()));
    }
}

impl fmt::Debug for TriageDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stages: Vec<_> = self.stages.values().map(|s| s.name().to_string()).collect();
        f.debug_struct("TriageDriver")
            .field("stages", &stages)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
