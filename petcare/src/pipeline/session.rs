//! Repeated driver invocation for a single request.

use super::TriageDriver;
use crate::context::AnalysisContext;
use crate::core::{PipelineStage, StepError, StepErrorKind, StepResult, StepStatus};
use crate::domain::TriageReport;
use crate::errors::TriageError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of one driver call within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepTrace {
    /// The stage that ran, if any.
    pub stage: Option<PipelineStage>,
    /// The step status.
    pub status: StepStatus,
    /// Stage duration in milliseconds.
    pub duration_ms: f64,
    /// The error, for failed steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<StepError>,
}

impl From<&StepResult> for StepTrace {
    fn from(result: &StepResult) -> Self {
        Self {
            stage: result.stage,
            status: result.status,
            duration_ms: result.duration_ms,
            error: result.error.clone(),
        }
    }
}

/// Drives one context to completion.
///
/// The session owns the context and calls the driver until it reports
/// `complete` or `failed`. A step limit guards against a stage that never
/// advances the cursor.
#[derive(Debug)]
pub struct TriageSession {
    driver: Arc<TriageDriver>,
    context: AnalysisContext,
    history: Vec<StepTrace>,
    max_steps: usize,
}

impl TriageSession {
    /// Creates a session over an existing (possibly resumed) context.
    #[must_use]
    pub fn new(driver: Arc<TriageDriver>, context: AnalysisContext) -> Self {
        let max_steps = driver.config().session.max_steps;
        Self {
            driver,
            context,
            history: Vec::new(),
            max_steps,
        }
    }

    /// Creates a session for a fresh request.
    #[must_use]
    pub fn start(
        driver: Arc<TriageDriver>,
        user_input: impl Into<String>,
        image_refs: Vec<String>,
    ) -> Self {
        Self::new(driver, AnalysisContext::new(user_input, image_refs))
    }

    /// Overrides the step limit.
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Returns the context.
    #[must_use]
    pub fn context(&self) -> &AnalysisContext {
        &self.context
    }

    /// Consumes the session and returns the context.
    #[must_use]
    pub fn into_context(self) -> AnalysisContext {
        self.context
    }

    /// Returns one trace per driver call so far.
    #[must_use]
    pub fn history(&self) -> &[StepTrace] {
        &self.history
    }

    /// Makes one driver call.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::StepLimitExceeded`] once the step limit has
    /// been used up. Step failures are reported in the returned result.
    pub async fn step(&mut self, original_input: &str) -> Result<StepResult, TriageError> {
        if self.history.len() >= self.max_steps {
            warn!(
                request_id = %self.context.request_id(),
                steps = self.history.len(),
                "Step limit reached"
            );
            return Err(TriageError::StepLimitExceeded {
                steps: self.history.len(),
            });
        }

        let result = self.driver.advance(&mut self.context, original_input).await;
        self.history.push(StepTrace::from(&result));
        Ok(result)
    }

    /// Calls the driver until the report is assembled or a step fails.
    ///
    /// # Errors
    ///
    /// Returns the first step failure, or a step limit error.
    pub async fn run(&mut self, original_input: &str) -> Result<TriageReport, TriageError> {
        loop {
            let result = self.step(original_input).await?;
            match result.status {
                StepStatus::InProgress => {
                    debug!(
                        stage = ?result.stage,
                        next = %self.context.stage(),
                        "Continuing session"
                    );
                }
                StepStatus::Complete => {
                    return result
                        .report()
                        .or_else(|| self.context.report())
                        .cloned()
                        .ok_or_else(|| {
                            TriageError::Sequencing("complete without a report".to_string())
                        });
                }
                StepStatus::Failed => {
                    let error = result.error.unwrap_or_else(|| StepError {
                        kind: StepErrorKind::Sequencing,
                        stage: result.stage,
                        message: "failed step carried no error".to_string(),
                    });
                    return Err(error.into());
                }
            }
        }
    }

    /// Runs the session and converts the outcome into a response.
    pub async fn into_response(mut self, original_input: &str) -> TriageResponse {
        self.run(original_input).await.into()
    }
}

/// Response returned to whoever submitted the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageResponse {
    /// True if a report was produced.
    pub success: bool,
    /// The report, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<TriageReport>,
    /// A human-readable error, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TriageResponse {
    /// A successful response.
    #[must_use]
    pub fn success(report: TriageReport) -> Self {
        Self {
            success: true,
            report: Some(report),
            error: None,
        }
    }

    /// A failed response.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            report: None,
            error: Some(error.into()),
        }
    }
}

impl From<Result<TriageReport, TriageError>> for TriageResponse {
    fn from(result: Result<TriageReport, TriageError>) -> Self {
        match result {
            Ok(report) => Self::success(report),
            Err(err) => Self::failure(err.to_string()),
        }
    }
}
