//! Step timing and span attributes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

/// Attributes describing one driver step, attached to events and logs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepSpanAttributes {
    /// Request ID.
    pub request_id: String,
    /// Stage name, if a stage was selected.
    pub stage: Option<String>,
    /// Step status.
    pub status: Option<String>,
    /// Duration in milliseconds.
    pub duration_ms: Option<f64>,
    /// Error kind if the step failed.
    pub error_kind: Option<String>,
    /// Error message if the step failed.
    pub error: Option<String>,
    /// Context fields populated after the step.
    pub populated: Vec<String>,
}

impl StepSpanAttributes {
    /// Creates attributes for a request.
    #[must_use]
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            ..Default::default()
        }
    }

    /// Sets the stage.
    #[must_use]
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Sets the duration.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Sets the error.
    #[must_use]
    pub fn with_error(mut self, kind: impl Into<String>, message: impl Into<String>) -> Self {
        self.error_kind = Some(kind.into());
        self.error = Some(message.into());
        self
    }

    /// Sets the populated fields.
    #[must_use]
    pub fn with_populated(mut self, fields: &[&str]) -> Self {
        self.populated = fields.iter().map(|f| (*f).to_string()).collect();
        self
    }

    /// Flattens to dotted attribute keys.
    #[must_use]
    pub fn to_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();
        attrs.insert("triage.request_id".to_string(), self.request_id.clone());

        if let Some(ref v) = self.stage {
            attrs.insert("triage.stage".to_string(), v.clone());
        }
        if let Some(ref v) = self.status {
            attrs.insert("triage.status".to_string(), v.clone());
        }
        if let Some(v) = self.duration_ms {
            attrs.insert("triage.duration_ms".to_string(), v.to_string());
        }
        if let Some(ref v) = self.error_kind {
            attrs.insert("triage.error_kind".to_string(), v.clone());
        }
        if let Some(ref v) = self.error {
            attrs.insert("triage.error".to_string(), v.clone());
        }
        if !self.populated.is_empty() {
            attrs.insert("triage.populated".to_string(), self.populated.join(","));
        }

        attrs
    }

    /// Converts to an event payload.
    #[must_use]
    pub fn to_event_data(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finishes the span and returns the duration.
    #[must_use]
    pub fn finish(self) -> f64 {
        self.elapsed_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_attributes() {
        let attrs = StepSpanAttributes::new("req-1")
            .with_stage("medical_analysis")
            .with_status("failed")
            .with_error("stage_failed", "no candidate conditions")
            .with_populated(&["symptom_data"])
            .to_attributes();

        assert_eq!(attrs.get("triage.stage").unwrap(), "medical_analysis");
        assert_eq!(attrs.get("triage.error_kind").unwrap(), "stage_failed");
        assert_eq!(attrs.get("triage.populated").unwrap(), "symptom_data");
        assert!(!attrs.contains_key("triage.duration_ms"));
    }

    #[test]
    fn test_event_data() {
        let data = StepSpanAttributes::new("req-2").with_status("complete").to_event_data();
        assert_eq!(data["request_id"], "req-2");
        assert_eq!(data["status"], "complete");
    }

    #[test]
    fn test_span_timer() {
        let timer = SpanTimer::start("symptom_intake");
        assert_eq!(timer.name(), "symptom_intake");
        assert!(timer.finish() >= 0.0);
    }
}
