//! Event emission for observability.
//!
//! The driver reports each step to an [`EventSink`]. A sink can be passed
//! to the builder or installed process-wide with [`set_event_sink`].

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, RecordedEvent};

use parking_lot::RwLock;
use std::sync::Arc;

static GLOBAL_EVENT_SINK: RwLock<Option<Arc<dyn EventSink>>> = RwLock::new(None);

/// Step started.
pub const STEP_STARTED: &str = "triage.step.started";
/// Step produced a field.
pub const STEP_COMPLETED: &str = "triage.step.completed";
/// Step failed.
pub const STEP_FAILED: &str = "triage.step.failed";
/// Driver called on a terminal context.
pub const STEP_NOOP: &str = "triage.step.noop";

/// Sets the process-wide event sink.
pub fn set_event_sink(sink: Arc<dyn EventSink>) {
    *GLOBAL_EVENT_SINK.write() = Some(sink);
}

/// Clears the process-wide event sink.
pub fn clear_event_sink() {
    *GLOBAL_EVENT_SINK.write() = None;
}

/// Gets the process-wide event sink.
///
/// Returns a `NoOpEventSink` if no sink is set.
pub fn get_event_sink() -> Arc<dyn EventSink> {
    GLOBAL_EVENT_SINK
        .read()
        .clone()
        .unwrap_or_else(|| Arc::new(NoOpEventSink))
}
