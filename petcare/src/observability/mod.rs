//! Logging setup and step instrumentation.

mod logging;
mod spans;

pub use logging::{init_from_env, init_logging, parse_level, LoggingConfig};
pub use spans::{SpanTimer, StepSpanAttributes};
