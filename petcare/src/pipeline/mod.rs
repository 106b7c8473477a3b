//! Pipeline driving and execution.
//!
//! This module provides:
//! - The single-step driver that runs the next stage for a context
//! - A builder that wires stages, collaborators and configuration
//! - A session loop that drives one request to its report

mod builder;
mod driver;
mod session;

pub use builder::DriverBuilder;
pub use driver::TriageDriver;
pub use session::{StepTrace, TriageResponse, TriageSession};
