//! # PetCare
//!
//! Orchestration core for a veterinary triage assistant.
//!
//! A pet owner's free-text description (and optional photos) is analysed by
//! a fixed sequence of stages:
//!
//! - **Symptom intake**: species, symptoms, severity cues and duration
//! - **Vision analysis**: only when images were supplied
//! - **Medical analysis**: ranked candidate conditions
//! - **Triage scoring**: urgency level and vet-visit window
//! - **Care plan**: home actions, things to avoid, what to monitor
//! - **Report assembly**: the owner-facing report
//!
//! Each call to [`pipeline::TriageDriver::advance`] runs exactly one stage
//! and commits its result into the shared [`context::AnalysisContext`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use petcare::prelude::*;
//! use std::sync::Arc;
//!
//! let driver = Arc::new(DriverBuilder::new().build()?);
//! let text = "My dog has been vomiting and lethargic for 2 days";
//! let mut session = TriageSession::start(driver, text, Vec::new());
//! let report = session.run(text).await?;
//! println!("{}: {}", report.triage_level, report.vet_visit_window);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod context;
pub mod core;
pub mod domain;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod ports;
pub mod stages;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::TriageConfig;
    pub use crate::context::{AnalysisContext, ContextParts};
    pub use crate::core::{
        PipelineStage, StageOutput, StageValue, StepError, StepErrorKind, StepResult, StepStatus,
    };
    pub use crate::domain::{Species, TriageReport, UrgencyLevel};
    pub use crate::errors::{ConfigError, ContextError, PortError, TriageError};
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::pipeline::{DriverBuilder, TriageDriver, TriageResponse, TriageSession};
    pub use crate::ports::{ImageAnalyzer, MedicalKnowledge};
    pub use crate::stages::{FnStage, TriageStage};
}
