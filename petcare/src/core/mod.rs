//! Core pipeline model types.
//!
//! This module contains the types every other part of the pipeline speaks:
//! - The explicit stage tag and step/stage status enums
//! - Stage values and stage output with factory methods
//! - The per-call step result returned by the driver

mod output;
mod status;
mod step;

pub use output::{StageOutput, StageValue};
pub use status::{PipelineStage, StageOutcome, StepStatus};
pub use step::{StepError, StepErrorKind, StepResult};
