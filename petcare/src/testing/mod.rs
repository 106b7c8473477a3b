//! Testing utilities for triage pipelines.
//!
//! This module provides:
//! - Sample stage values and pre-advanced contexts
//! - Scripted, failing and recording stages
//! - Assertions for step results

mod assertions;
pub mod fixtures;
mod mocks;

pub use assertions::{
    assert_populated, assert_step_complete, assert_step_failed, assert_step_in_progress,
};
pub use mocks::{ExecutionLog, FailingStage, RecordingStage, ScriptedStage};
