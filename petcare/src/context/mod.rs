//! The shared analysis context.
//!
//! One [`AnalysisContext`] exists per triage request. It is created with the
//! free-text description and image references, gains exactly one field per
//! successful driver call, and is discarded once the response is returned.

mod analysis;

pub use analysis::{AnalysisContext, ContextParts};
