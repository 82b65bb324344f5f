//! Build pipeline execution.
//!
//! This module provides:
//! - The sequential stage executor
//! - Per-stage timers

mod executor;
mod timing;

pub use executor::BuildPipeline;
pub use timing::StageTimer;
