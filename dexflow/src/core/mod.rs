//! Core domain model types for dexflow.
//!
//! This module contains the fundamental types used throughout the crate:
//! - The fixed build stage order and its labels
//! - Build results and timings
//! - Stage events for observers
//! - Entry points and invocation outcomes of the produced artifact

mod entry;
mod event;
mod result;
mod stage;

pub use entry::{ArtifactEntryPoint, ArtifactListing, InvocationOutcome};
pub use event::StageEvent;
pub use result::{BuildResult, BuildTimings, StageTiming};
pub use stage::{BuildStage, StageLabels};
