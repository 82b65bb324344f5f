//! Outcome of one pipeline run.

use super::BuildStage;
use crate::errors::StructuredFailure;
use serde::{Deserialize, Serialize};

/// Wall-clock duration of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTiming {
    /// The stage.
    pub stage: BuildStage,
    /// Elapsed milliseconds.
    pub duration_ms: u64,
}

/// Timings of a successful build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildTimings {
    /// Milliseconds spent compiling Java.
    pub compile_ms: u64,
    /// Milliseconds spent converting to dex.
    pub dex_ms: u64,
    /// Every stage that ran, in execution order.
    #[serde(default)]
    pub stages: Vec<StageTiming>,
}

impl BuildTimings {
    /// Records a finished stage.
    pub fn record(&mut self, stage: BuildStage, duration_ms: u64) {
        match stage {
            BuildStage::CompileJava => self.compile_ms = duration_ms,
            BuildStage::Dex => self.dex_ms = duration_ms,
            _ => {}
        }
        self.stages.push(StageTiming { stage, duration_ms });
    }

    /// Returns the recorded duration of a stage.
    #[must_use]
    pub fn duration_of(&self, stage: BuildStage) -> Option<u64> {
        self.stages
            .iter()
            .find(|t| t.stage == stage)
            .map(|t| t.duration_ms)
    }

    /// Sum of every recorded stage.
    #[must_use]
    pub fn total_ms(&self) -> u64 {
        self.stages.iter().map(|t| t.duration_ms).sum()
    }
}

/// The result of [`BuildPipeline::execute`](crate::pipeline::BuildPipeline::execute).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildResult {
    /// Every stage succeeded.
    Success(BuildTimings),
    /// A stage failed and the run stopped there.
    Failure {
        /// The stage that failed.
        stage: BuildStage,
        /// The classified failure.
        failure: StructuredFailure,
    },
}

impl BuildResult {
    /// Returns true if the build succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the timings of a successful build.
    #[must_use]
    pub fn timings(&self) -> Option<&BuildTimings> {
        match self {
            Self::Success(timings) => Some(timings),
            Self::Failure { .. } => None,
        }
    }

    /// Returns the failed stage and failure.
    #[must_use]
    pub fn failure(&self) -> Option<(BuildStage, &StructuredFailure)> {
        match self {
            Self::Success(_) => None,
            Self::Failure { stage, failure } => Some((*stage, failure)),
        }
    }
}
