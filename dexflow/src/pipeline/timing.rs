//! Per-stage wall-clock timers.

use crate::core::BuildStage;
use std::time::Instant;

/// Measures one stage.
///
/// Every stage gets its own timer; durations never accumulate across
/// stages.
#[derive(Debug)]
pub struct StageTimer {
    stage: BuildStage,
    start: Instant,
}

impl StageTimer {
    /// Starts timing `stage`.
    #[must_use]
    pub fn start(stage: BuildStage) -> Self {
        Self {
            stage,
            start: Instant::now(),
        }
    }

    /// Returns the timed stage.
    #[must_use]
    pub fn stage(&self) -> BuildStage {
        self.stage
    }

    /// Returns the elapsed time in whole milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Stops the timer and returns the duration.
    #[must_use]
    pub fn finish(self) -> u64 {
        self.elapsed_ms()
    }
}
