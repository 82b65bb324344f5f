//! Stage notifier trait and implementations.

use crate::core::{BuildStage, BuildTimings};
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn, Level};

/// Observer of a build run.
///
/// Called only from the build worker. Implementations must not assume they
/// run on a UI thread and must hand work over to one themselves.
pub trait StageNotifier: Send + Sync {
    /// A stage is about to start.
    fn on_stage_changed(&self, stage: BuildStage, label: &str);

    /// Every build stage succeeded.
    fn on_success(&self, timings: &BuildTimings);

    /// A stage failed; nothing else runs.
    fn on_failed(&self, stage: BuildStage, message: &str);
}

/// A notifier that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpNotifier;

impl StageNotifier for NoOpNotifier {
    fn on_stage_changed(&self, _stage: BuildStage, _label: &str) {}
    fn on_success(&self, _timings: &BuildTimings) {}
    fn on_failed(&self, _stage: BuildStage, _message: &str) {}
}

/// A notifier that logs through `tracing`.
#[derive(Debug, Clone)]
pub struct LoggingNotifier {
    level: Level,
}

impl Default for LoggingNotifier {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingNotifier {
    /// Creates a notifier logging stage changes at `level`.
    ///
    /// Failures are always logged at error level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level notifier.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    /// Returns the level stage changes are logged at.
    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }
}

impl StageNotifier for LoggingNotifier {
    fn on_stage_changed(&self, stage: BuildStage, label: &str) {
        match self.level {
            Level::TRACE => trace!(stage = %stage, label, "Stage changed"),
            Level::DEBUG => debug!(stage = %stage, label, "Stage changed"),
            Level::INFO => info!(stage = %stage, label, "Stage changed"),
            Level::WARN => warn!(stage = %stage, label, "Stage changed"),
            _ => error!(stage = %stage, label, "Stage changed"),
        }
    }

    fn on_success(&self, timings: &BuildTimings) {
        info!(
            compile_ms = timings.compile_ms,
            dex_ms = timings.dex_ms,
            total_ms = timings.total_ms(),
            "Build succeeded"
        );
    }

    fn on_failed(&self, stage: BuildStage, message: &str) {
        error!(stage = %stage, error = message, "Build failed");
    }
}

/// Forwards every callback to several notifiers, in registration order.
#[derive(Clone, Default)]
pub struct FanoutNotifier {
    targets: Vec<Arc<dyn StageNotifier>>,
}

impl FanoutNotifier {
    /// Creates an empty fanout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a target.
    #[must_use]
    pub fn with(mut self, target: Arc<dyn StageNotifier>) -> Self {
        self.targets.push(target);
        self
    }

    /// Returns the number of targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Returns true if there are no targets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl std::fmt::Debug for FanoutNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutNotifier")
            .field("targets", &self.targets.len())
            .finish()
    }
}

impl StageNotifier for FanoutNotifier {
    fn on_stage_changed(&self, stage: BuildStage, label: &str) {
        for target in &self.targets {
            target.on_stage_changed(stage, label);
        }
    }

    fn on_success(&self, timings: &BuildTimings) {
        for target in &self.targets {
            target.on_success(timings);
        }
    }

    fn on_failed(&self, stage: BuildStage, message: &str) {
        for target in &self.targets {
            target.on_failed(stage, message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{NotifierCall, RecordingNotifier};

    #[test]
    fn test_noop_notifier() {
        let notifier = NoOpNotifier;
        notifier.on_stage_changed(BuildStage::Clean, "Cleaning");
        notifier.on_success(&BuildTimings::default());
        notifier.on_failed(BuildStage::Dex, "boom");
        // Should not panic
    }

    #[test]
    fn test_logging_notifier() {
        let notifier = LoggingNotifier::debug();
        notifier.on_stage_changed(BuildStage::Clean, "Cleaning");
        LoggingNotifier::default().on_failed(BuildStage::Dex, "boom");
        // Should not panic
    }

    #[test]
    fn test_logging_notifier_honors_every_level() {
        for level in [Level::TRACE, Level::DEBUG, Level::INFO, Level::WARN, Level::ERROR] {
            let notifier = LoggingNotifier::new(level);
            assert_eq!(notifier.level(), level);

            let logged = last_event_level(|| notifier.on_stage_changed(BuildStage::Dex, "Dexing"));
            assert_eq!(logged, Some(level));
        }
    }

    /// Runs `f` under a subscriber that records the level of the last event.
    fn last_event_level(f: impl FnOnce()) -> Option<Level> {
        use std::sync::Mutex;
        use tracing::subscriber::with_default;
        use tracing_subscriber::layer::{Context, SubscriberExt};
        use tracing_subscriber::Layer;

        struct LastLevel(Arc<Mutex<Option<Level>>>);

        impl<S: tracing::Subscriber> Layer<S> for LastLevel {
            fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
                if let Ok(mut last) = self.0.lock() {
                    *last = Some(*event.metadata().level());
                }
            }
        }

        let seen = Arc::new(Mutex::new(None));
        let subscriber = tracing_subscriber::registry().with(LastLevel(seen.clone()));
        with_default(subscriber, f);
        let level = *seen.lock().unwrap();
        level
    }

    #[test]
    fn test_fanout_preserves_order_per_target() {
        let first = Arc::new(RecordingNotifier::new());
        let second = Arc::new(RecordingNotifier::new());
        let fanout = FanoutNotifier::new().with(first.clone()).with(second.clone());
        assert_eq!(fanout.len(), 2);

        fanout.on_stage_changed(BuildStage::Clean, "Cleaning");
        fanout.on_failed(BuildStage::Clean, "read-only");

        let expected = vec![
            NotifierCall::StageChanged(BuildStage::Clean, "Cleaning".to_string()),
            NotifierCall::Failed(BuildStage::Clean, "read-only".to_string()),
        ];
        assert_eq!(first.calls(), expected);
        assert_eq!(second.calls(), expected);
    }
}
