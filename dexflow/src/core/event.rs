//! Stage events delivered to observers.

use super::{BuildStage, BuildTimings};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One notification emitted by a build run.
///
/// A run emits zero or more `StageChanged` events followed by exactly one
/// terminal `Succeeded` or `Failed`. `StageChanged(LoadDex)` may follow
/// `Succeeded` when the execution phase runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StageEvent {
    /// A stage is about to start.
    StageChanged {
        /// The stage.
        stage: BuildStage,
        /// Its display label.
        label: String,
        /// When the event was emitted.
        at: DateTime<Utc>,
    },
    /// Every build stage succeeded.
    Succeeded {
        /// Timings of the run.
        timings: BuildTimings,
        /// When the event was emitted.
        at: DateTime<Utc>,
    },
    /// A stage failed; the run is over.
    Failed {
        /// The failed stage.
        stage: BuildStage,
        /// The user-facing message.
        message: String,
        /// When the event was emitted.
        at: DateTime<Utc>,
    },
}

impl StageEvent {
    /// Creates a `StageChanged` event.
    #[must_use]
    pub fn stage_changed(stage: BuildStage, label: impl Into<String>) -> Self {
        Self::StageChanged {
            stage,
            label: label.into(),
            at: Utc::now(),
        }
    }

    /// Creates a `Succeeded` event.
    #[must_use]
    pub fn succeeded(timings: BuildTimings) -> Self {
        Self::Succeeded {
            timings,
            at: Utc::now(),
        }
    }

    /// Creates a `Failed` event.
    #[must_use]
    pub fn failed(stage: BuildStage, message: impl Into<String>) -> Self {
        Self::Failed {
            stage,
            message: message.into(),
            at: Utc::now(),
        }
    }

    /// Returns the dotted event type (e.g. "stage.changed").
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::StageChanged { .. } => "stage.changed",
            Self::Succeeded { .. } => "build.succeeded",
            Self::Failed { .. } => "build.failed",
        }
    }

    /// Returns true for `Succeeded` and `Failed`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::StageChanged { .. })
    }

    /// Returns the stage the event refers to, if any.
    #[must_use]
    pub fn stage(&self) -> Option<BuildStage> {
        match self {
            Self::StageChanged { stage, .. } | Self::Failed { stage, .. } => Some(*stage),
            Self::Succeeded { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_types() {
        assert_eq!(
            StageEvent::stage_changed(BuildStage::Clean, "Cleaning").event_type(),
            "stage.changed"
        );
        assert_eq!(
            StageEvent::succeeded(BuildTimings::default()).event_type(),
            "build.succeeded"
        );
        assert_eq!(StageEvent::failed(BuildStage::Dex, "x").event_type(), "build.failed");
    }

    #[test]
    fn test_terminal_events() {
        assert!(!StageEvent::stage_changed(BuildStage::Dex, "Dexing").is_terminal());
        assert!(StageEvent::failed(BuildStage::Dex, "x").is_terminal());
        assert!(StageEvent::succeeded(BuildTimings::default()).is_terminal());
    }

    #[test]
    fn test_event_serialization() {
        let event = StageEvent::failed(BuildStage::CompileJava, "cannot find symbol Foo");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "failed");
        assert_eq!(json["stage"], "compile_java");
        assert_eq!(json["message"], "cannot find symbol Foo");

        let back: StageEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back.stage(), Some(BuildStage::CompileJava));
    }
}
