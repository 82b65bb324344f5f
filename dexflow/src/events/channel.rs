//! Channel-backed notifier producing an ordered event stream.

use super::StageNotifier;
use crate::core::{BuildStage, BuildTimings, StageEvent};
use tokio::sync::mpsc;
use tracing::trace;

/// Sender half of a stage event stream.
pub type StageEventSender = mpsc::UnboundedSender<StageEvent>;

/// Receiver half of a stage event stream.
pub type StageEventReceiver = mpsc::UnboundedReceiver<StageEvent>;

/// Creates a notifier and the receiver its events arrive on.
#[must_use]
pub fn event_channel() -> (ChannelNotifier, StageEventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelNotifier::new(tx), rx)
}

/// A notifier that forwards every callback as a [`StageEvent`].
///
/// Sending never blocks the worker. Events sent after the receiver is
/// dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: StageEventSender,
}

impl ChannelNotifier {
    /// Wraps an existing sender.
    #[must_use]
    pub fn new(tx: StageEventSender) -> Self {
        Self { tx }
    }

    fn send(&self, event: StageEvent) {
        let event_type = event.event_type();
        if self.tx.send(event).is_err() {
            trace!(event_type, "Stage event receiver dropped");
        }
    }
}

impl StageNotifier for ChannelNotifier {
    fn on_stage_changed(&self, stage: BuildStage, label: &str) {
        self.send(StageEvent::stage_changed(stage, label));
    }

    fn on_success(&self, timings: &BuildTimings) {
        self.send(StageEvent::succeeded(timings.clone()));
    }

    fn on_failed(&self, stage: BuildStage, message: &str) {
        self.send(StageEvent::failed(stage, message));
    }
}
