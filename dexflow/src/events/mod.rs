//! Stage notification for build observers.
//!
//! The pipeline reports progress through a [`StageNotifier`]. Hosts that
//! prefer a message stream use [`ChannelNotifier`], which turns every
//! callback into an ordered [`StageEvent`](crate::core::StageEvent).

mod channel;
mod notifier;

pub use channel::{event_channel, ChannelNotifier, StageEventReceiver, StageEventSender};
pub use notifier::{FanoutNotifier, LoggingNotifier, NoOpNotifier, StageNotifier};
