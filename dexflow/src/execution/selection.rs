//! Asking the host to pick one entry point.
//!
//! The worker issues a [`SelectionRequest`] and suspends until the host
//! answers with a [`Selection`]. With [`ChannelChooser`] the exchange is a
//! message on a channel plus a oneshot reply, so the host may answer from
//! any thread.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use uuid::Uuid;

/// Title of the entry point picker.
pub const SELECT_TITLE: &str = "Select a class to execute";

/// A "choose one of N options" request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRequest {
    /// Request ID.
    pub id: Uuid,
    /// Title shown above the options.
    pub title: String,
    /// Options in display order.
    pub options: Vec<String>,
}

impl SelectionRequest {
    /// Creates a request with a fresh ID.
    #[must_use]
    pub fn new(title: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            options,
        }
    }
}

/// The host's answer to a [`SelectionRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "index", rename_all = "snake_case")]
pub enum Selection {
    /// The option at this index was picked.
    Chosen(usize),
    /// The user dismissed the picker.
    Cancelled,
}

/// Presents a selection to the user.
#[async_trait]
pub trait EntryPointChooser: Send + Sync {
    /// Resolves once the user picked an option or dismissed the picker.
    async fn choose(&self, request: SelectionRequest) -> Selection;
}

/// A request waiting for the host's answer.
#[derive(Debug)]
pub struct PendingSelection {
    request: SelectionRequest,
    responder: oneshot::Sender<Selection>,
}

impl PendingSelection {
    /// Returns the request to present.
    #[must_use]
    pub fn request(&self) -> &SelectionRequest {
        &self.request
    }

    /// Answers with the option at `index`.
    ///
    /// Returns false if the worker stopped waiting.
    pub fn select(self, index: usize) -> bool {
        self.respond(Selection::Chosen(index))
    }

    /// Dismisses the picker.
    pub fn cancel(self) -> bool {
        self.respond(Selection::Cancelled)
    }

    /// Sends the answer.
    pub fn respond(self, selection: Selection) -> bool {
        self.responder.send(selection).is_ok()
    }
}

/// Receiver of pending selections, held by the host.
pub type SelectionRequests = mpsc::UnboundedReceiver<PendingSelection>;

/// Creates a chooser and the receiver its requests arrive on.
#[must_use]
pub fn chooser_channel() -> (ChannelChooser, SelectionRequests) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelChooser { tx }, rx)
}

/// A chooser that forwards requests to the host over a channel.
///
/// A host that is gone, or drops a request unanswered, counts as a
/// cancellation.
#[derive(Debug, Clone)]
pub struct ChannelChooser {
    tx: mpsc::UnboundedSender<PendingSelection>,
}

#[async_trait]
impl EntryPointChooser for ChannelChooser {
    async fn choose(&self, request: SelectionRequest) -> Selection {
        let id = request.id;
        let (responder, rx) = oneshot::channel();
        if self.tx.send(PendingSelection { request, responder }).is_err() {
            warn!(request_id = %id, "No host to present the selection");
            return Selection::Cancelled;
        }

        debug!(request_id = %id, "Waiting for selection");
        rx.await.unwrap_or_else(|_| {
            debug!(request_id = %id, "Selection dropped unanswered");
            Selection::Cancelled
        })
    }
}
