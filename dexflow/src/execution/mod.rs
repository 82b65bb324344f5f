//! Post-build execution: list the artifact's classes, let the user pick one
//! and run it.
//!
//! Nothing here can turn a successful build into a failed one. Every
//! failure is reported as an [`ExecutionReport`] carrying the logs captured
//! so far.

pub mod dex;
mod inspector;
mod runner;
mod selection;
mod selector;

pub use dex::DexFile;
pub use inspector::{ArtifactInspector, DexClassInspector};
pub use runner::{ArtifactRunner, CommandRunner};
pub use selection::{
    chooser_channel, ChannelChooser, EntryPointChooser, PendingSelection, Selection,
    SelectionRequest, SelectionRequests, SELECT_TITLE,
};
pub use selector::{ExecutionReport, ExecutionSelector, SelectionOutcome, FAILURE_TITLE};

pub(crate) use selector::panic_message;
