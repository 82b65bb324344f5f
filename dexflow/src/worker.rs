//! Running a session on a dedicated build thread.
//!
//! The worker owns its own single-threaded tokio runtime, so the host does
//! not need one. Stage events and selection requests reach the host over
//! channels; the host may consume them from any thread.

use crate::backends::BackendSet;
use crate::config::BuildConfig;
use crate::errors::DexflowError;
use crate::events::{event_channel, FanoutNotifier, LoggingNotifier, StageEventReceiver};
use crate::execution::{
    chooser_channel, panic_message, ArtifactInspector, ArtifactRunner, ExecutionSelector,
    SelectionRequests,
};
use crate::pipeline::BuildPipeline;
use crate::project::Project;
use crate::session::{BuildTask, SessionOutcome};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Name of the build thread.
pub const WORKER_THREAD_NAME: &str = "dexflow-build";

/// The host's side of a running session.
#[derive(Debug)]
pub struct BuildHandle {
    events: StageEventReceiver,
    selections: SelectionRequests,
    thread: JoinHandle<io::Result<SessionOutcome>>,
}

impl BuildHandle {
    /// Stage events in emission order.
    pub fn events(&mut self) -> &mut StageEventReceiver {
        &mut self.events
    }

    /// Entry point selections waiting for an answer.
    ///
    /// The session does not finish while a selection is left pending and
    /// this receiver is alive.
    pub fn selections(&mut self) -> &mut SelectionRequests {
        &mut self.selections
    }

    /// Returns true once the worker thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Blocks until the session ends.
    ///
    /// Drops the selection receiver first, so a pending selection resolves
    /// as cancelled instead of blocking forever.
    ///
    /// # Errors
    ///
    /// Returns [`DexflowError::Worker`] if the worker panicked and
    /// [`DexflowError::Io`] if its runtime could not be built.
    pub fn join(self) -> Result<SessionOutcome, DexflowError> {
        drop(self.selections);
        self.thread
            .join()
            .map_err(|panic| DexflowError::Worker(format!("build worker panicked: {}", panic_message(&*panic))))?
            .map_err(DexflowError::from)
    }
}

/// Starts a build session on a new thread.
///
/// Stage notifications go both to the returned handle and to the log. The
/// execution phase asks the host through [`BuildHandle::selections`].
///
/// # Errors
///
/// Returns [`DexflowError::Io`] if the thread cannot be spawned.
pub fn spawn_build(
    backends: BackendSet,
    inspector: Arc<dyn ArtifactInspector>,
    runner: Arc<dyn ArtifactRunner>,
    project: Project,
    config: BuildConfig,
) -> Result<BuildHandle, DexflowError> {
    let (channel, events) = event_channel();
    let (chooser, selections) = chooser_channel();

    let notifier = FanoutNotifier::new()
        .with(Arc::new(channel))
        .with(Arc::new(LoggingNotifier::default()));
    let task = BuildTask::new(BuildPipeline::new(backends, Arc::new(notifier)))
        .with_selector(ExecutionSelector::new(inspector, Arc::new(chooser), runner));

    let thread = thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || -> io::Result<SessionOutcome> {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            debug!(project = project.name(), "Build worker started");
            Ok(runtime.block_on(task.run(&project, &config)))
        })?;

    Ok(BuildHandle {
        events,
        selections,
        thread,
    })
}
