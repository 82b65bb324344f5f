//! Mock collaborators for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::backends::BackendAdapter;
use crate::config::BuildConfig;
use crate::core::{ArtifactEntryPoint, ArtifactListing, BuildStage, BuildTimings, InvocationOutcome};
use crate::errors::{BackendError, InspectError};
use crate::events::StageNotifier;
use crate::execution::{
    ArtifactInspector, ArtifactRunner, EntryPointChooser, Selection, SelectionRequest,
};
use crate::project::Project;

/// An ordered log shared between collaborators.
///
/// Lets a test check how calls on different mocks interleave.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// Returns every entry so far.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

#[derive(Debug, Clone)]
enum MockResult {
    Ok,
    Compilation(String),
    Unexpected(String),
}

/// A backend that records calls and returns a configurable result.
#[derive(Debug)]
pub struct MockBackend {
    name: String,
    result: Mutex<MockResult>,
    call_count: AtomicUsize,
    compilers: Mutex<Vec<crate::config::JavaCompiler>>,
    delay: Option<Duration>,
    log: Option<CallLog>,
}

impl MockBackend {
    /// Creates a backend that succeeds.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            result: Mutex::new(MockResult::Ok),
            call_count: AtomicUsize::new(0),
            compilers: Mutex::new(Vec::new()),
            delay: None,
            log: None,
        }
    }

    /// Creates a backend reporting a compilation failure.
    #[must_use]
    pub fn failing(name: impl Into<String>, message: impl Into<String>) -> Self {
        let backend = Self::new(name);
        backend.fail_compilation(message);
        backend
    }

    /// Records `run:<name>` in `log` on every call.
    #[must_use]
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Sleeps for `delay` before returning.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Makes subsequent calls succeed.
    pub fn succeed(&self) {
        *self.result.lock() = MockResult::Ok;
    }

    /// Makes subsequent calls report a compilation failure.
    pub fn fail_compilation(&self, message: impl Into<String>) {
        *self.result.lock() = MockResult::Compilation(message.into());
    }

    /// Makes subsequent calls fail unexpectedly.
    pub fn fail_unexpectedly(&self, message: impl Into<String>) {
        *self.result.lock() = MockResult::Unexpected(message.into());
    }

    /// Returns the number of times the backend ran.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Returns the Java compiler configured on each call.
    #[must_use]
    pub fn recorded_compilers(&self) -> Vec<crate::config::JavaCompiler> {
        self.compilers.lock().clone()
    }
}

#[async_trait]
impl BackendAdapter for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _project: &Project, config: &BuildConfig) -> Result<(), BackendError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.compilers.lock().push(config.java_compiler);
        if let Some(log) = &self.log {
            log.record(format!("run:{}", self.name));
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let result = self.result.lock().clone();
        match result {
            MockResult::Ok => Ok(()),
            MockResult::Compilation(message) => Err(BackendError::Compilation(message)),
            MockResult::Unexpected(message) => Err(BackendError::unexpected(message)),
        }
    }
}

/// A backend that panics when run.
#[derive(Debug)]
pub struct PanickingBackend {
    name: String,
    message: String,
}

impl PanickingBackend {
    /// Creates a backend panicking with `message`.
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl BackendAdapter for PanickingBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _project: &Project, _config: &BuildConfig) -> Result<(), BackendError> {
        panic!("{}", self.message)
    }
}

/// One callback received by a [`RecordingNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierCall {
    /// `on_stage_changed(stage, label)`.
    StageChanged(BuildStage, String),
    /// `on_success(timings)`.
    Success(BuildTimings),
    /// `on_failed(stage, message)`.
    Failed(BuildStage, String),
}

/// A notifier that records every callback.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<NotifierCall>>,
    log: Option<CallLog>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also records `notify:<stage>`, `success` and `failed:<stage>` in `log`.
    #[must_use]
    pub fn with_log(log: CallLog) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            log: Some(log),
        }
    }

    /// Returns every callback so far.
    #[must_use]
    pub fn calls(&self) -> Vec<NotifierCall> {
        self.calls.lock().clone()
    }

    /// Returns the stages announced so far.
    #[must_use]
    pub fn stages(&self) -> Vec<BuildStage> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                NotifierCall::StageChanged(stage, _) => Some(*stage),
                _ => None,
            })
            .collect()
    }

    /// Returns the failure messages received.
    #[must_use]
    pub fn failures(&self) -> Vec<(BuildStage, String)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                NotifierCall::Failed(stage, message) => Some((*stage, message.clone())),
                _ => None,
            })
            .collect()
    }

    /// Returns how many times `on_success` was called.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, NotifierCall::Success(_)))
            .count()
    }

    fn push(&self, call: NotifierCall, entry: impl FnOnce() -> String) {
        if let Some(log) = &self.log {
            log.record(entry());
        }
        self.calls.lock().push(call);
    }
}

impl StageNotifier for RecordingNotifier {
    fn on_stage_changed(&self, stage: BuildStage, label: &str) {
        self.push(NotifierCall::StageChanged(stage, label.to_string()), || {
            format!("notify:{stage}")
        });
    }

    fn on_success(&self, timings: &BuildTimings) {
        self.push(NotifierCall::Success(timings.clone()), || "success".to_string());
    }

    fn on_failed(&self, stage: BuildStage, message: &str) {
        self.push(NotifierCall::Failed(stage, message.to_string()), || {
            format!("failed:{stage}")
        });
    }
}

/// An inspector returning a fixed listing.
#[derive(Debug)]
pub struct StaticInspector {
    result: Result<ArtifactListing, String>,
    calls: AtomicUsize,
}

impl StaticInspector {
    /// Always lists `listing`.
    #[must_use]
    pub fn new(listing: ArtifactListing) -> Self {
        Self {
            result: Ok(listing),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            result: Err(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns the number of listings taken.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactInspector for StaticInspector {
    async fn list_entry_points(&self, _project: &Project) -> Result<ArtifactListing, InspectError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result
            .clone()
            .map_err(|message| InspectError::Other(anyhow::anyhow!(message)))
    }
}

/// A chooser answering from a script.
///
/// Answers [`Selection::Cancelled`] once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedChooser {
    script: Mutex<VecDeque<Selection>>,
    requests: Mutex<Vec<SelectionRequest>>,
}

impl ScriptedChooser {
    /// Creates a chooser answering `script` in order.
    #[must_use]
    pub fn new(script: impl IntoIterator<Item = Selection>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Returns every request received.
    #[must_use]
    pub fn requests(&self) -> Vec<SelectionRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl EntryPointChooser for ScriptedChooser {
    async fn choose(&self, request: SelectionRequest) -> Selection {
        self.requests.lock().push(request);
        self.script.lock().pop_front().unwrap_or(Selection::Cancelled)
    }
}

/// A runner returning scripted outcomes.
///
/// Returns `Ran` with empty logs once the script runs out.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    script: Mutex<VecDeque<InvocationOutcome>>,
    invocations: Mutex<Vec<ArtifactEntryPoint>>,
    log: Option<CallLog>,
}

impl ScriptedRunner {
    /// Creates a runner returning `script` in order.
    #[must_use]
    pub fn new(script: impl IntoIterator<Item = InvocationOutcome>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            invocations: Mutex::new(Vec::new()),
            log: None,
        }
    }

    /// Records `invoke:<entry point>` in `log` on every call.
    #[must_use]
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Returns the entry points invoked so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<ArtifactEntryPoint> {
        self.invocations.lock().clone()
    }
}

#[async_trait]
impl ArtifactRunner for ScriptedRunner {
    async fn invoke(
        &self,
        _project: &Project,
        _config: &BuildConfig,
        entry_point: &ArtifactEntryPoint,
    ) -> InvocationOutcome {
        self.invocations.lock().push(entry_point.clone());
        if let Some(log) = &self.log {
            log.record(format!("invoke:{entry_point}"));
        }
        self.script.lock().pop_front().unwrap_or(InvocationOutcome::Ran {
            logs: String::new(),
        })
    }
}
