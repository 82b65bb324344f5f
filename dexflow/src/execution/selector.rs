//! The post-build "pick an entry point and run it" phase.

use super::inspector::ArtifactInspector;
use super::runner::ArtifactRunner;
use super::selection::{EntryPointChooser, Selection, SelectionRequest, SELECT_TITLE};
use crate::config::BuildConfig;
use crate::core::{ArtifactEntryPoint, ArtifactListing, BuildTimings, InvocationOutcome};
use crate::errors::InspectError;
use crate::project::Project;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{info, warn};

/// Title of every failure report.
pub const FAILURE_TITLE: &str = "Failed...";

/// A dialog-style report for the host to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Dialog title.
    pub title: String,
    /// Dialog body.
    pub body: String,
    /// Whether the report describes a failure.
    pub is_error: bool,
}

impl ExecutionReport {
    /// Summary of a successful run: both surfaced durations and the logs.
    #[must_use]
    pub fn ran(timings: &BuildTimings, dex_tool: &str, logs: &str) -> Self {
        Self {
            title: format!(
                "Compiling took: {}ms, {dex_tool} took: {}ms",
                timings.compile_ms, timings.dex_ms
            ),
            body: logs.to_string(),
            is_error: false,
        }
    }

    /// Report of a failure thrown by the invoked code.
    #[must_use]
    pub fn runtime_error(message: &str, logs: &str) -> Self {
        Self::failure(format!("Runtime error: {message}\n\nSystem logs:\n{logs}"))
    }

    /// Report of a failure before or while invoking.
    #[must_use]
    pub fn setup_error(message: &str, logs: &str, trace: &str) -> Self {
        Self::failure(format!(
            "Couldn't execute the dex: {message}\n\nSystem logs:\n{logs}\n{trace}"
        ))
    }

    /// Report of an artifact that could not be listed.
    #[must_use]
    pub fn load_error(err: &InspectError) -> Self {
        Self::failure(format!("Couldn't load the dex: {err}"))
    }

    /// Builds the report for an invocation outcome.
    #[must_use]
    pub fn from_outcome(outcome: &InvocationOutcome, timings: &BuildTimings, dex_tool: &str) -> Self {
        match outcome {
            InvocationOutcome::Ran { logs } => Self::ran(timings, dex_tool, logs),
            InvocationOutcome::InvocationTargetFailed { message, logs } => {
                Self::runtime_error(message, logs)
            }
            InvocationOutcome::InvocationSetupFailed { message, logs, trace } => {
                Self::setup_error(message, logs, trace)
            }
        }
    }

    fn failure(body: String) -> Self {
        Self {
            title: FAILURE_TITLE.to_string(),
            body,
            is_error: true,
        }
    }
}

/// How the execution phase ended.
///
/// None of these affect the build result: the build already succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SelectionOutcome {
    /// The artifact could not be listed.
    LoadFailed {
        /// Report for the host.
        report: ExecutionReport,
    },
    /// The artifact has nothing to run.
    NoEntryPoints,
    /// Execution was not requested; the listing is returned as is.
    NotRequested {
        /// The fresh listing.
        listing: ArtifactListing,
    },
    /// The user dismissed the picker.
    Cancelled,
    /// An entry point was invoked.
    Invoked {
        /// The chosen entry point.
        entry_point: ArtifactEntryPoint,
        /// What the invocation did.
        outcome: InvocationOutcome,
        /// Report for the host.
        report: ExecutionReport,
    },
}

impl SelectionOutcome {
    /// Returns the report to display, if any.
    #[must_use]
    pub fn report(&self) -> Option<&ExecutionReport> {
        match self {
            Self::LoadFailed { report } | Self::Invoked { report, .. } => Some(report),
            _ => None,
        }
    }

    /// Returns a short name for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LoadFailed { .. } => "load_failed",
            Self::NoEntryPoints => "no_entry_points",
            Self::NotRequested { .. } => "not_requested",
            Self::Cancelled => "cancelled",
            Self::Invoked { .. } => "invoked",
        }
    }
}

/// Lists, picks and invokes an entry point of a freshly built artifact.
#[derive(Clone)]
pub struct ExecutionSelector {
    inspector: Arc<dyn ArtifactInspector>,
    chooser: Arc<dyn EntryPointChooser>,
    runner: Arc<dyn ArtifactRunner>,
    dex_tool: String,
}

impl ExecutionSelector {
    /// Creates a selector.
    #[must_use]
    pub fn new(
        inspector: Arc<dyn ArtifactInspector>,
        chooser: Arc<dyn EntryPointChooser>,
        runner: Arc<dyn ArtifactRunner>,
    ) -> Self {
        Self {
            inspector,
            chooser,
            runner,
            dex_tool: "D8".to_string(),
        }
    }

    /// Sets the dex tool name used in the success summary.
    #[must_use]
    pub fn with_dex_tool(mut self, name: impl Into<String>) -> Self {
        self.dex_tool = name.into();
        self
    }

    /// Runs the execution phase once.
    ///
    /// The listing is always taken fresh from the artifact. The user is
    /// asked at most once and the runner is invoked at most once.
    pub async fn run(
        &self,
        project: &Project,
        config: &BuildConfig,
        timings: &BuildTimings,
        interactive: bool,
    ) -> SelectionOutcome {
        let listing = match self.inspector.list_entry_points(project).await {
            Ok(listing) => listing,
            Err(err) => {
                warn!(error = %err, "Failed to list entry points");
                return SelectionOutcome::LoadFailed {
                    report: ExecutionReport::load_error(&err),
                };
            }
        };

        if listing.is_empty() {
            info!("Artifact has no entry points");
            return SelectionOutcome::NoEntryPoints;
        }
        if !interactive {
            return SelectionOutcome::NotRequested { listing };
        }

        let request = SelectionRequest::new(SELECT_TITLE, listing.names());
        let entry_point = match self.chooser.choose(request).await {
            Selection::Chosen(index) => match listing.entry_points.get(index) {
                Some(entry_point) => entry_point.clone(),
                None => {
                    warn!(index, options = listing.entry_points.len(), "Selection out of range");
                    return SelectionOutcome::Cancelled;
                }
            },
            Selection::Cancelled => {
                info!("Entry point selection cancelled");
                return SelectionOutcome::Cancelled;
            }
        };

        let outcome = self.invoke(project, config, &entry_point).await;
        info!(entry_point = %entry_point, success = outcome.is_success(), "Invocation finished");
        let report = ExecutionReport::from_outcome(&outcome, timings, &self.dex_tool);
        SelectionOutcome::Invoked {
            entry_point,
            outcome,
            report,
        }
    }

    async fn invoke(
        &self,
        project: &Project,
        config: &BuildConfig,
        entry_point: &ArtifactEntryPoint,
    ) -> InvocationOutcome {
        let invocation = AssertUnwindSafe(async { self.runner.invoke(project, config, entry_point).await });
        match invocation.catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = panic_message(&*panic);
                InvocationOutcome::InvocationSetupFailed {
                    trace: format!("runner panicked: {message}"),
                    message,
                    logs: String::new(),
                }
            }
        }
    }
}

impl std::fmt::Debug for ExecutionSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionSelector")
            .field("dex_tool", &self.dex_tool)
            .finish_non_exhaustive()
    }
}

/// Extracts the payload of a panic as text.
pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::runner::MockArtifactRunner;
    use crate::testing::{ScriptedChooser, StaticInspector};
    use pretty_assertions::assert_eq;

    fn timings() -> BuildTimings {
        BuildTimings {
            compile_ms: 120,
            dex_ms: 45,
            ..BuildTimings::default()
        }
    }

    fn listing() -> ArtifactListing {
        ArtifactListing::new(
            "abc",
            vec!["com.example.Main".into(), "com.example.Util".into()],
        )
    }

    fn project() -> Project {
        Project::new("demo", "/work/demo")
    }

    #[tokio::test]
    async fn test_user_picks_util() {
        let chooser = Arc::new(ScriptedChooser::new([Selection::Chosen(1)]));
        let mut runner = MockArtifactRunner::new();
        runner
            .expect_invoke()
            .withf(|_, _, entry_point| entry_point.name() == "com.example.Util")
            .times(1)
            .returning(|_, _, _| InvocationOutcome::Ran {
                logs: "hello\n".to_string(),
            });

        let selector = ExecutionSelector::new(
            Arc::new(StaticInspector::new(listing())),
            chooser.clone(),
            Arc::new(runner),
        );
        let outcome = selector
            .run(&project(), &BuildConfig::default(), &timings(), true)
            .await;

        let requests = chooser.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].title, SELECT_TITLE);
        assert_eq!(requests[0].options, vec!["com.example.Main", "com.example.Util"]);

        assert_eq!(
            outcome,
            SelectionOutcome::Invoked {
                entry_point: "com.example.Util".into(),
                outcome: InvocationOutcome::Ran {
                    logs: "hello\n".to_string()
                },
                report: ExecutionReport {
                    title: "Compiling took: 120ms, D8 took: 45ms".to_string(),
                    body: "hello\n".to_string(),
                    is_error: false,
                },
            }
        );
    }

    #[tokio::test]
    async fn test_runtime_error_report() {
        let mut runner = MockArtifactRunner::new();
        runner.expect_invoke().times(1).returning(|_, _, _| {
            InvocationOutcome::InvocationTargetFailed {
                message: "java.lang.ArithmeticException: / by zero".to_string(),
                logs: "starting\n".to_string(),
            }
        });

        let selector = ExecutionSelector::new(
            Arc::new(StaticInspector::new(listing())),
            Arc::new(ScriptedChooser::new([Selection::Chosen(0)])),
            Arc::new(runner),
        );
        let outcome = selector
            .run(&project(), &BuildConfig::default(), &timings(), true)
            .await;

        let report = outcome.report().unwrap();
        assert!(report.is_error);
        assert_eq!(report.title, FAILURE_TITLE);
        assert_eq!(
            report.body,
            "Runtime error: java.lang.ArithmeticException: / by zero\n\nSystem logs:\nstarting\n"
        );
    }

    #[test]
    fn test_setup_error_report() {
        let outcome = InvocationOutcome::InvocationSetupFailed {
            message: "ClassNotFoundException: Main".to_string(),
            logs: "log".to_string(),
            trace: "at Loader.load".to_string(),
        };
        let report = ExecutionReport::from_outcome(&outcome, &timings(), "D8");

        assert_eq!(
            report.body,
            "Couldn't execute the dex: ClassNotFoundException: Main\n\nSystem logs:\nlog\nat Loader.load"
        );
        assert!(report.is_error);
    }

    #[tokio::test]
    async fn test_empty_listing_skips_chooser() {
        let chooser = Arc::new(ScriptedChooser::new([]));
        let mut runner = MockArtifactRunner::new();
        runner.expect_invoke().never();

        let selector = ExecutionSelector::new(
            Arc::new(StaticInspector::new(ArtifactListing::new("abc", Vec::new()))),
            chooser.clone(),
            Arc::new(runner),
        );
        let outcome = selector
            .run(&project(), &BuildConfig::default(), &timings(), true)
            .await;

        assert_eq!(outcome, SelectionOutcome::NoEntryPoints);
        assert!(chooser.requests().is_empty());
    }

    #[tokio::test]
    async fn test_not_interactive_returns_listing() {
        let mut runner = MockArtifactRunner::new();
        runner.expect_invoke().never();

        let selector = ExecutionSelector::new(
            Arc::new(StaticInspector::new(listing())),
            Arc::new(ScriptedChooser::new([])),
            Arc::new(runner),
        );
        let outcome = selector
            .run(&project(), &BuildConfig::default(), &timings(), false)
            .await;

        assert_eq!(outcome, SelectionOutcome::NotRequested { listing: listing() });
    }

    #[tokio::test]
    async fn test_cancel_and_out_of_range_do_not_invoke() {
        for selection in [Selection::Cancelled, Selection::Chosen(5)] {
            let mut runner = MockArtifactRunner::new();
            runner.expect_invoke().never();

            let selector = ExecutionSelector::new(
                Arc::new(StaticInspector::new(listing())),
                Arc::new(ScriptedChooser::new([selection])),
                Arc::new(runner),
            );
            let outcome = selector
                .run(&project(), &BuildConfig::default(), &timings(), true)
                .await;

            assert_eq!(outcome, SelectionOutcome::Cancelled);
        }
    }

    #[tokio::test]
    async fn test_load_failure() {
        let mut runner = MockArtifactRunner::new();
        runner.expect_invoke().never();

        let selector = ExecutionSelector::new(
            Arc::new(StaticInspector::failing("classes.dex vanished")),
            Arc::new(ScriptedChooser::new([])),
            Arc::new(runner),
        );
        let outcome = selector
            .run(&project(), &BuildConfig::default(), &timings(), true)
            .await;

        assert_eq!(outcome.kind(), "load_failed");
        assert_eq!(
            outcome.report().unwrap().body,
            "Couldn't load the dex: classes.dex vanished"
        );
    }

    #[tokio::test]
    async fn test_runner_panic_is_setup_failure() {
        struct ExplodingRunner;

        #[async_trait::async_trait]
        impl ArtifactRunner for ExplodingRunner {
            async fn invoke(
                &self,
                _project: &Project,
                _config: &BuildConfig,
                _entry_point: &ArtifactEntryPoint,
            ) -> InvocationOutcome {
                panic!("vm exploded")
            }
        }

        let selector = ExecutionSelector::new(
            Arc::new(StaticInspector::new(listing())),
            Arc::new(ScriptedChooser::new([Selection::Chosen(0)])),
            Arc::new(ExplodingRunner),
        );
        let outcome = selector
            .run(&project(), &BuildConfig::default(), &timings(), true)
            .await;

        match outcome {
            SelectionOutcome::Invoked {
                outcome: InvocationOutcome::InvocationSetupFailed { message, .. },
                report,
                ..
            } => {
                assert_eq!(message, "vm exploded");
                assert!(report.body.starts_with("Couldn't execute the dex: vm exploded"));
            }
            other => panic!("expected setup failure, got {other:?}"),
        }
    }
}
