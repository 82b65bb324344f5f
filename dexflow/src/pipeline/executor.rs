//! Sequential execution of the build stages.

use super::timing::StageTimer;
use crate::backends::BackendSet;
use crate::config::BuildConfig;
use crate::core::{BuildResult, BuildStage, BuildTimings};
use crate::errors::StructuredFailure;
use crate::events::StageNotifier;
use crate::execution::panic_message;
use crate::project::Project;
use crate::sanitize::persist_sanitized;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Runs Clean, `CompileKotlin`, `CompileJava` and Dex in that order.
///
/// The first failing stage ends the run. Nothing is retried; a new run is a
/// new call to [`execute`](Self::execute). The pipeline keeps no state
/// between runs.
#[derive(Clone)]
pub struct BuildPipeline {
    backends: BackendSet,
    notifier: Arc<dyn StageNotifier>,
}

impl BuildPipeline {
    /// Creates a pipeline over `backends`, reporting to `notifier`.
    #[must_use]
    pub fn new(backends: BackendSet, notifier: Arc<dyn StageNotifier>) -> Self {
        Self { backends, notifier }
    }

    /// Returns the notifier.
    #[must_use]
    pub fn notifier(&self) -> &Arc<dyn StageNotifier> {
        &self.notifier
    }

    /// Runs one build.
    ///
    /// Stage failures and adapter panics are classified and returned as
    /// [`BuildResult::Failure`]; they never propagate to the caller.
    pub async fn execute(&self, project: &Project, config: &BuildConfig) -> BuildResult {
        let run_id = Uuid::new_v4();
        let span = info_span!(
            "build",
            %run_id,
            project = project.name(),
            compiler = %config.java_compiler
        );
        self.run_stages(project, config).instrument(span).await
    }

    async fn run_stages(&self, project: &Project, config: &BuildConfig) -> BuildResult {
        let mut timings = BuildTimings::default();

        self.announce(BuildStage::Clean, config);
        let timer = StageTimer::start(BuildStage::Clean);
        match persist_sanitized(project.active_file(), project.active_source()).await {
            Ok(outcome) => debug!(?outcome, path = %project.active_file().display(), "Source sanitized"),
            Err(err) => return self.fail(BuildStage::Clean, err.into()),
        }
        timings.record(BuildStage::Clean, timer.finish());

        for stage in BuildStage::BACKEND_STAGES {
            self.announce(stage, config);
            let timer = StageTimer::start(stage);
            if let Err(failure) = self.run_backend(stage, project, config).await {
                return self.fail(stage, failure);
            }
            let duration_ms = timer.finish();
            debug!(stage = %stage, duration_ms, "Stage finished");
            timings.record(stage, duration_ms);
        }

        info!(
            compile_ms = timings.compile_ms,
            dex_ms = timings.dex_ms,
            "Build succeeded"
        );
        self.notifier.on_success(&timings);
        BuildResult::Success(timings)
    }

    fn announce(&self, stage: BuildStage, config: &BuildConfig) {
        let label = config.labels.label(stage);
        debug!(stage = %stage, label, "Starting stage");
        self.notifier.on_stage_changed(stage, label);
    }

    async fn run_backend(
        &self,
        stage: BuildStage,
        project: &Project,
        config: &BuildConfig,
    ) -> Result<(), StructuredFailure> {
        let adapter = self
            .backends
            .adapter_for(stage, config.java_compiler)
            .ok_or_else(|| {
                StructuredFailure::unexpected(format!(
                    "No {stage} adapter registered for compiler {}",
                    config.java_compiler
                ))
            })?;

        debug!(stage = %stage, adapter = adapter.name(), "Running adapter");
        let run = AssertUnwindSafe(async { adapter.run(project, config).await });
        match run.catch_unwind().await {
            Ok(result) => result.map_err(StructuredFailure::from),
            Err(panic) => {
                let message = panic_message(&*panic);
                Err(StructuredFailure::UnexpectedError {
                    trace: format!("{} panicked: {message}", adapter.name()),
                    message,
                })
            }
        }
    }

    fn fail(&self, stage: BuildStage, failure: StructuredFailure) -> BuildResult {
        warn!(stage = %stage, kind = failure.kind(), "Stage failed");
        self.notifier.on_failed(stage, failure.user_message());
        BuildResult::Failure { stage, failure }
    }
}

impl std::fmt::Debug for BuildPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildPipeline")
            .field("backends", &self.backends)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JavaCompiler;
    use crate::testing::{assert_build_failed, MockBackend, RecordingNotifier};

    fn backends(java: Arc<MockBackend>) -> BackendSet {
        BackendSet::new(Arc::new(MockBackend::new("kotlinc")), Arc::new(MockBackend::new("d8")))
            .with_java(JavaCompiler::Javac, java)
    }

    #[tokio::test]
    async fn test_unregistered_compiler_fails_at_java_stage() {
        let dir = tempfile::tempdir().unwrap();
        let project = crate::testing::write_project(dir.path(), "", "").unwrap();
        let javac = Arc::new(MockBackend::new("javac"));
        let notifier = Arc::new(RecordingNotifier::new());
        let pipeline = BuildPipeline::new(backends(javac.clone()), notifier.clone());

        let config = BuildConfig::default().with_java_compiler(JavaCompiler::Ecj);
        let result = pipeline.execute(&project, &config).await;

        assert_build_failed(&result, BuildStage::CompileJava, "unexpected_error");
        assert_eq!(javac.call_count(), 0);
        assert_eq!(
            notifier.failures(),
            vec![(
                BuildStage::CompileJava,
                "No compile_java adapter registered for compiler ECJ".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_configured_compiler_is_passed_through() {
        let dir = tempfile::tempdir().unwrap();
        let project = crate::testing::write_project(dir.path(), "", "").unwrap();
        let javac = Arc::new(MockBackend::new("javac"));
        let pipeline = BuildPipeline::new(backends(javac.clone()), Arc::new(RecordingNotifier::new()));

        let result = pipeline.execute(&project, &BuildConfig::default()).await;

        assert!(result.is_success());
        assert_eq!(javac.recorded_compilers(), vec![JavaCompiler::Javac]);
    }
}
