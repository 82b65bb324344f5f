//! One build followed by the optional execution phase.

use crate::config::BuildConfig;
use crate::core::{BuildResult, BuildStage};
use crate::execution::{ExecutionSelector, SelectionOutcome};
use crate::pipeline::BuildPipeline;
use crate::project::Project;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Everything one session produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOutcome {
    /// The build result. Never changed by the execution phase.
    pub build: BuildResult,
    /// The execution phase, if it ran.
    pub execution: Option<SelectionOutcome>,
}

/// Runs a build and, after a success, the execution phase.
#[derive(Debug, Clone)]
pub struct BuildTask {
    pipeline: BuildPipeline,
    selector: Option<ExecutionSelector>,
}

impl BuildTask {
    /// Creates a task that only builds.
    #[must_use]
    pub fn new(pipeline: BuildPipeline) -> Self {
        Self {
            pipeline,
            selector: None,
        }
    }

    /// Lists the artifact after every successful build.
    #[must_use]
    pub fn with_selector(mut self, selector: ExecutionSelector) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Runs the session.
    ///
    /// The execution phase starts with a [`BuildStage::LoadDex`]
    /// notification, after `on_success`. It asks the user only when
    /// `config.execute` is set.
    pub async fn run(&self, project: &Project, config: &BuildConfig) -> SessionOutcome {
        let build = self.pipeline.execute(project, config).await;

        let execution = match (&build, &self.selector) {
            (BuildResult::Success(timings), Some(selector)) => {
                self.pipeline
                    .notifier()
                    .on_stage_changed(BuildStage::LoadDex, config.labels.label(BuildStage::LoadDex));
                let outcome = selector.run(project, config, timings, config.execute).await;
                debug!(outcome = outcome.kind(), "Execution phase finished");
                Some(outcome)
            }
            _ => None,
        };

        SessionOutcome { build, execution }
    }
}
