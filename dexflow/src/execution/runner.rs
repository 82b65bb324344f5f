//! Invoking a chosen entry point.

use crate::config::BuildConfig;
use crate::core::{ArtifactEntryPoint, InvocationOutcome};
use crate::project::Project;
use anyhow::Context;
use async_trait::async_trait;
use std::ffi::OsString;
use std::fmt;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{info, warn};

/// Runs one entry point of a built artifact.
///
/// Never returns an error: every failure is an [`InvocationOutcome`] that
/// carries whatever logs were captured.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArtifactRunner: Send + Sync {
    /// Invokes `entry_point` with the run arguments of `config`.
    async fn invoke(
        &self,
        project: &Project,
        config: &BuildConfig,
        entry_point: &ArtifactEntryPoint,
    ) -> InvocationOutcome;
}

type LaunchArgs = Arc<dyn Fn(&Project, &BuildConfig, &ArtifactEntryPoint) -> Vec<OsString> + Send + Sync>;

/// Runs an entry point in a separate VM process.
///
/// The default launches `dalvikvm -cp <dex> <class> <run_args...>`.
#[derive(Clone)]
pub struct CommandRunner {
    program: OsString,
    args: LaunchArgs,
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new("dalvikvm", |project: &Project, config: &BuildConfig, entry_point: &ArtifactEntryPoint| {
            let mut args: Vec<OsString> = vec![
                "-cp".into(),
                project.dex_file().into_os_string(),
                entry_point.name().into(),
            ];
            args.extend(config.run_args.iter().map(OsString::from));
            args
        })
    }
}

impl CommandRunner {
    /// Creates a runner with a custom launcher.
    pub fn new<F>(program: impl Into<OsString>, args: F) -> Self
    where
        F: Fn(&Project, &BuildConfig, &ArtifactEntryPoint) -> Vec<OsString> + Send + Sync + 'static,
    {
        Self {
            program: program.into(),
            args: Arc::new(args),
        }
    }
}

impl fmt::Debug for CommandRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRunner")
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ArtifactRunner for CommandRunner {
    async fn invoke(
        &self,
        project: &Project,
        config: &BuildConfig,
        entry_point: &ArtifactEntryPoint,
    ) -> InvocationOutcome {
        let args = (self.args)(project, config, entry_point);
        info!(entry_point = %entry_point, program = ?self.program, "Invoking entry point");

        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(project.root())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to launch {}", self.program.to_string_lossy()));

        let output = match output {
            Ok(output) => output,
            Err(err) => {
                warn!(entry_point = %entry_point, error = %err, "Invocation setup failed");
                return InvocationOutcome::InvocationSetupFailed {
                    message: err.to_string(),
                    logs: String::new(),
                    trace: format!("{err:?}"),
                };
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let logs = format!("{stdout}{stderr}");

        if output.status.success() {
            return InvocationOutcome::Ran { logs };
        }

        if let Some(cause) = load_failure(&stdout, &stderr) {
            warn!(entry_point = %entry_point, cause, "Entry point could not be loaded");
            return InvocationOutcome::InvocationSetupFailed {
                message: cause.to_string(),
                trace: stderr.trim_end().to_string(),
                logs,
            };
        }

        warn!(entry_point = %entry_point, status = %output.status, "Entry point failed");
        InvocationOutcome::InvocationTargetFailed {
            message: format!("{entry_point} exited with {}", output.status),
            logs,
        }
    }
}

/// VM diagnostics meaning the entry point was never reached.
const LOAD_FAILURE_MARKERS: [&str; 4] = [
    "ClassNotFoundException",
    "NoClassDefFoundError",
    "NoSuchMethodError",
    "Unable to find static main",
];

/// Returns the VM's load error if the run failed before the program printed
/// anything.
///
/// Only the first stderr line is considered, so a load error raised later by
/// the program itself stays a runtime error.
fn load_failure<'a>(stdout: &str, stderr: &'a str) -> Option<&'a str> {
    if !stdout.trim().is_empty() {
        return None;
    }
    let first = stderr.lines().map(str::trim).find(|line| !line.is_empty())?;
    LOAD_FAILURE_MARKERS
        .iter()
        .any(|marker| first.contains(marker))
        .then_some(first)
}
