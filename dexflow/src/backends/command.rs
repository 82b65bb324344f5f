//! Backend adapter running an external program.

use super::BackendAdapter;
use crate::config::BuildConfig;
use crate::errors::BackendError;
use crate::project::Project;
use anyhow::Context;
use async_trait::async_trait;
use std::ffi::OsString;
use std::fmt;
use std::io;
use std::process::Output;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info};

/// Builds the argument list of a command for one run.
///
/// Returning `Ok(None)` means there is nothing to do (for example no source
/// file of the tool's language) and the tool is not spawned.
pub type ArgsBuilder =
    Arc<dyn Fn(&Project, &BuildConfig) -> io::Result<Option<Vec<OsString>>> + Send + Sync>;

/// Runs one external program in the project root.
///
/// A non-zero exit is a compilation failure carrying the tool's output.
/// Failing to prepare, spawn or wait for the program is unexpected.
#[derive(Clone)]
pub struct CommandBackend {
    name: String,
    program: OsString,
    args: ArgsBuilder,
}

impl CommandBackend {
    /// Creates a backend for `program` with a dynamic argument list.
    pub fn new<F>(name: impl Into<String>, program: impl Into<OsString>, args: F) -> Self
    where
        F: Fn(&Project, &BuildConfig) -> io::Result<Option<Vec<OsString>>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            program: program.into(),
            args: Arc::new(args),
        }
    }

    /// Creates a backend with fixed arguments.
    pub fn fixed<I, S>(name: impl Into<String>, program: impl Into<OsString>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        Self::new(name, program, move |_, _| Ok(Some(args.clone())))
    }

    /// Returns the program this backend spawns.
    #[must_use]
    pub fn program(&self) -> &OsString {
        &self.program
    }
}

impl fmt::Debug for CommandBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBackend")
            .field("name", &self.name)
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BackendAdapter for CommandBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, project: &Project, config: &BuildConfig) -> Result<(), BackendError> {
        let args = (self.args)(project, config)
            .with_context(|| format!("failed to prepare {} arguments", self.name))?;
        let Some(args) = args else {
            info!(tool = %self.name, "Nothing to do");
            return Ok(());
        };

        tokio::fs::create_dir_all(project.classes_dir())
            .await
            .with_context(|| format!("failed to create {}", project.classes_dir().display()))?;

        debug!(tool = %self.name, program = ?self.program, ?args, "Spawning tool");
        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(project.root())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to launch {}", self.program.to_string_lossy()))?;

        if output.status.success() {
            debug!(tool = %self.name, "Tool finished");
            return Ok(());
        }

        Err(BackendError::Compilation(failure_message(&self.name, &output)))
    }
}

/// The tool's diagnostics, or its exit status when it printed nothing.
fn failure_message(name: &str, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let combined = [stderr.trim(), stdout.trim()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    if combined.is_empty() {
        format!("{name} exited with {}", output.status)
    } else {
        combined
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn project() -> (tempfile::TempDir, Project) {
        let dir = tempfile::tempdir().unwrap();
        let project = Project::new("demo", dir.path());
        (dir, project)
    }

    #[tokio::test]
    async fn test_successful_command() {
        let (_dir, project) = project();
        let backend = CommandBackend::fixed("true", "sh", ["-c", "exit 0"]);

        backend.run(&project, &BuildConfig::default()).await.unwrap();
        assert!(project.classes_dir().is_dir());
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_compilation_failure() {
        let (_dir, project) = project();
        let backend = CommandBackend::fixed(
            "javac",
            "sh",
            ["-c", "echo 'Main.java:3: error: cannot find symbol Foo' >&2; exit 1"],
        );

        let err = backend.run(&project, &BuildConfig::default()).await.unwrap_err();
        match err {
            BackendError::Compilation(message) => {
                assert_eq!(message, "Main.java:3: error: cannot find symbol Foo");
            }
            other => panic!("expected compilation failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_silent_failure_reports_status() {
        let (_dir, project) = project();
        let backend = CommandBackend::fixed("d8", "sh", ["-c", "exit 3"]);

        let err = backend.run(&project, &BuildConfig::default()).await.unwrap_err();
        assert!(err.to_string().starts_with("d8 exited with"));
    }

    #[tokio::test]
    async fn test_missing_program_is_unexpected() {
        let (_dir, project) = project();
        let backend = CommandBackend::fixed("ghost", "dexflow-no-such-tool", Vec::<String>::new());

        let err = backend.run(&project, &BuildConfig::default()).await.unwrap_err();
        assert!(matches!(err, BackendError::Unexpected(_)));
        assert!(err.to_string().contains("failed to launch dexflow-no-such-tool"));
    }

    #[tokio::test]
    async fn test_nothing_to_do_skips_spawn() {
        let (_dir, project) = project();
        let backend = CommandBackend::new("kotlinc", "dexflow-no-such-tool", |_, _| Ok(None));

        backend.run(&project, &BuildConfig::default()).await.unwrap();
        assert!(!project.classes_dir().exists());
    }
}
