//! # Dexflow
//!
//! Build orchestration for small Kotlin + Java projects targeting the
//! Android runtime.
//!
//! A build is a fixed linear sequence of stages:
//!
//! - **Clean**: rewrite `System.exit(` calls in the editor buffer and persist
//!   the buffer if it changed
//! - **`CompileKotlin`**, **`CompileJava`**: run the compilers, the Java one
//!   chosen per run from settings (`javac` or ECJ)
//! - **Dex**: convert the class files to `classes.dex`
//!
//! After a successful build the produced dex can be listed, one class picked
//! by the user and run. Execution failures never change the build result.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dexflow::prelude::*;
//! use std::sync::Arc;
//!
//! let backends = Toolchain::default().backend_set();
//! let config = BuildConfig::resolve(&JsonFileSettings::load("settings.json")?)
//!     .with_execute(true);
//!
//! let mut handle = spawn_build(
//!     backends,
//!     Arc::new(DexClassInspector),
//!     Arc::new(CommandRunner::default()),
//!     Project::new("demo", "/work/demo"),
//!     config,
//! )?;
//! if let Some(pending) = handle.selections().blocking_recv() {
//!     pending.select(0);
//! }
//! let outcome = handle.join()?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod backends;
pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod execution;
pub mod observability;
pub mod pipeline;
pub mod project;
pub mod sanitize;
pub mod session;
pub mod testing;
pub mod worker;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::backends::{BackendAdapter, BackendSet, CommandBackend, Toolchain};
    pub use crate::config::{BuildConfig, JavaCompiler, JsonFileSettings, SettingsStore};
    pub use crate::core::{
        ArtifactEntryPoint, BuildResult, BuildStage, BuildTimings, InvocationOutcome, StageEvent,
    };
    pub use crate::errors::{BackendError, DexflowError, StructuredFailure};
    pub use crate::events::{ChannelNotifier, LoggingNotifier, StageNotifier};
    pub use crate::execution::{
        ArtifactInspector, ArtifactRunner, CommandRunner, DexClassInspector, EntryPointChooser,
        ExecutionReport, ExecutionSelector, Selection, SelectionOutcome,
    };
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::pipeline::BuildPipeline;
    pub use crate::project::Project;
    pub use crate::session::{BuildTask, SessionOutcome};
    pub use crate::worker::{spawn_build, BuildHandle};
}
