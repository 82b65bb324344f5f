//! Build configuration resolved from persisted settings.
//!
//! Settings are read once at the start of each run. The pipeline only ever
//! sees the resolved [`BuildConfig`].

mod build;
mod settings;

pub use build::{BuildConfig, JavaCompiler};
pub use settings::{InMemorySettings, JsonFileSettings, SettingsStore};

/// Setting key selecting the Java compiler.
pub const KEY_COMPILER: &str = "compiler";
/// Setting key holding the Java release passed to the compiler.
pub const KEY_JAVA_RELEASE: &str = "java_release";
/// Setting key holding whitespace-separated program arguments.
pub const KEY_RUN_ARGS: &str = "run_args";
