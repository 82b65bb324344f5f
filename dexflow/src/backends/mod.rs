//! Backend adapters wrapping the external build tools.
//!
//! Every tool (Kotlin compiler, Java compilers, dexer) sits behind the same
//! [`BackendAdapter`] trait. The pipeline never knows which tool it runs;
//! it only looks the adapter up in a [`BackendSet`].

mod command;
pub mod toolchain;

pub use command::{ArgsBuilder, CommandBackend};
pub use toolchain::Toolchain;

use crate::config::{BuildConfig, JavaCompiler};
use crate::core::BuildStage;
use crate::errors::BackendError;
use crate::project::Project;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// One external tool invocation, run to completion or failure.
///
/// Return [`BackendError::Compilation`] when the tool rejected the user's
/// code; anything else is [`BackendError::Unexpected`].
#[async_trait]
pub trait BackendAdapter: Send + Sync + Debug {
    /// Returns the tool name, used in logs.
    fn name(&self) -> &str;

    /// Runs the tool against the project.
    async fn run(&self, project: &Project, config: &BuildConfig) -> Result<(), BackendError>;
}

/// The adapters a pipeline runs, keyed by stage.
///
/// The Java stage has one adapter per [`JavaCompiler`]; the configured
/// compiler picks one per run.
#[derive(Debug, Clone)]
pub struct BackendSet {
    kotlin: Arc<dyn BackendAdapter>,
    java: HashMap<JavaCompiler, Arc<dyn BackendAdapter>>,
    dex: Arc<dyn BackendAdapter>,
}

impl BackendSet {
    /// Creates a set with no Java compiler registered.
    #[must_use]
    pub fn new(kotlin: Arc<dyn BackendAdapter>, dex: Arc<dyn BackendAdapter>) -> Self {
        Self {
            kotlin,
            java: HashMap::new(),
            dex,
        }
    }

    /// Registers the adapter for a Java compiler.
    #[must_use]
    pub fn with_java(mut self, compiler: JavaCompiler, adapter: Arc<dyn BackendAdapter>) -> Self {
        self.java.insert(compiler, adapter);
        self
    }

    /// Returns the adapter running `stage` under `compiler`.
    ///
    /// Returns `None` for stages without a tool (clean, load) and for a
    /// compiler that was never registered.
    #[must_use]
    pub fn adapter_for(&self, stage: BuildStage, compiler: JavaCompiler) -> Option<&Arc<dyn BackendAdapter>> {
        match stage {
            BuildStage::CompileKotlin => Some(&self.kotlin),
            BuildStage::CompileJava => self.java.get(&compiler),
            BuildStage::Dex => Some(&self.dex),
            BuildStage::Clean | BuildStage::LoadDex => None,
        }
    }

    /// Returns the registered Java compilers.
    #[must_use]
    pub fn java_compilers(&self) -> Vec<JavaCompiler> {
        JavaCompiler::ALL
            .into_iter()
            .filter(|c| self.java.contains_key(c))
            .collect()
    }
}
