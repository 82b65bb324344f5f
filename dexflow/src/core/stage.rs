//! Build stages and their display labels.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of the build.
///
/// The derived ordering is the execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStage {
    /// Source sanitation of the active file.
    Clean,
    /// Kotlin compilation.
    CompileKotlin,
    /// Java compilation with the configured compiler.
    CompileJava,
    /// Class files to dex conversion.
    Dex,
    /// Loading the dex to list its entry points. Runs only after a
    /// successful build.
    LoadDex,
}

impl BuildStage {
    /// The stages every build runs, in order.
    pub const PIPELINE: [Self; 4] = [Self::Clean, Self::CompileKotlin, Self::CompileJava, Self::Dex];

    /// The stages backed by an external tool.
    pub const BACKEND_STAGES: [Self; 3] = [Self::CompileKotlin, Self::CompileJava, Self::Dex];

    /// Returns the stable identifier used in logs and events.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::CompileKotlin => "compile_kotlin",
            Self::CompileJava => "compile_java",
            Self::Dex => "dex",
            Self::LoadDex => "load_dex",
        }
    }
}

impl fmt::Display for BuildStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human-readable stage labels shown to the user.
///
/// Labels only feed notifications; they carry no behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageLabels {
    /// Label for [`BuildStage::Clean`].
    pub clean: String,
    /// Label for [`BuildStage::CompileKotlin`].
    pub compile_kotlin: String,
    /// Label for [`BuildStage::CompileJava`].
    pub compile_java: String,
    /// Label for [`BuildStage::Dex`].
    pub dex: String,
    /// Label for [`BuildStage::LoadDex`].
    pub load_dex: String,
}

impl Default for StageLabels {
    fn default() -> Self {
        Self {
            clean: "Cleaning".to_string(),
            compile_kotlin: "Compiling Kotlin".to_string(),
            compile_java: "Compiling Java".to_string(),
            dex: "Dexing".to_string(),
            load_dex: "Loading dex".to_string(),
        }
    }
}

impl StageLabels {
    /// Returns the label of a stage.
    #[must_use]
    pub fn label(&self, stage: BuildStage) -> &str {
        match stage {
            BuildStage::Clean => &self.clean,
            BuildStage::CompileKotlin => &self.compile_kotlin,
            BuildStage::CompileJava => &self.compile_java,
            BuildStage::Dex => &self.dex,
            BuildStage::LoadDex => &self.load_dex,
        }
    }
}
