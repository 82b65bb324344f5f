//! Resolved per-run build configuration.

use super::{SettingsStore, KEY_COMPILER, KEY_JAVA_RELEASE, KEY_RUN_ARGS};
use crate::core::StageLabels;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// The Java compiler used for [`BuildStage::CompileJava`](crate::core::BuildStage::CompileJava).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JavaCompiler {
    /// The JDK compiler.
    #[default]
    Javac,
    /// The Eclipse compiler for Java.
    #[serde(rename = "ECJ")]
    Ecj,
}

impl JavaCompiler {
    /// All compilers, in settings display order.
    pub const ALL: [Self; 2] = [Self::Javac, Self::Ecj];

    /// Returns the name stored in settings.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Javac => "Javac",
            Self::Ecj => "ECJ",
        }
    }
}

impl fmt::Display for JavaCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JavaCompiler {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown Java compiler '{s}'"))
    }
}

/// Configuration of one build run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Compiler for the Java stage.
    pub java_compiler: JavaCompiler,
    /// Java release passed to the compiler, if any.
    pub java_release: Option<String>,
    /// Arguments passed to the selected entry point.
    pub run_args: Vec<String>,
    /// Whether to offer entry-point selection after a successful build.
    pub execute: bool,
    /// Stage labels used in notifications.
    pub labels: StageLabels,
}

impl BuildConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the configuration from a settings store.
    ///
    /// The compiler setting selects `Javac` when it is absent or exactly
    /// `"Javac"`. Any other stored value selects ECJ.
    #[must_use]
    pub fn resolve(settings: &dyn SettingsStore) -> Self {
        let java_compiler = match settings.get(KEY_COMPILER).as_deref() {
            None | Some("Javac") => JavaCompiler::Javac,
            Some(name) => {
                if name != JavaCompiler::Ecj.as_str() {
                    warn!(setting = name, "Unrecognized compiler setting, using ECJ");
                }
                JavaCompiler::Ecj
            }
        };

        let java_release = settings
            .get(KEY_JAVA_RELEASE)
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        let run_args = settings
            .get(KEY_RUN_ARGS)
            .map(|args| args.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        Self {
            java_compiler,
            java_release,
            run_args,
            ..Self::default()
        }
    }

    /// Sets the Java compiler.
    #[must_use]
    pub fn with_java_compiler(mut self, compiler: JavaCompiler) -> Self {
        self.java_compiler = compiler;
        self
    }

    /// Enables entry-point selection after a successful build.
    #[must_use]
    pub fn with_execute(mut self, execute: bool) -> Self {
        self.execute = execute;
        self
    }

    /// Sets the stage labels.
    #[must_use]
    pub fn with_labels(mut self, labels: StageLabels) -> Self {
        self.labels = labels;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InMemorySettings;

    #[test]
    fn test_compiler_parse() {
        assert_eq!("Javac".parse::<JavaCompiler>(), Ok(JavaCompiler::Javac));
        assert_eq!("ecj".parse::<JavaCompiler>(), Ok(JavaCompiler::Ecj));
        assert!("jikes".parse::<JavaCompiler>().is_err());
    }

    #[test]
    fn test_resolve_defaults() {
        let config = BuildConfig::resolve(&InMemorySettings::new());
        assert_eq!(config.java_compiler, JavaCompiler::Javac);
        assert_eq!(config.java_release, None);
        assert!(config.run_args.is_empty());
        assert!(!config.execute);
    }

    #[test]
    fn test_resolve_reads_settings() {
        let settings = InMemorySettings::new()
            .with(KEY_COMPILER, "ECJ")
            .with(KEY_JAVA_RELEASE, " 8 ")
            .with(KEY_RUN_ARGS, "--verbose  input.txt");

        let config = BuildConfig::resolve(&settings);
        assert_eq!(config.java_compiler, JavaCompiler::Ecj);
        assert_eq!(config.java_release.as_deref(), Some("8"));
        assert_eq!(config.run_args, vec!["--verbose", "input.txt"]);
    }

    #[test]
    fn test_resolve_only_exact_javac_selects_javac() {
        let compiler = |value: &str| {
            BuildConfig::resolve(&InMemorySettings::new().with(KEY_COMPILER, value)).java_compiler
        };

        assert_eq!(compiler("Javac"), JavaCompiler::Javac);
        assert_eq!(compiler("ECJ"), JavaCompiler::Ecj);
        assert_eq!(compiler("javac"), JavaCompiler::Ecj);
        assert_eq!(compiler("Eclipse"), JavaCompiler::Ecj);
        assert_eq!(compiler(""), JavaCompiler::Ecj);
    }

    #[test]
    fn test_compiler_serialize() {
        assert_eq!(serde_json::to_string(&JavaCompiler::Ecj).unwrap(), r#""ECJ""#);
        assert_eq!(serde_json::to_string(&JavaCompiler::Javac).unwrap(), r#""Javac""#);
    }
}
