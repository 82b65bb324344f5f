//! Entry points of a produced artifact and the outcome of invoking one.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A fully qualified class name inside the artifact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactEntryPoint(String);

impl ArtifactEntryPoint {
    /// Creates an entry point from a dotted class name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates an entry point from a type descriptor like `Lcom/example/Main;`.
    ///
    /// Returns `None` for descriptors that are not class types.
    #[must_use]
    pub fn from_descriptor(descriptor: &str) -> Option<Self> {
        let inner = descriptor.strip_prefix('L')?.strip_suffix(';')?;
        if inner.is_empty() {
            return None;
        }
        Some(Self(inner.replace('/', ".")))
    }

    /// Returns the dotted class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Returns the simple name after the last dot.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for ArtifactEntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArtifactEntryPoint {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Entry points listed from one specific artifact.
///
/// The digest identifies the artifact bytes the listing came from, so a
/// listing can never be mistaken for one of a later build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactListing {
    /// Hex SHA-256 of the artifact.
    pub digest: String,
    /// Invocable classes in artifact order.
    pub entry_points: Vec<ArtifactEntryPoint>,
}

impl ArtifactListing {
    /// Creates a listing.
    #[must_use]
    pub fn new(digest: impl Into<String>, entry_points: Vec<ArtifactEntryPoint>) -> Self {
        Self {
            digest: digest.into(),
            entry_points,
        }
    }

    /// Returns true if the artifact exposes no entry point.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entry_points.is_empty()
    }

    /// Returns the entry point names for display.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.entry_points.iter().map(|e| e.name().to_string()).collect()
    }
}

/// What happened when an entry point was invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvocationOutcome {
    /// The entry point ran to completion.
    Ran {
        /// Captured runtime logs.
        logs: String,
    },
    /// The invoked code itself failed.
    InvocationTargetFailed {
        /// The failure reported by the invoked code.
        message: String,
        /// Captured runtime logs.
        logs: String,
    },
    /// The entry point could not be loaded or called.
    InvocationSetupFailed {
        /// The raw failure description.
        message: String,
        /// Captured runtime logs.
        logs: String,
        /// Full diagnostic trace.
        trace: String,
    },
}

impl InvocationOutcome {
    /// Returns true if the entry point ran to completion.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ran { .. })
    }

    /// Returns the captured logs.
    #[must_use]
    pub fn logs(&self) -> &str {
        match self {
            Self::Ran { logs }
            | Self::InvocationTargetFailed { logs, .. }
            | Self::InvocationSetupFailed { logs, .. } => logs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_descriptor() {
        let entry = ArtifactEntryPoint::from_descriptor("Lcom/example/Main;").unwrap();
        assert_eq!(entry.name(), "com.example.Main");
        assert_eq!(entry.simple_name(), "Main");
    }

    #[test]
    fn test_from_descriptor_rejects_non_class() {
        assert!(ArtifactEntryPoint::from_descriptor("I").is_none());
        assert!(ArtifactEntryPoint::from_descriptor("[Ljava/lang/String;").is_none());
        assert!(ArtifactEntryPoint::from_descriptor("L;").is_none());
    }

    #[test]
    fn test_default_package_simple_name() {
        let entry = ArtifactEntryPoint::new("Main");
        assert_eq!(entry.simple_name(), "Main");
    }

    #[test]
    fn test_listing_names() {
        let listing = ArtifactListing::new(
            "abc",
            vec!["com.example.Main".into(), "com.example.Util".into()],
        );
        assert!(!listing.is_empty());
        assert_eq!(listing.names(), vec!["com.example.Main", "com.example.Util"]);
    }

    #[test]
    fn test_outcome_logs() {
        let outcome = InvocationOutcome::InvocationTargetFailed {
            message: "java.lang.ArithmeticException: / by zero".to_string(),
            logs: "started\n".to_string(),
        };
        assert!(!outcome.is_success());
        assert_eq!(outcome.logs(), "started\n");
    }
}
