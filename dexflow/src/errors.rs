//! Error types for the dexflow build pipeline.
//!
//! Stage failures never escape a run as Rust errors. They are classified
//! into a [`StructuredFailure`] at the stage boundary and reported through
//! the notifier. The remaining types cover the library surface around the
//! pipeline: settings, the worker thread and artifact inspection.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// The main error type for dexflow operations outside a pipeline run.
#[derive(Debug, Error)]
pub enum DexflowError {
    /// A settings store could not be read.
    #[error("{0}")]
    Settings(#[from] SettingsError),

    /// The build worker could not be started or died.
    #[error("Build worker error: {0}")]
    Worker(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for DexflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Failure reported by a [`BackendAdapter`](crate::backends::BackendAdapter).
///
/// `Compilation` is the expected outcome of broken user code and its message
/// is already meant for the user. Everything else is `Unexpected`.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The tool ran and rejected the input.
    #[error("{0}")]
    Compilation(String),

    /// The tool could not run, crashed, or failed in a way it did not report.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl BackendError {
    /// Creates an expected compilation failure.
    #[must_use]
    pub fn compilation(message: impl Into<String>) -> Self {
        Self::Compilation(message.into())
    }

    /// Creates an unexpected failure from a plain message.
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(anyhow::Error::msg(message.into()))
    }
}

/// Classified failure of one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructuredFailure {
    /// A compiler reported an error in the user's code.
    #[error("{message}")]
    CompilationFailed {
        /// The tool's message.
        message: String,
    },

    /// Anything else went wrong inside a stage.
    #[error("{message}")]
    UnexpectedError {
        /// Short description.
        message: String,
        /// Full error chain and backtrace.
        trace: String,
    },

    /// The source file could not be read or written during sanitation.
    #[error("{message}")]
    IoFailure {
        /// The I/O error description.
        message: String,
    },
}

impl StructuredFailure {
    /// Creates an unexpected error whose trace is the message itself.
    #[must_use]
    pub fn unexpected(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::UnexpectedError {
            trace: message.clone(),
            message,
        }
    }

    /// The text handed to `on_failed`.
    ///
    /// Compilation and I/O failures show only their message; unexpected
    /// failures show the full trace.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::CompilationFailed { message } | Self::IoFailure { message } => message,
            Self::UnexpectedError { trace, .. } => trace,
        }
    }

    /// Returns the short kind name used in logs and events.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CompilationFailed { .. } => "compilation_failed",
            Self::UnexpectedError { .. } => "unexpected_error",
            Self::IoFailure { .. } => "io_failure",
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("kind".to_string(), serde_json::json!(self.kind()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        if let Self::UnexpectedError { trace, .. } = self {
            map.insert("trace".to_string(), serde_json::json!(trace));
        }
        map
    }
}

impl From<BackendError> for StructuredFailure {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Compilation(message) => Self::CompilationFailed { message },
            BackendError::Unexpected(err) => Self::UnexpectedError {
                message: err.to_string(),
                trace: format!("{err:?}"),
            },
        }
    }
}

impl From<std::io::Error> for StructuredFailure {
    fn from(err: std::io::Error) -> Self {
        Self::IoFailure {
            message: err.to_string(),
        }
    }
}

/// Errors raised while reading persisted settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        /// The file path.
        path: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not a JSON object of scalars.
    #[error("Invalid settings file {path}: {reason}")]
    Invalid {
        /// The file path.
        path: String,
        /// Why parsing failed.
        reason: String,
    },
}

/// Errors raised while parsing a dex container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DexParseError {
    /// The file does not start with a dex magic.
    #[error("Not a dex file: bad magic")]
    BadMagic,

    /// A read ran past the end of the data.
    #[error("Truncated dex file: needed {needed} bytes at offset {offset}, have {len}")]
    Truncated {
        /// Offset of the read.
        offset: usize,
        /// Bytes required.
        needed: usize,
        /// Total length of the data.
        len: usize,
    },

    /// A table index points outside its table.
    #[error("{table} index {index} out of range (size {size})")]
    IndexOutOfRange {
        /// The table name.
        table: &'static str,
        /// The offending index.
        index: u32,
        /// The table size.
        size: u32,
    },

    /// A string item is not valid modified UTF-8.
    #[error("Invalid string data at offset {offset}")]
    InvalidString {
        /// Offset of the string data.
        offset: usize,
    },
}

/// Errors raised while listing the entry points of an artifact.
#[derive(Debug, Error)]
pub enum InspectError {
    /// The artifact could not be read.
    #[error("Failed to read artifact {path}: {source}")]
    Read {
        /// The artifact path.
        path: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The artifact is malformed.
    #[error("Failed to parse artifact {path}: {source}")]
    Parse {
        /// The artifact path.
        path: String,
        /// The parse error.
        #[source]
        source: DexParseError,
    },

    /// Any other inspector-specific failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
