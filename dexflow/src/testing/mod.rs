//! Testing utilities for dexflow pipelines.
//!
//! This module provides:
//! - Mock backends, notifiers and execution collaborators
//! - Fixtures for on-disk projects and dex files
//! - Assertions for build results and notification order

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_build_failed, assert_build_succeeded, assert_single_terminal, assert_stages,
};
pub use fixtures::{dex_with_classes, write_project};
pub use mocks::{
    CallLog, MockBackend, NotifierCall, PanickingBackend, RecordingNotifier, ScriptedChooser,
    ScriptedRunner, StaticInspector,
};
