//! Test assertions for build results and notifications.

use super::{NotifierCall, RecordingNotifier};
use crate::core::{BuildResult, BuildStage, BuildTimings};

/// Asserts that the build succeeded and returns its timings.
pub fn assert_build_succeeded(result: &BuildResult) -> &BuildTimings {
    match result {
        BuildResult::Success(timings) => timings,
        BuildResult::Failure { stage, failure } => {
            panic!("Expected success, got failure at {stage}: {failure:?}")
        }
    }
}

/// Asserts that the build failed at `expected` with a failure of `kind`.
pub fn assert_build_failed(result: &BuildResult, expected: BuildStage, kind: &str) {
    let Some((stage, failure)) = result.failure() else {
        panic!("Expected failure at {expected}, got {result:?}");
    };
    assert_eq!(stage, expected, "Expected failure at {expected}, got {stage}");
    assert_eq!(
        failure.kind(),
        kind,
        "Expected {kind} failure, got {failure:?}"
    );
}

/// Asserts the exact sequence of announced stages.
pub fn assert_stages(notifier: &RecordingNotifier, expected: &[BuildStage]) {
    assert_eq!(
        notifier.stages(),
        expected,
        "Unexpected stage notifications: {:?}",
        notifier.calls()
    );
}

/// Asserts that exactly one terminal callback was made, and that it was the
/// last one.
pub fn assert_single_terminal(notifier: &RecordingNotifier) {
    let calls = notifier.calls();
    let terminal = calls
        .iter()
        .filter(|c| !matches!(c, NotifierCall::StageChanged(..)))
        .count();
    assert_eq!(terminal, 1, "Expected one terminal callback, got {calls:?}");
    assert!(
        !matches!(calls.last(), Some(NotifierCall::StageChanged(..))),
        "Terminal callback is not last: {calls:?}"
    );
}
