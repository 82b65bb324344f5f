//! Source sanitation run before every build.
//!
//! User programs run inside the host process, so a call to `System.exit`
//! would take the host down with it. Every such call is rewritten into a
//! print of the exit code on standard error.

use regex::{NoExpand, Regex};
use std::borrow::Cow;
use std::io;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

/// Text every exit call is rewritten to. The original argument list follows.
pub const EXIT_REPLACEMENT: &str = "System.err.println(\"Exit code \" + ";

/// Matches the start of an exit call, up to and including the open paren.
const EXIT_CALL_PATTERN: &str = r"\bSystem\s*\.\s*exit\s*\(";

// The pattern is a constant; `test_exit_call_pattern_compiles` pins it.
#[allow(clippy::expect_used)]
fn exit_call() -> &'static Regex {
    static EXIT_CALL: OnceLock<Regex> = OnceLock::new();
    EXIT_CALL.get_or_init(|| Regex::new(EXIT_CALL_PATTERN).expect("exit call pattern is valid"))
}

/// Rewrites every `System.exit(` call in `source`.
///
/// The argument text is kept as is; `System.exit(1)` becomes
/// `System.err.println("Exit code " + 1)`. Sanitizing sanitized text is a
/// no-op.
///
/// The match is slightly wider than the literal text: whitespace around the
/// dot and before the paren is accepted (`System . exit (0)` is rewritten
/// too), and `System` must start a word, so `MySystem.exit(` is left alone.
#[must_use]
pub fn sanitize_source(source: &str) -> Cow<'_, str> {
    exit_call().replace_all(source, NoExpand(EXIT_REPLACEMENT))
}

/// What [`persist_sanitized`] did on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizeOutcome {
    /// The file already held the sanitized text.
    Unchanged,
    /// The sanitized text was written.
    Written,
}

/// Sanitizes `buffer` and writes it to `path` if it differs from the file.
///
/// A missing file counts as different and is created.
pub async fn persist_sanitized(path: &Path, buffer: &str) -> io::Result<SanitizeOutcome> {
    let sanitized = sanitize_source(buffer);

    let on_disk = match tokio::fs::read_to_string(path).await {
        Ok(text) => Some(text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(e),
    };

    if on_disk.as_deref() == Some(sanitized.as_ref()) {
        debug!(path = %path.display(), "Source unchanged");
        return Ok(SanitizeOutcome::Unchanged);
    }

    tokio::fs::write(path, sanitized.as_bytes()).await?;
    debug!(path = %path.display(), bytes = sanitized.len(), "Source rewritten");
    Ok(SanitizeOutcome::Written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_exit_call_pattern_compiles() {
        assert!(Regex::new(EXIT_CALL_PATTERN).is_ok());
        assert!(exit_call().is_match("System.exit("));
    }

    #[test]
    fn test_exit_call_is_rewritten() {
        assert_eq!(
            sanitize_source("System.exit(1);"),
            "System.err.println(\"Exit code \" + 1);"
        );
    }

    #[test]
    fn test_argument_is_not_evaluated() {
        assert_eq!(
            sanitize_source("if (bad) System.exit(code + 2);"),
            "if (bad) System.err.println(\"Exit code \" + code + 2);"
        );
    }

    #[test]
    fn test_spaced_call_is_rewritten() {
        assert_eq!(
            sanitize_source("System . exit (0);"),
            "System.err.println(\"Exit code \" + 0);"
        );
    }

    #[test]
    fn test_other_identifiers_untouched() {
        let source = "MySystem.exit(1); System.out.println(\"exit(\");";
        assert!(matches!(sanitize_source(source), Cow::Borrowed(_)));
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let once = sanitize_source("a(); System.exit(3); System.exit(4);").into_owned();
        let twice = sanitize_source(&once);
        assert_eq!(twice, once);
    }

    #[tokio::test]
    async fn test_persist_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Main.java");
        std::fs::write(&path, "class Main { void f() { System.exit(1); } }").unwrap();
        let buffer = std::fs::read_to_string(&path).unwrap();

        assert_eq!(persist_sanitized(&path, &buffer).await.unwrap(), SanitizeOutcome::Written);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "class Main { void f() { System.err.println(\"Exit code \" + 1); } }"
        );
        assert_eq!(persist_sanitized(&path, &buffer).await.unwrap(), SanitizeOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_persist_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("New.java");

        assert_eq!(persist_sanitized(&path, "class New {}").await.unwrap(), SanitizeOutcome::Written);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "class New {}");
    }

    #[tokio::test]
    async fn test_persist_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be read as text.
        let result = persist_sanitized(dir.path(), "class A {}").await;
        assert!(result.is_err());
    }
}
