//! Shared deterministic types for the run-parts engine.
//!
//! These types carry no I/O. Entries are produced by `io::scan`, filtered by
//! `core::filter` and consumed by the orchestrator in `run`.

use std::borrow::Cow;
use std::ffi::OsString;
use std::path::Path;

use crate::exit_codes;

/// One entry of the scanned directory.
///
/// Only lives while the candidate list is built; the orchestrator keeps the
/// surviving entries in order and drops the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub file_name: OsString,
    pub is_dir: bool,
    /// Any of the `0o111` permission bits is set.
    pub is_executable: bool,
}

impl DirectoryEntry {
    pub fn new(file_name: impl Into<OsString>, is_dir: bool, is_executable: bool) -> Self {
        Self {
            file_name: file_name.into(),
            is_dir,
            is_executable,
        }
    }

    /// File name as UTF-8, lossy for names that are not.
    pub fn name(&self) -> Cow<'_, str> {
        self.file_name.to_string_lossy()
    }
}

/// Result of handing one script to a [`crate::io::process::ScriptRunner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptOutcome {
    /// The script ran to completion with this exit code (signals already mapped).
    Exited(i32),
    /// The script never started.
    SpawnFailed,
}

impl ScriptOutcome {
    /// Exit code recorded in [`Status`] for this outcome.
    pub fn exit_code(self) -> i32 {
        match self {
            ScriptOutcome::Exited(code) => code,
            ScriptOutcome::SpawnFailed => exit_codes::SPAWN_FAILED,
        }
    }
}

/// Aggregate state of one orchestrator run.
///
/// `exit_code` is the code of the most recently executed script, not the
/// first failure or the maximum: `0, 3, 0` ends with `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    pub exit_code: i32,
    /// Scripts handed to the runner (started or not).
    pub executed: u32,
    pub spawn_failures: u32,
}

impl Status {
    pub fn record(&mut self, outcome: ScriptOutcome) {
        self.executed += 1;
        if outcome == ScriptOutcome::SpawnFailed {
            self.spawn_failures += 1;
        }
        self.exit_code = outcome.exit_code();
    }

    /// True once a previous script left a non-zero code behind.
    pub fn has_failed(&self) -> bool {
        self.exit_code != exit_codes::OK
    }
}

/// Identity printed for a script: its path followed by the forwarded arguments.
pub fn format_identity(path: &Path, args: &[String]) -> String {
    let mut identity = path.display().to_string();
    for arg in args {
        identity.push(' ');
        identity.push_str(arg);
    }
    identity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_keeps_most_recent_code() {
        let mut status = Status::default();
        for code in [0, 3, 0] {
            status.record(ScriptOutcome::Exited(code));
        }
        assert_eq!(status.exit_code, 0);
        assert_eq!(status.executed, 3);
        assert!(!status.has_failed());
    }

    #[test]
    fn spawn_failure_counts_as_failure() {
        let mut status = Status::default();
        status.record(ScriptOutcome::SpawnFailed);
        assert_eq!(status.exit_code, exit_codes::SPAWN_FAILED);
        assert_eq!(status.spawn_failures, 1);
        assert!(status.has_failed());
    }

    #[test]
    fn identity_appends_args() {
        let identity = format_identity(
            Path::new("/etc/cron.daily/logrotate"),
            &["--force".to_string(), "x".to_string()],
        );
        assert_eq!(identity, "/etc/cron.daily/logrotate --force x");
    }

    #[test]
    fn identity_without_args_is_path() {
        assert_eq!(format_identity(Path::new("dir/a"), &[]), "dir/a");
    }
}
