//! Stable exit codes for the run-parts CLI.

/// Every executed script succeeded (or the last one did, see [`crate::core::types::Status`]).
pub const OK: i32 = 0;
/// Fatal error before any script ran: invalid configuration, unreadable
/// directory, or malformed `--regex` pattern.
pub const INVALID: i32 = 1;
/// Recorded for a script that could not be started. The classic tool forks
/// first and the child exits 1 when exec fails, so the observable code is 1.
pub const SPAWN_FAILED: i32 = 1;
/// A child killed by signal `N` is recorded as `SIGNAL_BASE + N`.
pub const SIGNAL_BASE: i32 = 128;
