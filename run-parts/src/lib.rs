//! Run every eligible script in a directory, in a deterministic order.
//!
//! The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (naming policy, status
//!   aggregation). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (directory listing, umask, child
//!   processes, output annotation, product log).
//!
//! [`run::Orchestrator`] combines both to implement the CLI.

pub mod config;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod run;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
