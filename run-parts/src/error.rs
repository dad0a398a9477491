//! Typed failure kinds surfaced by the engine.
//!
//! Orchestration code returns `anyhow::Result`; callers that need to tell the
//! kinds apart use `err.downcast_ref::<RunPartsError>()`. Messages leave the
//! cause to the source chain; print with `{:#}` to see it.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunPartsError {
    /// The target directory could not be listed. Fatal, nothing runs.
    #[error("failed to open directory {}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The `--regex` pattern did not compile. Fatal, nothing runs.
    #[error("invalid regex {pattern:?}")]
    Filter {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A single script could not be started. Recorded per script; the run
    /// continues.
    #[error("failed to exec {}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A configuration precondition does not hold.
    #[error("{0}")]
    InvalidConfig(String),
}

impl RunPartsError {
    /// True for kinds that abort the whole run before any script executes.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, RunPartsError::Spawn { .. })
    }
}
