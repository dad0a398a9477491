//! Orchestration for one `run-parts` invocation.
//!
//! Builds the ordered candidate list (scan + naming filter), then walks it
//! strictly sequentially. The list/test/execute decision is made per script.

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use crate::config::{Configuration, parse_umask};
use crate::core::filter::NamingFilter;
use crate::core::types::{DirectoryEntry, ScriptOutcome, Status, format_identity};
use crate::error::RunPartsError;
use crate::io::log::LogSink;
use crate::io::process::{ScriptRequest, ScriptRunner};
use crate::io::report::ReportPolicy;
use crate::io::scan::scan_directory;

/// Drives one run over a directory.
///
/// Not safe to use from several threads at once: each execution overrides the
/// process-wide umask.
#[derive(Debug)]
pub struct Orchestrator<R, L> {
    config: Configuration,
    filter: NamingFilter,
    umask: u32,
    runner: R,
    log: L,
}

impl<R: ScriptRunner, L: LogSink> Orchestrator<R, L> {
    /// Validate `config` and compile its naming policy.
    ///
    /// Fails with [`RunPartsError::InvalidConfig`] or
    /// [`RunPartsError::Filter`] before touching the filesystem.
    pub fn new(config: Configuration, runner: R, log: L) -> Result<Self, RunPartsError> {
        config.validate()?;
        let umask = parse_umask(&config.umask)?;
        let filter = NamingFilter::new(&config.filter_mode())?;
        Ok(Self {
            config,
            filter,
            umask,
            runner,
            log,
        })
    }

    /// Scan the directory and keep the entries the naming policy accepts,
    /// preserving scan order.
    pub fn candidates(&self) -> Result<Vec<DirectoryEntry>> {
        let entries = scan_directory(&self.config.directory, self.config.reverse)?;
        Ok(entries
            .into_iter()
            .filter(|entry| self.filter.include(entry))
            .collect())
    }

    /// Process every candidate and return the aggregate status.
    ///
    /// Errors only for discovery failures or unexpected I/O while waiting on
    /// a child; scripts that fail to start are logged and recorded.
    #[instrument(skip_all, fields(dir = %self.config.directory.display()))]
    pub fn run(&self) -> Result<Status> {
        let candidates = self.candidates()?;
        info!(count = candidates.len(), "candidates selected");

        let mut status = Status::default();
        for entry in &candidates {
            if self.config.exit_on_error && status.has_failed() {
                debug!(script = %entry.name(), "skipped after earlier failure");
                continue;
            }
            self.process(entry, &mut status)?;
        }
        Ok(status)
    }

    fn process(&self, entry: &DirectoryEntry, status: &mut Status) -> Result<()> {
        let cfg = &self.config;
        let path = cfg.directory.join(&entry.file_name);
        let identity = format_identity(&path, &cfg.args);

        if cfg.list {
            self.log.line(&identity);
            return Ok(());
        }
        if !entry.is_executable {
            debug!(script = %path.display(), "not executable, skipped");
            return Ok(());
        }
        if cfg.test {
            self.log.line(&identity);
            return Ok(());
        }
        if cfg.verbose {
            self.log.line(&format!("executing {identity}"));
        }

        let request = ScriptRequest {
            path: &path,
            args: &cfg.args,
            umask: self.umask,
            report: ReportPolicy {
                report: cfg.report,
                verbose: cfg.verbose,
            },
        };
        let outcome = match self.runner.run(&request) {
            Ok(code) => ScriptOutcome::Exited(code),
            Err(err) => {
                let recoverable = err
                    .downcast_ref::<RunPartsError>()
                    .is_some_and(|kind| !kind.is_fatal());
                if !recoverable {
                    return Err(err).with_context(|| format!("run {}", path.display()));
                }
                self.log.line(&format!("{err:#}"));
                ScriptOutcome::SpawnFailed
            }
        };
        status.record(outcome);

        // A script that never started already has its `failed to exec` line.
        if let ScriptOutcome::Exited(code) = outcome
            && (cfg.report || cfg.verbose)
            && code != 0
        {
            self.log.line(&format!(
                "{} exited with return code {code}",
                path.display()
            ));
        }
        Ok(())
    }
}
