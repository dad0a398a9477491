//! Output annotation for `--report`.
//!
//! Each script gets one [`ReportState`] shared by the writers wrapping its
//! stdout and stderr. Whichever writer sees output first (and is allowed to
//! report) prints `<identity>:` before that output; nothing prints it again
//! for the rest of the script's run.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// When each stream is allowed to print the identity line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportPolicy {
    pub report: bool,
    pub verbose: bool,
}

impl ReportPolicy {
    pub fn stdout(self) -> bool {
        self.report
    }

    /// `--verbose` already printed the identity on stderr before the script
    /// started, so stderr must not repeat it.
    pub fn stderr(self) -> bool {
        self.report && !self.verbose
    }
}

/// Single-use latch for one script invocation.
#[derive(Debug)]
pub struct ReportState {
    identity: String,
    reported: Mutex<bool>,
}

impl ReportState {
    pub fn new(identity: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            identity: identity.into(),
            reported: Mutex::new(false),
        })
    }

    pub fn is_reported(&self) -> bool {
        *self.reported.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Write the identity line to `sink` unless some writer already did.
    ///
    /// The line is written while the latch is held, so output from the other
    /// stream cannot land before it.
    fn report_once<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        let mut reported = self.reported.lock().unwrap_or_else(PoisonError::into_inner);
        if *reported {
            return Ok(());
        }
        sink.write_all(format!("{}:\n", self.identity).as_bytes())?;
        *reported = true;
        Ok(())
    }
}

/// Writer that may prefix the first chunk it forwards with the script identity.
#[derive(Debug)]
pub struct ReportingWriter<W> {
    inner: W,
    state: Arc<ReportState>,
    should_report: bool,
    seen_output: bool,
}

impl<W: Write> ReportingWriter<W> {
    pub fn new(inner: W, state: Arc<ReportState>, should_report: bool) -> Self {
        Self {
            inner,
            state,
            should_report,
            seen_output: false,
        }
    }
}

impl<W: Write> Write for ReportingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.seen_output {
            self.seen_output = true;
            if self.should_report {
                self.state.report_once(&mut self.inner)?;
            }
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::SharedBuffer;

    fn policy(report: bool, verbose: bool) -> ReportPolicy {
        ReportPolicy { report, verbose }
    }

    #[test]
    fn identity_printed_once_across_both_streams() {
        let state = ReportState::new("dir/job");
        let out = SharedBuffer::default();
        let err = SharedBuffer::default();
        let p = policy(true, false);
        let mut stdout = ReportingWriter::new(out.clone(), state.clone(), p.stdout());
        let mut stderr = ReportingWriter::new(err.clone(), state.clone(), p.stderr());

        stdout.write_all(b"hello\n").expect("write");
        stderr.write_all(b"oops\n").expect("write");
        stdout.write_all(b"again\n").expect("write");

        assert_eq!(out.contents(), "dir/job:\nhello\nagain\n");
        assert_eq!(err.contents(), "oops\n");
        assert!(state.is_reported());
    }

    #[test]
    fn identity_follows_first_stream_with_output() {
        let state = ReportState::new("dir/job");
        let out = SharedBuffer::default();
        let err = SharedBuffer::default();
        let p = policy(true, false);
        let mut stdout = ReportingWriter::new(out.clone(), state.clone(), p.stdout());
        let mut stderr = ReportingWriter::new(err.clone(), state.clone(), p.stderr());

        stderr.write_all(b"oops\n").expect("write");
        stdout.write_all(b"hello\n").expect("write");

        assert_eq!(err.contents(), "dir/job:\noops\n");
        assert_eq!(out.contents(), "hello\n");
    }

    #[test]
    fn verbose_suppresses_stderr_identity_only() {
        let state = ReportState::new("dir/job");
        let out = SharedBuffer::default();
        let err = SharedBuffer::default();
        let p = policy(true, true);
        let mut stdout = ReportingWriter::new(out.clone(), state.clone(), p.stdout());
        let mut stderr = ReportingWriter::new(err.clone(), state.clone(), p.stderr());

        stderr.write_all(b"oops\n").expect("write");
        assert!(!state.is_reported());
        stdout.write_all(b"hello\n").expect("write");

        assert_eq!(err.contents(), "oops\n");
        assert_eq!(out.contents(), "dir/job:\nhello\n");
    }

    #[test]
    fn no_report_passes_bytes_through() {
        let state = ReportState::new("dir/job");
        let out = SharedBuffer::default();
        let mut stdout =
            ReportingWriter::new(out.clone(), state.clone(), policy(false, false).stdout());
        stdout.write_all(b"plain").expect("write");
        assert_eq!(out.contents(), "plain");
        assert!(!state.is_reported());
    }

    #[test]
    fn silent_script_prints_nothing() {
        let state = ReportState::new("dir/job");
        let out = SharedBuffer::default();
        let stdout = ReportingWriter::new(out.clone(), state.clone(), true);
        drop(stdout);
        assert_eq!(out.contents(), "");
    }
}
