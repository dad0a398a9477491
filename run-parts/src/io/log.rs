//! Product log: the human-visible `run-parts: ...` lines.

use std::io::Write;

/// Prefix carried by every product log line.
pub const LOG_PREFIX: &str = "run-parts: ";

/// Line-oriented sink for list/test/verbose/report messages.
///
/// The engine hands over bare messages; prefixes and formatting belong to the
/// sink.
pub trait LogSink {
    fn line(&self, message: &str);
}

/// Writes `run-parts: <message>` lines to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrLog;

impl LogSink for StderrLog {
    fn line(&self, message: &str) {
        let mut stderr = std::io::stderr().lock();
        // Nothing sensible to do if stderr is gone.
        let _ = writeln!(stderr, "{LOG_PREFIX}{message}");
    }
}

impl<L: LogSink + ?Sized> LogSink for &L {
    fn line(&self, message: &str) {
        (**self).line(message);
    }
}
