//! Running one script as a child process.
//!
//! The [`ScriptRunner`] trait decouples orchestration from real process
//! spawning. Tests use scripted runners that return predetermined exit codes.

use std::io::{self, Read, Write};
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};

use crate::error::RunPartsError;
use crate::exit_codes;
use crate::io::report::{ReportPolicy, ReportState, ReportingWriter};
use crate::io::umask::UmaskGuard;

/// Parameters for one script invocation.
#[derive(Debug, Clone)]
pub struct ScriptRequest<'a> {
    pub path: &'a Path,
    pub args: &'a [String],
    /// Parsed octal umask applied for the whole life of the child.
    pub umask: u32,
    pub report: ReportPolicy,
}

/// Abstraction over script execution backends.
pub trait ScriptRunner {
    /// Run the script to completion and return its exit code.
    ///
    /// A script that cannot be started must fail with
    /// [`RunPartsError::Spawn`] so callers can tell "never ran" from
    /// "ran and failed".
    fn run(&self, request: &ScriptRequest<'_>) -> Result<i32>;
}

impl<R: ScriptRunner + ?Sized> ScriptRunner for &R {
    fn run(&self, request: &ScriptRequest<'_>) -> Result<i32> {
        (**self).run(request)
    }
}

/// Where a child's output ends up.
pub trait OutputSinks {
    type Stdout: Write + Send;
    type Stderr: Write + Send;

    fn stdout(&self) -> Self::Stdout;
    fn stderr(&self) -> Self::Stderr;
}

/// The parent's own stdout/stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct Inherited;

impl OutputSinks for Inherited {
    type Stdout = io::Stdout;
    type Stderr = io::Stderr;

    fn stdout(&self) -> io::Stdout {
        io::stdout()
    }

    fn stderr(&self) -> io::Stderr {
        io::stderr()
    }
}

/// Runner that spawns the script with its output piped through
/// [`ReportingWriter`]s.
#[derive(Debug, Default)]
pub struct ProcessRunner<S = Inherited> {
    sinks: S,
}

impl<S: OutputSinks> ProcessRunner<S> {
    pub fn new(sinks: S) -> Self {
        Self { sinks }
    }
}

impl<S: OutputSinks> ScriptRunner for ProcessRunner<S> {
    #[instrument(skip_all, fields(script = %request.path.display()))]
    fn run(&self, request: &ScriptRequest<'_>) -> Result<i32> {
        // Held until the child has exited and both pipes are drained.
        let _umask = UmaskGuard::set(request.umask);
        let state = ReportState::new(request.path.display().to_string());

        let mut cmd = Command::new(request.path);
        cmd.args(request.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!("spawning script");
        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(source) => {
                warn!(err = %source, "failed to spawn script");
                return Err(RunPartsError::Spawn {
                    path: request.path.to_path_buf(),
                    source,
                }
                .into());
            }
        };

        let child_stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("stdout was not piped"))?;
        let child_stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("stderr was not piped"))?;
        let stdout =
            ReportingWriter::new(self.sinks.stdout(), state.clone(), request.report.stdout());
        let stderr = ReportingWriter::new(self.sinks.stderr(), state, request.report.stderr());

        let status = thread::scope(|scope| {
            let stdout_handle = scope.spawn(move || pump(child_stdout, stdout));
            let stderr_handle = scope.spawn(move || pump(child_stderr, stderr));
            let status = child.wait();
            join_pump(stdout_handle, "stdout");
            join_pump(stderr_handle, "stderr");
            status
        })
        .context("wait for script")?;

        let code = exit_code_from_status(status);
        debug!(exit_code = code, "script finished");
        Ok(code)
    }
}

/// Map a finished child's status to the code recorded for it.
///
/// Normal exits keep their code. A child killed by signal `N` maps to
/// `128 + N`, the shell convention.
pub fn exit_code_from_status(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    match status.signal() {
        Some(signal) => exit_codes::SIGNAL_BASE + signal,
        None => exit_codes::INVALID,
    }
}

/// Copy a child stream into `writer` until EOF.
///
/// Once the writer fails the rest of the stream is drained and discarded so
/// the child never blocks on a full pipe.
fn pump<R: Read, W: Write>(mut reader: R, mut writer: W) -> io::Result<()> {
    let mut chunk = [0u8; 8192];
    let mut write_error = None;

    loop {
        let n = match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if write_error.is_some() {
            continue;
        }
        if let Err(e) = writer.write_all(&chunk[..n]).and_then(|()| writer.flush()) {
            write_error = Some(e);
        }
    }

    match write_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn join_pump(handle: thread::ScopedJoinHandle<'_, io::Result<()>>, stream: &str) {
    match handle.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(stream, err = %e, "failed to forward script output"),
        Err(_) => warn!(stream, "output forwarding thread panicked"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CapturedSinks, ScriptDir};

    fn request<'a>(path: &'a Path, args: &'a [String], report: bool) -> ScriptRequest<'a> {
        ScriptRequest {
            path,
            args,
            umask: 0o022,
            report: ReportPolicy {
                report,
                verbose: false,
            },
        }
    }

    #[test]
    fn returns_child_exit_code() {
        let dir = ScriptDir::new().expect("script dir");
        let path = dir.write_script("fail", 3).expect("write");
        let runner = ProcessRunner::new(CapturedSinks::default());
        let code = runner.run(&request(&path, &[], false)).expect("run");
        assert_eq!(code, 3);
    }

    #[test]
    fn forwards_arguments() {
        let dir = ScriptDir::new().expect("script dir");
        let path = dir
            .write_script_body("echo-args", "echo \"$@\"")
            .expect("write");
        let sinks = CapturedSinks::default();
        let runner = ProcessRunner::new(sinks.clone());
        let args = vec!["one".to_string(), "two words".to_string()];
        let code = runner.run(&request(&path, &args, false)).expect("run");
        assert_eq!(code, 0);
        assert_eq!(sinks.stdout.contents(), "one two words\n");
    }

    #[test]
    fn report_prefixes_first_output_once() {
        let dir = ScriptDir::new().expect("script dir");
        let path = dir
            .write_script_body("noisy", "echo out\necho err >&2\necho more")
            .expect("write");
        let sinks = CapturedSinks::default();
        let runner = ProcessRunner::new(sinks.clone());
        runner.run(&request(&path, &[], true)).expect("run");

        let identity = format!("{}:\n", path.display());
        let out = sinks.stdout.contents();
        let err = sinks.stderr.contents();
        let combined = format!("{out}{err}");
        assert_eq!(combined.matches(&identity).count(), 1);
        assert!(out.ends_with("out\nmore\n"));
        assert!(err.ends_with("err\n"));
    }

    #[test]
    fn silent_script_is_not_reported() {
        let dir = ScriptDir::new().expect("script dir");
        let path = dir.write_script("quiet", 0).expect("write");
        let sinks = CapturedSinks::default();
        let runner = ProcessRunner::new(sinks.clone());
        runner.run(&request(&path, &[], true)).expect("run");
        assert_eq!(sinks.stdout.contents(), "");
        assert_eq!(sinks.stderr.contents(), "");
    }

    #[test]
    fn signal_maps_to_128_plus_signal() {
        let dir = ScriptDir::new().expect("script dir");
        let path = dir
            .write_script_body("killed", "kill -9 $$")
            .expect("write");
        let runner = ProcessRunner::new(CapturedSinks::default());
        let code = runner.run(&request(&path, &[], false)).expect("run");
        assert_eq!(code, 128 + 9);
    }

    #[test]
    fn unstartable_script_is_spawn_error() {
        let dir = ScriptDir::new().expect("script dir");
        let path = dir
            .write_file("bad-interp", "#!/nonexistent/interpreter\n", 0o755)
            .expect("write");
        let runner = ProcessRunner::new(CapturedSinks::default());
        let err = runner.run(&request(&path, &[], false)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RunPartsError>(),
            Some(RunPartsError::Spawn { .. })
        ));
    }
}
