//! Test-only helpers: scratch script directories, capturing sinks, and a
//! scripted runner that never spawns processes.

use std::collections::VecDeque;
use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::error::RunPartsError;
use crate::io::log::LogSink;
use crate::io::process::{OutputSinks, ScriptRequest, ScriptRunner};

/// Temporary directory populated with scripts.
pub struct ScriptDir {
    dir: TempDir,
}

impl ScriptDir {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp dir")?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write an executable `#!/bin/sh` script that exits with `exit_code`.
    pub fn write_script(&self, name: &str, exit_code: i32) -> Result<PathBuf> {
        self.write_script_body(name, &format!("exit {exit_code}"))
    }

    /// Write an executable `#!/bin/sh` script with the given body.
    pub fn write_script_body(&self, name: &str, body: &str) -> Result<PathBuf> {
        self.write_file(name, &format!("#!/bin/sh\n{body}\n"), 0o755)
    }

    pub fn write_file(&self, name: &str, contents: &str, mode: u32) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        fs::set_permissions(&path, fs::Permissions::from_mode(mode))
            .with_context(|| format!("chmod {}", path.display()))?;
        Ok(path)
    }

    pub fn mkdir(&self, name: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        fs::create_dir(&path).with_context(|| format!("mkdir {}", path.display()))?;
        Ok(path)
    }
}

/// In-memory writer that can be cloned and inspected after the fact.
#[derive(Debug, Default, Clone)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Captures child stdout/stderr instead of writing to the test's own streams.
#[derive(Debug, Default, Clone)]
pub struct CapturedSinks {
    pub stdout: SharedBuffer,
    pub stderr: SharedBuffer,
}

impl OutputSinks for CapturedSinks {
    type Stdout = SharedBuffer;
    type Stderr = SharedBuffer;

    fn stdout(&self) -> SharedBuffer {
        self.stdout.clone()
    }

    fn stderr(&self) -> SharedBuffer {
        self.stderr.clone()
    }
}

/// Log sink that records every line.
#[derive(Debug, Default)]
pub struct RecordingLog {
    lines: Mutex<Vec<String>>,
}

impl RecordingLog {
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LogSink for RecordingLog {
    fn line(&self, message: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }
}

/// Predetermined result for one [`ScriptedRunner`] invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptedRun {
    Exit(i32),
    SpawnFailure,
}

/// Runner that returns queued results in order and records what it was asked
/// to run.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    queue: Mutex<VecDeque<ScriptedRun>>,
    invoked: Mutex<Vec<(PathBuf, Vec<String>)>>,
}

impl ScriptedRunner {
    pub fn new(runs: Vec<ScriptedRun>) -> Self {
        Self {
            queue: Mutex::new(runs.into()),
            invoked: Mutex::new(Vec::new()),
        }
    }

    /// File names of invoked scripts, in invocation order.
    pub fn invoked_names(&self) -> Vec<String> {
        self.invoked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(|(path, _)| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect()
    }

    pub fn invoked_args(&self) -> Vec<Vec<String>> {
        self.invoked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, args)| args.clone())
            .collect()
    }
}

impl ScriptRunner for ScriptedRunner {
    fn run(&self, request: &ScriptRequest<'_>) -> Result<i32> {
        self.invoked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((request.path.to_path_buf(), request.args.to_vec()));
        let next = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(ScriptedRun::Exit(0));
        match next {
            ScriptedRun::Exit(code) => Ok(code),
            ScriptedRun::SpawnFailure => Err(RunPartsError::Spawn {
                path: request.path.to_path_buf(),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            }
            .into()),
        }
    }
}
