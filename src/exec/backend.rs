// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The supervisor talks to a `ProcessBackend` instead of OS primitives
//! directly. The capability set is deliberately small:
//! spawn, non-blocking wait, graceful signal, liveness probe.
//!
//! - [`RealProcessBackend`](super::RealProcessBackend) is used in production.
//! - Tests provide a scripted implementation that never spawns processes.

use std::fmt;
use std::path::PathBuf;

use crate::errors::Result;

/// What to launch: `<program> <args...>` in `cwd`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl LaunchSpec {
    /// `<interpreter> <entry> <command words...>`.
    pub fn new(interpreter: impl Into<PathBuf>, entry: impl Into<PathBuf>, command: &str) -> Self {
        let entry: PathBuf = entry.into();
        let mut args = vec![entry.to_string_lossy().into_owned()];
        args.extend(command.split_whitespace().map(str::to_string));
        Self {
            program: interpreter.into(),
            args,
            cwd: None,
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

impl fmt::Display for LaunchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Exit status of a reaped child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitInfo {
    pub pid: u32,
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    /// Terminating signal, if any (always `None` off Unix).
    pub signal: Option<i32>,
}

impl ExitInfo {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Trait abstracting how the supervised child is spawned, reaped and signalled.
///
/// A backend manages at most one child at a time; the supervisor guarantees
/// it never calls `spawn` while the previous child may still be running.
pub trait ProcessBackend: Send {
    /// Start a new child and return its pid.
    fn spawn(&mut self, spec: &LaunchSpec) -> Result<u32>;

    /// Non-blocking wait: reap the current child if it has exited.
    fn try_wait(&mut self) -> Result<Option<ExitInfo>>;

    /// Ask the process to terminate (SIGTERM on Unix).
    fn terminate(&mut self, pid: u32) -> Result<()>;

    /// Liveness probe (signal 0 on Unix).
    fn is_alive(&self, pid: u32) -> bool;
}
