// src/exec/process.rs

//! Real OS process backend.

use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::debug;

use crate::errors::{Result, WatchserveError};
use crate::exec::backend::{ExitInfo, LaunchSpec, ProcessBackend};

/// Spawns the server with `tokio::process` and signals it with `nix` on Unix.
///
/// The child inherits stdin/stdout/stderr so the server's own output shows
/// up in the terminal. It is *not* killed when the backend is dropped: a
/// child that ignored SIGTERM is left for the operator to deal with.
#[derive(Debug, Default)]
pub struct RealProcessBackend {
    child: Option<Child>,
    pid: Option<u32>,
}

impl RealProcessBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProcessBackend for RealProcessBackend {
    fn spawn(&mut self, spec: &LaunchSpec) -> Result<u32> {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(false);
        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }

        let child = cmd
            .spawn()
            .map_err(|e| WatchserveError::SpawnFailed(format!("{spec}: {e}")))?;
        let pid = child
            .id()
            .ok_or_else(|| WatchserveError::SpawnFailed(format!("{spec}: no pid")))?;

        debug!(pid, cmd = %spec, "spawned child process");
        self.child = Some(child);
        self.pid = Some(pid);
        Ok(pid)
    }

    fn try_wait(&mut self) -> Result<Option<ExitInfo>> {
        let (Some(child), Some(pid)) = (self.child.as_mut(), self.pid) else {
            return Ok(None);
        };

        match child.try_wait()? {
            Some(status) => {
                self.child = None;
                Ok(Some(ExitInfo {
                    pid,
                    code: status.code(),
                    signal: exit_signal(&status),
                }))
            }
            None => Ok(None),
        }
    }

    #[cfg(unix)]
    fn terminate(&mut self, pid: u32) -> Result<()> {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        kill(Pid::from_raw(pid as i32), Signal::SIGTERM)
            .map_err(|e| WatchserveError::Other(anyhow::anyhow!("SIGTERM to pid {pid}: {e}")))
    }

    #[cfg(not(unix))]
    fn terminate(&mut self, pid: u32) -> Result<()> {
        match self.child.as_mut() {
            Some(child) if self.pid == Some(pid) => Ok(child.start_kill()?),
            _ => Ok(()),
        }
    }

    #[cfg(unix)]
    fn is_alive(&self, pid: u32) -> bool {
        use nix::errno::Errno;
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        // Our own child, already reaped: the pid may belong to someone else by now.
        if self.pid == Some(pid) && self.child.is_none() {
            return false;
        }
        !matches!(kill(Pid::from_raw(pid as i32), None), Err(Errno::ESRCH))
    }

    #[cfg(not(unix))]
    fn is_alive(&self, pid: u32) -> bool {
        self.pid == Some(pid) && self.child.is_some()
    }
}

#[cfg(unix)]
fn exit_signal(status: &std::process::ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn exit_signal(_status: &std::process::ExitStatus) -> Option<i32> {
    None
}
