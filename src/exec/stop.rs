// src/exec/stop.rs

//! Graceful stop of the supervised child.
//!
//! Send SIGTERM, then poll once per `retry` interval until the child has been
//! reaped or no longer exists. If it is still around after `timeout`, give up
//! and report it. There is no SIGKILL escalation: a child that ignores the
//! graceful signal is left for the operator.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::errors::Result;
use crate::exec::backend::{ExitInfo, ProcessBackend};

/// Default graceful-stop timeout for the serve loop.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(45);

/// Granularity of the stop polling loop.
pub const STOP_RETRY_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopPolicy {
    pub timeout: Duration,
    pub retry: Duration,
}

impl Default for StopPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_STOP_TIMEOUT,
            retry: STOP_RETRY_INTERVAL,
        }
    }
}

impl StopPolicy {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The child is gone. `Some` when we reaped it ourselves.
    Stopped(Option<ExitInfo>),
    /// The child was still alive when the timeout expired.
    TimedOut,
}

/// Stop `pid`, re-sending the graceful signal on every retry.
pub async fn stop_child<B>(backend: &mut B, pid: u32, policy: StopPolicy) -> Result<StopOutcome>
where
    B: ProcessBackend + ?Sized,
{
    let started = Instant::now();

    loop {
        // Reap first: a terminated but unreaped child still answers signal 0.
        if let Some(exit) = backend.try_wait()? {
            if exit.pid == pid {
                debug!(pid, ?exit, "child reaped after stop request");
                return Ok(StopOutcome::Stopped(Some(exit)));
            }
        }

        if !backend.is_alive(pid) {
            debug!(pid, "child no longer exists");
            return Ok(StopOutcome::Stopped(None));
        }

        if started.elapsed() >= policy.timeout {
            return Ok(StopOutcome::TimedOut);
        }

        if let Err(err) = backend.terminate(pid) {
            warn!(pid, error = %err, "failed to signal child");
        }
        sleep(policy.retry).await;
    }
}
