// src/engine/report.rs

//! Observable output of the supervisor.
//!
//! The core emits [`Report`]s as commands; the shell hands them to a
//! [`Reporter`]. Production uses [`TracingReporter`]; tests plug in a
//! recorder to assert on the sequence.

use std::time::Duration;

use tracing::{error, info, warn};

use crate::exec::ExitInfo;
use crate::watch::ChangeRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Started { pid: u32 },
    Exited(ExitInfo),
    Restarting { delay: Duration },
    Changed(Option<ChangeRecord>),
    Stopping { pid: u32 },
    Stopped { pid: u32, exit: Option<ExitInfo> },
    StopFailed { pid: u32, timeout: Duration },
    /// Debug-only "no changes" tick.
    Heartbeat,
}

pub trait Reporter: Send {
    fn report(&mut self, report: &Report);
}

/// Writes every report as a structured `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&mut self, report: &Report) {
        match report {
            Report::Started { pid } => {
                info!(pid, "server started");
            }
            Report::Exited(exit) => {
                warn!(
                    pid = exit.pid,
                    signal = ?exit.signal,
                    code = ?exit.code,
                    "server exited"
                );
                if !exit.success() {
                    error!(pid = exit.pid, "server exited with non-zero status");
                }
            }
            Report::Restarting { delay } => {
                info!(delay_secs = delay.as_secs(), "will try to restart server");
            }
            Report::Changed(Some(record)) => {
                info!(
                    path = %record.path.display(),
                    old_hash = record.old_hash.as_deref().unwrap_or("none"),
                    new_hash = record.new_hash.as_deref().unwrap_or("none"),
                    "file changed; restarting server"
                );
            }
            Report::Changed(None) => {
                info!("watched files changed; restarting server");
            }
            Report::Stopping { pid } => {
                info!(pid, "stopping old server");
            }
            Report::Stopped { pid, exit } => {
                info!(pid, code = ?exit.and_then(|e| e.code), "old server stopped");
            }
            Report::StopFailed { pid, timeout } => {
                error!(
                    pid,
                    timeout_secs = timeout.as_secs(),
                    "failed to stop server; giving up without starting a new one"
                );
            }
            Report::Heartbeat => {
                info!("no changes");
            }
        }
    }
}
