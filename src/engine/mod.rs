// src/engine/mod.rs

//! Supervision engine for watchserve.
//!
//! This module ties together:
//! - the child process lifecycle (start, exit, restart)
//! - the change source polled between checks
//! - the graceful stop protocol used before every restart
//! - shutdown requests (Ctrl-C)
//!
//! The pure state machine lives in [`core`] and [`event_handlers`]; the
//! async/IO shell is implemented in [`runtime`]; observable output goes
//! through the [`report::Reporter`] seam.

use std::time::Duration;

use crate::errors::Result;
use crate::exec::{ExitInfo, StopPolicy};
use crate::watch::ChangeRecord;

/// Default seconds between two change checks.
pub const DEFAULT_INTERVAL_SECS: u64 = 3;

/// Largest accepted check interval, in seconds.
pub const MAX_INTERVAL_SECS: u64 = 15;

/// Default backoff before restarting a child that exited on its own.
pub const DEFAULT_RESTART_DELAY_SECS: u64 = 3;

/// Lifecycle of the supervised child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Stopped,
    Starting,
    Running { pid: u32 },
    Stopping { pid: u32 },
    Exited { pid: u32 },
}

/// Events flowing into the core from the backend, the change source and
/// the shutdown signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// Supervision begins.
    Boot,
    /// A child was spawned.
    Started { pid: u32 },
    /// The non-blocking wait reaped the child.
    ChildExited(ExitInfo),
    /// The change source reported a change.
    SourceChanged(Option<ChangeRecord>),
    /// The change source reported nothing new.
    NoChange,
    /// The stop protocol saw the child go away.
    StopCompleted(Option<ExitInfo>),
    /// The child outlived the stop timeout.
    StopTimedOut,
    /// Final shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Why the supervision loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Shutdown,
    StopFailed { pid: u32 },
}

/// Timing knobs shared by the core and the async shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorOptions {
    /// Sleep between two change checks.
    pub interval: Duration,
    /// Backoff before restarting a child that exited.
    pub restart_delay: Duration,
    pub stop: StopPolicy,
    /// Report a heartbeat on every check that saw no change.
    pub debug: bool,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            restart_delay: Duration::from_secs(DEFAULT_RESTART_DELAY_SECS),
            stop: StopPolicy::default(),
            debug: false,
        }
    }
}

/// Anything the supervisor can ask "did the sources change?".
pub trait ChangeSource: Send {
    fn has_changed(&mut self) -> Result<bool>;
    /// Details of the last reported change, when known.
    fn changed_info(&self) -> Option<ChangeRecord>;
}

pub mod core;
pub mod event_handlers;
pub mod report;
pub mod runtime;

pub use core::SupervisorCore;
pub use event_handlers::{CoreCommand, CoreStep};
pub use report::{Report, Reporter, TracingReporter};
pub use runtime::Supervisor;
