// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::{debug, info};

use crate::errors::{Result, WatchserveError};
use crate::exec::{stop_child, LaunchSpec, ProcessBackend, StopOutcome};

use super::core::SupervisorCore;
use super::report::{Reporter, TracingReporter};
use super::{ChangeSource, CoreCommand, CoreStep, ExitReason, SupervisorEvent, SupervisorOptions};

/// Keeps one child process alive and current with its sources.
///
/// This is the IO shell around [`SupervisorCore`]. Each iteration it:
/// 1. checks for a shutdown request,
/// 2. reaps the child without blocking,
/// 3. otherwise polls the change source,
///
/// feeds the result into the core and executes the returned commands. Only
/// one child exists at any time: a replacement is spawned strictly after the
/// stop protocol has seen the old one go away.
pub struct Supervisor<B: ProcessBackend, C: ChangeSource + 'static> {
    core: SupervisorCore,
    backend: B,
    source: Arc<Mutex<C>>,
    launch: LaunchSpec,
    reporter: Box<dyn Reporter>,
    shutdown_rx: Option<mpsc::Receiver<()>>,
}

impl<B: ProcessBackend, C: ChangeSource + 'static> fmt::Debug for Supervisor<B, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("core", &self.core)
            .field("launch", &self.launch)
            .finish_non_exhaustive()
    }
}

impl<B: ProcessBackend, C: ChangeSource + 'static> Supervisor<B, C> {
    pub fn new(launch: LaunchSpec, options: SupervisorOptions, backend: B, source: C) -> Self {
        Self {
            core: SupervisorCore::new(options),
            backend,
            source: Arc::new(Mutex::new(source)),
            launch,
            reporter: Box::new(TracingReporter),
            shutdown_rx: None,
        }
    }

    pub fn with_reporter(mut self, reporter: Box<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Each message on `rx` requests a final shutdown.
    pub fn with_shutdown(mut self, rx: mpsc::Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Main supervision loop.
    ///
    /// Returns `Ok(())` after a requested shutdown, and
    /// [`WatchserveError::StopTimeout`] when a child could not be stopped.
    pub async fn run(mut self) -> Result<()> {
        info!(cmd = %self.launch, "supervisor started");

        let mut step = self.core.step(SupervisorEvent::Boot);

        loop {
            if let Some(reason) = self.execute(step).await? {
                return self.finish(reason);
            }

            let event = self.next_event().await?;
            debug!(?event, "supervisor received event");
            step = self.core.step(event);
        }
    }

    fn finish(&self, reason: ExitReason) -> Result<()> {
        match reason {
            ExitReason::Shutdown => {
                info!("supervisor stopped");
                Ok(())
            }
            ExitReason::StopFailed { pid } => Err(WatchserveError::StopTimeout {
                pid,
                timeout_secs: self.core.options().stop.timeout.as_secs(),
            }),
        }
    }

    async fn next_event(&mut self) -> Result<SupervisorEvent> {
        if self.poll_shutdown() {
            return Ok(SupervisorEvent::ShutdownRequested);
        }

        if let Some(exit) = self.backend.try_wait()? {
            return Ok(SupervisorEvent::ChildExited(exit));
        }

        self.poll_source().await
    }

    /// Execute the commands of one step, plus the follow-up steps they cause.
    async fn execute(&mut self, step: CoreStep) -> Result<Option<ExitReason>> {
        let mut queue: VecDeque<CoreCommand> = step.commands.into();
        let mut exit = None;

        while let Some(command) = queue.pop_front() {
            let follow_up = match command {
                CoreCommand::StartChild => {
                    let pid = self.backend.spawn(&self.launch)?;
                    Some(SupervisorEvent::Started { pid })
                }
                CoreCommand::StopChild { pid } => {
                    let policy = self.core.options().stop;
                    match stop_child(&mut self.backend, pid, policy).await? {
                        StopOutcome::Stopped(info) => Some(SupervisorEvent::StopCompleted(info)),
                        StopOutcome::TimedOut => Some(SupervisorEvent::StopTimedOut),
                    }
                }
                CoreCommand::Backoff(delay) | CoreCommand::Sleep(delay) => {
                    if self.sleep(delay).await {
                        // Whatever was queued behind the sleep is superseded.
                        queue.clear();
                        Some(SupervisorEvent::ShutdownRequested)
                    } else {
                        None
                    }
                }
                CoreCommand::Report(report) => {
                    self.reporter.report(&report);
                    None
                }
                CoreCommand::RequestExit(reason) => {
                    exit = Some(reason);
                    None
                }
            };

            // Follow-ups run before whatever the previous step queued.
            if let Some(event) = follow_up {
                let next = self.core.step(event);
                for command in next.commands.into_iter().rev() {
                    queue.push_front(command);
                }
            }
        }

        Ok(exit)
    }

    async fn poll_source(&self) -> Result<SupervisorEvent> {
        let source = Arc::clone(&self.source);

        let (changed, record) = tokio::task::spawn_blocking(move || {
            let mut guard = source
                .lock()
                .map_err(|_| WatchserveError::Other(anyhow!("change source mutex poisoned")))?;
            let changed = guard.has_changed()?;
            let record = if changed { guard.changed_info() } else { None };
            Ok::<_, WatchserveError>((changed, record))
        })
        .await
        .map_err(|e| WatchserveError::Other(anyhow::Error::from(e)))??;

        Ok(if changed {
            SupervisorEvent::SourceChanged(record)
        } else {
            SupervisorEvent::NoChange
        })
    }

    /// Non-blocking check for a pending shutdown request.
    fn poll_shutdown(&mut self) -> bool {
        let Some(rx) = self.shutdown_rx.as_mut() else {
            return false;
        };
        match rx.try_recv() {
            Ok(()) => true,
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.shutdown_rx = None;
                false
            }
        }
    }

    /// Sleep for `delay`; returns true if a shutdown request cut it short.
    async fn sleep(&mut self, delay: Duration) -> bool {
        let deadline = Instant::now() + delay;
        let Some(rx) = self.shutdown_rx.as_mut() else {
            sleep(delay).await;
            return false;
        };

        let received = tokio::select! {
            _ = sleep_until(deadline) => return false,
            msg = rx.recv() => msg,
        };

        match received {
            Some(()) => true,
            None => {
                self.shutdown_rx = None;
                sleep_until(deadline).await;
                false
            }
        }
    }
}
