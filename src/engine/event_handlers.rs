// src/engine/event_handlers.rs

//! Event handling logic for the core supervisor.

use crate::engine::report::Report;
use crate::engine::{ExitReason, SupervisorOptions, SupervisorState};
use crate::exec::ExitInfo;
use crate::watch::ChangeRecord;

use std::time::Duration;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Spawn a new child.
    StartChild,
    /// Run the graceful stop protocol against `pid`.
    StopChild { pid: u32 },
    /// Wait before restarting an exited child.
    Backoff(Duration),
    /// Wait until the next change check.
    Sleep(Duration),
    /// Emit an observable event.
    Report(Report),
    /// End the supervision loop.
    RequestExit(ExitReason),
}

/// Decision returned by the core after handling a single `SupervisorEvent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer loop should keep polling after these commands.
    pub keep_running: bool,
}

impl CoreStep {
    fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }

    fn exit_with(mut commands: Vec<CoreCommand>, reason: ExitReason) -> Self {
        commands.push(CoreCommand::RequestExit(reason));
        Self {
            commands,
            keep_running: false,
        }
    }
}

/// Initial start: only valid from `Stopped`.
pub fn handle_boot(state: &mut SupervisorState) -> CoreStep {
    if *state != SupervisorState::Stopped {
        return CoreStep::continue_with(Vec::new());
    }
    *state = SupervisorState::Starting;
    CoreStep::continue_with(vec![CoreCommand::StartChild])
}

pub fn handle_started(state: &mut SupervisorState, pid: u32) -> CoreStep {
    *state = SupervisorState::Running { pid };
    CoreStep::continue_with(vec![CoreCommand::Report(Report::Started { pid })])
}

/// The child exited on its own: report it and restart after the backoff.
///
/// No interval sleep follows; the next check runs right after the restart.
pub fn handle_child_exited(
    state: &mut SupervisorState,
    options: &SupervisorOptions,
    shutting_down: bool,
    exit: ExitInfo,
) -> CoreStep {
    let mut commands = vec![CoreCommand::Report(Report::Exited(exit))];

    if shutting_down {
        *state = SupervisorState::Stopped;
        return CoreStep::exit_with(commands, ExitReason::Shutdown);
    }

    *state = SupervisorState::Exited { pid: exit.pid };
    commands.push(CoreCommand::Report(Report::Restarting {
        delay: options.restart_delay,
    }));
    commands.push(CoreCommand::Backoff(options.restart_delay));
    commands.push(CoreCommand::StartChild);

    CoreStep::continue_with(commands)
}

/// Sources changed: stop the running child; the restart follows once the
/// stop protocol reports back.
pub fn handle_source_changed(
    state: &mut SupervisorState,
    options: &SupervisorOptions,
    record: Option<ChangeRecord>,
) -> CoreStep {
    let SupervisorState::Running { pid } = *state else {
        return CoreStep::continue_with(vec![CoreCommand::Sleep(options.interval)]);
    };

    *state = SupervisorState::Stopping { pid };
    CoreStep::continue_with(vec![
        CoreCommand::Report(Report::Changed(record)),
        CoreCommand::Report(Report::Stopping { pid }),
        CoreCommand::StopChild { pid },
    ])
}

pub fn handle_no_change(options: &SupervisorOptions) -> CoreStep {
    let mut commands = Vec::with_capacity(2);
    if options.debug {
        commands.push(CoreCommand::Report(Report::Heartbeat));
    }
    commands.push(CoreCommand::Sleep(options.interval));
    CoreStep::continue_with(commands)
}

/// The old child is gone: either start its replacement or finish shutdown.
pub fn handle_stop_completed(
    state: &mut SupervisorState,
    options: &SupervisorOptions,
    shutting_down: bool,
    exit: Option<ExitInfo>,
) -> CoreStep {
    let pid = match *state {
        SupervisorState::Stopping { pid } => pid,
        _ => exit.map(|e| e.pid).unwrap_or_default(),
    };
    let mut commands = vec![CoreCommand::Report(Report::Stopped { pid, exit })];

    if shutting_down {
        *state = SupervisorState::Stopped;
        return CoreStep::exit_with(commands, ExitReason::Shutdown);
    }

    *state = SupervisorState::Starting;
    commands.push(CoreCommand::StartChild);
    commands.push(CoreCommand::Sleep(options.interval));
    CoreStep::continue_with(commands)
}

/// The child ignored the graceful stop. Never start another one on top of
/// it: end the loop and leave the old process to the operator.
pub fn handle_stop_timed_out(state: &SupervisorState, options: &SupervisorOptions) -> CoreStep {
    let pid = match *state {
        SupervisorState::Stopping { pid } | SupervisorState::Running { pid } => pid,
        _ => 0,
    };
    let commands = vec![CoreCommand::Report(Report::StopFailed {
        pid,
        timeout: options.stop.timeout,
    })];
    CoreStep::exit_with(commands, ExitReason::StopFailed { pid })
}

pub fn handle_shutdown(state: &mut SupervisorState) -> CoreStep {
    match *state {
        SupervisorState::Running { pid } => {
            *state = SupervisorState::Stopping { pid };
            CoreStep::continue_with(vec![
                CoreCommand::Report(Report::Stopping { pid }),
                CoreCommand::StopChild { pid },
            ])
        }
        // A stop is already in flight; its completion finishes the shutdown.
        SupervisorState::Stopping { .. } => CoreStep::continue_with(Vec::new()),
        SupervisorState::Stopped | SupervisorState::Starting | SupervisorState::Exited { .. } => {
            *state = SupervisorState::Stopped;
            CoreStep::exit_with(Vec::new(), ExitReason::Shutdown)
        }
    }
}
