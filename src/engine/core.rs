// src/engine/core.rs

//! Pure core supervisor state machine.
//!
//! This module contains a synchronous, deterministic "core" that consumes
//! [`SupervisorEvent`]s and produces:
//! - an updated [`SupervisorState`]
//! - a list of commands describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Supervisor`) is responsible for:
//! - spawning, reaping and signalling the child through a `ProcessBackend`
//! - polling the change source
//! - sleeping, and listening for shutdown
//!
//! The core is intended to be tested without any Tokio, filesystem, or
//! processes.

use crate::engine::event_handlers::{
    handle_boot, handle_child_exited, handle_no_change, handle_shutdown,
    handle_source_changed, handle_started, handle_stop_completed,
    handle_stop_timed_out, CoreStep,
};
use crate::engine::{SupervisorEvent, SupervisorOptions, SupervisorState};

/// Pure core supervisor state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct SupervisorCore {
    state: SupervisorState,
    options: SupervisorOptions,
    shutting_down: bool,
}

impl SupervisorCore {
    pub fn new(options: SupervisorOptions) -> Self {
        Self {
            state: SupervisorState::Stopped,
            options,
            shutting_down: false,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn options(&self) -> &SupervisorOptions {
        &self.options
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down
    }

    /// Handle a single event, updating state and returning the resulting
    /// commands for the IO shell.
    pub fn step(&mut self, event: SupervisorEvent) -> CoreStep {
        match event {
            SupervisorEvent::Boot => handle_boot(&mut self.state),
            SupervisorEvent::Started { pid } => handle_started(&mut self.state, pid),
            SupervisorEvent::ChildExited(exit) => {
                handle_child_exited(&mut self.state, &self.options, self.shutting_down, exit)
            }
            SupervisorEvent::SourceChanged(record) => {
                handle_source_changed(&mut self.state, &self.options, record)
            }
            SupervisorEvent::NoChange => handle_no_change(&self.options),
            SupervisorEvent::StopCompleted(exit) => {
                handle_stop_completed(&mut self.state, &self.options, self.shutting_down, exit)
            }
            SupervisorEvent::StopTimedOut => handle_stop_timed_out(&self.state, &self.options),
            SupervisorEvent::ShutdownRequested => {
                self.shutting_down = true;
                handle_shutdown(&mut self.state)
            }
        }
    }
}
