use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::time::Instant;
use watchserve::errors::{Result, WatchserveError};
use watchserve::exec::{ExitInfo, LaunchSpec, ProcessBackend};

/// SIGTERM, as reported in the fake exit info.
pub const SIGTERM: i32 = 15;

/// Something the fake backend observed, stamped with (possibly paused) tokio time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeEvent {
    Spawned { pid: u32, at: Instant },
    Terminated { pid: u32, at: Instant },
    Reaped { exit: ExitInfo, at: Instant },
}

#[derive(Debug)]
struct FakeState {
    next_pid: u32,
    /// Spawned and not yet reaped.
    current: Option<u32>,
    /// Exit waiting to be picked up by `try_wait`.
    pending_exit: Option<ExitInfo>,
    /// Exit codes applied to the next spawned children, one per spawn.
    exit_on_spawn: VecDeque<i32>,
    ignore_sigterm: bool,
    fail_spawn: bool,
    overlap_detected: bool,
    events: Vec<FakeEvent>,
}

/// A scripted process backend that never spawns anything.
///
/// - Children live until they are terminated or scripted to exit.
/// - `terminate` makes the child exit with SIGTERM unless the backend was
///   built with [`FakeProcessBackend::ignoring_sigterm`].
/// - Spawning while a previous child is unreaped flags an overlap.
///
/// Clones share state, so a test keeps one handle while the supervisor owns
/// the other.
#[derive(Debug, Clone)]
pub struct FakeProcessBackend {
    state: Arc<Mutex<FakeState>>,
}

impl Default for FakeProcessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeProcessBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                next_pid: 100,
                current: None,
                pending_exit: None,
                exit_on_spawn: VecDeque::new(),
                ignore_sigterm: false,
                fail_spawn: false,
                overlap_detected: false,
                events: Vec::new(),
            })),
        }
    }

    /// A backend whose children never react to the graceful signal.
    pub fn ignoring_sigterm() -> Self {
        let backend = Self::new();
        backend.state.lock().unwrap().ignore_sigterm = true;
        backend
    }

    /// The next spawned child exits right away with `code`.
    pub fn exit_on_spawn(&self, code: i32) -> &Self {
        self.state.lock().unwrap().exit_on_spawn.push_back(code);
        self
    }

    /// Every spawn fails from now on.
    pub fn fail_spawns(&self) {
        self.state.lock().unwrap().fail_spawn = true;
    }

    /// Make the current child exit with `code`.
    pub fn exit_current(&self, code: i32) {
        let mut state = self.state.lock().unwrap();
        if let Some(pid) = state.current {
            state.pending_exit = Some(ExitInfo {
                pid,
                code: Some(code),
                signal: None,
            });
        }
    }

    pub fn events(&self) -> Vec<FakeEvent> {
        self.state.lock().unwrap().events.clone()
    }

    pub fn spawned_pids(&self) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                FakeEvent::Spawned { pid, .. } => Some(pid),
                _ => None,
            })
            .collect()
    }

    pub fn spawn_times(&self) -> Vec<Instant> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                FakeEvent::Spawned { at, .. } => Some(at),
                _ => None,
            })
            .collect()
    }

    pub fn reaped(&self) -> Vec<(ExitInfo, Instant)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                FakeEvent::Reaped { exit, at } => Some((exit, at)),
                _ => None,
            })
            .collect()
    }

    pub fn terminate_count(&self, pid: u32) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, FakeEvent::Terminated { pid: p, .. } if *p == pid))
            .count()
    }

    pub fn current_pid(&self) -> Option<u32> {
        self.state.lock().unwrap().current
    }

    pub fn overlap_detected(&self) -> bool {
        self.state.lock().unwrap().overlap_detected
    }
}

impl ProcessBackend for FakeProcessBackend {
    fn spawn(&mut self, spec: &LaunchSpec) -> Result<u32> {
        let mut state = self.state.lock().unwrap();
        if state.fail_spawn {
            return Err(WatchserveError::SpawnFailed(format!("{spec}: scripted failure")));
        }
        if state.current.is_some() {
            state.overlap_detected = true;
        }

        let pid = state.next_pid;
        state.next_pid += 1;
        state.current = Some(pid);
        state.pending_exit = state.exit_on_spawn.pop_front().map(|code| ExitInfo {
            pid,
            code: Some(code),
            signal: None,
        });
        state.events.push(FakeEvent::Spawned {
            pid,
            at: Instant::now(),
        });
        Ok(pid)
    }

    fn try_wait(&mut self) -> Result<Option<ExitInfo>> {
        let mut state = self.state.lock().unwrap();
        match state.pending_exit.take() {
            Some(exit) => {
                state.current = None;
                state.events.push(FakeEvent::Reaped {
                    exit,
                    at: Instant::now(),
                });
                Ok(Some(exit))
            }
            None => Ok(None),
        }
    }

    fn terminate(&mut self, pid: u32) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.events.push(FakeEvent::Terminated {
            pid,
            at: Instant::now(),
        });
        if !state.ignore_sigterm && state.current == Some(pid) && state.pending_exit.is_none() {
            state.pending_exit = Some(ExitInfo {
                pid,
                code: None,
                signal: Some(SIGTERM),
            });
        }
        Ok(())
    }

    fn is_alive(&self, pid: u32) -> bool {
        self.state.lock().unwrap().current == Some(pid)
    }
}
