// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] provides the `ProcessBackend` trait, `LaunchSpec` and
//!   `ExitInfo`.
//! - [`process`] is the real OS implementation (`tokio::process` + `nix`).
//! - [`stop`] implements the graceful stop protocol on top of any backend.

pub mod backend;
pub mod process;
pub mod stop;

pub use backend::{ExitInfo, LaunchSpec, ProcessBackend};
pub use process::RealProcessBackend;
pub use stop::{stop_child, StopOutcome, StopPolicy, DEFAULT_STOP_TIMEOUT, STOP_RETRY_INTERVAL};
