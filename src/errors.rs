// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Internal helpers (filesystem, hashing) use `anyhow` with context; the
//! public boundaries (config resolution, detector, supervisor) surface a
//! [`WatchserveError`] so callers can tell fatal conditions apart.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchserveError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("The application entry file does not exist: {}", .0.display())]
    EntryFileMissing(PathBuf),

    #[error("Failed to stop server (pid {pid}) within {timeout_secs}s")]
    StopTimeout { pid: u32, timeout_secs: u64 },

    #[error("Failed to spawn server process: {0}")]
    SpawnFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WatchserveError>;
