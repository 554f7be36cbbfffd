// src/watch/mod.rs

//! Directory change detection.
//!
//! This module is responsible for:
//! - Compiling the include / exclude rules for watched files (`patterns`).
//! - Hashing file contents and persisting the latest snapshot hash (`hash`).
//! - Scanning the watch set and deciding whether anything changed
//!   (`detector`).
//!
//! It does **not** know about processes; the supervisor only asks it
//! "did anything change since the last time?".

pub mod detector;
pub mod hash;
pub mod patterns;

pub use detector::{ChangeDetector, ChangeRecord};
pub use hash::{
    compute_aggregate_hash, compute_file_hash, marker_path, FileMarkerStore,
    MarkerStore, MemoryMarkerStore,
};
pub use patterns::{FilterSpec, WatchFilter, DEFAULT_EXCLUDE_NAMES, DEFAULT_INCLUDE};
