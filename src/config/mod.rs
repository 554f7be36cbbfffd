// src/config/mod.rs

//! Configuration loading and validation for watchserve.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate patterns and numeric settings (`validate.rs`).
//! - Merge with CLI flags and check the filesystem (`settings.rs`).

pub mod loader;
pub mod model;
pub mod settings;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, DEFAULT_CONFIG_FILE};
pub use model::{ConfigFile, RawConfigFile, ServeSection, WatchSection};
pub use settings::{resolve_target_dir, ServeSettings};
pub use validate::validate_config;
