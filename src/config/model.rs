// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::engine::{DEFAULT_INTERVAL_SECS, DEFAULT_RESTART_DELAY_SECS};
use crate::exec::DEFAULT_STOP_TIMEOUT;
use crate::types::HashStorageMode;
use crate::watch::{DEFAULT_EXCLUDE_NAMES, DEFAULT_INCLUDE};

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [serve]
/// interpreter = "php"
/// entry = "bin/swoft"
/// command = "http:start"
///
/// [watch]
/// dirs = ["app", "config"]
/// include = ["*.php"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub serve: ServeSection,

    #[serde(default)]
    pub watch: WatchSection,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub serve: ServeSection,
    pub watch: WatchSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(serve: ServeSection, watch: WatchSection) -> Self {
        Self { serve, watch }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(ServeSection::default(), WatchSection::default())
    }
}

/// `[serve]` section: what to run and how to supervise it.
#[derive(Debug, Clone, Deserialize)]
pub struct ServeSection {
    /// Interpreter executable; a bare name is looked up on `PATH`.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Entry file, relative to the target directory.
    #[serde(default = "default_entry")]
    pub entry: String,

    /// Sub-command passed to the entry file (split on whitespace).
    #[serde(default = "default_command")]
    pub command: String,

    /// Seconds between change checks (0-15).
    #[serde(default = "default_interval")]
    pub interval: u64,

    /// Seconds to wait before restarting a server that exited on its own.
    #[serde(default = "default_restart_delay")]
    pub restart_delay: u64,

    /// Seconds to wait for a graceful stop before giving up.
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout: u64,

    /// Report a heartbeat on every check that saw no change.
    #[serde(default)]
    pub debug: bool,
}

fn default_interpreter() -> String {
    "php".to_string()
}

fn default_entry() -> String {
    "bin/swoft".to_string()
}

fn default_command() -> String {
    "http:start".to_string()
}

fn default_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_restart_delay() -> u64 {
    DEFAULT_RESTART_DELAY_SECS
}

fn default_stop_timeout() -> u64 {
    DEFAULT_STOP_TIMEOUT.as_secs()
}

impl Default for ServeSection {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            entry: default_entry(),
            command: default_command(),
            interval: default_interval(),
            restart_delay: default_restart_delay(),
            stop_timeout: default_stop_timeout(),
            debug: false,
        }
    }
}

/// `[watch]` section: which files feed the change detector.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Directories to watch, relative to the target directory.
    #[serde(default = "default_dirs")]
    pub dirs: Vec<String>,

    /// File-name globs that are fingerprinted.
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    /// File-name regexes that are never fingerprinted.
    #[serde(default = "default_exclude_names")]
    pub exclude_names: Vec<String>,

    /// Directory names that are never descended into.
    #[serde(default)]
    pub exclude_dirs: Vec<String>,

    #[serde(default = "default_true")]
    pub ignore_dot_dirs: bool,

    #[serde(default = "default_true")]
    pub ignore_dot_files: bool,

    /// Stop each scan at the first changed file.
    #[serde(default = "default_true")]
    pub fast_mode: bool,

    #[serde(default)]
    pub hash_storage: HashStorageMode,

    /// Directory for snapshot marker files; the OS temp dir when unset.
    #[serde(default)]
    pub runtime_dir: Option<PathBuf>,
}

fn default_dirs() -> Vec<String> {
    vec!["app".to_string(), "config".to_string()]
}

fn default_include() -> Vec<String> {
    DEFAULT_INCLUDE.iter().map(|s| s.to_string()).collect()
}

fn default_exclude_names() -> Vec<String> {
    DEFAULT_EXCLUDE_NAMES.iter().map(|s| s.to_string()).collect()
}

fn default_true() -> bool {
    true
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            dirs: default_dirs(),
            include: default_include(),
            exclude_names: default_exclude_names(),
            exclude_dirs: Vec::new(),
            ignore_dot_dirs: true,
            ignore_dot_files: true,
            fast_mode: true,
            hash_storage: HashStorageMode::default(),
            runtime_dir: None,
        }
    }
}

impl WatchSection {
    /// The filter part of this section, ready to compile.
    pub fn filter_spec(&self) -> crate::watch::FilterSpec {
        crate::watch::FilterSpec {
            include: self.include.clone(),
            exclude_names: self.exclude_names.clone(),
            exclude_dirs: self.exclude_dirs.clone(),
            ignore_dot_dirs: self.ignore_dot_dirs,
            ignore_dot_files: self.ignore_dot_files,
        }
    }
}
