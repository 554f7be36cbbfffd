// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every option here is optional: unset values fall back to the TOML config
//! file and then to built-in defaults (see [`crate::config::ServeSettings`]).

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::HashStorageMode;

/// Command-line arguments for `watchserve`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "watchserve",
    version,
    about = "Start the application server and restart it when watched sources change.",
    long_about = None
)]
pub struct CliArgs {
    /// Project path, default is the current working directory.
    #[arg(value_name = "TARGET_PATH")]
    pub target_path: Option<PathBuf>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Watchserve.toml` in the target directory, skipped when absent.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Interval between change checks, in seconds (0-15).
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Entry file of the project, relative to the target path.
    #[arg(short = 'b', long = "bin-file", value_name = "PATH")]
    pub bin_file: Option<String>,

    /// The server startup command passed to the entry file.
    #[arg(short = 'c', long = "start-cmd", value_name = "CMD")]
    pub start_cmd: Option<String>,

    /// Comma separated directories to watch, relative to the target path.
    #[arg(short = 'w', long = "watch", value_name = "DIRS")]
    pub watch: Option<String>,

    /// Interpreter used to run the entry file.
    #[arg(long, alias = "php-bin", value_name = "PATH")]
    pub interpreter: Option<String>,

    /// Seconds to wait before restarting a server that exited on its own.
    #[arg(long, value_name = "SECS")]
    pub restart_delay: Option<u64>,

    /// Seconds to wait for the server to stop after SIGTERM.
    #[arg(long, value_name = "SECS")]
    pub stop_timeout: Option<u64>,

    /// Hash every watched file on each check instead of stopping at the
    /// first changed one.
    #[arg(long)]
    pub full_scan: bool,

    /// Where to keep the directory hash between runs (file, memory).
    #[arg(long, value_name = "MODE")]
    pub hash_storage: Option<HashStorageMode>,

    /// Print a heartbeat on every check, even when nothing changed.
    #[arg(long)]
    pub debug: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WATCHSERVE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the work information, but don't start the server.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
