// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{default_config_path, load_and_validate, resolve_target_dir, ConfigFile, ServeSettings};
use crate::engine::Supervisor;
use crate::errors::Result;
use crate::exec::RealProcessBackend;
use crate::fs::RealFileSystem;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading + CLI overrides
/// - the change detector and its baseline
/// - the real process backend
/// - the supervisor loop
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let cfg = load_config(&args, &cwd)?;
    let settings = ServeSettings::resolve(&cfg, &args, &cwd)?;

    if args.dry_run {
        print_dry_run(&settings);
        return Ok(());
    }

    for (key, value) in settings.work_information() {
        info!("{key}: {value}");
    }

    let mut detector = settings.build_detector(Arc::new(RealFileSystem))?;
    detector.initialize_baseline()?;
    info!(
        dirs = ?detector.watch_dirs(),
        marker = ?detector.marker_location(),
        fast_mode = detector.is_fast_mode(),
        "watching directories"
    );

    // Ctrl-C → final shutdown.
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = shutdown_tx.send(()).await;
    });

    Supervisor::new(
        settings.launch_spec(),
        settings.options,
        RealProcessBackend::new(),
        detector,
    )
    .with_shutdown(shutdown_rx)
    .run()
    .await
}

/// Explicit `--config` must exist; the default file is optional.
fn load_config(args: &CliArgs, cwd: &std::path::Path) -> Result<ConfigFile> {
    if let Some(path) = &args.config {
        return load_and_validate(path);
    }

    let target_dir = resolve_target_dir(args.target_path.as_deref(), cwd)?;
    let path = default_config_path(&target_dir);
    if path.is_file() {
        debug!(path = ?path, "loading config file");
        load_and_validate(&path)
    } else {
        Ok(ConfigFile::default())
    }
}

/// Simple dry-run output: print the resolved work information.
fn print_dry_run(settings: &ServeSettings) {
    println!("watchserve dry-run");
    for (key, value) in settings.work_information() {
        println!("  {key}: {value}");
    }
    println!("  interval: {}s", settings.options.interval.as_secs());
    println!("  restart delay: {}s", settings.options.restart_delay.as_secs());
    println!("  stop timeout: {}s", settings.options.stop.timeout.as_secs());
    println!("  fast mode: {}", settings.fast_mode);
    println!("  marker file: {}", settings.marker_path.display());

    debug!("dry-run complete (no execution)");
}
