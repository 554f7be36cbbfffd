// src/config/settings.rs

//! Effective settings for one serve run.
//!
//! Built from (lowest precedence first) built-in defaults, the TOML config
//! file and the CLI flags, then checked against the filesystem: the entry
//! file and every watch directory must exist before anything is started.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::cli::CliArgs;
use crate::config::model::ConfigFile;
use crate::config::validate::{clamp_interval, trim_dir_name};
use crate::engine::SupervisorOptions;
use crate::errors::{Result, WatchserveError};
use crate::exec::{LaunchSpec, StopPolicy};
use crate::fs::FileSystem;
use crate::types::HashStorageMode;
use crate::watch::{
    marker_path, ChangeDetector, FileMarkerStore, FilterSpec, MarkerStore, MemoryMarkerStore,
    WatchFilter,
};

#[derive(Debug, Clone)]
pub struct ServeSettings {
    pub current_dir: PathBuf,
    pub target_dir: PathBuf,
    pub interpreter: PathBuf,
    pub entry_file: PathBuf,
    pub command: String,
    pub watch_dirs: Vec<PathBuf>,
    pub filter: FilterSpec,
    pub fast_mode: bool,
    pub hash_storage: HashStorageMode,
    pub marker_path: PathBuf,
    pub options: SupervisorOptions,
}

/// Absolute target directory from the CLI argument (or `cwd`).
///
/// Paths containing `..` are canonicalised.
pub fn resolve_target_dir(arg: Option<&Path>, cwd: &Path) -> Result<PathBuf> {
    let target = match arg {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => cwd.join(p),
        None => cwd.to_path_buf(),
    };

    if target.components().any(|c| c == Component::ParentDir) {
        return target.canonicalize().map_err(|e| {
            WatchserveError::ConfigError(format!(
                "cannot resolve target path {}: {e}",
                target.display()
            ))
        });
    }
    Ok(target)
}

impl ServeSettings {
    /// Merge config and CLI, then validate against the filesystem.
    pub fn resolve(cfg: &ConfigFile, args: &CliArgs, cwd: &Path) -> Result<Self> {
        let target_dir = resolve_target_dir(args.target_path.as_deref(), cwd)?;

        let entry = args.bin_file.as_deref().unwrap_or(&cfg.serve.entry);
        let entry_file = target_dir.join(entry);
        if !entry_file.exists() {
            return Err(WatchserveError::EntryFileMissing(entry_file));
        }

        let interpreter = resolve_interpreter(
            args.interpreter.as_deref().unwrap_or(&cfg.serve.interpreter),
        );
        let command = args
            .start_cmd
            .clone()
            .unwrap_or_else(|| cfg.serve.command.clone());

        let dir_names: Vec<String> = match &args.watch {
            Some(list) => list.replace(' ', "").split(',').map(str::to_string).collect(),
            None => cfg.watch.dirs.clone(),
        };
        let watch_dirs = resolve_watch_dirs(&target_dir, &dir_names)?;

        let interval = clamp_interval(args.interval.unwrap_or(cfg.serve.interval));
        let restart_delay = args.restart_delay.unwrap_or(cfg.serve.restart_delay);
        let stop_timeout = args.stop_timeout.unwrap_or(cfg.serve.stop_timeout);
        if stop_timeout == 0 {
            return Err(WatchserveError::ConfigError(
                "stop timeout must be >= 1 second".to_string(),
            ));
        }

        let runtime_dir = cfg
            .watch
            .runtime_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir);

        Ok(Self {
            current_dir: cwd.to_path_buf(),
            marker_path: marker_path(&runtime_dir, &entry_file.to_string_lossy()),
            target_dir,
            interpreter,
            entry_file,
            command,
            watch_dirs,
            filter: cfg.watch.filter_spec(),
            fast_mode: cfg.watch.fast_mode && !args.full_scan,
            hash_storage: args.hash_storage.unwrap_or(cfg.watch.hash_storage),
            options: SupervisorOptions {
                interval: Duration::from_secs(interval),
                restart_delay: Duration::from_secs(restart_delay),
                stop: StopPolicy::with_timeout(Duration::from_secs(stop_timeout)),
                debug: args.debug || cfg.serve.debug,
            },
        })
    }

    pub fn launch_spec(&self) -> LaunchSpec {
        LaunchSpec::new(&self.interpreter, &self.entry_file, &self.command)
            .with_cwd(&self.target_dir)
    }

    /// Detector over the watch dirs, with the configured filter and marker.
    pub fn build_detector(&self, fs: Arc<dyn FileSystem>) -> Result<ChangeDetector> {
        let filter = WatchFilter::new(&self.filter)
            .map_err(|e| WatchserveError::ConfigError(format!("watch patterns: {e:#}")))?;

        let marker: Box<dyn MarkerStore> = match self.hash_storage {
            HashStorageMode::File => {
                Box::new(FileMarkerStore::new(self.marker_path.clone(), Arc::clone(&fs)))
            }
            HashStorageMode::Memory => Box::new(MemoryMarkerStore::new()),
        };

        let mut detector = ChangeDetector::new(filter)
            .with_fs(fs)
            .with_marker(marker)
            .with_fast_mode(self.fast_mode);
        detector.watch(self.watch_dirs.iter().cloned());
        Ok(detector)
    }

    /// Key/value summary printed before supervision starts.
    pub fn work_information(&self) -> Vec<(&'static str, String)> {
        let dirs: Vec<String> = self
            .watch_dirs
            .iter()
            .map(|d| d.display().to_string())
            .collect();

        vec![
            ("current pid", std::process::id().to_string()),
            ("current dir", self.current_dir.display().to_string()),
            ("interpreter", self.interpreter.display().to_string()),
            ("target path", self.target_dir.display().to_string()),
            ("watch dirs", dirs.join(", ")),
            ("entry file", self.entry_file.display().to_string()),
            ("execute cmd", self.launch_spec().to_string()),
        ]
    }
}

/// Look a bare interpreter name up on `PATH`; keep it as-is if not found.
fn resolve_interpreter(name: &str) -> PathBuf {
    let path = Path::new(name);
    if path.components().count() > 1 {
        return path.to_path_buf();
    }
    which::which(name).unwrap_or_else(|_| path.to_path_buf())
}

fn resolve_watch_dirs(target_dir: &Path, names: &[String]) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::with_capacity(names.len());
    for name in names {
        let name = trim_dir_name(name);
        if name.is_empty() {
            continue;
        }
        let path = target_dir.join(name);
        if !path.is_dir() {
            return Err(WatchserveError::ConfigError(format!(
                "the watched dir '{}' does not exist",
                path.display()
            )));
        }
        dirs.push(path);
    }

    if dirs.is_empty() {
        return Err(WatchserveError::ConfigError(
            "did not get any valid directory to watch".to_string(),
        ));
    }
    Ok(dirs)
}
