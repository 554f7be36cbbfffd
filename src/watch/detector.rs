// src/watch/detector.rs

//! Polling change detector over a set of watched directories.
//!
//! Each check walks the watch set, hashes every file accepted by the
//! [`WatchFilter`], and folds the per-file hashes into a single snapshot
//! hash. A check reports "changed" when the snapshot hash differs from the
//! previous one (or, on the first check of a run, from the persisted marker).
//!
//! In fast mode a scan stops at the first file whose hash differs from the
//! previous pass and records only that file. The following check scans again
//! from the start, so later changes are still picked up one pass later.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::engine::ChangeSource;
use crate::errors::{Result, WatchserveError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::hash::{compute_aggregate_hash, compute_file_hash, MarkerStore, MemoryMarkerStore};
use crate::watch::patterns::WatchFilter;

/// The single file change found by a fast-mode scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub path: PathBuf,
    /// `None` when the file was not fingerprinted before (new file).
    pub old_hash: Option<String>,
    /// `None` when the file is gone (deleted file).
    pub new_hash: Option<String>,
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} -> {})",
            self.path.display(),
            self.old_hash.as_deref().unwrap_or("none"),
            self.new_hash.as_deref().unwrap_or("none"),
        )
    }
}

pub struct ChangeDetector {
    fs: Arc<dyn FileSystem>,
    filter: WatchFilter,
    fast_mode: bool,
    watch_dirs: Vec<PathBuf>,
    /// Content hash per file, sorted by path.
    fingerprints: BTreeMap<PathBuf, String>,
    dir_hash: Option<String>,
    old_hash: Option<String>,
    marker: Box<dyn MarkerStore>,
    changed: Option<ChangeRecord>,
    file_counter: u64,
}

impl fmt::Debug for ChangeDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeDetector")
            .field("watch_dirs", &self.watch_dirs)
            .field("fast_mode", &self.fast_mode)
            .field("dir_hash", &self.dir_hash)
            .field("files", &self.fingerprints.len())
            .finish_non_exhaustive()
    }
}

impl ChangeDetector {
    /// New detector on the real filesystem, with an in-memory marker and
    /// fast mode enabled.
    pub fn new(filter: WatchFilter) -> Self {
        Self {
            fs: Arc::new(RealFileSystem),
            filter,
            fast_mode: true,
            watch_dirs: Vec::new(),
            fingerprints: BTreeMap::new(),
            dir_hash: None,
            old_hash: None,
            marker: Box::new(MemoryMarkerStore::new()),
            changed: None,
            file_counter: 0,
        }
    }

    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_marker(mut self, marker: Box<dyn MarkerStore>) -> Self {
        self.marker = marker;
        self
    }

    pub fn with_fast_mode(mut self, fast_mode: bool) -> Self {
        self.fast_mode = fast_mode;
        self
    }

    /// Append directories to the watch set. No I/O happens here.
    pub fn watch<I, P>(&mut self, dirs: I) -> &mut Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.watch_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// Establish the baseline snapshot from the current filesystem state.
    ///
    /// Always runs a full scan and never reports a change, whatever the
    /// persisted marker says.
    pub fn initialize_baseline(&mut self) -> Result<()> {
        self.ensure_watch_set()?;
        for dir in &self.watch_dirs {
            if !self.fs.is_dir(dir) {
                return Err(WatchserveError::ConfigError(format!(
                    "watched directory does not exist: {}",
                    dir.display()
                )));
            }
        }

        self.fingerprints.clear();
        self.old_hash = self.load_marker();
        let hash = self.scan(false);
        self.dir_hash = Some(hash.clone());
        self.changed = None;
        self.persist(&hash);

        debug!(hash = %hash, files = self.fingerprints.len(), "baseline established");
        Ok(())
    }

    /// Rescan the watch set and report whether the snapshot hash moved.
    ///
    /// The new hash is persisted on every call.
    pub fn has_changed(&mut self) -> Result<bool> {
        self.ensure_watch_set()?;

        let previous = match &self.dir_hash {
            Some(hash) => Some(hash.clone()),
            None => self.load_marker(),
        };

        // Without fingerprints from an earlier pass every file looks new, so
        // the first check of a run resuming from the marker must see them all.
        let fast = self.fast_mode && !self.fingerprints.is_empty();
        let hash = self.scan(fast);
        self.persist(&hash);

        let changed = previous.as_deref() != Some(hash.as_str());
        self.old_hash = previous;
        self.dir_hash = Some(hash);
        Ok(changed)
    }

    /// The file found by the most recent fast-mode scan, if any.
    pub fn changed_info(&self) -> Option<&ChangeRecord> {
        self.changed.as_ref()
    }

    pub fn watch_dirs(&self) -> &[PathBuf] {
        &self.watch_dirs
    }

    pub fn dir_hash(&self) -> Option<&str> {
        self.dir_hash.as_deref()
    }

    /// Snapshot hash the last check compared against.
    pub fn old_hash(&self) -> Option<&str> {
        self.old_hash.as_deref()
    }

    /// Number of file hashes computed since the detector was created.
    pub fn file_count(&self) -> u64 {
        self.file_counter
    }

    pub fn is_fast_mode(&self) -> bool {
        self.fast_mode
    }

    pub fn marker_location(&self) -> Option<&Path> {
        self.marker.location()
    }

    fn ensure_watch_set(&self) -> Result<()> {
        if self.watch_dirs.is_empty() {
            return Err(WatchserveError::ConfigError(
                "no directories to watch were configured".to_string(),
            ));
        }
        Ok(())
    }

    fn load_marker(&self) -> Option<String> {
        match self.marker.load() {
            Ok(hash) => hash,
            Err(err) => {
                warn!(error = %err, "failed to read snapshot marker; treating as absent");
                None
            }
        }
    }

    fn persist(&mut self, hash: &str) {
        if let Err(err) = self.marker.save(hash) {
            warn!(error = %err, "failed to persist snapshot marker");
        }
    }

    /// Walk every watch root and return the new snapshot hash.
    fn scan(&mut self, fast: bool) -> String {
        self.changed = None;

        let mut seen = HashSet::new();
        let mut complete = true;

        for dir in self.watch_dirs.clone() {
            if !self.fs.is_dir(&dir) {
                debug!(dir = ?dir, "watch root missing; no files found under it");
                continue;
            }
            if self.collect_dir(&dir, fast, &mut seen).is_break() {
                complete = false;
                break;
            }
        }

        // Only a pass that visited everything can tell which files are gone.
        if complete {
            let removed: Vec<PathBuf> = self
                .fingerprints
                .keys()
                .filter(|p| !seen.contains(*p))
                .cloned()
                .collect();

            for path in removed {
                let old_hash = self.fingerprints.remove(&path);
                if fast && self.changed.is_none() {
                    self.changed = Some(ChangeRecord {
                        path,
                        old_hash,
                        new_hash: None,
                    });
                }
            }
        }

        compute_aggregate_hash(self.fingerprints.values())
    }

    fn collect_dir(
        &mut self,
        dir: &Path,
        fast: bool,
        seen: &mut HashSet<PathBuf>,
    ) -> ControlFlow<()> {
        let mut entries = match self.fs.read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                debug!(dir = ?dir, error = %err, "skipping unreadable directory");
                self.keep_fingerprints_under(dir, seen);
                return ControlFlow::Continue(());
            }
        };
        entries.sort();

        for path in entries {
            let name = match path.file_name() {
                Some(name) => name.to_string_lossy().into_owned(),
                None => continue,
            };

            if self.fs.is_dir(&path) {
                if self.filter.is_watch_dir(&name) && self.collect_dir(&path, fast, seen).is_break() {
                    return ControlFlow::Break(());
                }
                continue;
            }

            if !self.fs.is_file(&path) || !self.filter.is_watch_file(&name) {
                continue;
            }

            let new_hash = match compute_file_hash(self.fs.as_ref(), &path) {
                Ok(hash) => hash,
                Err(err) => {
                    debug!(file = ?path, error = %err, "skipping unreadable file");
                    if self.fingerprints.contains_key(&path) {
                        seen.insert(path);
                    }
                    continue;
                }
            };

            self.file_counter += 1;
            seen.insert(path.clone());
            let old_hash = self.fingerprints.insert(path.clone(), new_hash.clone());

            if fast && old_hash.as_deref() != Some(new_hash.as_str()) {
                self.changed = Some(ChangeRecord {
                    path,
                    old_hash,
                    new_hash: Some(new_hash),
                });
                return ControlFlow::Break(());
            }
        }

        ControlFlow::Continue(())
    }

    fn keep_fingerprints_under(&self, dir: &Path, seen: &mut HashSet<PathBuf>) {
        seen.extend(
            self.fingerprints
                .keys()
                .filter(|p| p.starts_with(dir))
                .cloned(),
        );
    }
}

impl ChangeSource for ChangeDetector {
    fn has_changed(&mut self) -> Result<bool> {
        ChangeDetector::has_changed(self)
    }

    fn changed_info(&self) -> Option<ChangeRecord> {
        ChangeDetector::changed_info(self).cloned()
    }
}
