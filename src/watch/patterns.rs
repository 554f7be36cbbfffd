// src/watch/patterns.rs

use std::collections::HashSet;
use std::fmt;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::RegexSet;

/// File-name globs counted by default.
pub const DEFAULT_INCLUDE: &[&str] = &["*.php"];

/// File-name regexes excluded by default (VCS metadata, license files).
pub const DEFAULT_EXCLUDE_NAMES: &[&str] = &[r"^\.gitignore$", r"^LICENSE(\.txt)?$"];

/// Raw filter settings, as they come out of the config.
///
/// This corresponds to the `[watch]` section:
///
/// ```toml
/// [watch]
/// include = ["*.php"]
/// exclude_names = ['^\.gitignore$']
/// exclude_dirs = ["runtime", "vendor"]
/// ignore_dot_dirs = true
/// ignore_dot_files = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub include: Vec<String>,
    pub exclude_names: Vec<String>,
    pub exclude_dirs: Vec<String>,
    pub ignore_dot_dirs: bool,
    pub ignore_dot_files: bool,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            include: DEFAULT_INCLUDE.iter().map(|s| s.to_string()).collect(),
            exclude_names: DEFAULT_EXCLUDE_NAMES.iter().map(|s| s.to_string()).collect(),
            exclude_dirs: Vec::new(),
            ignore_dot_dirs: true,
            ignore_dot_files: true,
        }
    }
}

/// Compiled file/directory filter applied while scanning a watch set.
///
/// All checks work on bare entry names (`"HomeController.php"`, `"vendor"`),
/// never on full paths.
#[derive(Clone)]
pub struct WatchFilter {
    /// `None` means every file name is included.
    include: Option<GlobSet>,
    exclude_names: RegexSet,
    exclude_dirs: HashSet<String>,
    ignore_dot_dirs: bool,
    ignore_dot_files: bool,
}

impl fmt::Debug for WatchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchFilter")
            .field("exclude_names", &self.exclude_names.patterns())
            .field("exclude_dirs", &self.exclude_dirs)
            .field("ignore_dot_dirs", &self.ignore_dot_dirs)
            .field("ignore_dot_files", &self.ignore_dot_files)
            .finish_non_exhaustive()
    }
}

impl WatchFilter {
    /// Compile a filter from its raw spec.
    pub fn new(spec: &FilterSpec) -> Result<Self> {
        let include = if spec.include.is_empty() {
            None
        } else {
            Some(build_globset(&spec.include).context("building include globset")?)
        };

        let exclude_names = RegexSet::new(&spec.exclude_names)
            .context("compiling exclude name patterns")?;

        Ok(Self {
            include,
            exclude_names,
            exclude_dirs: spec.exclude_dirs.iter().cloned().collect(),
            ignore_dot_dirs: spec.ignore_dot_dirs,
            ignore_dot_files: spec.ignore_dot_files,
        })
    }

    /// A filter that accepts every file and directory.
    pub fn match_all() -> Self {
        Self {
            include: None,
            exclude_names: RegexSet::empty(),
            exclude_dirs: HashSet::new(),
            ignore_dot_dirs: false,
            ignore_dot_files: false,
        }
    }

    /// Whether the scan should descend into a directory with this name.
    pub fn is_watch_dir(&self, name: &str) -> bool {
        if self.ignore_dot_dirs && name.starts_with('.') {
            return false;
        }
        !self.exclude_dirs.contains(name)
    }

    /// Whether a file with this name contributes to the fingerprint.
    pub fn is_watch_file(&self, name: &str) -> bool {
        if self.ignore_dot_files && name.starts_with('.') {
            return false;
        }
        if self.exclude_names.is_match(name) {
            return false;
        }
        match &self.include {
            Some(set) => set.is_match(name),
            None => true,
        }
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat)
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
