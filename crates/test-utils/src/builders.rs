#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use watchserve::config::{ConfigFile, RawConfigFile};
use watchserve::types::HashStorageMode;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn entry(mut self, entry: &str) -> Self {
        self.config.serve.entry = entry.to_string();
        self
    }

    pub fn interpreter(mut self, interpreter: &str) -> Self {
        self.config.serve.interpreter = interpreter.to_string();
        self
    }

    pub fn command(mut self, command: &str) -> Self {
        self.config.serve.command = command.to_string();
        self
    }

    pub fn interval(mut self, secs: u64) -> Self {
        self.config.serve.interval = secs;
        self
    }

    pub fn stop_timeout(mut self, secs: u64) -> Self {
        self.config.serve.stop_timeout = secs;
        self
    }

    pub fn watch_dirs(mut self, dirs: &[&str]) -> Self {
        self.config.watch.dirs = dirs.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn include(mut self, pattern: &str) -> Self {
        self.config.watch.include.push(pattern.to_string());
        self
    }

    pub fn exclude_dir(mut self, name: &str) -> Self {
        self.config.watch.exclude_dirs.push(name.to_string());
        self
    }

    pub fn hash_storage(mut self, mode: HashStorageMode) -> Self {
        self.config.watch.hash_storage = mode;
        self
    }

    pub fn runtime_dir(mut self, dir: &Path) -> Self {
        self.config.watch.runtime_dir = Some(dir.to_path_buf());
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A project directory on disk: entry file plus watched sources.
pub struct ProjectLayout {
    root: PathBuf,
}

impl ProjectLayout {
    /// Create `bin/swoft`, `app/` and `config/` under `root`.
    pub fn standard(root: &Path) -> Self {
        let layout = Self {
            root: root.to_path_buf(),
        };
        layout.write("bin/swoft", "<?php\n");
        fs::create_dir_all(root.join("app")).unwrap();
        fs::create_dir_all(root.join("config")).unwrap();
        layout
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Write (or overwrite) a file, creating parent dirs.
    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }
}
