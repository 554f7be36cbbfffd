use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;

/// Length of the hex prefix used in marker file names.
const MARKER_KEY_LEN: usize = 32;

/// Compute the hash of a single file.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("reading file for hashing: {:?}", path))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Compute the snapshot hash from per-file hashes.
///
/// `hashes` must come in a stable order (the detector yields them sorted by
/// path) for the result to be comparable between scans.
pub fn compute_aggregate_hash<'a, I>(hashes: I) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    let mut hasher = Hasher::new();
    for h in hashes {
        hasher.update(h.as_bytes());
    }
    let hash = hasher.finalize().to_hex().to_string();
    debug!(hash = %hash, "computed aggregate hash");
    hash
}

/// Derive the marker file path for a watch configuration.
///
/// `key` identifies the configuration (the entry file path for the serve
/// command), so repeated invocations against the same target share a marker:
///
/// `<runtime_dir>/server-<hash(key)>.id`
pub fn marker_path(runtime_dir: &Path, key: &str) -> PathBuf {
    let digest = blake3::hash(key.as_bytes()).to_hex();
    runtime_dir.join(format!("server-{}.id", &digest[..MARKER_KEY_LEN]))
}

/// Storage for the latest snapshot hash of one watch configuration.
pub trait MarkerStore: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn save(&mut self, hash: &str) -> Result<()>;
    /// Where the marker lives, if it is persisted at all.
    fn location(&self) -> Option<&Path>;
}

/// Stores the hash as plain text in a marker file.
pub struct FileMarkerStore {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl FileMarkerStore {
    pub fn new(path: PathBuf, fs: Arc<dyn FileSystem>) -> Self {
        Self { path, fs }
    }
}

impl MarkerStore for FileMarkerStore {
    fn load(&self) -> Result<Option<String>> {
        if !self.fs.is_file(&self.path) {
            return Ok(None);
        }
        let contents = self
            .fs
            .read_to_string(&self.path)
            .with_context(|| format!("reading marker file at {:?}", self.path))?;
        let trimmed = contents.trim();
        if trimmed.is_empty() {
            Ok(None)
        } else {
            Ok(Some(trimmed.to_string()))
        }
    }

    fn save(&mut self, hash: &str) -> Result<()> {
        self.fs
            .write(&self.path, hash.as_bytes())
            .with_context(|| format!("writing marker file at {:?}", self.path))?;
        debug!(path = ?self.path, hash = %hash, "stored snapshot hash (file)");
        Ok(())
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

/// Keeps the hash in memory only.
#[derive(Debug, Default)]
pub struct MemoryMarkerStore {
    hash: Option<String>,
}

impl MemoryMarkerStore {
    pub fn new() -> Self {
        Self { hash: None }
    }
}

impl MarkerStore for MemoryMarkerStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.hash.clone())
    }

    fn save(&mut self, hash: &str) -> Result<()> {
        self.hash = Some(hash.to_string());
        Ok(())
    }

    fn location(&self) -> Option<&Path> {
        None
    }
}
