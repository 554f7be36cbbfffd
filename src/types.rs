use std::str::FromStr;
use serde::Deserialize;

/// Where the latest snapshot hash of a watch configuration is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashStorageMode {
    /// Persist the hash to a marker file under the runtime directory, so a
    /// later invocation against the same target resumes from it.
    File,
    /// Keep the hash in memory only (lost when the tool exits).
    Memory,
}

impl Default for HashStorageMode {
    fn default() -> Self {
        HashStorageMode::File
    }
}

impl FromStr for HashStorageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(HashStorageMode::File),
            "memory" => Ok(HashStorageMode::Memory),
            other => Err(format!(
                "invalid hash_storage: {other} (expected \"file\" or \"memory\")"
            )),
        }
    }
}
