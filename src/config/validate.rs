// src/config/validate.rs

use tracing::warn;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::engine::{DEFAULT_INTERVAL_SECS, MAX_INTERVAL_SECS};
use crate::errors::{Result, WatchserveError};
use crate::watch::WatchFilter;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::WatchserveError;

    fn try_from(mut raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&mut raw)?;
        Ok(ConfigFile::new_unchecked(raw.serve, raw.watch))
    }
}

/// Validate a raw config in place.
///
/// An out-of-range interval is not an error: it falls back to the default.
pub fn validate_config(cfg: &mut RawConfigFile) -> Result<()> {
    cfg.serve.interval = clamp_interval(cfg.serve.interval);
    validate_serve(cfg)?;
    validate_watch(cfg)?;
    Ok(())
}

/// Map an interval outside `0..=15` seconds back to the default.
pub fn clamp_interval(interval: u64) -> u64 {
    if interval > MAX_INTERVAL_SECS {
        warn!(
            interval,
            "interval must be between 0 and {MAX_INTERVAL_SECS} seconds; using {DEFAULT_INTERVAL_SECS}"
        );
        DEFAULT_INTERVAL_SECS
    } else {
        interval
    }
}

fn validate_serve(cfg: &RawConfigFile) -> Result<()> {
    if cfg.serve.stop_timeout == 0 {
        return Err(WatchserveError::ConfigError(
            "[serve].stop_timeout must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.serve.interpreter.trim().is_empty() {
        return Err(WatchserveError::ConfigError(
            "[serve].interpreter must not be empty".to_string(),
        ));
    }
    if cfg.serve.entry.trim().is_empty() {
        return Err(WatchserveError::ConfigError(
            "[serve].entry must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_watch(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.dirs.iter().any(|d| trim_dir_name(d).is_empty()) {
        return Err(WatchserveError::ConfigError(
            "[watch].dirs must not contain empty entries".to_string(),
        ));
    }

    WatchFilter::new(&cfg.watch.filter_spec())
        .map_err(|e| WatchserveError::ConfigError(format!("[watch] patterns: {e:#}")))?;

    Ok(())
}

/// Strip surrounding slashes and spaces from a watch dir name.
pub fn trim_dir_name(name: &str) -> &str {
    name.trim_matches(|c| c == '/' || c == ' ')
}
