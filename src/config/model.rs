// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::watch::DEFAULT_INTERVAL;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// files = ["Cargo.toml", "src/main.rs"]
///
/// [config]
/// interval_secs = 10
/// ```
///
/// Both keys are optional; files can also be given on the command line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// Files to watch, relative to the working directory.
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

/// `[config]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigSection {
    /// Poll interval in seconds.
    ///
    /// Values below 5 are replaced with the 60 second default by the watcher.
    #[serde(default)]
    pub interval_secs: Option<u64>,
}

impl RawConfigFile {
    /// Fold command-line values into the file config.
    ///
    /// CLI files are appended after the configured ones; a CLI interval wins
    /// over `interval_secs`.
    pub fn merge(mut self, files: Vec<PathBuf>, interval_secs: Option<u64>) -> Self {
        self.files.extend(files);
        if interval_secs.is_some() {
            self.config.interval_secs = interval_secs;
        }
        self
    }
}

/// Validated configuration. Built via `ConfigFile::try_from(RawConfigFile)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub files: Vec<PathBuf>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(config: ConfigSection, files: Vec<PathBuf>) -> Self {
        Self { config, files }
    }

    /// Requested poll interval (before the watcher's minimum is applied).
    pub fn interval(&self) -> Duration {
        self.config
            .interval_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_INTERVAL)
    }
}
