// src/errors.rs

//! Crate-wide error type and result alias.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Path not found: {0:?}")]
    NotFound(PathBuf),

    #[error("Permission denied: {0:?}")]
    PermissionDenied(PathBuf),

    #[error("Watching directories is not supported: {0:?}")]
    Unsupported(PathBuf),

    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Already watching {0:?}")]
    AlreadyWatching(PathBuf),

    #[error("Not watching {0:?}")]
    NotWatching(PathBuf),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WatchError {
    /// Classify an I/O error raised while touching `path`.
    ///
    /// `NotFound` and `PermissionDenied` get their own variants; everything
    /// else is wrapped as a generic `Io` error.
    pub fn from_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => WatchError::NotFound(path),
            io::ErrorKind::PermissionDenied => WatchError::PermissionDenied(path),
            _ => WatchError::Io { path, source },
        }
    }
}

pub type Result<T> = std::result::Result<T, WatchError>;
