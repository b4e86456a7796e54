// src/watch/validate.rs

use std::path::Path;

use crate::errors::{Result, WatchError};
use crate::fs::{EntryKind, FileSystem};

/// Check that `path` can be watched before any resources are committed.
///
/// Only regular files are accepted; directories are rejected with
/// `WatchError::Unsupported`.
pub fn validate_path(fs: &dyn FileSystem, path: &Path) -> Result<()> {
    match fs.metadata(path) {
        Ok(EntryKind::File) => Ok(()),
        Ok(EntryKind::Dir) => Err(WatchError::Unsupported(path.to_path_buf())),
        Err(e) => Err(WatchError::from_io(path, e)),
    }
}
