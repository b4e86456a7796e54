// src/fs/mock.rs

use std::collections::HashMap;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{EntryKind, FileSystem};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir,
    /// Exists, but every access fails with `PermissionDenied`.
    Denied,
    /// Opens fine, but the first read fails.
    Unreadable,
    /// Every access fails with an error that is neither "not found" nor
    /// "permission denied".
    Broken,
}

/// In-memory filesystem for tests.
///
/// Paths are matched exactly; there is no notion of parent directories.
/// Clones share the same underlying state, so a test can keep one handle and
/// mutate files while a watcher holds another.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
    opens: Arc<Mutex<HashMap<PathBuf, usize>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<PathBuf, MockEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create or overwrite a file.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.entries()
            .insert(path.as_ref().to_path_buf(), MockEntry::File(content.into()));
    }

    /// Append to a file, creating it if missing.
    pub fn append(&self, path: impl AsRef<Path>, content: impl AsRef<[u8]>) {
        let mut entries = self.entries();
        match entries.get_mut(path.as_ref()) {
            Some(MockEntry::File(bytes)) => bytes.extend_from_slice(content.as_ref()),
            _ => {
                entries.insert(
                    path.as_ref().to_path_buf(),
                    MockEntry::File(content.as_ref().to_vec()),
                );
            }
        }
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.entries().insert(path.as_ref().to_path_buf(), MockEntry::Dir);
    }

    pub fn deny(&self, path: impl AsRef<Path>) {
        self.entries()
            .insert(path.as_ref().to_path_buf(), MockEntry::Denied);
    }

    pub fn make_unreadable(&self, path: impl AsRef<Path>) {
        self.entries()
            .insert(path.as_ref().to_path_buf(), MockEntry::Unreadable);
    }

    pub fn break_entry(&self, path: impl AsRef<Path>) {
        self.entries()
            .insert(path.as_ref().to_path_buf(), MockEntry::Broken);
    }

    pub fn remove(&self, path: impl AsRef<Path>) {
        self.entries().remove(path.as_ref());
    }

    /// How many times `open_read` was called for `path`.
    pub fn open_count(&self, path: impl AsRef<Path>) -> usize {
        self.opens
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(path.as_ref())
            .copied()
            .unwrap_or(0)
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("file not found: {:?}", path))
}

fn denied(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("permission denied: {:?}", path),
    )
}

fn broken(path: &Path) -> io::Error {
    io::Error::other(format!("simulated I/O failure: {:?}", path))
}

/// Reader whose first `read` fails.
struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::other("simulated read failure"))
    }
}

impl FileSystem for MockFileSystem {
    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        *self
            .opens
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(path.to_path_buf())
            .or_default() += 1;

        match self.entries().get(path) {
            Some(MockEntry::File(content)) => Ok(Box::new(Cursor::new(content.clone()))),
            Some(MockEntry::Dir) => Err(io::Error::other(format!("is a directory: {:?}", path))),
            Some(MockEntry::Denied) => Err(denied(path)),
            Some(MockEntry::Unreadable) => Ok(Box::new(FailingReader)),
            Some(MockEntry::Broken) => Err(broken(path)),
            None => Err(not_found(path)),
        }
    }

    fn metadata(&self, path: &Path) -> io::Result<EntryKind> {
        match self.entries().get(path) {
            Some(MockEntry::File(_)) | Some(MockEntry::Unreadable) => Ok(EntryKind::File),
            Some(MockEntry::Dir) => Ok(EntryKind::Dir),
            Some(MockEntry::Denied) => Err(denied(path)),
            Some(MockEntry::Broken) => Err(broken(path)),
            None => Err(not_found(path)),
        }
    }
}
