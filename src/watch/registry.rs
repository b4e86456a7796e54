// src/watch/registry.rs

//! Path → fingerprint registry shared by all polling loops.
//!
//! Every method takes the lock for a single map operation and releases it
//! before returning, so the lock is never held across I/O or an `.await`.
//! Readers share the lock; writers are exclusive.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::oneshot;
use tracing::debug;

use crate::errors::{Result, WatchError};
use crate::watch::fingerprint::Fingerprint;

/// Identifies one registration of a path.
///
/// A path that is unwatched and added again gets a new id, so a loop that is
/// still winding down can never touch the newer entry.
pub type WatchId = u64;

#[derive(Debug)]
struct Entry {
    id: WatchId,
    /// `None` until the initial fingerprint has been computed.
    fingerprint: Option<Fingerprint>,
    stop: Option<oneshot::Sender<()>>,
}

/// Outcome of comparing a fresh fingerprint with the stored one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    Unchanged,
    /// The stored fingerprint was replaced with the new one.
    Changed,
    /// The entry was removed (or replaced by a newer registration).
    Gone,
}

#[derive(Debug, Default)]
pub struct Registry {
    entries: RwLock<HashMap<PathBuf, Entry>>,
    next_id: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // Each critical section is a single map operation, so a panic elsewhere
    // cannot leave the map half-updated; recover from poisoning.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<PathBuf, Entry>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<PathBuf, Entry>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Atomically check for an existing registration and insert a pending
    /// entry for `path`.
    pub fn reserve(&self, path: &Path, stop: oneshot::Sender<()>) -> Result<WatchId> {
        let mut entries = self.write();
        if entries.contains_key(path) {
            return Err(WatchError::AlreadyWatching(path.to_path_buf()));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        entries.insert(
            path.to_path_buf(),
            Entry {
                id,
                fingerprint: None,
                stop: Some(stop),
            },
        );
        debug!(path = ?path, id, "reserved registry entry");
        Ok(id)
    }

    /// Store the initial fingerprint. Returns `false` if the registration is
    /// no longer present.
    pub fn establish(&self, path: &Path, id: WatchId, fingerprint: Fingerprint) -> bool {
        match self.write().get_mut(path) {
            Some(entry) if entry.id == id => {
                entry.fingerprint = Some(fingerprint);
                true
            }
            _ => false,
        }
    }

    /// Compare `fingerprint` with the stored value and replace it on change.
    ///
    /// The comparison runs under the read lock; only a divergent fingerprint
    /// takes the write lock.
    pub fn observe(&self, path: &Path, id: WatchId, fingerprint: &Fingerprint) -> Observation {
        {
            let entries = self.read();
            match entries.get(path) {
                Some(entry) if entry.id == id => {
                    if entry.fingerprint.as_ref() == Some(fingerprint) {
                        return Observation::Unchanged;
                    }
                }
                _ => return Observation::Gone,
            }
        }

        match self.write().get_mut(path) {
            Some(entry) if entry.id == id => {
                entry.fingerprint = Some(fingerprint.clone());
                Observation::Changed
            }
            _ => Observation::Gone,
        }
    }

    /// Remove the registration for `path`, firing its stop signal.
    pub fn remove(&self, path: &Path) -> Result<()> {
        let entry = self
            .write()
            .remove(path)
            .ok_or_else(|| WatchError::NotWatching(path.to_path_buf()))?;
        stop_entry(entry);
        Ok(())
    }

    /// Remove `path` only if it still belongs to registration `id`.
    pub fn remove_if(&self, path: &Path, id: WatchId) -> bool {
        let mut entries = self.write();
        match entries.get(path) {
            Some(entry) if entry.id == id => {
                entries.remove(path);
                true
            }
            _ => false,
        }
    }

    /// Remove every registration, firing all stop signals.
    pub fn clear(&self) -> usize {
        let drained: Vec<Entry> = self.write().drain().map(|(_, e)| e).collect();
        let n = drained.len();
        drained.into_iter().for_each(stop_entry);
        n
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.read().contains_key(path)
    }

    pub fn fingerprint(&self, path: &Path) -> Option<Fingerprint> {
        self.read().get(path).and_then(|e| e.fingerprint.clone())
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

fn stop_entry(mut entry: Entry) {
    if let Some(stop) = entry.stop.take() {
        // The loop may already be gone; nothing to do then.
        let _ = stop.send(());
    }
}
