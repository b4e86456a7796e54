// src/watch/watcher.rs

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::fingerprint::{Fingerprint, compute_fingerprint_async};
use crate::watch::registry::{Observation, Registry, WatchId};
use crate::watch::validate::validate_path;

/// Shortest accepted poll interval.
pub const MIN_INTERVAL: Duration = Duration::from_secs(5);

/// Interval used when the requested one is below [`MIN_INTERVAL`].
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Polls registered files and reports content changes.
///
/// Each registered path gets its own tokio task which re-fingerprints the
/// file every `interval` and sends the path on the caller's channel when the
/// fingerprint diverges from the stored one.
///
/// Cloning is cheap; clones share the same registry. Dropping every handle
/// does *not* stop running loops; use [`Watcher::shutdown`] for that.
#[derive(Debug, Clone)]
pub struct Watcher {
    registry: Arc<Registry>,
    fs: Arc<dyn FileSystem>,
    interval: Duration,
}

impl Watcher {
    /// Create a watcher on the real filesystem.
    ///
    /// Intervals below 5 seconds are replaced with the 60 second default.
    pub fn new(interval: Duration) -> Self {
        Self::with_fs(interval, Arc::new(RealFileSystem))
    }

    pub fn with_fs(interval: Duration, fs: Arc<dyn FileSystem>) -> Self {
        let interval = effective_interval(interval);
        debug!(?interval, "watcher created");
        Self {
            registry: Arc::new(Registry::new()),
            fs,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start watching `path`, sending it on `events` whenever its content
    /// changes.
    ///
    /// Validation and the duplicate check happen synchronously; any error is
    /// returned before a task is spawned. The initial fingerprint is computed
    /// in the background, so this returns before the path is established.
    ///
    /// Must be called from within a tokio runtime.
    pub fn add_file(&self, path: impl AsRef<Path>, events: mpsc::Sender<PathBuf>) -> Result<()> {
        let path = path.as_ref().to_path_buf();
        validate_path(self.fs.as_ref(), &path)?;

        let (stop_tx, stop_rx) = oneshot::channel();
        let id = self.registry.reserve(&path, stop_tx)?;

        info!(path = ?path, "adding file to watcher");

        let poller = Poller {
            registry: Arc::clone(&self.registry),
            fs: Arc::clone(&self.fs),
            interval: self.interval,
            path,
            id,
            events,
        };
        tokio::spawn(poller.run(stop_rx));
        Ok(())
    }

    /// Stop watching `path`. The path may be added again afterwards.
    pub fn unwatch(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.registry.remove(path)?;
        info!(path = ?path, "stopped watching file");
        Ok(())
    }

    /// Stop every polling loop and forget all paths.
    pub fn shutdown(&self) {
        let n = self.registry.clear();
        info!(stopped = n, "watcher shut down");
    }

    /// `true` from a successful `add_file` until the path is unwatched, even
    /// while the initial fingerprint is still pending.
    pub fn is_watching(&self, path: impl AsRef<Path>) -> bool {
        self.registry.contains(path.as_ref())
    }

    /// Last fingerprint recorded for `path`, once established.
    pub fn fingerprint(&self, path: impl AsRef<Path>) -> Option<Fingerprint> {
        self.registry.fingerprint(path.as_ref())
    }

    pub fn watched_paths(&self) -> Vec<PathBuf> {
        self.registry.paths()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

/// Interval a watcher will actually use when asked for `requested`.
pub fn effective_interval(requested: Duration) -> Duration {
    if requested < MIN_INTERVAL {
        DEFAULT_INTERVAL
    } else {
        requested
    }
}

/// State owned by a single path's polling task.
struct Poller {
    registry: Arc<Registry>,
    fs: Arc<dyn FileSystem>,
    interval: Duration,
    path: PathBuf,
    id: WatchId,
    events: mpsc::Sender<PathBuf>,
}

impl Poller {
    async fn run(self, mut stop: oneshot::Receiver<()>) {
        if self.establish(&mut stop).await.is_break() {
            return;
        }

        // Checking, then Idle for one interval, forever. The next sleep only
        // starts once the current check (including a blocked send) is done.
        loop {
            if self.check(&mut stop).await.is_break() {
                break;
            }
            tokio::select! {
                _ = &mut stop => break,
                _ = sleep(self.interval) => {}
            }
        }

        debug!(path = ?self.path, "polling loop finished");
    }

    async fn fingerprint(
        &self,
        stop: &mut oneshot::Receiver<()>,
    ) -> ControlFlow<(), Result<Fingerprint>> {
        tokio::select! {
            _ = stop => ControlFlow::Break(()),
            res = compute_fingerprint_async(Arc::clone(&self.fs), self.path.clone()) => {
                ControlFlow::Continue(res)
            }
        }
    }

    async fn establish(&self, stop: &mut oneshot::Receiver<()>) -> ControlFlow<()> {
        match self.fingerprint(stop).await? {
            Ok(fingerprint) => {
                info!(
                    path = ?self.path,
                    fingerprint = %fingerprint,
                    "initial fingerprint recorded"
                );
                if self.registry.establish(&self.path, self.id, fingerprint) {
                    ControlFlow::Continue(())
                } else {
                    ControlFlow::Break(())
                }
            }
            Err(err) => {
                error!(
                    path = ?self.path,
                    error = %err,
                    "initial fingerprint failed; file not watched"
                );
                self.registry.remove_if(&self.path, self.id);
                ControlFlow::Break(())
            }
        }
    }

    async fn check(&self, stop: &mut oneshot::Receiver<()>) -> ControlFlow<()> {
        let fingerprint = match self.fingerprint(stop).await? {
            Ok(fp) => fp,
            Err(err) => {
                // Transient failures must not kill the watch.
                warn!(
                    path = ?self.path,
                    error = %err,
                    "fingerprint failed; retrying next interval"
                );
                return ControlFlow::Continue(());
            }
        };

        match self.registry.observe(&self.path, self.id, &fingerprint) {
            Observation::Unchanged => {
                debug!(path = ?self.path, "unchanged");
                ControlFlow::Continue(())
            }
            Observation::Gone => ControlFlow::Break(()),
            Observation::Changed => {
                info!(
                    path = ?self.path,
                    fingerprint = %fingerprint,
                    "content changed"
                );
                self.notify(stop).await
            }
        }
    }

    /// Send the path to the consumer. Blocks while the channel is full.
    async fn notify(&self, stop: &mut oneshot::Receiver<()>) -> ControlFlow<()> {
        tokio::select! {
            _ = stop => ControlFlow::Break(()),
            res = self.events.send(self.path.clone()) => match res {
                Ok(()) => ControlFlow::Continue(()),
                Err(_) => {
                    warn!(
                        path = ?self.path,
                        "notification receiver dropped; no longer watching"
                    );
                    self.registry.remove_if(&self.path, self.id);
                    ControlFlow::Break(())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::WatchError;
    use crate::fs::mock::MockFileSystem;

    fn mock_watcher(interval: Duration) -> (Watcher, MockFileSystem) {
        let fs = MockFileSystem::new();
        let watcher = Watcher::with_fs(interval, Arc::new(fs.clone()));
        (watcher, fs)
    }

    /// Let spawned tasks and blocking fingerprints settle without moving the
    /// paused clock past the next poll.
    async fn settle() {
        sleep(Duration::from_millis(10)).await;
    }

    #[test]
    fn intervals_below_minimum_fall_back_to_default() {
        assert_eq!(Watcher::new(Duration::from_secs(1)).interval(), DEFAULT_INTERVAL);
        assert_eq!(Watcher::new(Duration::ZERO).interval(), DEFAULT_INTERVAL);
        assert_eq!(Watcher::new(MIN_INTERVAL).interval(), MIN_INTERVAL);
        assert_eq!(
            Watcher::new(Duration::from_secs(3600)).interval(),
            Duration::from_secs(3600)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn initial_fingerprint_is_recorded() {
        let (watcher, fs) = mock_watcher(MIN_INTERVAL);
        fs.add_file("a.txt", "A");
        let (tx, _rx) = mpsc::channel(1);

        watcher.add_file("a.txt", tx).unwrap();
        assert!(watcher.is_watching("a.txt"));

        settle().await;
        let expected = crate::watch::fingerprint::fingerprint_reader(&b"A"[..]).unwrap();
        assert_eq!(watcher.fingerprint("a.txt"), Some(expected));
        assert_eq!(watcher.watched_paths(), vec![PathBuf::from("a.txt")]);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_initial_fingerprint_leaves_no_entry() {
        let (watcher, fs) = mock_watcher(MIN_INTERVAL);
        fs.make_unreadable("broken.txt");
        let (tx, _rx) = mpsc::channel(1);

        // Validation only stats the file, so registration itself succeeds.
        watcher.add_file("broken.txt", tx).unwrap();
        settle().await;

        assert!(!watcher.is_watching("broken.txt"));
        assert!(watcher.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn duplicate_registration_is_rejected_while_pending() {
        let (watcher, fs) = mock_watcher(MIN_INTERVAL);
        fs.add_file("a.txt", "A");
        let (tx, _rx) = mpsc::channel(1);

        watcher.add_file("a.txt", tx.clone()).unwrap();
        // No yield in between: the first registration is still pending.
        assert!(matches!(
            watcher.add_file("a.txt", tx),
            Err(WatchError::AlreadyWatching(_))
        ));
        assert_eq!(watcher.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unwatch_stops_the_loop() {
        let (watcher, fs) = mock_watcher(MIN_INTERVAL);
        fs.add_file("a.txt", "A");
        let (tx, mut rx) = mpsc::channel(1);

        watcher.add_file("a.txt", tx).unwrap();
        settle().await;
        watcher.unwatch("a.txt").unwrap();
        assert!(!watcher.is_watching("a.txt"));

        let opens = fs.open_count("a.txt");
        fs.add_file("a.txt", "changed");
        sleep(MIN_INTERVAL * 3).await;

        assert_eq!(fs.open_count("a.txt"), opens);
        // The loop owned the only sender, so the channel is now closed.
        assert_eq!(rx.recv().await, None);
        assert!(matches!(
            watcher.unwatch("a.txt"),
            Err(WatchError::NotWatching(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_receiver_deregisters_path() {
        let (watcher, fs) = mock_watcher(MIN_INTERVAL);
        fs.add_file("a.txt", "A");
        let (tx, rx) = mpsc::channel(1);

        watcher.add_file("a.txt", tx).unwrap();
        settle().await;
        drop(rx);

        fs.add_file("a.txt", "B");
        sleep(MIN_INTERVAL + Duration::from_secs(1)).await;

        assert!(!watcher.is_watching("a.txt"));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_all_paths() {
        let (watcher, fs) = mock_watcher(MIN_INTERVAL);
        fs.add_file("a.txt", "A");
        fs.add_file("b.txt", "B");
        let (tx, _rx) = mpsc::channel(4);

        watcher.add_file("a.txt", tx.clone()).unwrap();
        watcher.add_file("b.txt", tx).unwrap();
        settle().await;
        assert_eq!(watcher.len(), 2);

        watcher.shutdown();
        assert!(watcher.is_empty());

        let opens = fs.open_count("a.txt");
        sleep(MIN_INTERVAL * 2).await;
        assert_eq!(fs.open_count("a.txt"), opens);
    }
}
