pub mod builders;

use std::path::Path;
use std::sync::Once;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 30-second timeout.
///
/// Under a paused clock the timeout is virtual, so this comfortably covers
/// several poll intervals without slowing the test down.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(30), f)
        .await
        .expect("Test timed out after 30 seconds")
}

/// Assert that nothing is waiting on `rx` right now.
pub fn assert_no_event(rx: &mut mpsc::Receiver<std::path::PathBuf>) {
    match rx.try_recv() {
        Err(mpsc::error::TryRecvError::Empty) => {}
        Err(mpsc::error::TryRecvError::Disconnected) => {}
        Ok(path) => panic!("unexpected change notification for {:?}", path),
    }
}

/// Wait for the next notification and check it carries `expected`.
pub async fn expect_event(rx: &mut mpsc::Receiver<std::path::PathBuf>, expected: &Path) {
    let got = with_timeout(rx.recv())
        .await
        .expect("notification channel closed");
    assert_eq!(got, expected, "notification carried the wrong path");
}
