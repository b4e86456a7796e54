// src/watch/fingerprint.rs

//! Content fingerprints.
//!
//! A fingerprint is the first 128 bits of the BLAKE3 digest of a file's bytes,
//! rendered as 32 lowercase hex characters. Files are streamed in fixed-size
//! chunks so arbitrarily large files never have to fit in memory.

use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use blake3::Hasher;
use tracing::debug;

use crate::errors::{Result, WatchError};
use crate::fs::FileSystem;

/// Size of the read buffer used while streaming a file into the hasher.
pub const CHUNK_SIZE: usize = 1024;

/// Number of digest bytes kept in a fingerprint.
pub const FINGERPRINT_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stream everything `reader` yields into a fresh hasher.
pub fn fingerprint_reader(mut reader: impl Read) -> io::Result<Fingerprint> {
    let mut hasher = Hasher::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }

    let hex = hasher.finalize().to_hex();
    Ok(Fingerprint(hex.as_str()[..FINGERPRINT_LEN * 2].to_string()))
}

/// Compute the fingerprint of a single file.
///
/// The file handle lives only for the duration of this call.
pub fn compute_fingerprint(fs: &dyn FileSystem, path: &Path) -> Result<Fingerprint> {
    let reader = fs
        .open_read(path)
        .map_err(|e| WatchError::from_io(path, e))?;
    let fingerprint = fingerprint_reader(reader).map_err(|e| WatchError::from_io(path, e))?;
    debug!(path = ?path, fingerprint = %fingerprint, "computed fingerprint");
    Ok(fingerprint)
}

/// Same as [`compute_fingerprint`], but runs on tokio's blocking pool.
pub async fn compute_fingerprint_async(
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
) -> Result<Fingerprint> {
    tokio::task::spawn_blocking(move || compute_fingerprint(fs.as_ref(), &path))
        .await
        .map_err(|e| WatchError::Other(anyhow::anyhow!("fingerprint task failed: {e}")))?
}
