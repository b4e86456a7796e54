// src/watch/mod.rs

//! Polling-based change detection for individual files.
//!
//! This module is responsible for:
//! - Fingerprinting file contents (`fingerprint`).
//! - Deciding whether a path may be watched (`validate`).
//! - Tracking the last known fingerprint per path (`registry`).
//! - Running one polling loop per path and notifying on change (`watcher`).
//!
//! There is no OS-level event integration here; every file is re-read on a
//! fixed interval.

pub mod fingerprint;
pub mod registry;
pub mod validate;
pub mod watcher;

pub use fingerprint::{
    Fingerprint, compute_fingerprint, compute_fingerprint_async, fingerprint_reader,
};
pub use validate::validate_path;
pub use watcher::{DEFAULT_INTERVAL, MIN_INTERVAL, Watcher, effective_interval};
