// src/config/mod.rs

//! Configuration loading and validation for the `pollwatch` binary.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate the file list (`validate.rs`).
//!
//! The library API (`Watcher`) does not need any of this; it only takes an
//! interval.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, ConfigSection, RawConfigFile};
pub use validate::ensure_has_files;
