// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod watch;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::config::{default_config_path, ensure_has_files, load_from_path};
use crate::watch::effective_interval;

pub use crate::errors::WatchError;
pub use crate::watch::{Fingerprint, Watcher};

/// Capacity of the notification channel used by the binary.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file + CLI overrides)
/// - the watcher, one registration per file
/// - printing notifications to stdout
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = resolve_config(&args)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let watcher = Watcher::new(cfg.interval());
    let (tx, mut rx) = mpsc::channel::<PathBuf>(EVENT_CHANNEL_CAPACITY);

    for file in cfg.files.iter() {
        watcher
            .add_file(file, tx.clone())
            .with_context(|| format!("cannot watch {:?}", file))?;
    }
    // Only the polling loops hold senders now; once they all stop, `recv`
    // returns `None`.
    drop(tx);

    info!(
        files = watcher.len(),
        interval = ?watcher.interval(),
        "pollwatch started"
    );

    loop {
        tokio::select! {
            changed = rx.recv() => match changed {
                Some(path) => println!("changed: {}", path.display()),
                None => {
                    info!("no files left to watch; exiting");
                    break;
                }
            },
            res = tokio::signal::ctrl_c() => {
                res.context("failed to listen for Ctrl+C")?;
                info!("Ctrl-C received; shutting down");
                break;
            }
        }
    }

    watcher.shutdown();
    Ok(())
}

/// Merge the optional config file with command-line files and interval.
fn resolve_config(args: &CliArgs) -> Result<ConfigFile> {
    let raw = match &args.config {
        Some(path) => load_from_path(path)
            .with_context(|| format!("loading config from {:?}", path))?,
        None => {
            let path = default_config_path();
            if path.is_file() {
                debug!(?path, "using default config file");
                load_from_path(&path)
                    .with_context(|| format!("loading config from {:?}", path))?
            } else {
                RawConfigFile::default()
            }
        }
    };

    let cfg = ConfigFile::try_from(raw.merge(args.files.clone(), args.interval))?;
    ensure_has_files(&cfg)?;
    Ok(cfg)
}

/// Simple dry-run output: print the resolved interval and files.
fn print_dry_run(cfg: &ConfigFile) {
    println!("pollwatch dry-run");
    println!("  requested interval = {:?}", cfg.interval());
    println!(
        "  effective interval = {:?}",
        effective_interval(cfg.interval())
    );
    println!();

    println!("files ({}):", cfg.files.len());
    for file in cfg.files.iter() {
        println!("  - {}", file.display());
    }

    debug!("dry-run complete (nothing watched)");
}
