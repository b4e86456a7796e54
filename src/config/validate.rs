// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, WatchError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::WatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.config, raw.files))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_no_blank_files(cfg)?;
    ensure_unique_files(cfg)?;
    Ok(())
}

fn ensure_no_blank_files(cfg: &RawConfigFile) -> Result<()> {
    if cfg.files.iter().any(|f| f.as_os_str().is_empty()) {
        return Err(WatchError::ConfigError(
            "`files` must not contain empty paths".to_string(),
        ));
    }
    Ok(())
}

fn ensure_unique_files(cfg: &RawConfigFile) -> Result<()> {
    let mut seen = HashSet::new();
    for file in cfg.files.iter() {
        if !seen.insert(file) {
            return Err(WatchError::ConfigError(format!(
                "file {:?} is listed more than once",
                file
            )));
        }
    }
    Ok(())
}

/// The merged config (file + CLI) must name at least one file.
pub fn ensure_has_files(cfg: &ConfigFile) -> Result<()> {
    if cfg.files.is_empty() {
        return Err(WatchError::ConfigError(
            "no files to watch (pass them as arguments or list them in `files`)".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn raw(files: &[&str]) -> RawConfigFile {
        RawConfigFile {
            files: files.iter().map(PathBuf::from).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn duplicate_files_are_rejected() {
        match ConfigFile::try_from(raw(&["a.txt", "b.txt", "a.txt"])) {
            Err(WatchError::ConfigError(msg)) => assert!(msg.contains("a.txt")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn blank_paths_are_rejected() {
        assert!(matches!(
            ConfigFile::try_from(raw(&["a.txt", ""])),
            Err(WatchError::ConfigError(_))
        ));
    }

    #[test]
    fn merge_appends_cli_files_and_overrides_interval() {
        let mut base = raw(&["a.txt"]);
        base.config.interval_secs = Some(30);

        let merged = base.merge(vec![PathBuf::from("b.txt")], Some(7));
        let cfg = ConfigFile::try_from(merged).unwrap();
        assert_eq!(cfg.files, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
        assert_eq!(cfg.config.interval_secs, Some(7));

        let kept = raw(&[]).merge(vec![], None);
        assert_eq!(kept.config.interval_secs, None);
    }

    #[test]
    fn merged_config_needs_files() {
        let cfg = ConfigFile::try_from(raw(&[])).unwrap();
        assert!(matches!(
            ensure_has_files(&cfg),
            Err(WatchError::ConfigError(_))
        ));
    }
}
