use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tempfile::NamedTempFile;

use pollwatch::cli::CliArgs;
use pollwatch::config::{ConfigFile, ensure_has_files, load_and_validate};
use pollwatch::errors::WatchError;
use pollwatch::run;
use pollwatch_test_utils::builders::ConfigFileBuilder;
use pollwatch_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn builder_config_reports_interval() {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_file("a.txt")
        .with_interval_secs(12)
        .build();

    assert_eq!(cfg.interval(), Duration::from_secs(12));
    assert!(ensure_has_files(&cfg).is_ok());
}

#[test]
fn cli_files_are_merged_after_config_files() -> TestResult {
    init_tracing();
    let raw = ConfigFileBuilder::new().with_file("a.txt").raw();
    let cfg = ConfigFile::try_from(raw.merge(vec![PathBuf::from("b.txt")], None))?;
    assert_eq!(cfg.files, vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);

    // The same file from both sources is a duplicate.
    let raw = ConfigFileBuilder::new().with_file("a.txt").raw();
    assert!(matches!(
        ConfigFile::try_from(raw.merge(vec![PathBuf::from("a.txt")], None)),
        Err(WatchError::ConfigError(_))
    ));
    Ok(())
}

#[test]
fn malformed_toml_is_a_toml_error() -> TestResult {
    init_tracing();
    let mut file = NamedTempFile::new()?;
    write!(file, "files = [\"a.txt\"\n[config")?;

    assert!(matches!(
        load_and_validate(file.path()),
        Err(WatchError::TomlError(_))
    ));
    Ok(())
}

#[test]
fn wrong_value_type_is_a_toml_error() -> TestResult {
    init_tracing();
    let mut file = NamedTempFile::new()?;
    write!(file, "[config]\ninterval_secs = \"soon\"\n")?;

    assert!(matches!(
        load_and_validate(file.path()),
        Err(WatchError::TomlError(_))
    ));
    Ok(())
}

#[tokio::test]
async fn dry_run_resolves_config_without_watching() -> TestResult {
    init_tracing();
    let mut file = NamedTempFile::new()?;
    write!(file, "files = [\"does-not-need-to-exist.txt\"]\n")?;

    let config = file.path().to_string_lossy().to_string();
    let args = CliArgs::try_parse_from(["pollwatch", "--config", &config, "--dry-run"])?;
    run(args).await?;
    Ok(())
}

#[tokio::test]
async fn run_without_files_fails() -> TestResult {
    init_tracing();
    let file = NamedTempFile::new()?;
    let config = file.path().to_string_lossy().to_string();
    let args = CliArgs::try_parse_from(["pollwatch", "--config", &config])?;

    let err = run(args).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<WatchError>(),
        Some(WatchError::ConfigError(_))
    ));
    Ok(())
}

#[tokio::test]
async fn run_fails_on_missing_file() -> TestResult {
    init_tracing();
    let file = NamedTempFile::new()?;
    let config = file.path().to_string_lossy().to_string();
    let args = CliArgs::try_parse_from([
        "pollwatch",
        "--config",
        &config,
        "/definitely/not/here.txt",
    ])?;

    let err = run(args).await.unwrap_err();
    let root = err
        .chain()
        .find_map(|e| e.downcast_ref::<WatchError>())
        .expect("a WatchError in the chain");
    assert!(matches!(root, WatchError::NotFound(_)));
    Ok(())
}
