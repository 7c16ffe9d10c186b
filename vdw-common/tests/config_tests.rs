//! Unit tests for folder and config file resolution
//!
//! Tests that touch VDW_TEST_* environment variables run under #[serial]
//! so they do not race each other.

use serde::Deserialize;
use serial_test::serial;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use vdw_common::config::{find_config_file, load_toml, resolve_folder};
use vdw_common::Error;

const ENV: &str = "VDW_TEST_OUTPUT_DIR";

#[test]
#[serial]
fn test_cli_overrides_env_and_config() {
    std::env::set_var(ENV, "/from/env");
    let resolved = resolve_folder(
        Some(Path::new("/from/cli")),
        ENV,
        Some(Path::new("/from/toml")),
        Path::new("default"),
    );
    assert_eq!(resolved, PathBuf::from("/from/cli"));
    std::env::remove_var(ENV);
}

#[test]
#[serial]
fn test_env_overrides_config() {
    std::env::set_var(ENV, "/from/env");
    let resolved = resolve_folder(None, ENV, Some(Path::new("/from/toml")), Path::new("default"));
    assert_eq!(resolved, PathBuf::from("/from/env"));
    std::env::remove_var(ENV);
}

#[test]
#[serial]
fn test_blank_env_is_ignored() {
    std::env::set_var(ENV, "   ");
    let resolved = resolve_folder(None, ENV, Some(Path::new("/from/toml")), Path::new("default"));
    assert_eq!(resolved, PathBuf::from("/from/toml"));
    std::env::remove_var(ENV);
}

#[test]
#[serial]
fn test_default_when_nothing_set() {
    std::env::remove_var(ENV);
    let resolved = resolve_folder(None, ENV, None, Path::new("curation_output"));
    assert_eq!(resolved, PathBuf::from("curation_output"));
}

#[test]
#[serial]
fn test_explicit_missing_config_is_error() {
    let result = find_config_file(Some(Path::new("/nonexistent/curate.toml")), "VDW_TEST_CONFIG", "curate");
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_env_config_path_is_used() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("curate.toml");
    std::fs::write(&path, "answer = 42\n").unwrap();

    std::env::set_var("VDW_TEST_CONFIG", &path);
    let found = find_config_file(None, "VDW_TEST_CONFIG", "curate").unwrap();
    std::env::remove_var("VDW_TEST_CONFIG");

    assert_eq!(found, Some(path));
}

#[derive(Debug, Deserialize)]
struct Sample {
    answer: u32,
    #[serde(default)]
    name: Option<String>,
}

#[test]
fn test_load_toml_parses_struct() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sample.toml");
    std::fs::write(&path, "answer = 42\n").unwrap();

    let sample: Sample = load_toml(&path).unwrap();
    assert_eq!(sample.answer, 42);
    assert!(sample.name.is_none());
}

#[test]
fn test_load_toml_reports_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "answer = = 42\n").unwrap();

    let result: Result<Sample, Error> = load_toml(&path);
    assert!(matches!(result, Err(Error::Toml(_))));
}
