//! Configuration file discovery and folder resolution

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Default folder for curation output, relative to the working directory
pub const DEFAULT_OUTPUT_DIR: &str = "curation_output";

/// Resolve a folder following the usual priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config value
/// 4. Compiled default (fallback)
pub fn resolve_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    config_value: Option<&Path>,
    default: &Path,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = config_value {
        return path.to_path_buf();
    }

    // Priority 4: Compiled default
    default.to_path_buf()
}

/// Locate the configuration file for `app_name`
///
/// Explicit path first, then the environment variable, then
/// `<config_dir>/vanderwaals/<app_name>.toml`. An explicit path or
/// environment value that does not exist is an error; a missing default
/// file is not (returns `None`).
pub fn find_config_file(
    explicit: Option<&Path>,
    env_var_name: &str,
    app_name: &str,
) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        return require_exists(path).map(Some);
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return require_exists(Path::new(&path)).map(Some);
        }
    }

    let default = dirs::config_dir().map(|d| d.join("vanderwaals").join(format!("{}.toml", app_name)));
    match default {
        Some(path) if path.exists() => Ok(Some(path)),
        _ => Ok(None),
    }
}

fn require_exists(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        Ok(path.to_path_buf())
    } else {
        Err(Error::Config(format!("Config file not found: {}", path.display())))
    }
}

/// Read and parse a TOML file into `T`
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let value = toml::from_str(&content)?;
    tracing::debug!(path = %path.display(), "Loaded TOML config");
    Ok(value)
}
