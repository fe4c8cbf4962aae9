//! Path resolution for catsync
//!
//! # Environment Variables
//!
//! - `CATSYNC_CONFIG_DIR` - Override the config directory
//!
//! # Path Resolution Priority
//!
//! For config_file():
//! 1. `--config` flag (or `CATSYNC_CONFIG`)
//! 2. `CATSYNC_CONFIG_DIR/catsync.toml`
//! 3. `XDG_CONFIG_HOME/catsync/catsync.toml` (if set)
//! 4. Platform default:
//!    - Windows: `%APPDATA%\catsync\catsync.toml`
//!    - macOS/Linux: `~/.config/catsync/catsync.toml`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for config directory override
pub const ENV_CONFIG_DIR: &str = "CATSYNC_CONFIG_DIR";

pub const CONFIG_FILE_NAME: &str = "catsync.toml";

/// Get the catsync config directory path
pub fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR) {
        let path = expand(&dir);
        log::debug!(
            "Using config dir from {}: {}",
            ENV_CONFIG_DIR,
            path.display()
        );
        return Ok(path);
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config).join("catsync");
        log::debug!("Using XDG_CONFIG_HOME: {}", path.display());
        return Ok(path);
    }

    #[cfg(windows)]
    {
        if let Some(app_data) = dirs::config_dir() {
            let path = app_data.join("catsync");
            log::debug!("Using Windows config dir: {}", path.display());
            return Ok(path);
        }
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    let path = home.join(".config").join("catsync");
    log::debug!("Using default config dir: {}", path.display());
    Ok(path)
}

/// Resolve the config file, honouring an explicit `--config`
pub fn config_file(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(expand(&path.to_string_lossy())),
        None => Ok(config_dir()?.join(CONFIG_FILE_NAME)),
    }
}

/// Expand ~ and environment variables in a path string
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}
