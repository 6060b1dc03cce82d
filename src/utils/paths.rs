//! Cross-Platform Path Utilities
//!
//! Resolves the application directory (~/.aegis-command/) across platforms.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the Aegis Command directory (~/.aegis-command/)
pub fn aegis_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".aegis-command"))
}

/// Get the config file path (~/.aegis-command/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(aegis_dir()?.join("config.json"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Ensure the parent directory of `file` exists
pub fn ensure_parent_dir(file: &Path) -> AppResult<()> {
    match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}
