//! Cross-Platform Path Utilities
//!
//! Functions for resolving application directories across platforms.
//! Everything lives under ~/.compscope/ unless `COMPSCOPE_HOME` points
//! elsewhere.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Environment variable overriding the application directory
pub const HOME_ENV: &str = "COMPSCOPE_HOME";

const CONFIG_FILE: &str = "config.json";
const DATABASE_FILE: &str = "data.db";

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the compscope directory (~/.compscope/ or $COMPSCOPE_HOME)
pub fn compscope_dir() -> AppResult<PathBuf> {
    match std::env::var_os(HOME_ENV) {
        Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
        _ => Ok(home_dir()?.join(".compscope")),
    }
}

/// Config file inside an application directory
pub fn config_file(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE)
}

/// SQLite file inside an application directory
pub fn database_file(dir: &Path) -> PathBuf {
    dir.join(DATABASE_FILE)
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Get the compscope directory, creating if it doesn't exist
pub fn ensure_compscope_dir() -> AppResult<PathBuf> {
    let path = compscope_dir()?;
    ensure_dir(&path)?;
    Ok(path)
}
