// termdeck platform abstraction
// Per-OS locations for settings and session files.
//
// `TERMDECK_CONFIG_DIR` / `TERMDECK_DATA_DIR` override the platform choice,
// which keeps tests and side-by-side installs away from the user's files.

use std::env;
use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

pub const APP_DIR_NAME: &str = "termdeck";

/// Returns the configuration directory (holds `settings.json`).
///
/// - **Linux**: `$XDG_CONFIG_HOME/termdeck` or `~/.config/termdeck`
/// - **macOS**: `~/Library/Application Support/termdeck`
/// - **Windows**: `%APPDATA%/termdeck`
pub fn get_config_dir() -> PathBuf {
    if let Some(dir) = env_override("TERMDECK_CONFIG_DIR") {
        return dir;
    }
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
}

/// Returns the data directory (holds `session.json` and
/// `window-geometry.json`).
///
/// - **Linux**: `$XDG_DATA_HOME/termdeck` or `~/.local/share/termdeck`
/// - **macOS**: `~/Library/Application Support/termdeck`
/// - **Windows**: `%APPDATA%/termdeck`
pub fn get_data_dir() -> PathBuf {
    if let Some(dir) = env_override("TERMDECK_DATA_DIR") {
        return dir;
    }
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
}

fn env_override(name: &str) -> Option<PathBuf> {
    env::var_os(name)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
