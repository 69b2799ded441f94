// termdeck paths on Linux (XDG base directories)
// Config: ~/.config/termdeck
// Data:   ~/.local/share/termdeck

use std::env;
use std::path::PathBuf;

use super::APP_DIR_NAME;

pub fn get_config_dir() -> PathBuf {
    xdg_dir(env::var("XDG_CONFIG_HOME").ok(), env::var("HOME").ok(), &[".config"])
}

pub fn get_data_dir() -> PathBuf {
    xdg_dir(env::var("XDG_DATA_HOME").ok(), env::var("HOME").ok(), &[".local", "share"])
}

/// `$XDG_*/termdeck` when the variable is set and absolute, otherwise
/// `$HOME/<fallback...>/termdeck`.
fn xdg_dir(xdg: Option<String>, home: Option<String>, fallback: &[&str]) -> PathBuf {
    if let Some(xdg) = xdg.filter(|v| v.starts_with('/')) {
        return PathBuf::from(xdg).join(APP_DIR_NAME);
    }
    let mut path = PathBuf::from(home.unwrap_or_else(|| String::from("/tmp")));
    for part in fallback {
        path.push(part);
    }
    path.join(APP_DIR_NAME)
}
