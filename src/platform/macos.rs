// termdeck paths on macOS
// Config and data share ~/Library/Application Support/termdeck

use std::env;
use std::path::PathBuf;

use super::APP_DIR_NAME;

fn application_support() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
        .join("Library")
        .join("Application Support")
        .join(APP_DIR_NAME)
}

pub fn get_config_dir() -> PathBuf {
    application_support()
}

pub fn get_data_dir() -> PathBuf {
    application_support()
}
