// termdeck paths on Windows
// Config and data share %APPDATA%\termdeck

use std::env;
use std::path::PathBuf;

use super::APP_DIR_NAME;

fn roaming_app_data() -> PathBuf {
    let base = env::var("APPDATA")
        .or_else(|_| env::var("USERPROFILE").map(|p| format!("{}\\AppData\\Roaming", p)))
        .unwrap_or_else(|_| String::from("C:\\Temp"));
    PathBuf::from(base).join(APP_DIR_NAME)
}

pub fn get_config_dir() -> PathBuf {
    roaming_app_data()
}

pub fn get_data_dir() -> PathBuf {
    roaming_app_data()
}
