// termdeck Settings Engine
// Loads, validates, updates and persists `ShellSettings`.
// Settings are stored as pretty JSON at the platform-specific config path.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::event::{KeyChord, ShortcutAction};
use crate::types::settings::ShellSettings;

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<ShellSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &ShellSettings;
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

/// Settings engine implementation that persists settings as JSON on disk.
pub struct SettingsEngine {
    config_path: String,
    settings: ShellSettings,
}

impl SettingsEngine {
    /// Uses `path_override`, or `<config dir>/settings.json`.
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = path_override.unwrap_or_else(|| {
            platform::get_config_dir()
                .join("settings.json")
                .to_string_lossy()
                .to_string()
        });

        Self {
            config_path,
            settings: ShellSettings::default(),
        }
    }

    /// Rejects values that parse but cannot work.
    pub fn validate(settings: &ShellSettings) -> Result<(), SettingsError> {
        if settings.session.autosave_interval_secs == 0 {
            return Err(SettingsError::InvalidValue(
                "session.autosave_interval_secs must be at least 1".to_string(),
            ));
        }
        if settings.session.max_windows == 0 {
            return Err(SettingsError::InvalidValue(
                "session.max_windows must be at least 1".to_string(),
            ));
        }
        let geometry = &settings.geometry;
        let sizes = [
            ("geometry.min_width", geometry.min_width),
            ("geometry.min_height", geometry.min_height),
            ("geometry.default_width", geometry.default_width),
            ("geometry.default_height", geometry.default_height),
        ];
        for (name, size) in sizes {
            if !size.is_finite() || size <= 0.0 {
                return Err(SettingsError::InvalidValue(format!("{} must be positive", name)));
            }
        }
        if !geometry.match_tolerance.is_finite() || geometry.match_tolerance < 0.0 {
            return Err(SettingsError::InvalidValue(
                "geometry.match_tolerance must not be negative".to_string(),
            ));
        }
        for (action, keys) in &settings.shortcuts {
            if ShortcutAction::from_name(action).is_none() {
                return Err(SettingsError::InvalidKey(format!("shortcuts.{}", action)));
            }
            keys.parse::<KeyChord>()
                .map_err(|e| SettingsError::InvalidValue(format!("shortcuts.{}: {}", action, e)))?;
        }
        Ok(())
    }
}

/// Walks a dot-separated path to an existing value. `shortcuts.*` entries may
/// be created, since that map starts empty.
fn value_at_path<'a>(root: &'a mut Value, key: &str) -> Result<&'a mut Value, SettingsError> {
    let not_found = || SettingsError::InvalidKey(format!("Key '{}' not found in settings", key));
    let parts: Vec<&str> = key.split('.').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(SettingsError::InvalidKey(format!("Malformed key '{}'", key)));
    }

    let mut current = root;
    for (i, part) in parts.iter().enumerate() {
        let is_last = i == parts.len() - 1;
        let Value::Object(map) = current else {
            return Err(not_found());
        };
        let creatable = is_last && parts.len() == 2 && parts[0] == "shortcuts";
        if creatable && !map.contains_key(*part) {
            map.insert(part.to_string(), Value::Null);
        }
        current = map.get_mut(*part).ok_or_else(not_found)?;
    }
    Ok(current)
}

impl SettingsEngineTrait for SettingsEngine {
    /// A missing file yields defaults; a malformed or invalid one is an error.
    fn load(&mut self) -> Result<ShellSettings, SettingsError> {
        let path = Path::new(&self.config_path);

        if !path.exists() {
            self.settings = ShellSettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;

        let settings: ShellSettings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })?;
        Self::validate(&settings)?;

        debug!(path = %self.config_path, "settings loaded");
        self.settings = settings;
        Ok(self.settings.clone())
    }

    /// Writes atomically, creating parent directories as needed.
    fn save(&self) -> Result<(), SettingsError> {
        let path = Path::new(&self.config_path);
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| {
            SettingsError::IoError(format!("Failed to create config directory: {}", e))
        })?;

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        let mut tmp = NamedTempFile::new_in(dir)
            .map_err(|e| SettingsError::IoError(format!("Failed to create temp file: {}", e)))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))?;
        tmp.persist(path)
            .map_err(|e| SettingsError::IoError(format!("Failed to replace config file: {}", e.error)))?;
        Ok(())
    }

    fn get_settings(&self) -> &ShellSettings {
        &self.settings
    }

    /// Updates one setting by dot-notation key path and saves.
    ///
    /// - `"session.autosave_interval_secs"`
    /// - `"control.mode"` (`"disabled"`, `"process_only"`, `"allow_all"`)
    /// - `"shortcuts.toggle_sidebar"`
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        if key.is_empty() {
            return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
        }

        let mut json_value = serde_json::to_value(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;
        *value_at_path(&mut json_value, key)? = value;

        let new_settings: ShellSettings = serde_json::from_value(json_value).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;
        Self::validate(&new_settings)?;

        self.settings = new_settings;
        self.save()
    }

    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = ShellSettings::default();
        self.save()
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}
