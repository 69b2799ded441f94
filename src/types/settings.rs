use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::session::MAX_SNAPSHOT_WINDOWS;

/// Top-level shell settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ShellSettings {
    pub session: SessionSettings,
    pub geometry: GeometrySettings,
    pub focus: FocusSettings,
    /// Action name -> chord overrides, e.g. `"toggle_sidebar": "Cmd+Shift+B"`.
    pub shortcuts: HashMap<String, String>,
    pub logging: LogSettings,
    pub control: ControlSettings,
}

/// Snapshot persistence and restore settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionSettings {
    pub autosave_interval_secs: u64,
    pub restore_on_launch: bool,
    pub max_windows: usize,
    /// Overrides `<data dir>/session.json`.
    pub snapshot_path: Option<String>,
    /// Overrides `<data dir>/window-geometry.json`.
    pub geometry_path: Option<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            autosave_interval_secs: 8,
            restore_on_launch: true,
            max_windows: MAX_SNAPSHOT_WINDOWS,
            snapshot_path: None,
            geometry_path: None,
        }
    }
}

/// Window geometry floor and defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeometrySettings {
    pub min_width: f64,
    pub min_height: f64,
    /// Per-edge tolerance when deciding a display is unchanged.
    pub match_tolerance: f64,
    pub default_width: f64,
    pub default_height: f64,
}

impl Default for GeometrySettings {
    fn default() -> Self {
        Self {
            min_width: 300.0,
            min_height: 200.0,
            match_tolerance: 1.0,
            default_width: 1000.0,
            default_height: 700.0,
        }
    }
}

/// Focus re-assertion after cross-window moves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FocusSettings {
    /// Delays, relative to the move, at which focus is re-checked.
    pub retry_delays_ms: Vec<u64>,
}

impl Default for FocusSettings {
    fn default() -> Self {
        Self {
            retry_delays_ms: vec![30, 120, 300],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogSettings {
    /// Filter directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    pub compact: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            compact: false,
        }
    }
}

/// Who may drive the shell through the control protocol.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    Disabled,
    /// Only clients started from inside a termdeck surface, identified by
    /// the surface marker in their environment.
    #[default]
    ProcessOnly,
    AllowAll,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ControlSettings {
    pub mode: ControlMode,
}
