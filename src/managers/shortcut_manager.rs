//! Shortcut Manager for termdeck.
//!
//! Manages keyboard shortcut bindings with conflict detection
//! and platform-specific modifier key adaptation.

use std::collections::HashMap;

use tracing::warn;

use crate::types::errors::ShortcutError;
use crate::types::event::{KeyChord, ShortcutAction};

/// Trait defining shortcut management operations.
pub trait ShortcutManagerTrait {
    fn register_shortcut(&mut self, action: &str, keys: &str) -> Result<(), ShortcutError>;
    fn unregister_shortcut(&mut self, action: &str) -> Result<(), ShortcutError>;
    fn get_shortcut(&self, action: &str) -> Option<&KeyChord>;
    fn list_shortcuts(&self) -> &HashMap<String, KeyChord>;
    fn lookup(&self, chord: &KeyChord) -> Option<ShortcutAction>;
    fn reset_to_defaults(&mut self) -> Result<(), ShortcutError>;
    fn has_conflict(&self, chord: &KeyChord, exclude_action: Option<&str>) -> Option<String>;
    fn get_default_shortcuts(&self) -> HashMap<String, KeyChord>;
}

/// Shortcut manager with in-memory storage and platform adaptation.
pub struct ShortcutManager {
    shortcuts: HashMap<String, KeyChord>,
}

impl ShortcutManager {
    pub fn new() -> Self {
        let mut mgr = Self {
            shortcuts: HashMap::new(),
        };
        let defaults = mgr.get_default_shortcuts();
        mgr.shortcuts = defaults;
        mgr
    }

    /// Builds the default table, then applies `overrides` (action -> keys).
    /// Invalid overrides are logged and skipped.
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Self {
        let mut mgr = Self::new();
        let mut entries: Vec<_> = overrides.iter().collect();
        entries.sort();
        for (action, keys) in entries {
            if let Err(e) = mgr.register_shortcut(action, keys) {
                warn!(action = %action, keys = %keys, error = %e, "ignoring shortcut override");
            }
        }
        mgr
    }

    fn parse_keys(keys: &str) -> Result<KeyChord, ShortcutError> {
        if keys.trim().is_empty() {
            return Err(ShortcutError::InvalidKeys("Keys cannot be empty".to_string()));
        }
        keys.parse::<KeyChord>()
            .map(|chord| chord.adapted_for_platform())
            .map_err(ShortcutError::InvalidKeys)
    }
}

impl Default for ShortcutManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ShortcutManagerTrait for ShortcutManager {
    fn register_shortcut(&mut self, action: &str, keys: &str) -> Result<(), ShortcutError> {
        if ShortcutAction::from_name(action).is_none() {
            return Err(ShortcutError::UnknownAction(action.to_string()));
        }
        let chord = Self::parse_keys(keys)?;

        if let Some(conflicting_action) = self.has_conflict(&chord, Some(action)) {
            return Err(ShortcutError::Conflict(format!(
                "'{}' is already bound to '{}'", chord, conflicting_action
            )));
        }

        self.shortcuts.insert(action.to_string(), chord);
        Ok(())
    }

    fn unregister_shortcut(&mut self, action: &str) -> Result<(), ShortcutError> {
        self.shortcuts.remove(action)
            .map(|_| ())
            .ok_or_else(|| ShortcutError::NotFound(action.to_string()))
    }

    fn get_shortcut(&self, action: &str) -> Option<&KeyChord> {
        self.shortcuts.get(action)
    }

    fn list_shortcuts(&self) -> &HashMap<String, KeyChord> {
        &self.shortcuts
    }

    fn lookup(&self, chord: &KeyChord) -> Option<ShortcutAction> {
        self.shortcuts
            .iter()
            .find(|(_, bound)| *bound == chord)
            .and_then(|(action, _)| ShortcutAction::from_name(action))
    }

    fn reset_to_defaults(&mut self) -> Result<(), ShortcutError> {
        self.shortcuts = self.get_default_shortcuts();
        Ok(())
    }

    fn has_conflict(&self, chord: &KeyChord, exclude_action: Option<&str>) -> Option<String> {
        for (action, bound) in &self.shortcuts {
            if bound == chord {
                if let Some(exclude) = exclude_action {
                    if action == exclude {
                        continue;
                    }
                }
                return Some(action.clone());
            }
        }
        None
    }

    fn get_default_shortcuts(&self) -> HashMap<String, KeyChord> {
        let defaults = vec![
            (ShortcutAction::ToggleSidebar, "Cmd+B"),
            (ShortcutAction::ShowNotifications, "Cmd+I"),
            (ShortcutAction::NewSurface, "Cmd+T"),
            (ShortcutAction::CloseSurface, "Cmd+W"),
            (ShortcutAction::NewWorkspace, "Cmd+N"),
            (ShortcutAction::CloseWorkspace, "Cmd+Shift+W"),
            (ShortcutAction::NextWorkspace, "Ctrl+Cmd+]"),
            (ShortcutAction::PreviousWorkspace, "Ctrl+Cmd+["),
            (ShortcutAction::SplitRight, "Cmd+D"),
            (ShortcutAction::SplitDown, "Cmd+Shift+D"),
            (ShortcutAction::NewWindow, "Cmd+Shift+N"),
            (ShortcutAction::CloseWindow, "Cmd+Shift+Q"),
        ];
        let numbered: Vec<(ShortcutAction, String)> = (1..=9)
            .map(|n| (ShortcutAction::SelectWorkspace(n), format!("Cmd+{}", n)))
            .collect();

        let mut table = HashMap::new();
        for (action, keys) in defaults.into_iter().map(|(a, k)| (a, k.to_string())).chain(numbered) {
            match Self::parse_keys(&keys) {
                Ok(chord) => {
                    table.insert(action.name(), chord);
                }
                Err(e) => warn!(action = %action.name(), error = %e, "invalid default shortcut"),
            }
        }
        table
    }
}
