use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::window::WindowHandle;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        const CMD = 1 << 3;
    }
}

impl Modifiers {
    /// Modifiers that mark an application command on this platform.
    pub fn command() -> Modifiers {
        if cfg!(target_os = "macos") {
            Modifiers::CMD
        } else {
            Modifiers::CTRL
        }
    }
}

/// A key plus modifiers, written as `"Cmd+Shift+T"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub modifiers: Modifiers,
    pub key: String,
}

impl KeyChord {
    pub fn new(modifiers: Modifiers, key: &str) -> Self {
        Self {
            modifiers,
            key: key.to_ascii_lowercase(),
        }
    }

    /// Chords without the platform command modifiers are terminal input.
    pub fn is_terminal_input(&self) -> bool {
        !self.modifiers.contains(Modifiers::command())
    }

    /// Rewrites `Cmd` into the platform's command modifiers.
    pub fn adapted_for_platform(&self) -> Self {
        if cfg!(target_os = "macos") || !self.modifiers.contains(Modifiers::CMD) {
            return self.clone();
        }
        let modifiers = (self.modifiers - Modifiers::CMD) | Modifiers::command();
        Self {
            modifiers,
            key: self.key.clone(),
        }
    }
}

impl FromStr for KeyChord {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut modifiers = Modifiers::empty();
        let mut key: Option<String> = None;
        for part in s.split('+') {
            let part = part.trim();
            if part.is_empty() {
                return Err(format!("empty component in '{}'", s));
            }
            match part.to_ascii_lowercase().as_str() {
                "cmd" | "command" | "super" | "meta" => modifiers |= Modifiers::CMD,
                "ctrl" | "control" => modifiers |= Modifiers::CTRL,
                "alt" | "option" | "opt" => modifiers |= Modifiers::ALT,
                "shift" => modifiers |= Modifiers::SHIFT,
                other => {
                    if key.is_some() {
                        return Err(format!("more than one key in '{}'", s));
                    }
                    key = Some(other.to_string());
                }
            }
        }
        let key = key.ok_or_else(|| format!("no key in '{}'", s))?;
        Ok(Self { modifiers, key })
    }
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Modifiers::CMD, "Cmd"),
            (Modifiers::CTRL, "Ctrl"),
            (Modifiers::ALT, "Alt"),
            (Modifiers::SHIFT, "Shift"),
        ];
        for (flag, name) in names {
            if self.modifiers.contains(flag) {
                write!(f, "{}+", name)?;
            }
        }
        if self.key.chars().count() == 1 {
            write!(f, "{}", self.key.to_ascii_uppercase())
        } else {
            let mut chars = self.key.chars();
            match chars.next() {
                Some(first) => write!(f, "{}{}", first.to_ascii_uppercase(), chars.as_str()),
                None => Ok(()),
            }
        }
    }
}

/// A keyboard event as delivered by the window server.
///
/// `window` is the window the event claims to belong to; events synthesized
/// by the system often carry none.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEvent {
    pub window: Option<WindowHandle>,
    pub chord: KeyChord,
}

impl KeyEvent {
    pub fn new(window: Option<WindowHandle>, chord: KeyChord) -> Self {
        Self { window, chord }
    }

    /// Builds an event from a raw window number, where `0` means unbound.
    pub fn from_window_number(number: u64, chord: KeyChord) -> Self {
        Self {
            window: WindowHandle::from_number(number),
            chord,
        }
    }
}

/// Application-level commands reachable through the shortcut table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortcutAction {
    ToggleSidebar,
    ShowNotifications,
    NewSurface,
    CloseSurface,
    NewWorkspace,
    CloseWorkspace,
    NextWorkspace,
    PreviousWorkspace,
    SelectWorkspace(u8),
    SplitRight,
    SplitDown,
    NewWindow,
    CloseWindow,
}

impl ShortcutAction {
    /// Stable name used in settings overrides and the control protocol.
    pub fn name(&self) -> String {
        match self {
            ShortcutAction::ToggleSidebar => "toggle_sidebar".to_string(),
            ShortcutAction::ShowNotifications => "show_notifications".to_string(),
            ShortcutAction::NewSurface => "new_surface".to_string(),
            ShortcutAction::CloseSurface => "close_surface".to_string(),
            ShortcutAction::NewWorkspace => "new_workspace".to_string(),
            ShortcutAction::CloseWorkspace => "close_workspace".to_string(),
            ShortcutAction::NextWorkspace => "next_workspace".to_string(),
            ShortcutAction::PreviousWorkspace => "previous_workspace".to_string(),
            ShortcutAction::SelectWorkspace(n) => format!("select_workspace_{}", n),
            ShortcutAction::SplitRight => "split_right".to_string(),
            ShortcutAction::SplitDown => "split_down".to_string(),
            ShortcutAction::NewWindow => "new_window".to_string(),
            ShortcutAction::CloseWindow => "close_window".to_string(),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let action = match name {
            "toggle_sidebar" => ShortcutAction::ToggleSidebar,
            "show_notifications" => ShortcutAction::ShowNotifications,
            "new_surface" => ShortcutAction::NewSurface,
            "close_surface" => ShortcutAction::CloseSurface,
            "new_workspace" => ShortcutAction::NewWorkspace,
            "close_workspace" => ShortcutAction::CloseWorkspace,
            "next_workspace" => ShortcutAction::NextWorkspace,
            "previous_workspace" => ShortcutAction::PreviousWorkspace,
            "split_right" => ShortcutAction::SplitRight,
            "split_down" => ShortcutAction::SplitDown,
            "new_window" => ShortcutAction::NewWindow,
            "close_window" => ShortcutAction::CloseWindow,
            other => {
                let n: u8 = other.strip_prefix("select_workspace_")?.parse().ok()?;
                if !(1..=9).contains(&n) {
                    return None;
                }
                ShortcutAction::SelectWorkspace(n)
            }
        };
        Some(action)
    }
}
