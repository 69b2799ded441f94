use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Process-lifetime-stable identifier assigned when a window is created.
///
/// Never reused; this is the persistence and lookup key for a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(Uuid);

impl WindowId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }
}

impl Default for WindowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque OS window token (window number).
///
/// The window server may reassign it during a window's lifetime, so it is a
/// secondary index only. Zero never names a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowHandle(pub u64);

impl WindowHandle {
    /// Maps a raw window number to a handle; `0` means "no window".
    pub fn from_number(number: u64) -> Option<Self> {
        (number != 0).then_some(Self(number))
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which list the sidebar shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SidebarSelection {
    #[default]
    Tabs,
    Notifications,
}

pub const DEFAULT_SIDEBAR_WIDTH: f64 = 220.0;
pub const MIN_SIDEBAR_WIDTH: f64 = 140.0;
pub const MAX_SIDEBAR_WIDTH: f64 = 480.0;

/// Per-window sidebar state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidebarState {
    pub visible: bool,
    pub width: f64,
    pub selection: SidebarSelection,
}

impl SidebarState {
    /// Returns a copy with a finite width clamped into the supported range.
    pub fn sanitized(&self) -> Self {
        let width = if self.width.is_finite() {
            self.width.clamp(MIN_SIDEBAR_WIDTH, MAX_SIDEBAR_WIDTH)
        } else {
            DEFAULT_SIDEBAR_WIDTH
        };
        Self {
            visible: self.visible,
            width,
            selection: self.selection,
        }
    }
}

impl Default for SidebarState {
    fn default() -> Self {
        Self {
            visible: true,
            width: DEFAULT_SIDEBAR_WIDTH,
            selection: SidebarSelection::Tabs,
        }
    }
}
