use serde::{Deserialize, Serialize};

use super::geometry::{DisplayDescriptor, Rect};
use super::window::SidebarState;
use super::workspace::{SplitOrientation, SurfaceId, SurfaceKind};

pub const SESSION_SCHEMA_VERSION: u32 = 1;

/// Upper bound on windows written into one snapshot.
pub const MAX_SNAPSHOT_WINDOWS: usize = 12;

/// Versioned description of every window, persisted for restart recovery.
///
/// Unknown fields are ignored on read so older builds can open newer files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub schema_version: u32,
    pub created_at: i64,
    #[serde(default)]
    pub windows: Vec<WindowSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WindowSnapshot {
    pub frame: Rect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<DisplayDescriptor>,
    pub workspace_manager: WorkspaceManagerSnapshot,
    #[serde(default)]
    pub sidebar: SidebarState,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceManagerSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_index: Option<usize>,
    #[serde(default)]
    pub workspaces: Vec<WorkspaceSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSnapshot {
    pub title: String,
    #[serde(default)]
    pub panes: Vec<PaneSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focused_pane_index: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PaneSnapshot {
    #[serde(default)]
    pub surfaces: Vec<SurfaceSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_index: Option<usize>,
    /// Orientation of the split that created this pane; `None` for the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<SplitOrientation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceSnapshot {
    pub id: SurfaceId,
    pub title: String,
    pub kind: SurfaceKind,
}

/// Last-known geometry of a single window, kept apart from the full snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WindowGeometry {
    pub frame: Rect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<DisplayDescriptor>,
}
