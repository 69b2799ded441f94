use serde::{Deserialize, Serialize};

use super::workspace::{SurfaceId, WorkspaceId};

/// A notification raised by a surface, owned by its workspace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: String,
    pub workspace_id: WorkspaceId,
    pub surface_id: Option<SurfaceId>,
    pub title: String,
    pub body: String,
    pub created_at: i64,
}
