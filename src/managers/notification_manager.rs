//! In-memory notifications, owned by the workspace that raised them.

use std::collections::HashSet;

use uuid::Uuid;

use crate::managers::session_manager::unix_now;
use crate::types::notification::Notification;
use crate::types::workspace::{SurfaceId, WorkspaceId};

#[derive(Debug, Default)]
pub struct NotificationManager {
    notifications: Vec<Notification>,
}

impl NotificationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        workspace_id: WorkspaceId,
        surface_id: Option<SurfaceId>,
        title: &str,
        body: &str,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        self.notifications.push(Notification {
            id: id.clone(),
            workspace_id,
            surface_id,
            title: title.to_string(),
            body: body.to_string(),
            created_at: unix_now(),
        });
        id
    }

    /// Newest first; limited to `workspace_id` when given.
    pub fn list(&self, workspace_id: Option<WorkspaceId>) -> Vec<&Notification> {
        self.notifications
            .iter()
            .rev()
            .filter(|n| workspace_id.map_or(true, |ws| n.workspace_id == ws))
            .collect()
    }

    pub fn clear(&mut self) -> usize {
        let count = self.notifications.len();
        self.notifications.clear();
        count
    }

    /// Drops every notification owned by one of `workspaces`.
    pub fn remove_for_workspaces(&mut self, workspaces: &[WorkspaceId]) -> usize {
        let owned: HashSet<&WorkspaceId> = workspaces.iter().collect();
        let before = self.notifications.len();
        self.notifications.retain(|n| !owned.contains(&n.workspace_id));
        before - self.notifications.len()
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }
}
