//! Window context registry.
//!
//! In-memory directory of live windows. Each entry binds a process-stable
//! [`WindowId`] to its workspace manager, its sidebar state and the OS window
//! handle currently naming it. Entries are keyed by `WindowId`; the handle is a
//! secondary index that `reindex` keeps current when the window server
//! reassigns window numbers.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::managers::workspace_manager::{Workspace, WorkspaceManager, WorkspaceManagerTrait};
use crate::types::errors::RegistryError;
use crate::types::window::{SidebarState, WindowHandle, WindowId};
use crate::types::workspace::{ManagerId, SurfaceId, WorkspaceId};

/// Everything the shell tracks for one OS window.
#[derive(Debug)]
pub struct WindowContext {
    window_id: WindowId,
    handle: WindowHandle,
    pub workspace_manager: WorkspaceManager,
    pub sidebar: SidebarState,
}

impl WindowContext {
    pub fn window_id(&self) -> WindowId {
        self.window_id
    }

    /// Non-owning reference to the OS window.
    pub fn handle(&self) -> WindowHandle {
        self.handle
    }

    pub fn manager_id(&self) -> ManagerId {
        self.workspace_manager.id()
    }
}

/// Registry of window contexts in registration order.
#[derive(Debug, Default)]
pub struct WindowContextRegistry {
    contexts: Vec<WindowContext>,
    by_handle: HashMap<WindowHandle, WindowId>,
}

impl WindowContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a window. Registering a known `window_id` again only moves
    /// it to `handle`; the passed manager and sidebar are dropped.
    pub fn register(
        &mut self,
        window_id: WindowId,
        workspace_manager: WorkspaceManager,
        sidebar: SidebarState,
        handle: WindowHandle,
    ) -> Result<(), RegistryError> {
        if let Some(owner) = self.by_handle.get(&handle) {
            if *owner != window_id {
                return Err(RegistryError::HandleInUse(handle.0));
            }
        }
        if self.position(window_id).is_some() {
            return self.reindex(window_id, handle);
        }
        debug!(window_id = %window_id, handle = %handle, "registering window context");
        self.by_handle.insert(handle, window_id);
        self.contexts.push(WindowContext {
            window_id,
            handle,
            workspace_manager,
            sidebar: sidebar.sanitized(),
        });
        Ok(())
    }

    /// Binds an existing context to a new OS handle.
    pub fn reindex(&mut self, window_id: WindowId, new_handle: WindowHandle) -> Result<(), RegistryError> {
        if let Some(owner) = self.by_handle.get(&new_handle) {
            if *owner != window_id {
                return Err(RegistryError::HandleInUse(new_handle.0));
            }
        }
        let index = self
            .position(window_id)
            .ok_or_else(|| RegistryError::WindowNotFound(window_id.to_string()))?;
        let context = &mut self.contexts[index];
        if context.handle != new_handle {
            debug!(window_id = %window_id, from = %context.handle, to = %new_handle, "reindexing window context");
            self.by_handle.remove(&context.handle);
            context.handle = new_handle;
            self.by_handle.insert(new_handle, window_id);
        }
        Ok(())
    }

    /// Removes the context bound to `handle` and hands it back for teardown.
    pub fn unregister(&mut self, handle: WindowHandle) -> Option<WindowContext> {
        let Some(window_id) = self.by_handle.get(&handle).copied() else {
            warn!(handle = %handle, "unregister for unknown window handle");
            return None;
        };
        self.unregister_window(window_id)
    }

    pub fn unregister_window(&mut self, window_id: WindowId) -> Option<WindowContext> {
        let index = self.position(window_id)?;
        let context = self.contexts.remove(index);
        self.by_handle.remove(&context.handle);
        debug!(window_id = %window_id, "unregistered window context");
        Some(context)
    }

    pub fn find(&self, window_id: WindowId) -> Option<&WindowContext> {
        self.contexts.iter().find(|c| c.window_id == window_id)
    }

    pub fn find_mut(&mut self, window_id: WindowId) -> Option<&mut WindowContext> {
        self.contexts.iter_mut().find(|c| c.window_id == window_id)
    }

    pub fn find_by_handle(&self, handle: WindowHandle) -> Option<&WindowContext> {
        let window_id = self.by_handle.get(&handle)?;
        self.find(*window_id)
    }

    pub fn find_by_handle_mut(&mut self, handle: WindowHandle) -> Option<&mut WindowContext> {
        let window_id = *self.by_handle.get(&handle)?;
        self.find_mut(window_id)
    }

    pub fn all(&self) -> &[WindowContext] {
        &self.contexts
    }

    pub fn all_mut(&mut self) -> impl Iterator<Item = &mut WindowContext> {
        self.contexts.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn first(&self) -> Option<&WindowContext> {
        self.contexts.first()
    }

    /// Context whose workspace manager is `manager_id`.
    pub fn context_for_manager(&self, manager_id: ManagerId) -> Option<&WindowContext> {
        self.contexts.iter().find(|c| c.manager_id() == manager_id)
    }

    /// Window hosting `workspace_id`.
    pub fn locate_workspace(&self, workspace_id: WorkspaceId) -> Option<WindowId> {
        self.contexts
            .iter()
            .find(|c| c.workspace_manager.contains(workspace_id))
            .map(|c| c.window_id)
    }

    /// Window and workspace hosting `surface_id`.
    pub fn locate_surface(&self, surface_id: SurfaceId) -> Option<(WindowId, WorkspaceId)> {
        self.contexts.iter().find_map(|c| {
            c.workspace_manager
                .workspace_for_surface(surface_id)
                .map(|ws| (c.window_id, ws))
        })
    }

    pub fn workspace(&self, workspace_id: WorkspaceId) -> Option<&Workspace> {
        self.contexts
            .iter()
            .find_map(|c| c.workspace_manager.workspace(workspace_id))
    }

    pub fn workspace_mut(&mut self, workspace_id: WorkspaceId) -> Option<&mut Workspace> {
        self.contexts
            .iter_mut()
            .find_map(|c| c.workspace_manager.workspace_mut(workspace_id))
    }

    fn position(&self, window_id: WindowId) -> Option<usize> {
        self.contexts.iter().position(|c| c.window_id == window_id)
    }
}
