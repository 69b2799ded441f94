//! App Core for termdeck.
//!
//! Central struct owning the window registry, routing, transfer, focus and
//! session lifecycle state. Every method runs on the UI thread; persistence
//! is the only work handed to another thread.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::managers::notification_manager::NotificationManager;
use crate::managers::session_manager::{SessionSnapshotStore, SnapshotStore, WindowGeometryStore};
use crate::managers::shortcut_manager::ShortcutManager;
use crate::managers::shortcut_router::ShortcutRouter;
use crate::managers::surface_transfer::{
    self, MoveRequest, SourceCleanup, TransferOutcome, WorkspaceMoveOutcome,
};
use crate::managers::window_registry::{WindowContext, WindowContextRegistry};
use crate::managers::workspace_manager::{Workspace, WorkspaceManager, WorkspaceManagerTrait};
use crate::services::display_geometry::{self, GeometryPolicy};
use crate::services::event_interception::{DispatchOutcome, EventInterceptionLayer};
use crate::services::focus_reassertion::{FocusReassertion, FocusTarget};
use crate::services::pane_tree::{PaneTreeFactory, StackPaneTreeFactory};
use crate::services::session_lifecycle::{build_snapshot, AutosaveOutcome, SessionLifecycle};
use crate::services::window_server::{HeadlessWindowServer, WindowServer};
use crate::types::errors::{RegistryError, TransferError, WorkspaceError};
use crate::types::event::{KeyEvent, ShortcutAction};
use crate::types::geometry::{DisplayDescriptor, Rect};
use crate::types::session::{SessionSnapshot, WindowGeometry};
use crate::types::settings::ShellSettings;
use crate::types::window::{SidebarSelection, SidebarState, WindowHandle, WindowId};
use crate::types::workspace::{PaneId, SplitOrientation, Surface, SurfaceId, WorkspaceId};

/// Offset applied to each new window relative to the active one.
const CASCADE_OFFSET: f64 = 24.0;

/// Central application struct.
pub struct App<S: WindowServer = HeadlessWindowServer> {
    pub settings: ShellSettings,
    pub server: S,
    pub registry: WindowContextRegistry,
    pub router: ShortcutRouter,
    pub shortcuts: ShortcutManager,
    pub notifications: NotificationManager,
    pub interception: EventInterceptionLayer,
    pane_trees: Box<dyn PaneTreeFactory>,
    focus: FocusReassertion,
    lifecycle: SessionLifecycle,
    geometry: GeometryPolicy,
}

impl App<HeadlessWindowServer> {
    /// App over the in-memory window server and pane trees.
    pub fn headless(settings: ShellSettings) -> Self {
        App::new(
            settings,
            HeadlessWindowServer::single_display(),
            Box::new(StackPaneTreeFactory),
        )
    }
}

impl<S: WindowServer> App<S> {
    pub fn new(settings: ShellSettings, server: S, pane_trees: Box<dyn PaneTreeFactory>) -> Self {
        let store: Arc<dyn SnapshotStore> =
            Arc::new(SessionSnapshotStore::new(settings.session.snapshot_path.clone()));
        let geometry_store = WindowGeometryStore::new(settings.session.geometry_path.clone());
        let lifecycle = SessionLifecycle::new(store, geometry_store, &settings.session);
        Self {
            shortcuts: ShortcutManager::with_overrides(&settings.shortcuts),
            focus: FocusReassertion::new(&settings.focus.retry_delays_ms),
            geometry: GeometryPolicy::from(&settings.geometry),
            registry: WindowContextRegistry::new(),
            router: ShortcutRouter::new(),
            notifications: NotificationManager::new(),
            interception: EventInterceptionLayer::new(),
            pane_trees,
            lifecycle,
            settings,
            server,
        }
    }

    /// Restores the last session, else opens one window at the remembered
    /// geometry, else one default window. Returns the opened windows.
    pub fn startup(&mut self) -> Vec<WindowId> {
        self.lifecycle.begin_restore();
        let mut opened = Vec::new();

        let snapshot = if self.settings.session.restore_on_launch {
            self.lifecycle.load()
        } else {
            None
        };
        if let Some(snapshot) = snapshot {
            opened = self.restore_snapshot(&snapshot);
        }

        if opened.is_empty() {
            let frame = match self.lifecycle.geometry_fallback() {
                Some(geometry) => self.resolve_frame(geometry.frame, geometry.display.as_ref()),
                None => self.default_frame(),
            };
            let manager = self.default_manager();
            match self.open_window(frame, manager, SidebarState::default()) {
                Ok(window_id) => opened.push(window_id),
                Err(e) => warn!(error = %e, "failed to open startup window"),
            }
        }

        self.lifecycle.finish_restore();
        if let Some(first) = opened.first().copied() {
            self.activate(first);
        }
        info!(windows = opened.len(), "startup complete");
        opened
    }

    fn restore_snapshot(&mut self, snapshot: &SessionSnapshot) -> Vec<WindowId> {
        let mut opened = Vec::new();
        let mut seen: HashSet<SurfaceId> = HashSet::new();
        for window in snapshot.windows.iter().take(self.lifecycle.max_windows()) {
            let frame = self.resolve_frame(window.frame, window.display.as_ref());
            let mut manager =
                WorkspaceManager::restore(&window.workspace_manager, self.pane_trees.as_ref(), &mut seen);
            if manager.workspace_count() == 0 {
                self.add_default_workspace(&mut manager);
            }
            match self.open_window(frame, manager, window.sidebar.clone()) {
                Ok(window_id) => opened.push(window_id),
                Err(e) => warn!(error = %e, "failed to restore window"),
            }
        }
        debug!(restored = opened.len(), persisted = snapshot.windows.len(), "session restored");
        opened
    }

    /// Persisted frame mapped onto the current displays, or a default frame.
    pub fn resolve_frame(&self, frame: Rect, display: Option<&DisplayDescriptor>) -> Rect {
        let displays = self.server.displays();
        let main = self.server.main_display();
        display_geometry::resolve(frame, display, &displays, main.as_ref(), &self.geometry)
            .unwrap_or_else(|| self.default_frame())
    }

    fn default_frame(&self) -> Rect {
        let main = self.server.main_display();
        display_geometry::default_frame(main.as_ref(), &self.settings.geometry)
    }

    fn default_manager(&self) -> WorkspaceManager {
        let mut manager = WorkspaceManager::new();
        self.add_default_workspace(&mut manager);
        manager
    }

    fn add_default_workspace(&self, manager: &mut WorkspaceManager) -> WorkspaceId {
        let id = manager.create_workspace(None, self.pane_trees.create(), true);
        if let Some(workspace) = manager.workspace_mut(id) {
            if let Err(e) = workspace.add_surface(Surface::terminal(None), None, None) {
                warn!(error = %e, "failed to seed workspace");
            }
        }
        id
    }

    fn open_window(
        &mut self,
        frame: Rect,
        manager: WorkspaceManager,
        sidebar: SidebarState,
    ) -> Result<WindowId, RegistryError> {
        let handle = self.server.create_window(frame);
        let window_id = WindowId::new();
        if let Err(e) = self.registry.register(window_id, manager, sidebar, handle) {
            self.server.close_window(handle);
            return Err(e);
        }
        debug!(window_id = %window_id, handle = %handle, "window opened");
        Ok(window_id)
    }

    /// Makes a window key and points the active context at it.
    pub fn activate(&mut self, window_id: WindowId) -> bool {
        let Some(handle) = self.registry.find(window_id).map(|c| c.handle()) else {
            return false;
        };
        self.server.make_key(handle);
        self.router.sync(window_id, &self.registry)
    }

    /// Opens a window with one terminal workspace, cascaded from the active one.
    pub fn new_window(&mut self) -> Result<WindowId, RegistryError> {
        let base = self.default_frame();
        let frame = self
            .router
            .active_window()
            .and_then(|id| self.registry.find(id))
            .and_then(|c| self.server.frame(c.handle()))
            .map(|f| Rect::new(f.x + CASCADE_OFFSET, f.y + CASCADE_OFFSET, f.width, f.height))
            .map(|f| self.resolve_frame(f, None))
            .unwrap_or(base);
        let manager = self.default_manager();
        let window_id = self.open_window(frame, manager, SidebarState::default())?;
        self.activate(window_id);
        Ok(window_id)
    }

    /// Tears a window down: registry entry, notifications, pending focus,
    /// then remembers its geometry and refreshes the snapshot.
    pub fn close_window(&mut self, window_id: WindowId) -> bool {
        let Some(handle) = self.registry.find(window_id).map(|c| c.handle()) else {
            return false;
        };
        let frame = self.server.frame(handle);
        let display = self.server.display_for(handle);
        let Some(context) = self.registry.unregister_window(window_id) else {
            return false;
        };
        self.teardown(context);
        self.server.close_window(handle);

        if let Some(frame) = frame {
            let snapshot = self.snapshot();
            self.lifecycle.window_closed(&WindowGeometry { frame, display }, snapshot);
        }
        if self.router.active().is_none() {
            let next = self
                .server
                .key_window()
                .and_then(|h| self.registry.find_by_handle(h))
                .or_else(|| self.registry.first())
                .map(|c| c.window_id());
            if let Some(next) = next {
                self.activate(next);
            }
        }
        info!(window_id = %window_id, "window closed");
        true
    }

    /// Close notification from the window server.
    pub fn window_did_close(&mut self, handle: WindowHandle) -> bool {
        match self.registry.find_by_handle(handle).map(|c| c.window_id()) {
            Some(window_id) => self.close_window(window_id),
            None => false,
        }
    }

    fn teardown(&mut self, context: WindowContext) {
        let workspaces: Vec<WorkspaceId> = context
            .workspace_manager
            .workspaces()
            .iter()
            .map(Workspace::id)
            .collect();
        let dropped = self.notifications.remove_for_workspaces(&workspaces);
        if dropped > 0 {
            debug!(window_id = %context.window_id(), dropped, "discarded window notifications");
        }
        self.router.clear_if(context.window_id());
        self.focus.cancel_for_window(context.window_id());
    }

    /// The window server renumbered a window.
    pub fn window_did_change_handle(&mut self, window_id: WindowId, handle: WindowHandle) -> Result<(), RegistryError> {
        self.registry.reindex(window_id, handle)
    }

    pub fn window_did_become_key(&mut self, handle: WindowHandle) -> bool {
        match self.registry.find_by_handle(handle).map(|c| c.window_id()) {
            Some(window_id) => self.router.sync(window_id, &self.registry),
            None => false,
        }
    }

    /// Runs a key event through the interception stages and performs the
    /// resulting shortcut, if any.
    pub fn handle_key_event(&mut self, event: &KeyEvent) -> DispatchOutcome {
        let outcome = self.interception.dispatch(
            event,
            &self.registry,
            &mut self.router,
            &self.shortcuts,
            &self.server,
        );
        if let DispatchOutcome::Shortcut { action, window_id } = &outcome {
            if !self.perform(*action, *window_id) {
                debug!(action = %action.name(), window_id = %window_id, "shortcut had no effect");
            }
        }
        outcome
    }

    /// Performs `action` against `window_id` only.
    pub fn perform(&mut self, action: ShortcutAction, window_id: WindowId) -> bool {
        let done = match action {
            ShortcutAction::NewWindow => return self.new_window().is_ok(),
            ShortcutAction::CloseWindow => return self.close_window(window_id),
            ShortcutAction::CloseSurface => return self.close_focused_surface(window_id),
            ShortcutAction::CloseWorkspace => return self.close_selected_workspace(window_id),
            ShortcutAction::NewWorkspace => self.create_workspace(window_id, None).is_ok(),
            ShortcutAction::NewSurface => self
                .create_surface(window_id, None, Surface::terminal(None))
                .is_ok(),
            ShortcutAction::SplitRight => self.split_focused(window_id, SplitOrientation::Horizontal),
            ShortcutAction::SplitDown => self.split_focused(window_id, SplitOrientation::Vertical),
            _ => {
                let Some(context) = self.registry.find_mut(window_id) else {
                    return false;
                };
                apply_to_context(action, context)
            }
        };
        self.router.sync(window_id, &self.registry);
        done
    }

    /// Adds a workspace with one terminal to a window and selects it.
    pub fn create_workspace(&mut self, window_id: WindowId, title: Option<&str>) -> Result<WorkspaceId, RegistryError> {
        let tree = self.pane_trees.create();
        let context = self
            .registry
            .find_mut(window_id)
            .ok_or_else(|| RegistryError::WindowNotFound(window_id.to_string()))?;
        let id = context.workspace_manager.create_workspace(title, tree, true);
        if let Some(workspace) = context.workspace_manager.workspace_mut(id) {
            if let Err(e) = workspace.add_surface(Surface::terminal(None), None, None) {
                warn!(error = %e, "failed to seed workspace");
            }
        }
        Ok(id)
    }

    /// Adds a surface to `workspace_id`, or to the window's selected workspace.
    pub fn create_surface(
        &mut self,
        window_id: WindowId,
        workspace_id: Option<WorkspaceId>,
        surface: Surface,
    ) -> Result<SurfaceId, WorkspaceError> {
        let context = self
            .registry
            .find_mut(window_id)
            .ok_or_else(|| WorkspaceError::NotFound(window_id.to_string()))?;
        let manager = &mut context.workspace_manager;
        let target = match workspace_id.or(manager.selected_id()) {
            Some(id) => id,
            None => manager.create_workspace(None, self.pane_trees.create(), true),
        };
        let workspace = manager
            .workspace_mut(target)
            .ok_or_else(|| WorkspaceError::NotFound(target.to_string()))?;
        workspace.add_surface(surface, None, None)
    }

    fn split_focused(&mut self, window_id: WindowId, orientation: SplitOrientation) -> bool {
        let Some(context) = self.registry.find_mut(window_id) else {
            return false;
        };
        let Some(workspace) = context.workspace_manager.selected_workspace_mut() else {
            return false;
        };
        let Some(pane) = workspace.pane_tree().focused_pane() else {
            return false;
        };
        let Ok(surface) = workspace.add_surface(Surface::terminal(None), Some(pane), None) else {
            return false;
        };
        if workspace.pane_tree_mut().split(pane, orientation, surface, false).is_none() {
            warn!(pane = %pane, "split refused; surface stays in its pane");
            return false;
        }
        true
    }

    fn close_focused_surface(&mut self, window_id: WindowId) -> bool {
        let Some(context) = self.registry.find_mut(window_id) else {
            return false;
        };
        let Some(workspace) = context.workspace_manager.selected_workspace_mut() else {
            return false;
        };
        let Some(surface) = workspace.focused_surface() else {
            return false;
        };
        if workspace.close_surface(surface).is_err() {
            return false;
        }
        if workspace.is_empty() {
            return self.close_selected_workspace(window_id);
        }
        self.router.sync(window_id, &self.registry);
        true
    }

    /// Closes the selected workspace; the last one takes its window along.
    fn close_selected_workspace(&mut self, window_id: WindowId) -> bool {
        let Some(context) = self.registry.find_mut(window_id) else {
            return false;
        };
        let manager = &mut context.workspace_manager;
        let Some(selected) = manager.selected_id() else {
            return false;
        };
        if manager.workspace_count() <= 1 {
            return self.close_window(window_id);
        }
        if manager.close_workspace(selected).is_err() {
            return false;
        }
        self.notifications.remove_for_workspaces(&[selected]);
        self.router.sync(window_id, &self.registry);
        true
    }

    /// Moves a surface and, when it landed in another window, brings that
    /// window forward and keeps re-checking focus for a short while.
    pub fn move_surface(&mut self, request: &MoveRequest) -> Result<TransferOutcome, TransferError> {
        let outcome = surface_transfer::move_surface(&mut self.registry, request)?;
        match outcome.cleanup {
            SourceCleanup::CloseWindow(window_id) => {
                self.close_window(window_id);
            }
            SourceCleanup::ClosedWorkspace(workspace_id) => {
                self.notifications.remove_for_workspaces(&[workspace_id]);
            }
            SourceCleanup::None => {}
        }
        if request.focus {
            self.activate(outcome.destination_window);
            if outcome.destination_window != outcome.source_window {
                self.focus.schedule(
                    FocusTarget {
                        window_id: outcome.destination_window,
                        workspace_id: outcome.destination_workspace,
                        surface_id: Some(request.surface),
                    },
                    Instant::now(),
                );
            }
        }
        Ok(outcome)
    }

    pub fn move_workspace_to_window(
        &mut self,
        workspace_id: WorkspaceId,
        window_id: WindowId,
        focus: bool,
    ) -> Result<WorkspaceMoveOutcome, TransferError> {
        let outcome = surface_transfer::move_workspace_to_window(&mut self.registry, workspace_id, window_id, focus)?;
        if let SourceCleanup::CloseWindow(source) = outcome.cleanup {
            self.close_window(source);
        }
        if focus {
            self.activate(window_id);
            self.focus.schedule(
                FocusTarget {
                    window_id,
                    workspace_id,
                    surface_id: None,
                },
                Instant::now(),
            );
        }
        Ok(outcome)
    }

    /// Runs due focus retries.
    pub fn tick(&mut self, now: Instant) -> bool {
        let target = self.focus.target();
        let changed = self.focus.poll(now, &mut self.registry, &mut self.server);
        if changed {
            if let Some(target) = target {
                self.router.sync(target.window_id, &self.registry);
            }
        }
        changed
    }

    pub fn next_focus_deadline(&self) -> Option<Instant> {
        self.focus.next_deadline()
    }

    pub fn autosave(&mut self) -> AutosaveOutcome {
        let max = self.lifecycle.max_windows();
        let registry = &self.registry;
        let server = &self.server;
        self.lifecycle.autosave_tick(|| build_snapshot(registry, server, max))
    }

    /// The app lost focus; save in the background.
    pub fn resign_active(&mut self) -> bool {
        let snapshot = self.snapshot();
        self.lifecycle.save_async(snapshot)
    }

    /// Synchronous save.
    pub fn save_session(&mut self) -> bool {
        let snapshot = self.snapshot();
        self.lifecycle.save_sync(&snapshot)
    }

    pub fn terminate(&mut self) -> bool {
        let snapshot = self.snapshot();
        let saved = self.lifecycle.terminate(&snapshot);
        self.focus.cancel();
        saved
    }

    pub fn power_off(&mut self) -> bool {
        let snapshot = self.snapshot();
        let saved = self.lifecycle.power_off(&snapshot);
        self.focus.cancel();
        saved
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        build_snapshot(&self.registry, &self.server, self.lifecycle.max_windows())
    }

    pub fn lifecycle(&self) -> &SessionLifecycle {
        &self.lifecycle
    }

    pub fn autosave_interval(&self) -> std::time::Duration {
        self.lifecycle.autosave_interval()
    }

    pub fn active_context(&self) -> Option<&WindowContext> {
        self.router.active_window().and_then(|id| self.registry.find(id))
    }

    /// True when `pane` belongs to `workspace_id`.
    pub fn pane_exists(&self, workspace_id: WorkspaceId, pane: PaneId) -> bool {
        self.registry
            .workspace(workspace_id)
            .map(|ws| ws.pane_tree().all_panes().contains(&pane))
            .unwrap_or(false)
    }
}

/// Actions that only touch one window's own state.
fn apply_to_context(action: ShortcutAction, context: &mut WindowContext) -> bool {
    let manager = &mut context.workspace_manager;
    match action {
        ShortcutAction::ToggleSidebar => {
            context.sidebar.visible = !context.sidebar.visible;
            true
        }
        ShortcutAction::ShowNotifications => {
            let sidebar = &mut context.sidebar;
            if sidebar.visible && sidebar.selection == SidebarSelection::Notifications {
                sidebar.selection = SidebarSelection::Tabs;
            } else {
                sidebar.visible = true;
                sidebar.selection = SidebarSelection::Notifications;
            }
            true
        }
        ShortcutAction::NextWorkspace => manager.select_next().is_some(),
        ShortcutAction::PreviousWorkspace => manager.select_previous().is_some(),
        ShortcutAction::SelectWorkspace(n) => {
            let count = manager.workspace_count();
            if count == 0 {
                return false;
            }
            let index = if n == 9 { count - 1 } else { usize::from(n).saturating_sub(1) };
            manager.select_index(index).is_ok()
        }
        _ => false,
    }
}
