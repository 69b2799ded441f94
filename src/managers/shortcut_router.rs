//! Shortcut routing.
//!
//! Decides which window context an input event belongs to and keeps the
//! "active" pointers (workspace manager, sidebar state) synchronized with it
//! before any shortcut runs. Resolution order is fixed:
//!
//! 1. the event's own window, when it maps to a registered context;
//! 2. an event naming an unregistered window resolves to nothing;
//! 3. the key window;
//! 4. the main window;
//! 5. the context owning the last active workspace manager;
//! 6. the first registered context.

use tracing::{debug, trace};

use crate::managers::window_registry::{WindowContext, WindowContextRegistry};
use crate::services::window_server::WindowServer;
use crate::types::window::{SidebarSelection, WindowHandle, WindowId};
use crate::types::workspace::ManagerId;

/// Which rule produced a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSource {
    EventWindow,
    KeyWindow,
    MainWindow,
    LastActive,
    FirstRegistered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub window_id: WindowId,
    pub source: RouteSource,
}

/// The context actions currently operate on.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveContext {
    pub window_id: WindowId,
    pub manager_id: ManagerId,
    pub sidebar_visible: bool,
    pub sidebar_selection: SidebarSelection,
}

impl ActiveContext {
    fn from_context(context: &WindowContext) -> Self {
        Self {
            window_id: context.window_id(),
            manager_id: context.manager_id(),
            sidebar_visible: context.sidebar.visible,
            sidebar_selection: context.sidebar.selection,
        }
    }
}

#[derive(Debug, Default)]
pub struct ShortcutRouter {
    active: Option<ActiveContext>,
}

impl ShortcutRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ActiveContext> {
        self.active.as_ref()
    }

    pub fn active_window(&self) -> Option<WindowId> {
        self.active.as_ref().map(|a| a.window_id)
    }

    /// Resolves the target context without touching the active pointers.
    pub fn resolve(
        &self,
        event_window: Option<WindowHandle>,
        registry: &WindowContextRegistry,
        key_window: Option<WindowHandle>,
        main_window: Option<WindowHandle>,
    ) -> Option<Route> {
        if let Some(handle) = event_window {
            return match registry.find_by_handle(handle) {
                Some(context) => Some(Route {
                    window_id: context.window_id(),
                    source: RouteSource::EventWindow,
                }),
                None => {
                    debug!(handle = %handle, "event names an unregistered window; not routing");
                    None
                }
            };
        }

        let by_handle = |handle: Option<WindowHandle>, source| {
            handle
                .and_then(|h| registry.find_by_handle(h))
                .map(|context| Route {
                    window_id: context.window_id(),
                    source,
                })
        };

        by_handle(key_window, RouteSource::KeyWindow)
            .or_else(|| by_handle(main_window, RouteSource::MainWindow))
            .or_else(|| {
                let manager = self.active.as_ref()?.manager_id;
                registry.context_for_manager(manager).map(|context| Route {
                    window_id: context.window_id(),
                    source: RouteSource::LastActive,
                })
            })
            .or_else(|| {
                registry.first().map(|context| Route {
                    window_id: context.window_id(),
                    source: RouteSource::FirstRegistered,
                })
            })
    }

    /// Resolves the target and synchronizes the active pointers to it.
    pub fn route(
        &mut self,
        event_window: Option<WindowHandle>,
        registry: &WindowContextRegistry,
        server: &dyn WindowServer,
    ) -> Option<Route> {
        let route = self.resolve(event_window, registry, server.key_window(), server.main_window())?;
        trace!(window_id = %route.window_id, source = ?route.source, "routed event");
        self.sync(route.window_id, registry);
        Some(route)
    }

    /// Points the active pointers at `window_id`. Unknown windows are ignored.
    pub fn sync(&mut self, window_id: WindowId, registry: &WindowContextRegistry) -> bool {
        match registry.find(window_id) {
            Some(context) => {
                self.active = Some(ActiveContext::from_context(context));
                true
            }
            None => false,
        }
    }

    /// Forgets the active context if it belongs to `window_id`.
    pub fn clear_if(&mut self, window_id: WindowId) {
        if self.active_window() == Some(window_id) {
            self.active = None;
        }
    }
}
