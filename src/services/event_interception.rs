//! Keyboard event interception.
//!
//! Stages, first match wins:
//! 1. surface-direct: a focused terminal gets chords without the command
//!    modifier untouched;
//! 2. the app shortcut table, after routing and active-pointer sync;
//! 3. native menu key equivalents ([`MenuDispatch`]);
//! 4. default delivery.

use tracing::trace;

use crate::managers::shortcut_manager::{ShortcutManager, ShortcutManagerTrait};
use crate::managers::shortcut_router::ShortcutRouter;
use crate::managers::window_registry::WindowContextRegistry;
use crate::managers::workspace_manager::WorkspaceManagerTrait;
use crate::services::window_server::WindowServer;
use crate::types::event::{KeyChord, KeyEvent, ShortcutAction};
use crate::types::window::WindowId;
use crate::types::workspace::SurfaceId;

/// A native menu able to claim key equivalents.
pub trait MenuDispatch {
    fn perform_key_equivalent(&mut self, chord: &KeyChord) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// Delivered straight to the focused terminal surface.
    SurfaceDirect { window_id: WindowId, surface_id: SurfaceId },
    /// Resolved to an app shortcut; the active pointers already point at
    /// `window_id`.
    Shortcut { action: ShortcutAction, window_id: WindowId },
    /// Claimed by the native menu.
    Menu,
    /// Nobody claimed it; normal delivery applies.
    Default,
}

#[derive(Default)]
pub struct EventInterceptionLayer {
    menu: Option<Box<dyn MenuDispatch>>,
}

impl EventInterceptionLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_menu(menu: Box<dyn MenuDispatch>) -> Self {
        Self { menu: Some(menu) }
    }

    pub fn set_menu(&mut self, menu: Option<Box<dyn MenuDispatch>>) {
        self.menu = menu;
    }

    pub fn dispatch(
        &mut self,
        event: &KeyEvent,
        registry: &WindowContextRegistry,
        router: &mut ShortcutRouter,
        shortcuts: &ShortcutManager,
        server: &dyn WindowServer,
    ) -> DispatchOutcome {
        if event.chord.is_terminal_input() {
            let route = router.resolve(event.window, registry, server.key_window(), server.main_window());
            let focused = route.and_then(|route| {
                let context = registry.find(route.window_id)?;
                let workspace = context.workspace_manager.selected_workspace()?;
                let surface_id = workspace.focused_surface()?;
                let surface = workspace.surface(surface_id)?;
                surface.is_terminal().then_some((route.window_id, surface_id))
            });
            if let Some((window_id, surface_id)) = focused {
                trace!(surface_id = %surface_id, chord = %event.chord, "surface-direct dispatch");
                return DispatchOutcome::SurfaceDirect { window_id, surface_id };
            }
        }

        if let Some(action) = shortcuts.lookup(&event.chord) {
            if let Some(route) = router.route(event.window, registry, server) {
                trace!(action = %action.name(), window_id = %route.window_id, "shortcut dispatch");
                return DispatchOutcome::Shortcut {
                    action,
                    window_id: route.window_id,
                };
            }
        }

        if let Some(menu) = self.menu.as_mut() {
            if menu.perform_key_equivalent(&event.chord) {
                return DispatchOutcome::Menu;
            }
        }
        DispatchOutcome::Default
    }
}
