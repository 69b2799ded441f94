// termdeck state managers
// Managers own mutable shell state: workspaces, windows, routing, transfers, sessions, shortcuts, notifications.

pub mod notification_manager;
pub mod session_manager;
pub mod shortcut_manager;
pub mod shortcut_router;
pub mod surface_transfer;
pub mod window_registry;
pub mod workspace_manager;
