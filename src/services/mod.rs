// termdeck services
// Services wrap the platform seams and cross-cutting behavior: geometry, panes, focus, persistence, logging, settings.

pub mod display_geometry;
pub mod event_interception;
pub mod focus_reassertion;
pub mod logging;
pub mod pane_tree;
pub mod session_lifecycle;
pub mod settings_engine;
pub mod window_server;
