//! RPC method handler for the termdeck control protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested without stdin.
//! `handle_method` dispatches one request against the shared `App`.

use std::sync::Mutex;

use serde_json::{json, Value};

use crate::app::App;
use crate::managers::surface_transfer::{MoveRequest, SourceCleanup, SplitRequest};
use crate::managers::window_registry::WindowContext;
use crate::managers::workspace_manager::{Workspace, WorkspaceManagerTrait};
use crate::services::event_interception::DispatchOutcome;
use crate::services::window_server::WindowServer;
use crate::types::event::{KeyChord, KeyEvent};
use crate::types::settings::ControlMode;
use crate::types::window::WindowId;
use crate::types::workspace::{PaneId, SplitOrientation, Surface, SurfaceId, WorkspaceId};

/// Environment variable a surface exports to the processes it runs.
pub const SURFACE_ENV: &str = "TERMDECK_SURFACE_ID";

/// Decides whether a client may talk to the control server.
///
/// `surface_marker` is the client's `TERMDECK_SURFACE_ID`, if any.
pub fn authorize_client(mode: ControlMode, surface_marker: Option<&str>) -> Result<(), String> {
    match mode {
        ControlMode::Disabled => Err("control protocol is disabled (control.mode = \"disabled\")".to_string()),
        ControlMode::AllowAll => Ok(()),
        ControlMode::ProcessOnly => match surface_marker.map(str::trim) {
            Some(raw) if SurfaceId::parse(raw).is_some() => Ok(()),
            Some(raw) => Err(format!("invalid {}: {:?}", SURFACE_ENV, raw)),
            None => Err(format!(
                "control.mode is \"process_only\" and {} is not set; run the client from a termdeck surface",
                SURFACE_ENV
            )),
        },
    }
}

fn param_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

fn window_param(params: &Value, key: &str) -> Result<Option<WindowId>, String> {
    match param_str(params, key) {
        Some(raw) => WindowId::parse(raw).map(Some).ok_or_else(|| format!("invalid {}", key)),
        None => Ok(None),
    }
}

fn workspace_param(params: &Value, key: &str) -> Result<Option<WorkspaceId>, String> {
    match param_str(params, key) {
        Some(raw) => WorkspaceId::parse(raw).map(Some).ok_or_else(|| format!("invalid {}", key)),
        None => Ok(None),
    }
}

fn surface_param(params: &Value, key: &str) -> Result<Option<SurfaceId>, String> {
    match param_str(params, key) {
        Some(raw) => SurfaceId::parse(raw).map(Some).ok_or_else(|| format!("invalid {}", key)),
        None => Ok(None),
    }
}

/// Named window, else the active one.
fn target_window<S: WindowServer>(app: &App<S>, params: &Value) -> Result<WindowId, String> {
    match window_param(params, "window_id")? {
        Some(id) if app.registry.find(id).is_some() => Ok(id),
        Some(id) => Err(format!("window not found: {}", id)),
        None => app
            .router
            .active_window()
            .or_else(|| app.registry.first().map(WindowContext::window_id))
            .ok_or_else(|| "no window".to_string()),
    }
}

/// Named workspace, else the selected workspace of the target window.
fn target_workspace<S: WindowServer>(app: &App<S>, params: &Value) -> Result<WorkspaceId, String> {
    if let Some(id) = workspace_param(params, "workspace_id")? {
        return match app.registry.workspace(id) {
            Some(_) => Ok(id),
            None => Err(format!("workspace not found: {}", id)),
        };
    }
    let window_id = target_window(app, params)?;
    app.registry
        .find(window_id)
        .and_then(|c| c.workspace_manager.selected_id())
        .ok_or_else(|| "no workspace".to_string())
}

fn window_json<S: WindowServer>(app: &App<S>, context: &WindowContext) -> Value {
    let frame = app.server.frame(context.handle());
    json!({
        "id": context.window_id().to_string(),
        "handle": context.handle().0,
        "workspaces": context.workspace_manager.workspace_count(),
        "selected_workspace": context.workspace_manager.selected_id().map(|id| id.to_string()),
        "sidebar": context.sidebar,
        "frame": frame,
        "key": app.server.key_window() == Some(context.handle()),
        "active": app.router.active_window() == Some(context.window_id()),
    })
}

fn workspace_json(workspace: &Workspace, selected: Option<WorkspaceId>) -> Value {
    json!({
        "id": workspace.id().to_string(),
        "title": workspace.title(),
        "surfaces": workspace.surface_count(),
        "panes": workspace.pane_tree().all_panes().len(),
        "selected": selected == Some(workspace.id()),
    })
}

fn split_param(params: &Value) -> Result<Option<SplitRequest>, String> {
    let split = match param_str(params, "split") {
        None => return Ok(None),
        Some("right") => (SplitOrientation::Horizontal, false),
        Some("left") => (SplitOrientation::Horizontal, true),
        Some("down") => (SplitOrientation::Vertical, false),
        Some("up") => (SplitOrientation::Vertical, true),
        Some(other) => return Err(format!("invalid split: {}", other)),
    };
    Ok(Some(SplitRequest {
        orientation: split.0,
        insert_first: split.1,
    }))
}

/// Dispatch a control request to the app.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub fn handle_method<S: WindowServer>(app: &Mutex<App<S>>, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Windows ───
        "window.list" => {
            let guard = app.lock().map_err(|e| e.to_string())?;
            let a = &*guard;
            let arr: Vec<Value> = a.registry.all().iter().map(|c| window_json(a, c)).collect();
            Ok(json!(arr))
        }
        "window.current" => {
            let guard = app.lock().map_err(|e| e.to_string())?;
            let a = &*guard;
            let context = a.active_context().ok_or("no active window")?;
            Ok(window_json(a, context))
        }
        "window.create" => {
            let mut guard = app.lock().map_err(|e| e.to_string())?;
            let a = &mut *guard;
            let id = a.new_window().map_err(|e| e.to_string())?;
            Ok(json!({"id": id.to_string()}))
        }
        "window.focus" => {
            let window_id = window_param(params, "window_id")?.ok_or("missing window_id")?;
            let mut guard = app.lock().map_err(|e| e.to_string())?;
            let a = &mut *guard;
            if !a.activate(window_id) {
                return Err(format!("window not found: {}", window_id));
            }
            Ok(json!({"ok": true}))
        }
        "window.close" => {
            let window_id = window_param(params, "window_id")?.ok_or("missing window_id")?;
            let mut guard = app.lock().map_err(|e| e.to_string())?;
            let a = &mut *guard;
            if !a.close_window(window_id) {
                return Err(format!("window not found: {}", window_id));
            }
            Ok(json!({"ok": true}))
        }

        // ─── Workspaces ───
        "workspace.list" => {
            let guard = app.lock().map_err(|e| e.to_string())?;
            let a = &*guard;
            let window_id = target_window(a, params)?;
            let context = a.registry.find(window_id).ok_or("no window")?;
            let manager = &context.workspace_manager;
            let arr: Vec<Value> = manager
                .workspaces()
                .iter()
                .map(|ws| workspace_json(ws, manager.selected_id()))
                .collect();
            Ok(json!(arr))
        }
        "workspace.create" => {
            let title = param_str(params, "title");
            let mut guard = app.lock().map_err(|e| e.to_string())?;
            let a = &mut *guard;
            let window_id = target_window(a, params)?;
            let id = a.create_workspace(window_id, title).map_err(|e| e.to_string())?;
            a.router.sync(window_id, &a.registry);
            Ok(json!({"id": id.to_string(), "window_id": window_id.to_string()}))
        }
        "workspace.select" => {
            let workspace_id = workspace_param(params, "workspace_id")?.ok_or("missing workspace_id")?;
            let mut guard = app.lock().map_err(|e| e.to_string())?;
            let a = &mut *guard;
            let window_id = a
                .registry
                .locate_workspace(workspace_id)
                .ok_or_else(|| format!("workspace not found: {}", workspace_id))?;
            let context = a.registry.find_mut(window_id).ok_or("no window")?;
            context
                .workspace_manager
                .select_workspace(workspace_id)
                .map_err(|e| e.to_string())?;
            a.activate(window_id);
            Ok(json!({"ok": true, "window_id": window_id.to_string()}))
        }
        "workspace.move_to_window" => {
            let workspace_id = workspace_param(params, "workspace_id")?.ok_or("missing workspace_id")?;
            let window_id = window_param(params, "window_id")?.ok_or("missing window_id")?;
            let focus = params.get("focus").and_then(|v| v.as_bool()).unwrap_or(true);
            let mut guard = app.lock().map_err(|e| e.to_string())?;
            let a = &mut *guard;
            let outcome = a
                .move_workspace_to_window(workspace_id, window_id, focus)
                .map_err(|e| e.to_string())?;
            Ok(json!({
                "ok": true,
                "source_window": outcome.source_window.to_string(),
                "source_closed": outcome.cleanup != SourceCleanup::None,
            }))
        }

        // ─── Surfaces ───
        "surface.list" => {
            let guard = app.lock().map_err(|e| e.to_string())?;
            let a = &*guard;
            let workspace_id = target_workspace(a, params)?;
            let workspace = a.registry.workspace(workspace_id).ok_or("no workspace")?;
            let focused = workspace.focused_surface();
            let arr: Vec<Value> = workspace
                .ordered_surfaces()
                .into_iter()
                .map(|s| {
                    let pane = workspace.pane_tree().locate(s.id).map(|(p, _)| p.0);
                    json!({
                        "id": s.id.to_string(),
                        "title": s.title,
                        "kind": s.kind,
                        "pane": pane,
                        "focused": focused == Some(s.id),
                        "env": { SURFACE_ENV: s.id.to_string() },
                    })
                })
                .collect();
            Ok(json!(arr))
        }
        "surface.create" => {
            let surface = match param_str(params, "kind").unwrap_or("terminal") {
                "terminal" => Surface::terminal(param_str(params, "cwd")),
                "browser" => {
                    let url = param_str(params, "url").ok_or("missing url")?;
                    if !url.starts_with("http://") && !url.starts_with("https://") {
                        return Err("invalid url: must start with http:// or https://".to_string());
                    }
                    Surface::browser(url)
                }
                other => return Err(format!("invalid kind: {}", other)),
            };
            let mut guard = app.lock().map_err(|e| e.to_string())?;
            let a = &mut *guard;
            let workspace_id = target_workspace(a, params)?;
            let window_id = a.registry.locate_workspace(workspace_id).ok_or("no window")?;
            let id = a
                .create_surface(window_id, Some(workspace_id), surface)
                .map_err(|e| e.to_string())?;
            Ok(json!({"id": id.to_string(), "workspace_id": workspace_id.to_string()}))
        }
        "surface.move" => {
            let surface = surface_param(params, "surface_id")?.ok_or("missing surface_id")?;
            let to_workspace = workspace_param(params, "workspace_id")?.ok_or("missing workspace_id")?;
            let mut request = MoveRequest::new(surface, to_workspace);
            request.from_workspace = workspace_param(params, "from_workspace_id")?;
            request.target_pane = params.get("pane").and_then(|v| v.as_u64()).map(PaneId);
            request.target_index = params.get("index").and_then(|v| v.as_u64()).map(|i| i as usize);
            request.split = split_param(params)?;
            request.focus = params.get("focus").and_then(|v| v.as_bool()).unwrap_or(true);

            let mut guard = app.lock().map_err(|e| e.to_string())?;
            let a = &mut *guard;
            let outcome = a.move_surface(&request).map_err(|e| e.to_string())?;
            Ok(json!({
                "ok": true,
                "window_id": outcome.destination_window.to_string(),
                "workspace_id": outcome.destination_workspace.to_string(),
                "pane": outcome.pane.0,
            }))
        }

        // ─── Shortcuts & sidebar ───
        "shortcut.simulate" => {
            let keys = param_str(params, "keys").ok_or("missing keys")?;
            let chord = keys.parse::<KeyChord>()?.adapted_for_platform();
            let mut guard = app.lock().map_err(|e| e.to_string())?;
            let a = &mut *guard;
            let event = match params.get("window_handle").and_then(|v| v.as_u64()) {
                Some(number) => KeyEvent::from_window_number(number, chord),
                None => KeyEvent::new(a.server.key_window(), chord),
            };
            let outcome = a.handle_key_event(&event);
            Ok(match outcome {
                DispatchOutcome::SurfaceDirect { window_id, surface_id } => json!({
                    "outcome": "surface",
                    "window_id": window_id.to_string(),
                    "surface_id": surface_id.to_string(),
                }),
                DispatchOutcome::Shortcut { action, window_id } => json!({
                    "outcome": "shortcut",
                    "action": action.name(),
                    "window_id": window_id.to_string(),
                }),
                DispatchOutcome::Menu => json!({"outcome": "menu"}),
                DispatchOutcome::Default => json!({"outcome": "default"}),
            })
        }
        "sidebar.visible" => {
            let visible = params.get("visible").and_then(|v| v.as_bool());
            let mut guard = app.lock().map_err(|e| e.to_string())?;
            let a = &mut *guard;
            let window_id = target_window(a, params)?;
            let context = a.registry.find_mut(window_id).ok_or("no window")?;
            if let Some(visible) = visible {
                context.sidebar.visible = visible;
            }
            let current = context.sidebar.visible;
            a.router.sync(window_id, &a.registry);
            Ok(json!({"window_id": window_id.to_string(), "visible": current}))
        }

        // ─── Notifications ───
        "notification.create" => {
            let title = param_str(params, "title").ok_or("missing title")?;
            let body = param_str(params, "body").unwrap_or("");
            let surface_id = surface_param(params, "surface_id")?;
            let mut guard = app.lock().map_err(|e| e.to_string())?;
            let a = &mut *guard;
            let workspace_id = match surface_id.and_then(|s| a.registry.locate_surface(s)) {
                Some((_, workspace_id)) => workspace_id,
                None => target_workspace(a, params)?,
            };
            let id = a.notifications.add(workspace_id, surface_id, title, body);
            Ok(json!({"id": id, "workspace_id": workspace_id.to_string()}))
        }
        "notification.list" => {
            let workspace_id = workspace_param(params, "workspace_id")?;
            let guard = app.lock().map_err(|e| e.to_string())?;
            let a = &*guard;
            let arr: Vec<Value> = a
                .notifications
                .list(workspace_id)
                .into_iter()
                .map(|n| json!(n))
                .collect();
            Ok(json!(arr))
        }
        "notification.clear" => {
            let mut guard = app.lock().map_err(|e| e.to_string())?;
            let a = &mut *guard;
            let cleared = a.notifications.clear();
            Ok(json!({"cleared": cleared}))
        }

        // ─── Session ───
        "session.save" => {
            let mut guard = app.lock().map_err(|e| e.to_string())?;
            let a = &mut *guard;
            let windows = a.registry.len();
            if !a.save_session() {
                return Err("session save failed".to_string());
            }
            Ok(json!({"ok": true, "windows": windows}))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}

