//! Unit tests for shortcut routing and keyboard event interception.

use std::path::Path;

use tempfile::TempDir;

use termdeck::app::App;
use termdeck::managers::shortcut_router::{RouteSource, ShortcutRouter};
use termdeck::managers::window_registry::WindowContextRegistry;
use termdeck::managers::workspace_manager::{WorkspaceManager, WorkspaceManagerTrait};
use termdeck::services::event_interception::{DispatchOutcome, MenuDispatch};
use termdeck::services::window_server::{HeadlessWindowServer, WindowServer};
use termdeck::types::event::{KeyChord, KeyEvent, Modifiers, ShortcutAction};
use termdeck::types::geometry::Rect;
use termdeck::types::settings::ShellSettings;
use termdeck::types::window::{SidebarState, WindowHandle, WindowId};

fn settings_in(dir: &Path) -> ShellSettings {
    let mut settings = ShellSettings::default();
    settings.session.snapshot_path = Some(dir.join("session.json").to_string_lossy().to_string());
    settings.session.geometry_path = Some(dir.join("geometry.json").to_string_lossy().to_string());
    settings
}

fn setup_app(windows: usize) -> (App, Vec<WindowId>, TempDir) {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let mut app = App::headless(settings_in(tmp.path()));
    let mut ids = app.startup();
    for _ in 1..windows {
        ids.push(app.new_window().expect("window opens"));
    }
    (app, ids, tmp)
}

fn command(key: &str) -> KeyChord {
    KeyChord::new(Modifiers::command(), key)
}

fn handle_of(app: &App, window_id: WindowId) -> WindowHandle {
    app.registry.find(window_id).expect("registered").handle()
}

fn server_with_windows(count: usize) -> (HeadlessWindowServer, WindowContextRegistry, Vec<WindowId>) {
    let mut server = HeadlessWindowServer::single_display();
    let mut registry = WindowContextRegistry::new();
    let ids = (0..count)
        .map(|i| {
            let handle = server.create_window(Rect::new(40.0 * i as f64, 0.0, 800.0, 600.0));
            let id = WindowId::new();
            registry
                .register(id, WorkspaceManager::new(), SidebarState::default(), handle)
                .unwrap();
            id
        })
        .collect();
    (server, registry, ids)
}

#[test]
fn route_prefers_event_window_over_key_window() {
    let (mut server, registry, ids) = server_with_windows(2);
    server.make_key(WindowHandle(2));
    let mut router = ShortcutRouter::new();
    let route = router.route(Some(WindowHandle(1)), &registry, &server).unwrap();
    assert_eq!(route.window_id, ids[0]);
    assert_eq!(route.source, RouteSource::EventWindow);
    assert_eq!(router.active_window(), Some(ids[0]));
}

#[test]
fn route_uses_main_window_when_nothing_is_key() {
    let (mut server, registry, ids) = server_with_windows(3);
    server.set_main_window(Some(WindowHandle(3)));
    let mut router = ShortcutRouter::new();
    let route = router.route(None, &registry, &server).unwrap();
    assert_eq!(route.window_id, ids[2]);
    assert_eq!(route.source, RouteSource::MainWindow);
}

#[test]
fn unroutable_event_leaves_active_context_alone() {
    let (mut server, registry, ids) = server_with_windows(2);
    server.make_key(WindowHandle(1));
    let mut router = ShortcutRouter::new();
    router.sync(ids[1], &registry);
    assert!(router.route(Some(WindowHandle(42)), &registry, &server).is_none());
    assert_eq!(router.active_window(), Some(ids[1]));
}

#[test]
fn empty_registry_routes_nowhere() {
    let server = HeadlessWindowServer::single_display();
    let registry = WindowContextRegistry::new();
    let mut router = ShortcutRouter::new();
    assert!(router.route(None, &registry, &server).is_none());
    assert!(router.active().is_none());
}

#[test]
fn sync_captures_sidebar_state() {
    let (_server, mut registry, ids) = server_with_windows(1);
    registry.find_mut(ids[0]).unwrap().sidebar.visible = false;
    let mut router = ShortcutRouter::new();
    assert!(router.sync(ids[0], &registry));
    let active = router.active().unwrap();
    assert!(!active.sidebar_visible);
    assert_eq!(active.manager_id, registry.find(ids[0]).unwrap().manager_id());
    assert!(!router.sync(WindowId::new(), &registry));
}

#[test]
fn unbound_window_number_routes_to_last_active_window() {
    let (mut app, ids, _tmp) = setup_app(2);
    app.activate(ids[1]);
    app.server.set_key_window(None);
    app.server.set_main_window(None);

    let event = KeyEvent::from_window_number(0, command("b"));
    let outcome = app.handle_key_event(&event);
    assert_eq!(
        outcome,
        DispatchOutcome::Shortcut {
            action: ShortcutAction::ToggleSidebar,
            window_id: ids[1],
        }
    );
    assert!(!app.registry.find(ids[1]).unwrap().sidebar.visible);
    assert!(app.registry.find(ids[0]).unwrap().sidebar.visible);
    assert!(!app.router.active().unwrap().sidebar_visible);
}

#[test]
fn shortcut_acts_on_event_window_not_key_window() {
    let (mut app, ids, _tmp) = setup_app(2);
    app.activate(ids[1]);
    let event = KeyEvent::new(Some(handle_of(&app, ids[0])), command("n"));
    let outcome = app.handle_key_event(&event);
    assert!(matches!(outcome, DispatchOutcome::Shortcut { window_id, .. } if window_id == ids[0]));
    assert_eq!(app.registry.find(ids[0]).unwrap().workspace_manager.workspace_count(), 2);
    assert_eq!(app.registry.find(ids[1]).unwrap().workspace_manager.workspace_count(), 1);
    assert_eq!(app.router.active_window(), Some(ids[0]));
}

#[test]
fn shortcut_from_unregistered_window_is_not_handled() {
    let (mut app, ids, _tmp) = setup_app(1);
    let event = KeyEvent::new(Some(WindowHandle(999)), command("b"));
    assert_eq!(app.handle_key_event(&event), DispatchOutcome::Default);
    assert!(app.registry.find(ids[0]).unwrap().sidebar.visible);
}

#[test]
fn renumbered_window_keeps_receiving_shortcuts() {
    let (mut app, ids, _tmp) = setup_app(2);
    let old = handle_of(&app, ids[0]);
    let fresh = app.server.renumber(old).unwrap();
    app.window_did_change_handle(ids[0], fresh).unwrap();

    let stale = KeyEvent::new(Some(old), command("b"));
    assert_eq!(app.handle_key_event(&stale), DispatchOutcome::Default);

    let event = KeyEvent::new(Some(fresh), command("b"));
    assert!(matches!(app.handle_key_event(&event), DispatchOutcome::Shortcut { window_id, .. } if window_id == ids[0]));
    assert!(!app.registry.find(ids[0]).unwrap().sidebar.visible);
}

#[test]
fn closing_active_window_moves_routing_to_remaining_one() {
    let (mut app, ids, _tmp) = setup_app(2);
    app.activate(ids[1]);
    assert!(app.close_window(ids[1]));
    assert_eq!(app.router.active_window(), Some(ids[0]));

    let outcome = app.handle_key_event(&KeyEvent::from_window_number(0, command("b")));
    assert!(matches!(outcome, DispatchOutcome::Shortcut { window_id, .. } if window_id == ids[0]));
}

#[test]
fn plain_keys_go_straight_to_focused_terminal() {
    let (mut app, ids, _tmp) = setup_app(1);
    let surface = app
        .registry
        .find(ids[0])
        .and_then(|c| c.workspace_manager.selected_workspace())
        .and_then(|ws| ws.focused_surface())
        .unwrap();
    let event = KeyEvent::new(Some(handle_of(&app, ids[0])), KeyChord::new(Modifiers::ALT, "f"));
    assert_eq!(
        app.handle_key_event(&event),
        DispatchOutcome::SurfaceDirect { window_id: ids[0], surface_id: surface }
    );
}

struct ClaimingMenu {
    claims: KeyChord,
}

impl MenuDispatch for ClaimingMenu {
    fn perform_key_equivalent(&mut self, chord: &KeyChord) -> bool {
        *chord == self.claims
    }
}

#[test]
fn unbound_command_chords_fall_through_to_menu_then_default() {
    let (mut app, _ids, _tmp) = setup_app(1);
    app.interception
        .set_menu(Some(Box::new(ClaimingMenu { claims: command("k") })));
    assert_eq!(app.handle_key_event(&KeyEvent::new(None, command("k"))), DispatchOutcome::Menu);
    assert_eq!(app.handle_key_event(&KeyEvent::new(None, command("j"))), DispatchOutcome::Default);
}

#[test]
fn select_workspace_nine_picks_last() {
    let (mut app, ids, _tmp) = setup_app(1);
    let second = app.create_workspace(ids[0], Some("two")).unwrap();
    let third = app.create_workspace(ids[0], Some("three")).unwrap();
    assert!(app.perform(ShortcutAction::SelectWorkspace(1), ids[0]));
    assert_ne!(app.registry.find(ids[0]).unwrap().workspace_manager.selected_id(), Some(third));
    assert!(app.perform(ShortcutAction::SelectWorkspace(9), ids[0]));
    assert_eq!(app.registry.find(ids[0]).unwrap().workspace_manager.selected_id(), Some(third));
    assert!(app.perform(ShortcutAction::PreviousWorkspace, ids[0]));
    assert_eq!(app.registry.find(ids[0]).unwrap().workspace_manager.selected_id(), Some(second));
    assert!(!app.perform(ShortcutAction::SelectWorkspace(5), ids[0]));
}
