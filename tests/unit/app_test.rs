//! Integration tests for the app core: startup, restore, window teardown,
//! shortcuts and cross-window moves.

use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use termdeck::app::App;
use termdeck::managers::session_manager::{SessionSnapshotStore, SnapshotStore};
use termdeck::managers::surface_transfer::{MoveRequest, SourceCleanup};
use termdeck::managers::workspace_manager::{Workspace, WorkspaceManagerTrait};
use termdeck::services::pane_tree::StackPaneTreeFactory;
use termdeck::services::session_lifecycle::{AutosaveOutcome, LifecyclePhase};
use termdeck::services::window_server::{HeadlessWindowServer, WindowServer};
use termdeck::types::errors::RegistryError;
use termdeck::types::event::{KeyChord, KeyEvent, Modifiers, ShortcutAction};
use termdeck::types::geometry::{DisplayDescriptor, Rect};
use termdeck::types::settings::ShellSettings;
use termdeck::types::window::{SidebarSelection, WindowHandle, WindowId};
use termdeck::types::workspace::{Surface, SurfaceId, WorkspaceId};

fn settings_in(dir: &Path) -> ShellSettings {
    let mut settings = ShellSettings::default();
    settings.session.snapshot_path = Some(dir.join("session.json").to_string_lossy().to_string());
    settings.session.geometry_path = Some(dir.join("geometry.json").to_string_lossy().to_string());
    settings
}

fn setup() -> (App, WindowId, TempDir) {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let mut app = App::headless(settings_in(tmp.path()));
    let first = app.startup()[0];
    (app, first, tmp)
}

fn handle_of(app: &App, window_id: WindowId) -> WindowHandle {
    app.registry.find(window_id).expect("registered").handle()
}

fn frame_of(app: &App, window_id: WindowId) -> Rect {
    app.server.frame(handle_of(app, window_id)).expect("window exists")
}

fn selected_workspace(app: &App, window_id: WindowId) -> WorkspaceId {
    app.registry
        .find(window_id)
        .and_then(|c| c.workspace_manager.selected_id())
        .expect("workspace selected")
}

fn surfaces_of(app: &App, window_id: WindowId) -> HashSet<SurfaceId> {
    app.registry
        .find(window_id)
        .map(|c| {
            c.workspace_manager
                .workspaces()
                .iter()
                .flat_map(|ws| ws.ordered_surfaces().into_iter().map(|s| s.id))
                .collect()
        })
        .unwrap_or_default()
}

fn left_display() -> DisplayDescriptor {
    DisplayDescriptor::new(
        Some(1),
        Rect::new(0.0, 0.0, 1440.0, 900.0),
        Rect::new(0.0, 0.0, 1440.0, 875.0),
    )
}

fn right_display() -> DisplayDescriptor {
    DisplayDescriptor::new(
        Some(2),
        Rect::new(1440.0, 0.0, 1920.0, 1080.0),
        Rect::new(1440.0, 0.0, 1920.0, 1055.0),
    )
}

#[test]
fn startup_without_history_opens_default_window() {
    let (app, first, _tmp) = setup();
    assert_eq!(app.registry.len(), 1);
    assert_eq!(frame_of(&app, first), Rect::new(220.0, 87.5, 1000.0, 700.0));
    assert_eq!(app.server.key_window(), Some(handle_of(&app, first)));
    assert_eq!(app.router.active_window(), Some(first));
    assert_eq!(app.lifecycle().phase(), LifecyclePhase::Running);

    let context = app.active_context().unwrap();
    assert_eq!(context.workspace_manager.workspace_count(), 1);
    assert_eq!(surfaces_of(&app, first).len(), 1);
}

#[test]
fn session_is_restored_by_next_launch() {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let (frames, surfaces) = {
        let mut app = App::headless(settings_in(tmp.path()));
        let first = app.startup()[0];
        let second = app.new_window().unwrap();
        let logs = app.create_workspace(second, Some("logs")).unwrap();
        app.create_surface(second, Some(logs), Surface::browser("https://example.com/ci"))
            .unwrap();
        assert!(app.perform(ShortcutAction::ToggleSidebar, second));
        assert!(app.terminate());
        (
            vec![frame_of(&app, first), frame_of(&app, second)],
            vec![surfaces_of(&app, first), surfaces_of(&app, second)],
        )
    };

    let mut app = App::headless(settings_in(tmp.path()));
    let opened = app.startup();
    assert_eq!(opened.len(), 2);
    for (i, window_id) in opened.iter().enumerate() {
        assert_eq!(frame_of(&app, *window_id), frames[i]);
        assert_eq!(surfaces_of(&app, *window_id), surfaces[i]);
    }

    let second = app.registry.find(opened[1]).unwrap();
    let titles: Vec<&str> = second.workspace_manager.workspaces().iter().map(Workspace::title).collect();
    assert_eq!(titles, vec!["Workspace 1", "logs"]);
    assert_eq!(second.workspace_manager.selected_workspace().unwrap().title(), "logs");
    assert!(!second.sidebar.visible);
    assert!(app.registry.find(opened[0]).unwrap().sidebar.visible);
    assert_eq!(app.router.active_window(), Some(opened[0]));
}

#[test]
fn surface_saved_in_two_windows_is_restored_once() {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let shared = {
        let mut app = App::headless(settings_in(tmp.path()));
        let first = app.startup()[0];
        app.new_window().unwrap();
        let shared = *surfaces_of(&app, first).iter().next().unwrap();
        assert!(app.terminate());
        shared
    };

    let store = SessionSnapshotStore::new(Some(
        tmp.path().join("session.json").to_string_lossy().to_string(),
    ));
    let mut snapshot = store.load().expect("session written");
    let copy = snapshot.windows[0].workspace_manager.workspaces[0].panes[0].surfaces[0].clone();
    assert_eq!(copy.id, shared);
    snapshot.windows[1].workspace_manager.workspaces[0].panes[0].surfaces.push(copy);
    assert!(store.save(&snapshot));

    let mut app = App::headless(settings_in(tmp.path()));
    let opened = app.startup();
    assert_eq!(opened.len(), 2);
    assert!(surfaces_of(&app, opened[0]).contains(&shared));
    assert!(!surfaces_of(&app, opened[1]).contains(&shared));
    assert_eq!(surfaces_of(&app, opened[1]).len(), 1);
}

#[test]
fn restore_can_be_disabled() {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    {
        let mut app = App::headless(settings_in(tmp.path()));
        app.startup();
        app.new_window().unwrap();
        assert!(app.terminate());
    }
    let mut settings = settings_in(tmp.path());
    settings.session.restore_on_launch = false;
    let mut app = App::headless(settings);
    assert_eq!(app.startup().len(), 1);
}

#[test]
fn restore_is_capped_at_max_windows() {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let mut settings = settings_in(tmp.path());
    settings.session.max_windows = 2;
    {
        let mut app = App::headless(settings.clone());
        app.startup();
        app.new_window().unwrap();
        app.new_window().unwrap();
        assert_eq!(app.snapshot().windows.len(), 2);
        assert!(app.terminate());
    }
    let mut app = App::headless(settings);
    assert_eq!(app.startup().len(), 2);
}

#[test]
fn last_closed_window_geometry_is_used_without_snapshot() {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    let remembered = Rect::new(100.0, 120.0, 800.0, 600.0);
    {
        let mut app = App::headless(settings_in(tmp.path()));
        let first = app.startup()[0];
        let handle = handle_of(&app, first);
        assert!(app.server.set_frame(handle, remembered));
        assert!(app.close_window(first));
        assert!(app.registry.is_empty());
        assert!(app.terminate());
    }
    let mut app = App::headless(settings_in(tmp.path()));
    let opened = app.startup();
    assert_eq!(opened.len(), 1);
    assert_eq!(frame_of(&app, opened[0]), remembered);
}

#[test]
fn window_on_disconnected_display_is_remapped() {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    {
        let server = HeadlessWindowServer::new(vec![left_display(), right_display()]);
        let mut app = App::new(settings_in(tmp.path()), server, Box::new(StackPaneTreeFactory));
        let first = app.startup()[0];
        let handle = handle_of(&app, first);
        app.server.set_frame(handle, Rect::new(1600.0, 100.0, 900.0, 600.0));
        assert!(app.terminate());
    }
    let server = HeadlessWindowServer::new(vec![left_display()]);
    let mut app = App::new(settings_in(tmp.path()), server, Box::new(StackPaneTreeFactory));
    let first = app.startup()[0];
    let frame = frame_of(&app, first);
    assert!(left_display().work_area().contains_rect(&frame, 0.0));
    assert!(frame.width >= 300.0 && frame.height >= 200.0);
}

#[test]
fn new_window_cascades_from_active_window() {
    let (mut app, first, _tmp) = setup();
    let base = frame_of(&app, first);
    let second = app.new_window().unwrap();
    let frame = frame_of(&app, second);
    assert_eq!(frame, Rect::new(base.x + 24.0, base.y + 24.0, base.width, base.height));
    assert_eq!(app.router.active_window(), Some(second));
    assert_eq!(app.server.key_window(), Some(handle_of(&app, second)));
}

#[test]
fn closing_window_drops_its_notifications_and_state() {
    let (mut app, first, _tmp) = setup();
    let second = app.new_window().unwrap();
    app.notifications.add(selected_workspace(&app, first), None, "build", "ok");
    app.notifications.add(selected_workspace(&app, second), None, "test", "failed");

    let handle = handle_of(&app, second);
    assert!(app.close_window(second));

    assert_eq!(app.notifications.len(), 1);
    assert_eq!(app.notifications.list(None)[0].title, "build");
    assert!(app.registry.find(second).is_none());
    assert!(app.server.frame(handle).is_none());
    assert_eq!(app.router.active_window(), Some(first));
    assert!(!app.close_window(second));
}

#[test]
fn server_close_notification_tears_window_down() {
    let (mut app, first, _tmp) = setup();
    let handle = handle_of(&app, first);
    assert!(!app.window_did_close(WindowHandle(404)));
    assert!(app.window_did_close(handle));
    assert!(app.registry.is_empty());
    assert!(app.router.active().is_none());
}

#[test]
fn key_status_change_updates_active_context() {
    let (mut app, first, _tmp) = setup();
    app.new_window().unwrap();
    assert!(app.window_did_become_key(handle_of(&app, first)));
    assert_eq!(app.router.active_window(), Some(first));
    assert!(!app.window_did_become_key(WindowHandle(404)));
    assert_eq!(app.router.active_window(), Some(first));
}

#[test]
fn reindex_to_taken_handle_is_refused() {
    let (mut app, first, _tmp) = setup();
    let second = app.new_window().unwrap();
    let taken = handle_of(&app, second);
    assert_eq!(
        app.window_did_change_handle(first, taken),
        Err(RegistryError::HandleInUse(taken.0))
    );
}

#[test]
fn sidebar_shortcuts_toggle_state() {
    let (mut app, first, _tmp) = setup();
    let command = |key: &str| KeyChord::new(Modifiers::command(), key);

    app.handle_key_event(&KeyEvent::new(None, command("b")));
    assert!(!app.registry.find(first).unwrap().sidebar.visible);

    app.handle_key_event(&KeyEvent::new(None, command("i")));
    let sidebar = &app.registry.find(first).unwrap().sidebar;
    assert!(sidebar.visible);
    assert_eq!(sidebar.selection, SidebarSelection::Notifications);

    app.handle_key_event(&KeyEvent::new(None, command("i")));
    let sidebar = &app.registry.find(first).unwrap().sidebar;
    assert_eq!(sidebar.selection, SidebarSelection::Tabs);
    assert_eq!(app.router.active().unwrap().sidebar_selection, SidebarSelection::Tabs);
}

#[test]
fn split_right_adds_pane_with_new_terminal() {
    let (mut app, first, _tmp) = setup();
    assert!(app.perform(ShortcutAction::SplitRight, first));
    let context = app.registry.find(first).unwrap();
    let workspace = context.workspace_manager.selected_workspace().unwrap();
    assert_eq!(workspace.pane_tree().all_panes().len(), 2);
    assert_eq!(workspace.surface_count(), 2);
    let focused = workspace.focused_surface().unwrap();
    let pane = workspace.pane_tree().focused_pane().unwrap();
    assert_eq!(workspace.pane_tree().items(pane), vec![focused]);
}

#[test]
fn closing_last_surface_closes_workspace_then_window() {
    let (mut app, first, _tmp) = setup();
    let second = app.new_window().unwrap();
    app.create_workspace(second, Some("extra")).unwrap();

    assert!(app.perform(ShortcutAction::CloseSurface, second));
    let manager = &app.registry.find(second).unwrap().workspace_manager;
    assert_eq!(manager.workspace_count(), 1);

    assert!(app.perform(ShortcutAction::CloseSurface, second));
    assert!(app.registry.find(second).is_none());
    assert_eq!(app.registry.len(), 1);
    assert_eq!(app.router.active_window(), Some(first));
}

#[test]
fn close_workspace_keeps_window_while_others_remain() {
    let (mut app, first, _tmp) = setup();
    let extra = app.create_workspace(first, None).unwrap();
    app.notifications.add(extra, None, "extra", "");
    assert!(app.perform(ShortcutAction::CloseWorkspace, first));
    assert_eq!(app.registry.find(first).unwrap().workspace_manager.workspace_count(), 1);
    assert!(app.notifications.is_empty());
}

#[test]
fn new_surface_lands_in_selected_workspace() {
    let (mut app, first, _tmp) = setup();
    let ws = selected_workspace(&app, first);
    let surface = app
        .create_surface(first, None, Surface::browser("https://example.com"))
        .unwrap();
    assert_eq!(app.registry.locate_surface(surface), Some((first, ws)));
    assert!(app.create_workspace(WindowId::new(), None).is_err());
}

#[test]
fn cross_window_move_refocuses_destination() {
    let (mut app, first, _tmp) = setup();
    let moving = app.create_surface(first, None, Surface::terminal(Some("/srv"))).unwrap();
    let second = app.new_window().unwrap();
    app.activate(first);
    let destination = selected_workspace(&app, second);

    let outcome = app.move_surface(&MoveRequest::new(moving, destination)).unwrap();
    assert_eq!(outcome.cleanup, SourceCleanup::None);
    assert_eq!(app.router.active_window(), Some(second));
    assert!(app.next_focus_deadline().is_some());

    // Another window steals key status before the retries run.
    app.server.make_key(handle_of(&app, first));
    let later = Instant::now() + Duration::from_secs(1);
    assert!(app.tick(later));
    assert_eq!(app.server.key_window(), Some(handle_of(&app, second)));
    assert_eq!(app.router.active_window(), Some(second));
    assert!(app.next_focus_deadline().is_none());
    assert!(!app.tick(later));
}

#[test]
fn focus_deadline_is_armed_only_while_retries_remain() {
    let (mut app, first, _tmp) = setup();
    assert!(app.next_focus_deadline().is_none());

    let moving = app.create_surface(first, None, Surface::terminal(None)).unwrap();
    let second = app.new_window().unwrap();
    app.move_surface(&MoveRequest::new(moving, selected_workspace(&app, second)))
        .unwrap();

    let mut last = None;
    let mut steps = 0;
    while let Some(deadline) = app.next_focus_deadline() {
        if let Some(previous) = last {
            assert!(deadline > previous, "deadlines must advance");
        }
        app.tick(deadline);
        last = Some(deadline);
        steps += 1;
        assert!(steps <= 16, "retries never drained");
    }
    assert!(steps >= 1);
    assert!(!app.tick(Instant::now() + Duration::from_secs(5)));
}

#[test]
fn moving_last_surface_closes_source_window() {
    let (mut app, first, _tmp) = setup();
    let moving = *surfaces_of(&app, first).iter().next().unwrap();
    let second = app.new_window().unwrap();
    app.notifications.add(selected_workspace(&app, first), Some(moving), "bell", "");

    let outcome = app
        .move_surface(&MoveRequest::new(moving, selected_workspace(&app, second)))
        .unwrap();
    assert_eq!(outcome.cleanup, SourceCleanup::CloseWindow(first));
    assert!(app.registry.find(first).is_none());
    assert_eq!(app.registry.len(), 1);
    assert!(app.notifications.is_empty());
    assert!(surfaces_of(&app, second).contains(&moving));
}

#[test]
fn moving_only_workspace_closes_source_window() {
    let (mut app, first, _tmp) = setup();
    let workspace = selected_workspace(&app, first);
    let second = app.new_window().unwrap();

    let outcome = app.move_workspace_to_window(workspace, second, true).unwrap();
    assert_eq!(outcome.cleanup, SourceCleanup::CloseWindow(first));
    assert!(app.registry.find(first).is_none());
    assert_eq!(selected_workspace(&app, second), workspace);
    assert_eq!(app.router.active_window(), Some(second));
}

#[test]
fn autosave_skips_unchanged_session() {
    let (mut app, first, _tmp) = setup();
    assert_eq!(app.autosave(), AutosaveOutcome::Scheduled);
    assert_eq!(app.autosave(), AutosaveOutcome::Unchanged);
    app.create_workspace(first, None).unwrap();
    assert_eq!(app.autosave(), AutosaveOutcome::Scheduled);
    assert!(app.resign_active());
    assert!(app.save_session());
}

#[test]
fn terminate_then_power_off_saves_once() {
    let (mut app, _first, _tmp) = setup();
    assert!(app.terminate());
    assert!(!app.power_off());
    assert_eq!(app.autosave(), AutosaveOutcome::Terminating);
    assert!(!app.resign_active());
}

#[test]
fn pane_exists_checks_workspace_membership() {
    let (app, first, _tmp) = setup();
    let ws = selected_workspace(&app, first);
    let pane = app.registry.workspace(ws).unwrap().pane_tree().all_panes()[0];
    assert!(app.pane_exists(ws, pane));
    assert!(!app.pane_exists(WorkspaceId::new(), pane));
}
