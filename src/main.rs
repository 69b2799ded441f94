//! termdeck headless console demo.
//!
//! Drives every shell component against the in-memory window server and
//! prints what happened. State lives in a temporary directory.

use std::path::Path;

use termdeck::app::App;
use termdeck::managers::shortcut_manager::ShortcutManagerTrait;
use termdeck::managers::surface_transfer::{MoveRequest, SplitRequest};
use termdeck::managers::workspace_manager::WorkspaceManagerTrait;
use termdeck::services::display_geometry::{self, GeometryPolicy};
use termdeck::services::logging::init_logging;
use termdeck::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use termdeck::services::window_server::WindowServer;
use termdeck::types::event::KeyEvent;
use termdeck::types::geometry::{DisplayDescriptor, Rect};
use termdeck::types::settings::ShellSettings;
use termdeck::types::workspace::{SplitOrientation, Surface};

fn main() {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                termdeck v{} — Demo Mode                   ║", env!("CARGO_PKG_VERSION"));
    println!("║      Multi-window terminal/browser workspace shell core     ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("failed to create demo directory: {}", e);
            std::process::exit(1);
        }
    };

    let demos: [(&str, fn(&Path) -> Result<(), String>); 6] = [
        ("Settings Engine", demo_settings),
        ("Display Geometry Resolver", demo_geometry),
        ("Shortcut Routing", demo_shortcuts),
        ("Surface Transfer", demo_transfer),
        ("Notifications", demo_notifications),
        ("Session Lifecycle", demo_session),
    ];
    let mut failed = 0;
    for (name, demo) in demos {
        section(name);
        match demo(dir.path()) {
            Ok(()) => println!("  ✓ {} OK", name),
            Err(e) => {
                failed += 1;
                println!("  ✗ {} failed: {}", name, e);
            }
        }
        println!();
    }

    println!("═══════════════════════════════════════════════════════════════");
    if failed == 0 {
        println!("  ✅ All {} components demonstrated successfully!", demos.len());
    } else {
        println!("  ⚠ {} of {} demos failed", failed, demos.len());
        std::process::exit(1);
    }
    println!("═══════════════════════════════════════════════════════════════");
}

fn section(name: &str) {
    println!("───────────────────────────────────────────────────────────────");
    println!("  📦 {}", name);
    println!("───────────────────────────────────────────────────────────────");
}

fn demo_settings_for(dir: &Path, name: &str) -> ShellSettings {
    let mut settings = ShellSettings::default();
    settings.session.snapshot_path = Some(dir.join(format!("{}-session.json", name)).to_string_lossy().to_string());
    settings.session.geometry_path = Some(dir.join(format!("{}-geometry.json", name)).to_string_lossy().to_string());
    settings
}

fn demo_settings(dir: &Path) -> Result<(), String> {
    let path = dir.join("settings.json").to_string_lossy().to_string();
    let mut engine = SettingsEngine::new(Some(path));
    let settings = engine.load().map_err(|e| e.to_string())?;
    println!("  Autosave every {}s, at most {} windows", settings.session.autosave_interval_secs, settings.session.max_windows);
    println!("  Control mode: {:?}", settings.control.mode);

    engine
        .set_value("shortcuts.toggle_sidebar", serde_json::json!("Cmd+Shift+B"))
        .map_err(|e| e.to_string())?;
    println!("  Rebound toggle_sidebar to Cmd+Shift+B");

    let rejected = engine.set_value("session.autosave_interval_secs", serde_json::json!(0));
    println!("  Zero autosave interval rejected: {}", rejected.is_err());

    engine.reset().map_err(|e| e.to_string())?;
    println!("  Reset to defaults: {} overrides", engine.get_settings().shortcuts.len());
    init_logging(&engine.get_settings().logging).map_err(|e| e.to_string())?;
    Ok(())
}

fn demo_geometry(_dir: &Path) -> Result<(), String> {
    let policy = GeometryPolicy::default();
    let left = DisplayDescriptor::new(
        Some(1),
        Rect::new(0.0, 0.0, 1440.0, 900.0),
        Rect::new(0.0, 0.0, 1440.0, 875.0),
    );
    let right = DisplayDescriptor::new(
        Some(2),
        Rect::new(1440.0, 0.0, 1920.0, 1080.0),
        Rect::new(1440.0, 0.0, 1920.0, 1055.0),
    );
    let frame = Rect::new(1600.0, 100.0, 900.0, 600.0);

    let both = [left.clone(), right.clone()];
    let unchanged = display_geometry::resolve(frame, Some(&right), &both, Some(&left), &policy);
    println!("  Same displays: {:?}", unchanged);

    let only_left = [left.clone()];
    let remapped = display_geometry::resolve(frame, Some(&right), &only_left, Some(&left), &policy)
        .ok_or("remap produced no frame")?;
    println!("  Right display unplugged: {:?}", remapped);
    if !left.work_area().contains_rect(&remapped, policy.match_tolerance) {
        return Err("remapped frame escaped the remaining display".to_string());
    }
    Ok(())
}

fn demo_shortcuts(dir: &Path) -> Result<(), String> {
    let mut app = App::headless(demo_settings_for(dir, "shortcuts"));
    let first = app.startup();
    let second = app.new_window().map_err(|e| e.to_string())?;
    println!("  Opened {} windows; shortcut table has {} bindings", first.len() + 1, app.shortcuts.list_shortcuts().len());

    let toggle = app
        .shortcuts
        .get_shortcut("toggle_sidebar")
        .cloned()
        .ok_or("toggle_sidebar unbound")?;
    app.server.set_key_window(None);
    app.server.set_main_window(None);
    let label = toggle.to_string();
    let outcome = app.handle_key_event(&KeyEvent::from_window_number(0, toggle));
    println!("  {} from window number 0 with no key window: {:?}", label, outcome);

    let visible = app.registry.find(second).map(|c| c.sidebar.visible);
    println!("  Sidebar of last active window now visible: {:?}", visible);
    app.terminate();
    Ok(())
}

fn demo_transfer(dir: &Path) -> Result<(), String> {
    let mut app = App::headless(demo_settings_for(dir, "transfer"));
    let source_window = *app.startup().first().ok_or("no window")?;
    let destination_window = app.new_window().map_err(|e| e.to_string())?;

    let browser = app
        .create_surface(source_window, None, Surface::browser("https://example.com"))
        .map_err(|e| e.to_string())?;
    let target = app
        .registry
        .find(destination_window)
        .and_then(|c| c.workspace_manager.selected_id())
        .ok_or("destination has no workspace")?;

    let mut request = MoveRequest::new(browser, target);
    request.split = Some(SplitRequest {
        orientation: SplitOrientation::Horizontal,
        insert_first: false,
    });
    let outcome = app.move_surface(&request).map_err(|e| e.to_string())?;
    let panes = app.registry.workspace(target).map(|ws| ws.pane_tree().all_panes().len()).unwrap_or(0);
    println!("  Moved browser surface across windows into new pane {} ({} panes)", outcome.pane, panes);
    println!("  Key window is destination: {}", app.server.key_window() == app.registry.find(destination_window).map(|c| c.handle()));
    app.terminate();
    Ok(())
}

fn demo_notifications(dir: &Path) -> Result<(), String> {
    let mut app = App::headless(demo_settings_for(dir, "notifications"));
    let window = *app.startup().first().ok_or("no window")?;
    let workspace = app
        .registry
        .find(window)
        .and_then(|c| c.workspace_manager.selected_id())
        .ok_or("no workspace")?;
    app.notifications.add(workspace, None, "Build finished", "cargo exited with 0");
    app.notifications.add(workspace, None, "Tests", "212 passed");
    println!("  {} notifications queued", app.notifications.len());

    app.close_window(window);
    println!("  After closing the window: {} notifications", app.notifications.len());
    app.terminate();
    Ok(())
}

fn demo_session(dir: &Path) -> Result<(), String> {
    let settings = demo_settings_for(dir, "session");
    {
        let mut app = App::headless(settings.clone());
        let window = *app.startup().first().ok_or("no window")?;
        app.create_workspace(window, Some("logs")).map_err(|e| e.to_string())?;
        if let Some(context) = app.registry.find_mut(window) {
            context.workspace_manager.select_index(0).map_err(|e| e.to_string())?;
        }
        println!("  Autosave: {:?}", app.autosave());
        println!("  Autosave again without changes: {:?}", app.autosave());
        if !app.terminate() {
            return Err("final save failed".to_string());
        }
        println!("  Terminated with a synchronous save");
    }

    let mut restored = App::headless(settings);
    let windows = restored.startup();
    let workspaces: usize = restored
        .registry
        .all()
        .iter()
        .map(|c| c.workspace_manager.workspace_count())
        .sum();
    println!("  Restored {} window(s) with {} workspace(s)", windows.len(), workspaces);
    restored.terminate();
    Ok(())
}

