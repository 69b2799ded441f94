//! termdeck control server: newline-delimited JSON over stdin/stdout.
//!
//! Protocol: one JSON object per line.
//! Request:  {"id":1, "method":"workspace.create", "params":{"title":"build"}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//!
//! Requests, autosave ticks and focus retries are multiplexed on a
//! current-thread runtime; every event is then handled on this thread. The
//! loop sleeps until the next focus deadline, never on a fixed poll.

use std::io::{self, BufRead, Write};
use std::sync::Mutex;
use std::time::Instant;

use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::{interval, sleep_until, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use termdeck::app::App;
use termdeck::rpc_handler::{authorize_client, handle_method, SURFACE_ENV};
use termdeck::services::logging::init_logging;
use termdeck::services::session_lifecycle::AutosaveOutcome;
use termdeck::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use termdeck::types::settings::ShellSettings;

/// Simple rate limiter: max requests per second.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        let elapsed = self.window_start.elapsed();
        if elapsed.as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

enum Event {
    Line(String),
    Autosave,
    FocusDue,
    Closed,
}

fn respond(response: &Value) {
    let mut stdout = io::stdout().lock();
    if writeln!(stdout, "{}", response).and_then(|_| stdout.flush()).is_err() {
        error!("failed to write response");
    }
}

fn load_settings() -> ShellSettings {
    let mut engine = SettingsEngine::new(std::env::var("TERMDECK_SETTINGS").ok());
    match engine.load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("termdeck-rpc: {}; using defaults", e);
            ShellSettings::default()
        }
    }
}

/// Parses and answers one request line.
fn handle_line(app: &Mutex<App>, limiter: &mut RateLimiter, line: &str) {
    if line.trim().is_empty() {
        return;
    }
    let req: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            respond(&json!({"id": null, "error": format!("parse error: {}", e)}));
            return;
        }
    };
    let id = req.get("id").cloned().unwrap_or(Value::Null);

    if !limiter.check() {
        respond(&json!({"id": id, "error": "rate limit exceeded"}));
        return;
    }

    let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
    let params = req.get("params").cloned().unwrap_or(json!({}));
    let response = match handle_method(app, method, &params) {
        Ok(val) => json!({"id": id, "result": val}),
        Err(err) => json!({"id": id, "error": err}),
    };
    respond(&response);
}

fn main() {
    let settings = load_settings();
    if let Err(e) = init_logging(&settings.logging) {
        eprintln!("termdeck-rpc: {}", e);
    }
    let marker = std::env::var(SURFACE_ENV).ok();
    if let Err(reason) = authorize_client(settings.control.mode, marker.as_deref()) {
        error!(mode = ?settings.control.mode, "{}", reason);
        std::process::exit(2);
    }

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_time().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to build runtime");
            std::process::exit(1);
        }
    };

    let app = Mutex::new(App::headless(settings.clone()));
    let (autosave_every, opened) = match app.lock() {
        Ok(mut a) => (a.autosave_interval(), a.startup().len()),
        Err(e) => {
            error!(error = %e, "app lock poisoned");
            std::process::exit(1);
        }
    };
    info!(windows = opened, mode = ?settings.control.mode, "control server ready");

    respond(&json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}));

    // stdin is read on its own thread; lines arrive over a channel.
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let reader = std::thread::Builder::new()
        .name("termdeck-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = reader {
        error!(error = %e, "failed to spawn stdin reader");
        std::process::exit(1);
    }

    // Max 200 requests per second.
    let mut rate_limiter = RateLimiter::new(200);
    let mut autosave = runtime.block_on(async {
        let mut autosave = interval(autosave_every);
        autosave.set_missed_tick_behavior(MissedTickBehavior::Delay);
        autosave.tick().await;
        autosave
    });

    loop {
        // Only armed while a focus retry is pending.
        let focus_due = app
            .lock()
            .ok()
            .and_then(|a| a.next_focus_deadline())
            .map(tokio::time::Instant::from_std);
        let event = runtime.block_on(async {
            let wake = focus_due.unwrap_or_else(tokio::time::Instant::now);
            tokio::select! {
                line = rx.recv() => match line {
                    Some(line) => Event::Line(line),
                    None => Event::Closed,
                },
                _ = autosave.tick() => Event::Autosave,
                _ = sleep_until(wake), if focus_due.is_some() => Event::FocusDue,
            }
        });

        // Handled outside the runtime: saves may block on the persistence worker.
        match event {
            Event::Line(line) => handle_line(&app, &mut rate_limiter, &line),
            Event::Autosave => {
                if let Ok(mut a) = app.lock() {
                    if a.autosave() == AutosaveOutcome::Scheduled {
                        debug!("autosave scheduled");
                    }
                }
            }
            Event::FocusDue => {
                if let Ok(mut a) = app.lock() {
                    if a.tick(Instant::now()) {
                        debug!("focus retry applied");
                    }
                }
            }
            Event::Closed => break,
        }
    }

    match app.lock() {
        Ok(mut a) => {
            if !a.terminate() {
                warn!("final session save failed");
            }
        }
        Err(e) => error!(error = %e, "app lock poisoned at shutdown"),
    }
    info!("stdin closed; control server exiting");
}
