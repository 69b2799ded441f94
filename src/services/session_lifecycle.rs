//! Session lifecycle: when snapshots are taken and restored.
//!
//! All decisions run on the caller's (UI) thread. Routine saves are handed to
//! a [`PersistenceWorker`] thread; the final save on terminate or power-off
//! is written synchronously after draining the worker.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, trace, warn};

use crate::managers::session_manager::{unix_now, SnapshotStore, WindowGeometryStore};
use crate::managers::window_registry::WindowContextRegistry;
use crate::services::window_server::WindowServer;
use crate::types::session::{SessionSnapshot, WindowGeometry, WindowSnapshot, SESSION_SCHEMA_VERSION};
use crate::types::settings::SessionSettings;

enum PersistCommand {
    Save(SessionSnapshot, u64),
    Flush(oneshot::Sender<()>),
}

/// Fingerprint of the last snapshot handed to the store. A failed write
/// clears it so the next autosave retries.
#[derive(Clone, Default)]
struct SavedFingerprint(Arc<Mutex<Option<u64>>>);

impl SavedFingerprint {
    fn get(&self) -> Option<u64> {
        self.0.lock().ok().and_then(|guard| *guard)
    }

    fn set(&self, fingerprint: u64) {
        if let Ok(mut guard) = self.0.lock() {
            *guard = Some(fingerprint);
        }
    }

    fn clear_if(&self, fingerprint: u64) {
        if let Ok(mut guard) = self.0.lock() {
            if *guard == Some(fingerprint) {
                *guard = None;
            }
        }
    }
}

/// Single background thread writing snapshots. Queued saves coalesce: only
/// the newest pending snapshot is written.
pub struct PersistenceWorker {
    tx: Option<mpsc::UnboundedSender<PersistCommand>>,
    thread: Option<JoinHandle<()>>,
    saved: SavedFingerprint,
}

impl PersistenceWorker {
    pub fn spawn(store: Arc<dyn SnapshotStore>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let saved = SavedFingerprint::default();
        let cell = saved.clone();
        let thread = thread::Builder::new()
            .name("termdeck-persist".to_string())
            .spawn(move || Self::run(store, rx, cell));
        let thread = match thread {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!(error = %e, "failed to spawn persistence thread; saves will be dropped");
                None
            }
        };
        Self { tx: Some(tx), thread, saved }
    }

    fn run(
        store: Arc<dyn SnapshotStore>,
        mut rx: mpsc::UnboundedReceiver<PersistCommand>,
        saved: SavedFingerprint,
    ) {
        while let Some(command) = rx.blocking_recv() {
            let mut latest = None;
            let mut acks = Vec::new();
            let mut next = Some(command);
            while let Some(command) = next {
                match command {
                    PersistCommand::Save(snapshot, fingerprint) => latest = Some((snapshot, fingerprint)),
                    PersistCommand::Flush(ack) => acks.push(ack),
                }
                next = rx.try_recv().ok();
            }
            if let Some((snapshot, fingerprint)) = latest {
                if !store.save(&snapshot) {
                    warn!("background session save failed; next autosave will retry");
                    saved.clear_if(fingerprint);
                }
            }
            for ack in acks {
                let _ = ack.send(());
            }
        }
        trace!("persistence worker exiting");
    }

    /// Queues a write. The fingerprint counts as saved until the write fails.
    pub fn enqueue(&self, snapshot: SessionSnapshot) -> bool {
        let (Some(tx), Some(_)) = (&self.tx, &self.thread) else {
            return false;
        };
        let fingerprint = fingerprint(&snapshot);
        // Set before sending so a fast failure can still clear it.
        self.saved.set(fingerprint);
        let queued = tx.send(PersistCommand::Save(snapshot, fingerprint)).is_ok();
        if !queued {
            self.saved.clear_if(fingerprint);
        }
        queued
    }

    /// Fingerprint of the newest snapshot queued or written without failure.
    pub fn saved_fingerprint(&self) -> Option<u64> {
        self.saved.get()
    }

    fn record_written(&self, fingerprint: u64) {
        self.saved.set(fingerprint);
    }

    /// Blocks until everything queued so far has been written.
    ///
    /// Must not be called from inside an async task.
    pub fn flush(&self) {
        let (Some(tx), Some(_)) = (&self.tx, &self.thread) else {
            return;
        };
        let (ack_tx, ack_rx) = oneshot::channel();
        if tx.send(PersistCommand::Flush(ack_tx)).is_err() {
            return;
        }
        if ack_rx.blocking_recv().is_err() {
            warn!("persistence worker dropped a flush request");
        }
    }

    /// Drains the queue and joins the thread.
    pub fn shutdown(&mut self) {
        self.tx.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("persistence worker panicked");
            }
        }
    }
}

impl Drop for PersistenceWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Restoring,
    Running,
    Terminating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveOutcome {
    Terminating,
    Restoring,
    Unchanged,
    Scheduled,
}

pub struct SessionLifecycle {
    phase: LifecyclePhase,
    store: Arc<dyn SnapshotStore>,
    geometry_store: WindowGeometryStore,
    worker: PersistenceWorker,
    max_windows: usize,
    autosave_interval: Duration,
}

impl SessionLifecycle {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        geometry_store: WindowGeometryStore,
        settings: &SessionSettings,
    ) -> Self {
        let worker = PersistenceWorker::spawn(store.clone());
        Self {
            phase: LifecyclePhase::Running,
            store,
            geometry_store,
            worker,
            max_windows: settings.max_windows,
            autosave_interval: Duration::from_secs(settings.autosave_interval_secs.max(1)),
        }
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    pub fn is_terminating(&self) -> bool {
        self.phase == LifecyclePhase::Terminating
    }

    pub fn max_windows(&self) -> usize {
        self.max_windows
    }

    pub fn autosave_interval(&self) -> Duration {
        self.autosave_interval
    }

    /// Marks a startup restore as in progress. Ignored once terminating.
    pub fn begin_restore(&mut self) {
        if !self.is_terminating() {
            self.phase = LifecyclePhase::Restoring;
        }
    }

    pub fn finish_restore(&mut self) {
        if self.phase == LifecyclePhase::Restoring {
            self.phase = LifecyclePhase::Running;
        }
    }

    pub fn load(&self) -> Option<SessionSnapshot> {
        self.store.load()
    }

    pub fn geometry_fallback(&self) -> Option<WindowGeometry> {
        self.geometry_store.load()
    }

    /// Periodic save. `build` only runs when a save may happen.
    pub fn autosave_tick(&mut self, build: impl FnOnce() -> SessionSnapshot) -> AutosaveOutcome {
        match self.phase {
            LifecyclePhase::Terminating => return AutosaveOutcome::Terminating,
            LifecyclePhase::Restoring => return AutosaveOutcome::Restoring,
            LifecyclePhase::Running => {}
        }
        let snapshot = build();
        if self.worker.saved_fingerprint() == Some(fingerprint(&snapshot)) {
            trace!("autosave skipped; session unchanged");
            return AutosaveOutcome::Unchanged;
        }
        self.worker.enqueue(snapshot);
        AutosaveOutcome::Scheduled
    }

    /// Background save, e.g. when the app resigns active.
    pub fn save_async(&mut self, snapshot: SessionSnapshot) -> bool {
        if self.phase != LifecyclePhase::Running {
            return false;
        }
        self.worker.enqueue(snapshot)
    }

    /// Writes now, after anything already queued.
    pub fn save_sync(&mut self, snapshot: &SessionSnapshot) -> bool {
        self.worker.flush();
        let saved = self.store.save(snapshot);
        if saved {
            self.worker.record_written(fingerprint(snapshot));
        }
        saved
    }

    /// Final save on application termination. Idempotent.
    pub fn terminate(&mut self, snapshot: &SessionSnapshot) -> bool {
        if self.is_terminating() {
            return false;
        }
        info!(windows = snapshot.windows.len(), "terminating; writing final session snapshot");
        self.phase = LifecyclePhase::Terminating;
        self.save_sync(snapshot)
    }

    /// Final save on system power-off.
    pub fn power_off(&mut self, snapshot: &SessionSnapshot) -> bool {
        debug!("power-off notification");
        self.terminate(snapshot)
    }

    /// Remembers the closed window's geometry and refreshes the snapshot.
    pub fn window_closed(&mut self, geometry: &WindowGeometry, snapshot: SessionSnapshot) {
        self.geometry_store.save(geometry);
        if !self.is_terminating() {
            self.save_async(snapshot);
        }
    }

    /// Waits for queued background saves.
    pub fn flush(&self) {
        self.worker.flush();
    }

    pub fn shutdown(&mut self) {
        self.worker.shutdown();
    }
}

fn fingerprint(snapshot: &SessionSnapshot) -> u64 {
    let mut hasher = DefaultHasher::new();
    match serde_json::to_string(&snapshot.windows) {
        Ok(json) => json.hash(&mut hasher),
        Err(_) => snapshot.created_at.hash(&mut hasher),
    }
    hasher.finish()
}

/// Captures every registered window, in registration order, capped at
/// `max_windows`. Windows the server no longer knows are skipped.
pub fn build_snapshot(
    registry: &WindowContextRegistry,
    server: &dyn WindowServer,
    max_windows: usize,
) -> SessionSnapshot {
    let windows: Vec<WindowSnapshot> = registry
        .all()
        .iter()
        .filter_map(|context| {
            let frame = server.frame(context.handle())?;
            Some(WindowSnapshot {
                frame,
                display: server.display_for(context.handle()),
                workspace_manager: context.workspace_manager.snapshot(),
                sidebar: context.sidebar.clone(),
            })
        })
        .take(max_windows)
        .collect();
    SessionSnapshot {
        schema_version: SESSION_SCHEMA_VERSION,
        created_at: unix_now(),
        windows,
    }
}
