//! Focus re-assertion after cross-window moves.
//!
//! Window activation can race with the window server: another window may
//! regain key status shortly after a move. A scheduled target is re-checked
//! at a few fixed delays; each check only re-applies what is wrong, so
//! checking an already-focused target changes nothing. Scheduling a new target
//! replaces the pending one.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::managers::window_registry::WindowContextRegistry;
use crate::managers::workspace_manager::WorkspaceManagerTrait;
use crate::services::window_server::WindowServer;
use crate::types::window::WindowId;
use crate::types::workspace::{SurfaceId, WorkspaceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusTarget {
    pub window_id: WindowId,
    pub workspace_id: WorkspaceId,
    pub surface_id: Option<SurfaceId>,
}

#[derive(Debug)]
struct Pending {
    target: FocusTarget,
    deadlines: VecDeque<Instant>,
}

#[derive(Debug)]
pub struct FocusReassertion {
    delays: Vec<Duration>,
    pending: Option<Pending>,
}

impl FocusReassertion {
    pub fn new(retry_delays_ms: &[u64]) -> Self {
        Self {
            delays: retry_delays_ms.iter().map(|ms| Duration::from_millis(*ms)).collect(),
            pending: None,
        }
    }

    pub fn schedule(&mut self, target: FocusTarget, now: Instant) {
        let deadlines: VecDeque<Instant> = self.delays.iter().map(|d| now + *d).collect();
        if deadlines.is_empty() {
            self.pending = None;
            return;
        }
        trace!(window_id = %target.window_id, retries = deadlines.len(), "scheduling focus re-assertion");
        self.pending = Some(Pending { target, deadlines });
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Drops the pending target if it points at `window_id`.
    pub fn cancel_for_window(&mut self, window_id: WindowId) {
        if self.target().map(|t| t.window_id) == Some(window_id) {
            self.pending = None;
        }
    }

    pub fn target(&self) -> Option<FocusTarget> {
        self.pending.as_ref().map(|p| p.target)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().and_then(|p| p.deadlines.front().copied())
    }

    /// Runs every retry due at `now`. Returns true if focus had to be fixed.
    pub fn poll(
        &mut self,
        now: Instant,
        registry: &mut WindowContextRegistry,
        server: &mut dyn WindowServer,
    ) -> bool {
        let Some(pending) = self.pending.as_mut() else {
            return false;
        };
        let mut due = false;
        while pending.deadlines.front().is_some_and(|d| *d <= now) {
            pending.deadlines.pop_front();
            due = true;
        }
        if !due {
            return false;
        }
        let target = pending.target;
        if pending.deadlines.is_empty() {
            self.pending = None;
        }
        if registry.find(target.window_id).is_none() {
            self.pending = None;
            return false;
        }
        reassert(target, registry, server)
    }
}

/// Makes `target` key, selected and focused. Returns true if anything changed.
pub fn reassert(
    target: FocusTarget,
    registry: &mut WindowContextRegistry,
    server: &mut dyn WindowServer,
) -> bool {
    let Some(context) = registry.find_mut(target.window_id) else {
        return false;
    };
    let mut changed = false;

    let handle = context.handle();
    if server.key_window() != Some(handle) && server.make_key(handle) {
        debug!(window_id = %target.window_id, "re-asserted key window");
        changed = true;
    }

    let manager = &mut context.workspace_manager;
    if manager.selected_id() != Some(target.workspace_id) && manager.select_workspace(target.workspace_id).is_ok() {
        changed = true;
    }

    if let (Some(surface), Some(workspace)) = (target.surface_id, manager.workspace_mut(target.workspace_id)) {
        if workspace.focused_surface() != Some(surface) && workspace.focus_surface(surface) {
            changed = true;
        }
    }
    changed
}
