//! Moving surfaces and workspaces between workspaces and windows.
//!
//! A cross-workspace surface move is detach, attach, then (optionally) split.
//! Any failing step puts the surface back where it was, so callers either see
//! the move completed or no change at all. Emptied sources are reported back
//! through [`SourceCleanup`]; closing a workspace happens here, closing a
//! window is left to the caller that owns the window server.

use tracing::{debug, error, info, warn};

use crate::managers::window_registry::WindowContextRegistry;
use crate::managers::workspace_manager::WorkspaceManagerTrait;
use crate::services::pane_tree::PaneTree;
use crate::types::errors::TransferError;
use crate::types::window::WindowId;
use crate::types::workspace::{
    PaneId, SplitOrientation, Surface, SurfaceId, TransferHandle, WorkspaceId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitRequest {
    pub orientation: SplitOrientation,
    pub insert_first: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MoveRequest {
    pub surface: SurfaceId,
    /// When set, the move fails unless the surface lives in this workspace.
    pub from_workspace: Option<WorkspaceId>,
    pub to_workspace: WorkspaceId,
    pub target_pane: Option<PaneId>,
    pub target_index: Option<usize>,
    pub split: Option<SplitRequest>,
    /// Select the destination workspace and surface afterwards.
    pub focus: bool,
}

impl MoveRequest {
    pub fn new(surface: SurfaceId, to_workspace: WorkspaceId) -> Self {
        Self {
            surface,
            from_workspace: None,
            to_workspace,
            target_pane: None,
            target_index: None,
            split: None,
            focus: true,
        }
    }
}

/// What became of the source after a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceCleanup {
    None,
    /// The emptied source workspace was closed.
    ClosedWorkspace(WorkspaceId),
    /// The source window lost its last workspace; the caller closes it.
    CloseWindow(WindowId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferOutcome {
    pub source_window: WindowId,
    pub source_workspace: WorkspaceId,
    pub destination_window: WindowId,
    pub destination_workspace: WorkspaceId,
    pub pane: PaneId,
    pub cleanup: SourceCleanup,
}

/// Moves a surface according to `request`.
pub fn move_surface(
    registry: &mut WindowContextRegistry,
    request: &MoveRequest,
) -> Result<TransferOutcome, TransferError> {
    let surface = request.surface;
    let (source_window, source_workspace) = registry
        .locate_surface(surface)
        .ok_or_else(|| TransferError::SurfaceNotFound(surface.to_string()))?;
    if let Some(expected) = request.from_workspace {
        if expected != source_workspace {
            return Err(TransferError::SourceMismatch(format!(
                "surface {} is in workspace {}, not {}",
                surface, source_workspace, expected
            )));
        }
    }

    let to = request.to_workspace;
    let destination_window = registry
        .locate_workspace(to)
        .ok_or_else(|| TransferError::WorkspaceNotFound(to.to_string()))?;
    let pane = registry
        .workspace(to)
        .and_then(|ws| ws.resolve_pane(request.target_pane))
        .ok_or_else(|| TransferError::NoDestinationPane(to.to_string()))?;

    let pane = if source_workspace == to {
        move_within(registry, request, pane)?
    } else {
        move_across(registry, request, source_workspace, pane)?
    };

    if request.focus {
        if let Some(context) = registry.find_mut(destination_window) {
            if let Err(e) = context.workspace_manager.select_workspace(to) {
                warn!(workspace_id = %to, error = %e, "could not select destination workspace");
            }
            if let Some(workspace) = context.workspace_manager.workspace_mut(to) {
                workspace.focus_surface(surface);
            }
        }
    }

    let cleanup = if source_workspace == to {
        SourceCleanup::None
    } else {
        cleanup_source(registry, source_window, source_workspace)
    };

    info!(
        surface_id = %surface,
        from = %source_workspace,
        to = %to,
        "surface moved"
    );
    Ok(TransferOutcome {
        source_window,
        source_workspace,
        destination_window,
        destination_workspace: to,
        pane,
        cleanup,
    })
}

/// Same-workspace move: split or reposition, no detach/attach cycle.
fn move_within(
    registry: &mut WindowContextRegistry,
    request: &MoveRequest,
    pane: PaneId,
) -> Result<PaneId, TransferError> {
    let surface = request.surface;
    let workspace = registry
        .workspace_mut(request.to_workspace)
        .ok_or_else(|| TransferError::WorkspaceNotFound(request.to_workspace.to_string()))?;
    let tree = workspace.pane_tree_mut();
    match request.split {
        Some(split) => tree
            .split(pane, split.orientation, surface, split.insert_first)
            .ok_or_else(|| TransferError::SplitFailed(surface.to_string())),
        None => {
            if tree.move_item(surface, pane, request.target_index) {
                Ok(pane)
            } else {
                Err(TransferError::AttachFailed(surface.to_string()))
            }
        }
    }
}

fn move_across(
    registry: &mut WindowContextRegistry,
    request: &MoveRequest,
    source_workspace: WorkspaceId,
    pane: PaneId,
) -> Result<PaneId, TransferError> {
    let id = request.surface;
    let missing_source = || TransferError::WorkspaceNotFound(source_workspace.to_string());

    let (origin, handle, surface) = {
        let source = registry.workspace_mut(source_workspace).ok_or_else(missing_source)?;
        let origin = Selection::capture(source.pane_tree(), id);
        let handle = source
            .pane_tree_mut()
            .detach(id)
            .ok_or_else(|| TransferError::DetachFailed(id.to_string()))?;
        let surface = source.take_surface(id);
        (origin, handle, surface)
    };
    let Some(surface) = surface else {
        // Tree and map disagreed; put the tree back the way it was.
        rollback(registry, source_workspace, origin, handle, None);
        return Err(TransferError::DetachFailed(id.to_string()));
    };

    let Some(destination) = registry.workspace_mut(request.to_workspace) else {
        rollback(registry, source_workspace, origin, handle, Some(surface));
        return Err(TransferError::WorkspaceNotFound(request.to_workspace.to_string()));
    };
    let landing = Selection::of_pane(destination.pane_tree(), pane);
    match destination.pane_tree_mut().attach(handle, pane, request.target_index) {
        Ok(_) => destination.insert_surface(surface),
        Err(handle) => {
            warn!(surface_id = %id, pane = %pane, "attach refused; rolling back");
            rollback(registry, source_workspace, origin, handle, Some(surface));
            return Err(TransferError::AttachFailed(id.to_string()));
        }
    }

    let Some(split) = request.split else {
        return Ok(pane);
    };
    let split_pane = destination
        .pane_tree_mut()
        .split(pane, split.orientation, id, split.insert_first);
    if let Some(new_pane) = split_pane {
        return Ok(new_pane);
    }

    warn!(surface_id = %id, pane = %pane, "split refused; rolling back");
    let handle = destination.pane_tree_mut().detach(id);
    let surface = destination.take_surface(id);
    landing.restore(destination.pane_tree_mut());
    match handle {
        Some(handle) => rollback(registry, source_workspace, origin, handle, surface),
        None => error!(surface_id = %id, "could not detach surface for rollback"),
    }
    Err(TransferError::SplitFailed(id.to_string()))
}

/// Position of a surface plus the selection around it, captured before a
/// cross-workspace move touches a tree.
#[derive(Debug, Clone, Copy)]
struct Selection {
    slot: Option<(PaneId, usize)>,
    selected: Option<SurfaceId>,
    focused_pane: Option<PaneId>,
}

impl Selection {
    fn capture(tree: &dyn PaneTree, item: SurfaceId) -> Self {
        let slot = tree.locate(item);
        Self {
            slot,
            selected: slot.and_then(|(pane, _)| tree.selected_item(pane)),
            focused_pane: tree.focused_pane(),
        }
    }

    fn of_pane(tree: &dyn PaneTree, pane: PaneId) -> Self {
        Self {
            slot: None,
            selected: tree.selected_item(pane),
            focused_pane: tree.focused_pane(),
        }
    }

    fn restore(&self, tree: &mut dyn PaneTree) {
        if let Some(item) = self.selected {
            tree.select_item(item);
        }
        if let Some(pane) = self.focused_pane {
            tree.focus_pane(pane);
        }
    }
}

/// Re-hosts a detached surface at its original pane and index.
fn rollback(
    registry: &mut WindowContextRegistry,
    source_workspace: WorkspaceId,
    origin: Selection,
    handle: TransferHandle,
    surface: Option<Surface>,
) {
    let Some(source) = registry.workspace_mut(source_workspace) else {
        error!(workspace_id = %source_workspace, "rollback target vanished");
        return;
    };
    let pane = source.resolve_pane(origin.slot.map(|(pane, _)| pane));
    let index = origin.slot.map(|(_, index)| index);
    let attached = match pane {
        Some(pane) => source.pane_tree_mut().attach(handle, pane, index).is_ok(),
        None => false,
    };
    if !attached {
        error!(workspace_id = %source_workspace, "rollback attach failed");
    }
    if let Some(surface) = surface {
        source.insert_surface(surface);
    }
    origin.restore(source.pane_tree_mut());
    debug!(workspace_id = %source_workspace, "surface rolled back");
}

fn cleanup_source(
    registry: &mut WindowContextRegistry,
    window_id: WindowId,
    workspace_id: WorkspaceId,
) -> SourceCleanup {
    let Some(context) = registry.find_mut(window_id) else {
        return SourceCleanup::None;
    };
    let manager = &mut context.workspace_manager;
    let emptied = match manager.workspace_mut(workspace_id) {
        Some(workspace) => {
            workspace.pane_tree_mut().prune_empty();
            workspace.is_empty()
        }
        None => false,
    };
    if !emptied {
        return SourceCleanup::None;
    }
    if manager.workspace_count() > 1 {
        match manager.close_workspace(workspace_id) {
            Ok(_) => debug!(workspace_id = %workspace_id, "closed emptied source workspace"),
            Err(e) => warn!(workspace_id = %workspace_id, error = %e, "could not close emptied source workspace"),
        }
        SourceCleanup::ClosedWorkspace(workspace_id)
    } else {
        SourceCleanup::CloseWindow(window_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkspaceMoveOutcome {
    pub source_window: WindowId,
    pub destination_window: WindowId,
    pub cleanup: SourceCleanup,
}

/// Moves a whole workspace into another window's manager.
pub fn move_workspace_to_window(
    registry: &mut WindowContextRegistry,
    workspace_id: WorkspaceId,
    destination_window: WindowId,
    focus: bool,
) -> Result<WorkspaceMoveOutcome, TransferError> {
    let source_window = registry
        .locate_workspace(workspace_id)
        .ok_or_else(|| TransferError::WorkspaceNotFound(workspace_id.to_string()))?;
    if registry.find(destination_window).is_none() {
        return Err(TransferError::WindowNotFound(destination_window.to_string()));
    }
    if source_window == destination_window {
        return Err(TransferError::SameWindow(workspace_id.to_string()));
    }

    let (workspace, source_left) = {
        let source = registry
            .find_mut(source_window)
            .ok_or_else(|| TransferError::WindowNotFound(source_window.to_string()))?;
        let workspace = source
            .workspace_manager
            .detach_workspace(workspace_id)
            .map_err(|e| TransferError::WorkspaceNotFound(e.to_string()))?;
        (workspace, source.workspace_manager.workspace_count())
    };

    match registry.find_mut(destination_window) {
        Some(destination) => {
            destination.workspace_manager.add_workspace(workspace, focus);
        }
        None => {
            error!(window_id = %destination_window, "destination vanished; returning workspace");
            if let Some(source) = registry.find_mut(source_window) {
                source.workspace_manager.add_workspace(workspace, true);
            }
            return Err(TransferError::WindowNotFound(destination_window.to_string()));
        }
    }

    info!(workspace_id = %workspace_id, from = %source_window, to = %destination_window, "workspace moved");
    Ok(WorkspaceMoveOutcome {
        source_window,
        destination_window,
        cleanup: if source_left == 0 {
            SourceCleanup::CloseWindow(source_window)
        } else {
            SourceCleanup::None
        },
    })
}
