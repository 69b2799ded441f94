//! Unit tests for moving surfaces and workspaces between windows.

use std::cell::Cell;
use std::rc::Rc;

use termdeck::managers::surface_transfer::{
    move_surface, move_workspace_to_window, MoveRequest, SourceCleanup, SplitRequest,
};
use termdeck::managers::window_registry::WindowContextRegistry;
use termdeck::managers::workspace_manager::{WorkspaceManager, WorkspaceManagerTrait};
use termdeck::services::pane_tree::{PaneTree, StackPaneTree};
use termdeck::types::errors::TransferError;
use termdeck::types::window::{SidebarState, WindowHandle, WindowId};
use termdeck::types::workspace::{
    PaneId, SplitOrientation, Surface, SurfaceId, TransferHandle, WorkspaceId,
};

/// Stack tree whose attach and split can be made to fail on demand.
#[derive(Debug)]
struct FlakyTree {
    inner: StackPaneTree,
    refuse_attach: Rc<Cell<bool>>,
    refuse_split: Rc<Cell<bool>>,
}

impl PaneTree for FlakyTree {
    fn all_panes(&self) -> Vec<PaneId> {
        self.inner.all_panes()
    }
    fn focused_pane(&self) -> Option<PaneId> {
        self.inner.focused_pane()
    }
    fn focus_pane(&mut self, pane: PaneId) -> bool {
        self.inner.focus_pane(pane)
    }
    fn items(&self, pane: PaneId) -> Vec<SurfaceId> {
        self.inner.items(pane)
    }
    fn locate(&self, item: SurfaceId) -> Option<(PaneId, usize)> {
        self.inner.locate(item)
    }
    fn selected_item(&self, pane: PaneId) -> Option<SurfaceId> {
        self.inner.selected_item(pane)
    }
    fn orientation(&self, pane: PaneId) -> Option<SplitOrientation> {
        self.inner.orientation(pane)
    }
    fn select_item(&mut self, item: SurfaceId) -> bool {
        self.inner.select_item(item)
    }
    fn split(
        &mut self,
        pane: PaneId,
        orientation: SplitOrientation,
        moving: SurfaceId,
        insert_first: bool,
    ) -> Option<PaneId> {
        if self.refuse_split.get() {
            return None;
        }
        self.inner.split(pane, orientation, moving, insert_first)
    }
    fn move_item(&mut self, item: SurfaceId, pane: PaneId, index: Option<usize>) -> bool {
        self.inner.move_item(item, pane, index)
    }
    fn detach(&mut self, item: SurfaceId) -> Option<TransferHandle> {
        self.inner.detach(item)
    }
    fn attach(
        &mut self,
        handle: TransferHandle,
        pane: PaneId,
        index: Option<usize>,
    ) -> Result<SurfaceId, TransferHandle> {
        if self.refuse_attach.get() {
            return Err(handle);
        }
        self.inner.attach(handle, pane, index)
    }
    fn prune_empty(&mut self) {
        self.inner.prune_empty()
    }
}

#[derive(Clone, Default)]
struct Flags {
    refuse_attach: Rc<Cell<bool>>,
    refuse_split: Rc<Cell<bool>>,
}

impl Flags {
    fn tree(&self) -> Box<dyn PaneTree> {
        Box::new(FlakyTree {
            inner: StackPaneTree::new(),
            refuse_attach: self.refuse_attach.clone(),
            refuse_split: self.refuse_split.clone(),
        })
    }
}

struct TestWindow {
    id: WindowId,
    workspaces: Vec<WorkspaceId>,
    surfaces: Vec<Vec<SurfaceId>>,
}

/// Registers a window with one workspace per entry of `layout`, each holding
/// that many terminals in a single pane.
fn add_window(
    registry: &mut WindowContextRegistry,
    handle: u64,
    layout: &[usize],
    flags: Option<&Flags>,
) -> TestWindow {
    let mut manager = WorkspaceManager::new();
    let mut workspaces = Vec::new();
    let mut surfaces = Vec::new();
    for count in layout {
        let tree = match flags {
            Some(flags) => flags.tree(),
            None => Box::new(StackPaneTree::new()) as Box<dyn PaneTree>,
        };
        let ws = manager.create_workspace(None, tree, false);
        let workspace = manager.workspace_mut(ws).unwrap();
        let ids: Vec<SurfaceId> = (0..*count)
            .map(|_| workspace.add_surface(Surface::terminal(None), None, None).unwrap())
            .collect();
        workspaces.push(ws);
        surfaces.push(ids);
    }
    let id = WindowId::new();
    registry
        .register(id, manager, SidebarState::default(), WindowHandle(handle))
        .unwrap();
    TestWindow { id, workspaces, surfaces }
}

fn items_of(registry: &WindowContextRegistry, ws: WorkspaceId) -> Vec<Vec<SurfaceId>> {
    let tree = registry.workspace(ws).unwrap().pane_tree();
    tree.all_panes().into_iter().map(|pane| tree.items(pane)).collect()
}

#[test]
fn reorder_within_workspace() {
    let mut registry = WindowContextRegistry::new();
    let a = add_window(&mut registry, 1, &[3], None);
    let ws = a.workspaces[0];
    let [s0, s1, s2] = [a.surfaces[0][0], a.surfaces[0][1], a.surfaces[0][2]];

    let mut request = MoveRequest::new(s2, ws);
    request.target_index = Some(0);
    let outcome = move_surface(&mut registry, &request).unwrap();

    assert_eq!(items_of(&registry, ws), vec![vec![s2, s0, s1]]);
    assert_eq!(outcome.cleanup, SourceCleanup::None);
    assert_eq!(outcome.source_window, outcome.destination_window);
}

#[test]
fn split_within_workspace_creates_pane() {
    let mut registry = WindowContextRegistry::new();
    let a = add_window(&mut registry, 1, &[2], None);
    let ws = a.workspaces[0];
    let (s0, s1) = (a.surfaces[0][0], a.surfaces[0][1]);

    let mut request = MoveRequest::new(s1, ws);
    request.split = Some(SplitRequest {
        orientation: SplitOrientation::Horizontal,
        insert_first: false,
    });
    let outcome = move_surface(&mut registry, &request).unwrap();

    assert_eq!(items_of(&registry, ws), vec![vec![s0], vec![s1]]);
    assert_eq!(registry.workspace(ws).unwrap().pane_tree().locate(s1), Some((outcome.pane, 0)));
    assert_eq!(registry.workspace(ws).unwrap().focused_surface(), Some(s1));
}

#[test]
fn move_across_windows_selects_destination() {
    let mut registry = WindowContextRegistry::new();
    let a = add_window(&mut registry, 1, &[2], None);
    let b = add_window(&mut registry, 2, &[1, 1], None);
    let moving = a.surfaces[0][0];
    let to = b.workspaces[0];

    let outcome = move_surface(&mut registry, &MoveRequest::new(moving, to)).unwrap();

    assert_eq!(outcome.source_window, a.id);
    assert_eq!(outcome.destination_window, b.id);
    assert_eq!(outcome.cleanup, SourceCleanup::None);
    assert_eq!(registry.locate_surface(moving), Some((b.id, to)));
    assert!(!registry.workspace(a.workspaces[0]).unwrap().contains_surface(moving));
    let context = registry.find(b.id).unwrap();
    assert_eq!(context.workspace_manager.selected_id(), Some(to));
    assert_eq!(registry.workspace(to).unwrap().focused_surface(), Some(moving));
}

#[test]
fn move_without_focus_keeps_destination_selection() {
    let mut registry = WindowContextRegistry::new();
    let a = add_window(&mut registry, 1, &[2], None);
    let b = add_window(&mut registry, 2, &[1, 1], None);
    let selected = registry.find(b.id).unwrap().workspace_manager.selected_id();

    let mut request = MoveRequest::new(a.surfaces[0][1], b.workspaces[1]);
    request.focus = false;
    move_surface(&mut registry, &request).unwrap();

    assert_eq!(registry.find(b.id).unwrap().workspace_manager.selected_id(), selected);
    assert_ne!(selected, Some(b.workspaces[1]));
}

#[test]
fn move_across_workspaces_honors_pane_and_index() {
    let mut registry = WindowContextRegistry::new();
    let a = add_window(&mut registry, 1, &[2, 2], None);
    let moving = a.surfaces[0][1];
    let to = a.workspaces[1];
    let pane = registry.workspace(to).unwrap().pane_tree().all_panes()[0];

    let mut request = MoveRequest::new(moving, to);
    request.target_pane = Some(pane);
    request.target_index = Some(0);
    let outcome = move_surface(&mut registry, &request).unwrap();

    assert_eq!(outcome.pane, pane);
    assert_eq!(items_of(&registry, to)[0][0], moving);
}

#[test]
fn wrong_source_workspace_is_rejected_without_change() {
    let mut registry = WindowContextRegistry::new();
    let a = add_window(&mut registry, 1, &[1, 1], None);
    let moving = a.surfaces[0][0];
    let mut request = MoveRequest::new(moving, a.workspaces[1]);
    request.from_workspace = Some(a.workspaces[1]);

    let err = move_surface(&mut registry, &request).unwrap_err();
    assert!(matches!(err, TransferError::SourceMismatch(_)));
    assert_eq!(registry.locate_surface(moving), Some((a.id, a.workspaces[0])));
}

#[test]
fn unknown_surface_or_workspace_is_rejected() {
    let mut registry = WindowContextRegistry::new();
    let a = add_window(&mut registry, 1, &[1], None);
    let ghost = SurfaceId::new();
    assert_eq!(
        move_surface(&mut registry, &MoveRequest::new(ghost, a.workspaces[0])).unwrap_err(),
        TransferError::SurfaceNotFound(ghost.to_string())
    );
    let nowhere = WorkspaceId::new();
    assert_eq!(
        move_surface(&mut registry, &MoveRequest::new(a.surfaces[0][0], nowhere)).unwrap_err(),
        TransferError::WorkspaceNotFound(nowhere.to_string())
    );
}

#[test]
fn refused_attach_restores_original_position() {
    let flags = Flags::default();
    let mut registry = WindowContextRegistry::new();
    let a = add_window(&mut registry, 1, &[3], None);
    let b = add_window(&mut registry, 2, &[1], Some(&flags));
    let source = a.workspaces[0];
    let before = items_of(&registry, source);
    let moving = a.surfaces[0][1];

    flags.refuse_attach.set(true);
    let err = move_surface(&mut registry, &MoveRequest::new(moving, b.workspaces[0])).unwrap_err();

    assert_eq!(err, TransferError::AttachFailed(moving.to_string()));
    assert_eq!(items_of(&registry, source), before);
    assert!(registry.workspace(source).unwrap().contains_surface(moving));
    assert_eq!(registry.workspace(b.workspaces[0]).unwrap().surface_count(), 1);
    assert_eq!(registry.locate_surface(moving), Some((a.id, source)));
}

#[test]
fn refused_attach_of_only_surface_keeps_source_workspace() {
    let flags = Flags::default();
    let mut registry = WindowContextRegistry::new();
    let a = add_window(&mut registry, 1, &[1], None);
    let b = add_window(&mut registry, 2, &[1], Some(&flags));
    let moving = a.surfaces[0][0];

    flags.refuse_attach.set(true);
    assert!(move_surface(&mut registry, &MoveRequest::new(moving, b.workspaces[0])).is_err());

    let context = registry.find(a.id).unwrap();
    assert_eq!(context.workspace_manager.workspace_count(), 1);
    assert_eq!(registry.workspace(a.workspaces[0]).unwrap().focused_surface(), Some(moving));
}

#[test]
fn refused_attach_restores_split_source_layout() {
    let flags = Flags::default();
    let mut registry = WindowContextRegistry::new();
    let a = add_window(&mut registry, 1, &[2], None);
    let b = add_window(&mut registry, 2, &[1], Some(&flags));
    let source = a.workspaces[0];
    let (left, right) = (a.surfaces[0][0], a.surfaces[0][1]);
    let pane = registry.workspace(source).unwrap().pane_tree().all_panes()[0];
    registry
        .workspace_mut(source)
        .unwrap()
        .pane_tree_mut()
        .split(pane, SplitOrientation::Horizontal, right, false)
        .unwrap();
    let before = items_of(&registry, source);
    assert_eq!(before, vec![vec![left], vec![right]]);
    let panes_before = registry.workspace(source).unwrap().pane_tree().all_panes();

    flags.refuse_attach.set(true);
    assert!(move_surface(&mut registry, &MoveRequest::new(right, b.workspaces[0])).is_err());

    let workspace = registry.workspace(source).unwrap();
    assert_eq!(items_of(&registry, source), before);
    assert_eq!(workspace.pane_tree().all_panes(), panes_before);
    assert_eq!(workspace.focused_surface(), Some(right));
}

#[test]
fn refused_attach_keeps_source_focus() {
    let flags = Flags::default();
    let mut registry = WindowContextRegistry::new();
    let a = add_window(&mut registry, 1, &[3], None);
    let b = add_window(&mut registry, 2, &[1], Some(&flags));
    let source = a.workspaces[0];
    let last = a.surfaces[0][2];
    assert_eq!(registry.workspace(source).unwrap().focused_surface(), Some(last));

    flags.refuse_attach.set(true);
    assert!(move_surface(&mut registry, &MoveRequest::new(a.surfaces[0][0], b.workspaces[0])).is_err());

    assert_eq!(registry.workspace(source).unwrap().focused_surface(), Some(last));
}

#[test]
fn refused_split_keeps_destination_selection() {
    let flags = Flags::default();
    let mut registry = WindowContextRegistry::new();
    let a = add_window(&mut registry, 1, &[2], None);
    let b = add_window(&mut registry, 2, &[2], Some(&flags));
    let destination = b.workspaces[0];
    let first = b.surfaces[0][0];
    registry.workspace_mut(destination).unwrap().focus_surface(first);

    flags.refuse_split.set(true);
    let mut request = MoveRequest::new(a.surfaces[0][0], destination);
    request.split = Some(SplitRequest {
        orientation: SplitOrientation::Horizontal,
        insert_first: false,
    });
    assert!(move_surface(&mut registry, &request).is_err());

    assert_eq!(registry.workspace(destination).unwrap().focused_surface(), Some(first));
    assert_eq!(items_of(&registry, destination), vec![b.surfaces[0].clone()]);
}

#[test]
fn successful_move_collapses_emptied_source_pane() {
    let mut registry = WindowContextRegistry::new();
    let a = add_window(&mut registry, 1, &[2], None);
    let b = add_window(&mut registry, 2, &[1], None);
    let source = a.workspaces[0];
    let (left, right) = (a.surfaces[0][0], a.surfaces[0][1]);
    let pane = registry.workspace(source).unwrap().pane_tree().all_panes()[0];
    registry
        .workspace_mut(source)
        .unwrap()
        .pane_tree_mut()
        .split(pane, SplitOrientation::Horizontal, right, false)
        .unwrap();

    move_surface(&mut registry, &MoveRequest::new(right, b.workspaces[0])).unwrap();

    assert_eq!(items_of(&registry, source), vec![vec![left]]);
    assert_eq!(registry.workspace(source).unwrap().focused_surface(), Some(left));
}

#[test]
fn refused_split_rolls_back_cross_workspace_move() {
    let flags = Flags::default();
    let mut registry = WindowContextRegistry::new();
    let a = add_window(&mut registry, 1, &[3], None);
    let b = add_window(&mut registry, 2, &[1], Some(&flags));
    let source = a.workspaces[0];
    let before = items_of(&registry, source);
    let moving = a.surfaces[0][1];

    flags.refuse_split.set(true);
    let mut request = MoveRequest::new(moving, b.workspaces[0]);
    request.split = Some(SplitRequest {
        orientation: SplitOrientation::Vertical,
        insert_first: true,
    });
    let err = move_surface(&mut registry, &request).unwrap_err();

    assert_eq!(err, TransferError::SplitFailed(moving.to_string()));
    assert_eq!(items_of(&registry, source), before);
    assert_eq!(items_of(&registry, b.workspaces[0]), vec![b.surfaces[0].clone()]);
}

#[test]
fn emptied_source_workspace_is_closed() {
    let mut registry = WindowContextRegistry::new();
    let a = add_window(&mut registry, 1, &[1, 1], None);
    let b = add_window(&mut registry, 2, &[1], None);

    let outcome = move_surface(&mut registry, &MoveRequest::new(a.surfaces[0][0], b.workspaces[0])).unwrap();

    assert_eq!(outcome.cleanup, SourceCleanup::ClosedWorkspace(a.workspaces[0]));
    let context = registry.find(a.id).unwrap();
    assert_eq!(context.workspace_manager.workspace_count(), 1);
    assert!(!context.workspace_manager.contains(a.workspaces[0]));
}

#[test]
fn emptied_source_window_is_left_to_caller() {
    let mut registry = WindowContextRegistry::new();
    let a = add_window(&mut registry, 1, &[1], None);
    let b = add_window(&mut registry, 2, &[1], None);

    let outcome = move_surface(&mut registry, &MoveRequest::new(a.surfaces[0][0], b.workspaces[0])).unwrap();

    assert_eq!(outcome.cleanup, SourceCleanup::CloseWindow(a.id));
    assert!(registry.find(a.id).is_some());
    assert_eq!(registry.workspace(b.workspaces[0]).unwrap().surface_count(), 2);
}

#[test]
fn workspace_moves_to_other_window() {
    let mut registry = WindowContextRegistry::new();
    let a = add_window(&mut registry, 1, &[1, 2], None);
    let b = add_window(&mut registry, 2, &[1], None);
    let moving = a.workspaces[1];

    let outcome = move_workspace_to_window(&mut registry, moving, b.id, true).unwrap();

    assert_eq!(outcome.source_window, a.id);
    assert_eq!(outcome.cleanup, SourceCleanup::None);
    assert_eq!(registry.locate_workspace(moving), Some(b.id));
    assert_eq!(registry.find(b.id).unwrap().workspace_manager.selected_id(), Some(moving));
    assert_eq!(registry.workspace(moving).unwrap().surface_count(), 2);
    assert_eq!(registry.find(a.id).unwrap().workspace_manager.workspace_count(), 1);
}

#[test]
fn moving_last_workspace_asks_to_close_source_window() {
    let mut registry = WindowContextRegistry::new();
    let a = add_window(&mut registry, 1, &[1], None);
    let b = add_window(&mut registry, 2, &[1], None);
    let selected = registry.find(b.id).unwrap().workspace_manager.selected_id();

    let outcome = move_workspace_to_window(&mut registry, a.workspaces[0], b.id, false).unwrap();

    assert_eq!(outcome.cleanup, SourceCleanup::CloseWindow(a.id));
    assert_eq!(registry.find(b.id).unwrap().workspace_manager.selected_id(), selected);
}

#[test]
fn workspace_move_errors() {
    let mut registry = WindowContextRegistry::new();
    let a = add_window(&mut registry, 1, &[1], None);
    let ws = a.workspaces[0];

    assert_eq!(
        move_workspace_to_window(&mut registry, ws, a.id, true).unwrap_err(),
        TransferError::SameWindow(ws.to_string())
    );
    let ghost_window = WindowId::new();
    assert_eq!(
        move_workspace_to_window(&mut registry, ws, ghost_window, true).unwrap_err(),
        TransferError::WindowNotFound(ghost_window.to_string())
    );
    let ghost_ws = WorkspaceId::new();
    assert_eq!(
        move_workspace_to_window(&mut registry, ghost_ws, a.id, true).unwrap_err(),
        TransferError::WorkspaceNotFound(ghost_ws.to_string())
    );
    assert_eq!(registry.locate_workspace(ws), Some(a.id));
}
