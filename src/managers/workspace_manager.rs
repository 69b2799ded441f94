use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::debug;

use crate::services::pane_tree::{PaneTree, PaneTreeFactory};
use crate::types::errors::WorkspaceError;
use crate::types::session::{PaneSnapshot, SurfaceSnapshot, WorkspaceManagerSnapshot, WorkspaceSnapshot};
use crate::types::workspace::{
    ManagerId, PaneId, SplitOrientation, Surface, SurfaceId, TransferHandle, WorkspaceId,
};

/// A tab: a pane tree plus the surfaces it hosts.
///
/// The surface map and the pane tree always describe the same set of ids.
pub struct Workspace {
    id: WorkspaceId,
    title: String,
    surfaces: HashMap<SurfaceId, Surface>,
    pane_tree: Box<dyn PaneTree>,
}

impl fmt::Debug for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("surfaces", &self.surfaces.len())
            .field("pane_tree", &self.pane_tree)
            .finish()
    }
}

impl Workspace {
    pub fn new(title: &str, pane_tree: Box<dyn PaneTree>) -> Self {
        Self {
            id: WorkspaceId::new(),
            title: title.to_string(),
            surfaces: HashMap::new(),
            pane_tree,
        }
    }

    pub fn id(&self) -> WorkspaceId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    pub fn surface(&self, id: SurfaceId) -> Option<&Surface> {
        self.surfaces.get(&id)
    }

    pub fn contains_surface(&self, id: SurfaceId) -> bool {
        self.surfaces.contains_key(&id)
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Surfaces in pane order, then stack order within each pane.
    pub fn ordered_surfaces(&self) -> Vec<&Surface> {
        self.pane_tree
            .all_panes()
            .into_iter()
            .flat_map(|pane| self.pane_tree.items(pane))
            .filter_map(|id| self.surfaces.get(&id))
            .collect()
    }

    pub fn pane_tree(&self) -> &dyn PaneTree {
        self.pane_tree.as_ref()
    }

    pub fn pane_tree_mut(&mut self) -> &mut dyn PaneTree {
        self.pane_tree.as_mut()
    }

    /// `pane` if it exists, else the focused pane, else the first pane.
    pub fn resolve_pane(&self, pane: Option<PaneId>) -> Option<PaneId> {
        let panes = self.pane_tree.all_panes();
        pane.filter(|p| panes.contains(p))
            .or_else(|| self.pane_tree.focused_pane())
            .or_else(|| panes.first().copied())
    }

    /// Hosts a new surface in `pane` (see [`Workspace::resolve_pane`]).
    pub fn add_surface(
        &mut self,
        surface: Surface,
        pane: Option<PaneId>,
        index: Option<usize>,
    ) -> Result<SurfaceId, WorkspaceError> {
        let target = self
            .resolve_pane(pane)
            .ok_or_else(|| WorkspaceError::PaneRejected(format!("no pane in {}", self.id)))?;
        let handle = TransferHandle::new(surface.id, surface.title.clone());
        let id = self
            .pane_tree
            .attach(handle, target, index)
            .map_err(|h| WorkspaceError::PaneRejected(h.item().to_string()))?;
        self.pane_tree.select_item(id);
        self.surfaces.insert(id, surface);
        Ok(id)
    }

    /// Closes a surface: removes it from the pane tree and the surface map.
    pub fn close_surface(&mut self, id: SurfaceId) -> Result<Surface, WorkspaceError> {
        if !self.surfaces.contains_key(&id) {
            return Err(WorkspaceError::SurfaceNotFound(id.to_string()));
        }
        self.pane_tree.detach(id);
        self.pane_tree.prune_empty();
        self.surfaces
            .remove(&id)
            .ok_or_else(|| WorkspaceError::SurfaceNotFound(id.to_string()))
    }

    pub(crate) fn take_surface(&mut self, id: SurfaceId) -> Option<Surface> {
        self.surfaces.remove(&id)
    }

    pub(crate) fn insert_surface(&mut self, surface: Surface) {
        self.surfaces.insert(surface.id, surface);
    }

    pub fn focused_surface(&self) -> Option<SurfaceId> {
        let pane = self.pane_tree.focused_pane()?;
        self.pane_tree.selected_item(pane)
    }

    pub fn focus_surface(&mut self, id: SurfaceId) -> bool {
        self.surfaces.contains_key(&id) && self.pane_tree.select_item(id)
    }

    pub fn is_empty(&self) -> bool {
        self.pane_tree.is_empty()
    }

    pub fn snapshot(&self) -> WorkspaceSnapshot {
        let panes = self.pane_tree.all_panes();
        let focused = self.pane_tree.focused_pane();
        let pane_snapshots = panes
            .iter()
            .map(|pane| {
                let items = self.pane_tree.items(*pane);
                let selected = self.pane_tree.selected_item(*pane);
                PaneSnapshot {
                    selected_index: selected.and_then(|s| items.iter().position(|i| *i == s)),
                    surfaces: items
                        .iter()
                        .filter_map(|id| self.surfaces.get(id))
                        .map(|s| SurfaceSnapshot {
                            id: s.id,
                            title: s.title.clone(),
                            kind: s.kind.clone(),
                        })
                        .collect(),
                    orientation: self.pane_tree.orientation(*pane),
                }
            })
            .collect();
        WorkspaceSnapshot {
            title: self.title.clone(),
            panes: pane_snapshots,
            focused_pane_index: focused.and_then(|f| panes.iter().position(|p| *p == f)),
        }
    }

    /// Rebuilds a workspace inside a fresh (single empty pane) tree.
    ///
    /// Each non-empty pane after the first is recreated by splitting the
    /// previous pane with its first surface. Duplicate ids are dropped.
    pub fn from_snapshot(snapshot: &WorkspaceSnapshot, pane_tree: Box<dyn PaneTree>) -> Self {
        Self::restore(snapshot, pane_tree, &mut HashSet::new())
    }

    /// Like [`Workspace::from_snapshot`], skipping ids already in `seen` and
    /// adding every restored id to it.
    pub fn restore(
        snapshot: &WorkspaceSnapshot,
        pane_tree: Box<dyn PaneTree>,
        seen: &mut HashSet<SurfaceId>,
    ) -> Self {
        let mut workspace = Workspace::new(&snapshot.title, pane_tree);
        let mut restored_panes: Vec<Option<PaneId>> = Vec::with_capacity(snapshot.panes.len());
        let mut previous: Option<PaneId> = None;

        for pane_snapshot in &snapshot.panes {
            let mut surfaces = pane_snapshot.surfaces.iter();
            let Some(first) = surfaces.next() else {
                restored_panes.push(None);
                continue;
            };
            let pane = match previous {
                None => workspace
                    .restore_surface(first, None, seen)
                    .and_then(|_| workspace.pane_tree.locate(first.id).map(|(p, _)| p)),
                Some(anchor) => match workspace.restore_surface(first, Some(anchor), seen) {
                    Some(id) => {
                        let orientation = pane_snapshot.orientation.unwrap_or(SplitOrientation::Horizontal);
                        workspace
                            .pane_tree
                            .split(anchor, orientation, id, false)
                            .or(Some(anchor))
                    }
                    None => None,
                },
            };
            let Some(pane) = pane else {
                restored_panes.push(None);
                continue;
            };
            for surface in surfaces {
                workspace.restore_surface(surface, Some(pane), seen);
            }
            restored_panes.push(Some(pane));
            previous = Some(pane);
        }

        // Splitting borrows the previous pane, so selections go last.
        for (pane, pane_snapshot) in restored_panes.iter().zip(&snapshot.panes) {
            let Some(pane) = pane else { continue };
            let items = workspace.pane_tree.items(*pane);
            let selected = pane_snapshot
                .selected_index
                .and_then(|i| items.get(i).copied())
                .or_else(|| items.first().copied());
            if let Some(selected) = selected {
                workspace.pane_tree.select_item(selected);
            }
        }

        let focus = snapshot
            .focused_pane_index
            .and_then(|i| restored_panes.get(i).copied().flatten())
            .or(previous);
        if let Some(pane) = focus {
            workspace.pane_tree.focus_pane(pane);
        }
        workspace
    }

    fn restore_surface(
        &mut self,
        snapshot: &SurfaceSnapshot,
        pane: Option<PaneId>,
        seen: &mut HashSet<SurfaceId>,
    ) -> Option<SurfaceId> {
        if seen.contains(&snapshot.id) || self.surfaces.contains_key(&snapshot.id) {
            debug!(surface_id = %snapshot.id, "dropping duplicate surface from snapshot");
            return None;
        }
        let surface = Surface {
            id: snapshot.id,
            title: snapshot.title.clone(),
            kind: snapshot.kind.clone(),
        };
        let id = self.add_surface(surface, pane, None).ok()?;
        seen.insert(id);
        Some(id)
    }
}

/// Trait defining the workspace management interface.
pub trait WorkspaceManagerTrait {
    fn create_workspace(&mut self, title: Option<&str>, pane_tree: Box<dyn PaneTree>, select: bool) -> WorkspaceId;
    fn add_workspace(&mut self, workspace: Workspace, select: bool) -> WorkspaceId;
    fn close_workspace(&mut self, workspace_id: WorkspaceId) -> Result<Workspace, WorkspaceError>;
    fn select_workspace(&mut self, workspace_id: WorkspaceId) -> Result<(), WorkspaceError>;
    fn select_next(&mut self) -> Option<WorkspaceId>;
    fn select_previous(&mut self) -> Option<WorkspaceId>;
    fn select_index(&mut self, index: usize) -> Result<WorkspaceId, WorkspaceError>;
    fn reorder_workspace(&mut self, workspace_id: WorkspaceId, new_index: usize) -> Result<(), WorkspaceError>;
    fn rename_workspace(&mut self, workspace_id: WorkspaceId, title: &str) -> Result<(), WorkspaceError>;
    fn workspace(&self, workspace_id: WorkspaceId) -> Option<&Workspace>;
    fn workspace_mut(&mut self, workspace_id: WorkspaceId) -> Option<&mut Workspace>;
    fn selected_workspace(&self) -> Option<&Workspace>;
    fn selected_workspace_mut(&mut self) -> Option<&mut Workspace>;
    fn workspace_count(&self) -> usize;
}

/// Ordered workspaces of one window plus the selection pointer.
#[derive(Debug)]
pub struct WorkspaceManager {
    id: ManagerId,
    workspaces: Vec<Workspace>,
    selected: Option<WorkspaceId>,
}

impl WorkspaceManager {
    pub fn new() -> Self {
        Self {
            id: ManagerId::new(),
            workspaces: Vec::new(),
            selected: None,
        }
    }

    pub fn id(&self) -> ManagerId {
        self.id
    }

    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    pub fn workspaces_mut(&mut self) -> impl Iterator<Item = &mut Workspace> {
        self.workspaces.iter_mut()
    }

    pub fn selected_id(&self) -> Option<WorkspaceId> {
        self.selected
    }

    pub fn contains(&self, workspace_id: WorkspaceId) -> bool {
        self.find_index(workspace_id).is_some()
    }

    pub fn workspace_for_surface(&self, surface: SurfaceId) -> Option<WorkspaceId> {
        self.workspaces
            .iter()
            .find(|w| w.contains_surface(surface))
            .map(|w| w.id())
    }

    /// Removes a workspace so it can be handed to another manager.
    pub fn detach_workspace(&mut self, workspace_id: WorkspaceId) -> Result<Workspace, WorkspaceError> {
        self.close_workspace(workspace_id)
    }

    pub fn snapshot(&self) -> WorkspaceManagerSnapshot {
        WorkspaceManagerSnapshot {
            selected_index: self.selected.and_then(|id| self.find_index(id)),
            workspaces: self.workspaces.iter().map(Workspace::snapshot).collect(),
        }
    }

    /// Rebuilds a manager; workspaces whose surfaces all failed to restore
    /// are dropped.
    pub fn from_snapshot(snapshot: &WorkspaceManagerSnapshot, factory: &dyn PaneTreeFactory) -> Self {
        Self::restore(snapshot, factory, &mut HashSet::new())
    }

    /// Rebuilds a manager as one of several windows: surface ids in `seen`
    /// are dropped and restored ids are added to it.
    pub fn restore(
        snapshot: &WorkspaceManagerSnapshot,
        factory: &dyn PaneTreeFactory,
        seen: &mut HashSet<SurfaceId>,
    ) -> Self {
        let mut manager = WorkspaceManager::new();
        let mut kept: Vec<Option<WorkspaceId>> = Vec::with_capacity(snapshot.workspaces.len());
        for workspace_snapshot in &snapshot.workspaces {
            let workspace = Workspace::restore(workspace_snapshot, factory.create(), seen);
            if workspace.surface_count() == 0 {
                debug!(title = %workspace_snapshot.title, "skipping empty workspace from snapshot");
                kept.push(None);
                continue;
            }
            kept.push(Some(manager.add_workspace(workspace, false)));
        }
        if let Some(id) = snapshot
            .selected_index
            .and_then(|i| kept.get(i).copied().flatten())
        {
            manager.selected = Some(id);
        }
        manager
    }

    fn find_index(&self, workspace_id: WorkspaceId) -> Option<usize> {
        self.workspaces.iter().position(|w| w.id() == workspace_id)
    }
}

impl Default for WorkspaceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkspaceManagerTrait for WorkspaceManager {
    /// Create an empty workspace. The first workspace is always selected.
    fn create_workspace(&mut self, title: Option<&str>, pane_tree: Box<dyn PaneTree>, select: bool) -> WorkspaceId {
        let title = match title {
            Some(t) => t.to_string(),
            None => format!("Workspace {}", self.workspaces.len() + 1),
        };
        self.add_workspace(Workspace::new(&title, pane_tree), select)
    }

    fn add_workspace(&mut self, workspace: Workspace, select: bool) -> WorkspaceId {
        let id = workspace.id();
        self.workspaces.push(workspace);
        if select || self.selected.is_none() {
            self.selected = Some(id);
        }
        id
    }

    /// Remove a workspace. If it was selected, select the nearest neighbor.
    fn close_workspace(&mut self, workspace_id: WorkspaceId) -> Result<Workspace, WorkspaceError> {
        let index = self
            .find_index(workspace_id)
            .ok_or_else(|| WorkspaceError::NotFound(workspace_id.to_string()))?;
        let removed = self.workspaces.remove(index);

        if self.selected == Some(workspace_id) {
            self.selected = if self.workspaces.is_empty() {
                None
            } else {
                let neighbor = index.min(self.workspaces.len() - 1);
                Some(self.workspaces[neighbor].id())
            };
        }
        Ok(removed)
    }

    fn select_workspace(&mut self, workspace_id: WorkspaceId) -> Result<(), WorkspaceError> {
        if self.find_index(workspace_id).is_none() {
            return Err(WorkspaceError::NotFound(workspace_id.to_string()));
        }
        self.selected = Some(workspace_id);
        Ok(())
    }

    fn select_next(&mut self) -> Option<WorkspaceId> {
        let len = self.workspaces.len();
        if len == 0 {
            return None;
        }
        let current = self.selected.and_then(|id| self.find_index(id)).unwrap_or(len - 1);
        let id = self.workspaces[(current + 1) % len].id();
        self.selected = Some(id);
        Some(id)
    }

    fn select_previous(&mut self) -> Option<WorkspaceId> {
        let len = self.workspaces.len();
        if len == 0 {
            return None;
        }
        let current = self.selected.and_then(|id| self.find_index(id)).unwrap_or(0);
        let id = self.workspaces[(current + len - 1) % len].id();
        self.selected = Some(id);
        Some(id)
    }

    fn select_index(&mut self, index: usize) -> Result<WorkspaceId, WorkspaceError> {
        let id = self
            .workspaces
            .get(index)
            .map(|w| w.id())
            .ok_or(WorkspaceError::InvalidIndex(index))?;
        self.selected = Some(id);
        Ok(id)
    }

    /// Move a workspace to a new position in the sidebar order.
    fn reorder_workspace(&mut self, workspace_id: WorkspaceId, new_index: usize) -> Result<(), WorkspaceError> {
        let index = self
            .find_index(workspace_id)
            .ok_or_else(|| WorkspaceError::NotFound(workspace_id.to_string()))?;
        if new_index >= self.workspaces.len() {
            return Err(WorkspaceError::InvalidIndex(new_index));
        }
        let workspace = self.workspaces.remove(index);
        self.workspaces.insert(new_index, workspace);
        Ok(())
    }

    fn rename_workspace(&mut self, workspace_id: WorkspaceId, title: &str) -> Result<(), WorkspaceError> {
        let workspace = self
            .workspace_mut(workspace_id)
            .ok_or_else(|| WorkspaceError::NotFound(workspace_id.to_string()))?;
        workspace.set_title(title);
        Ok(())
    }

    fn workspace(&self, workspace_id: WorkspaceId) -> Option<&Workspace> {
        self.workspaces.iter().find(|w| w.id() == workspace_id)
    }

    fn workspace_mut(&mut self, workspace_id: WorkspaceId) -> Option<&mut Workspace> {
        self.workspaces.iter_mut().find(|w| w.id() == workspace_id)
    }

    fn selected_workspace(&self) -> Option<&Workspace> {
        self.selected.and_then(|id| self.workspace(id))
    }

    fn selected_workspace_mut(&mut self) -> Option<&mut Workspace> {
        let id = self.selected?;
        self.workspace_mut(id)
    }

    fn workspace_count(&self) -> usize {
        self.workspaces.len()
    }
}
