//! Pane-tree service.
//!
//! The split layout of a workspace is owned by an external service; the core
//! only talks to it through [`PaneTree`]. [`StackPaneTree`] is the in-process
//! implementation used by the headless shell: panes are kept in visual order,
//! each pane holds an ordered stack of surfaces with one selected.

use std::fmt;

use crate::types::workspace::{PaneId, SplitOrientation, SurfaceId, TransferHandle};

/// Operations the core needs from a workspace's split-layout tree.
pub trait PaneTree: fmt::Debug {
    fn all_panes(&self) -> Vec<PaneId>;
    fn focused_pane(&self) -> Option<PaneId>;
    fn focus_pane(&mut self, pane: PaneId) -> bool;
    fn items(&self, pane: PaneId) -> Vec<SurfaceId>;
    /// Pane and index currently hosting `item`.
    fn locate(&self, item: SurfaceId) -> Option<(PaneId, usize)>;
    fn selected_item(&self, pane: PaneId) -> Option<SurfaceId>;
    /// Orientation of the split that created `pane`; `None` for the root pane.
    fn orientation(&self, _pane: PaneId) -> Option<SplitOrientation> {
        None
    }
    /// Selects `item` in its pane and focuses that pane.
    fn select_item(&mut self, item: SurfaceId) -> bool;
    /// Splits `pane`, moving `moving` into the new side. Returns the new pane.
    fn split(
        &mut self,
        pane: PaneId,
        orientation: SplitOrientation,
        moving: SurfaceId,
        insert_first: bool,
    ) -> Option<PaneId>;
    /// Repositions an item already in this tree.
    fn move_item(&mut self, item: SurfaceId, pane: PaneId, index: Option<usize>) -> bool;
    /// Removes `item`; its pane stays, even when left empty.
    fn detach(&mut self, item: SurfaceId) -> Option<TransferHandle>;
    /// Hosts a detached item in `pane` at `index` (append when `None`).
    ///
    /// On failure the handle is handed back untouched.
    fn attach(
        &mut self,
        handle: TransferHandle,
        pane: PaneId,
        index: Option<usize>,
    ) -> Result<SurfaceId, TransferHandle>;
    /// Collapses empty panes, keeping at least one pane.
    fn prune_empty(&mut self);

    /// True when no pane hosts any item.
    fn is_empty(&self) -> bool {
        self.all_panes().iter().all(|pane| self.items(*pane).is_empty())
    }
}

/// Creates empty pane trees (one empty pane) for new workspaces.
pub trait PaneTreeFactory {
    fn create(&self) -> Box<dyn PaneTree>;
}

#[derive(Debug)]
struct PaneSlot {
    id: PaneId,
    items: Vec<(SurfaceId, String)>,
    selected: Option<SurfaceId>,
    orientation: Option<SplitOrientation>,
}

impl PaneSlot {
    fn new(id: PaneId, orientation: Option<SplitOrientation>) -> Self {
        Self {
            id,
            items: Vec::new(),
            selected: None,
            orientation,
        }
    }

    fn insert(&mut self, item: SurfaceId, title: String, index: Option<usize>) {
        let at = index.unwrap_or(self.items.len()).min(self.items.len());
        self.items.insert(at, (item, title));
        self.selected = Some(item);
    }

    fn remove(&mut self, item: SurfaceId) -> Option<(usize, String)> {
        let index = self.items.iter().position(|(id, _)| *id == item)?;
        let (_, title) = self.items.remove(index);
        if self.selected == Some(item) {
            let neighbor = index.min(self.items.len().saturating_sub(1));
            self.selected = self.items.get(neighbor).map(|(id, _)| *id);
        }
        Some((index, title))
    }
}

/// Flat, ordered pane list. Empty panes collapse when an item leaves them,
/// as long as another pane remains (a split of a pane's only item
/// therefore replaces that pane).
#[derive(Debug)]
pub struct StackPaneTree {
    panes: Vec<PaneSlot>,
    focused: Option<PaneId>,
    next_pane: u64,
}

impl StackPaneTree {
    pub fn new() -> Self {
        Self {
            panes: vec![PaneSlot::new(PaneId(1), None)],
            focused: Some(PaneId(1)),
            next_pane: 2,
        }
    }

    fn slot_index(&self, pane: PaneId) -> Option<usize> {
        self.panes.iter().position(|slot| slot.id == pane)
    }

    fn title_of(&self, item: SurfaceId) -> Option<String> {
        self.panes
            .iter()
            .flat_map(|slot| slot.items.iter())
            .find(|(id, _)| *id == item)
            .map(|(_, title)| title.clone())
    }

    fn allocate(&mut self) -> PaneId {
        let id = PaneId(self.next_pane);
        self.next_pane += 1;
        id
    }

    fn collapse_if_empty(&mut self, pane: PaneId) {
        if self.panes.len() < 2 {
            return;
        }
        if let Some(index) = self.slot_index(pane) {
            if self.panes[index].items.is_empty() {
                self.panes.remove(index);
                if self.focused == Some(pane) {
                    let neighbor = index.min(self.panes.len() - 1);
                    self.focused = Some(self.panes[neighbor].id);
                }
            }
        }
    }
}

impl Default for StackPaneTree {
    fn default() -> Self {
        Self::new()
    }
}

impl PaneTree for StackPaneTree {
    fn all_panes(&self) -> Vec<PaneId> {
        self.panes.iter().map(|slot| slot.id).collect()
    }

    fn focused_pane(&self) -> Option<PaneId> {
        self.focused.filter(|pane| self.slot_index(*pane).is_some())
    }

    fn focus_pane(&mut self, pane: PaneId) -> bool {
        if self.slot_index(pane).is_none() {
            return false;
        }
        self.focused = Some(pane);
        true
    }

    fn items(&self, pane: PaneId) -> Vec<SurfaceId> {
        self.slot_index(pane)
            .map(|i| self.panes[i].items.iter().map(|(id, _)| *id).collect())
            .unwrap_or_default()
    }

    fn locate(&self, item: SurfaceId) -> Option<(PaneId, usize)> {
        self.panes.iter().find_map(|slot| {
            slot.items
                .iter()
                .position(|(id, _)| *id == item)
                .map(|index| (slot.id, index))
        })
    }

    fn selected_item(&self, pane: PaneId) -> Option<SurfaceId> {
        self.slot_index(pane).and_then(|i| self.panes[i].selected)
    }

    fn orientation(&self, pane: PaneId) -> Option<SplitOrientation> {
        self.slot_index(pane).and_then(|i| self.panes[i].orientation)
    }

    fn select_item(&mut self, item: SurfaceId) -> bool {
        let Some((pane, _)) = self.locate(item) else {
            return false;
        };
        if let Some(index) = self.slot_index(pane) {
            self.panes[index].selected = Some(item);
        }
        self.focused = Some(pane);
        true
    }

    fn split(
        &mut self,
        pane: PaneId,
        orientation: SplitOrientation,
        moving: SurfaceId,
        insert_first: bool,
    ) -> Option<PaneId> {
        let anchor = self.slot_index(pane)?;
        let (origin, _) = self.locate(moving)?;
        let origin_index = self.slot_index(origin)?;
        let (_, title) = self.panes[origin_index].remove(moving)?;

        let new_pane = self.allocate();
        let mut slot = PaneSlot::new(new_pane, Some(orientation));
        slot.insert(moving, title, None);
        let at = if insert_first { anchor } else { anchor + 1 };
        self.panes.insert(at, slot);
        self.focused = Some(new_pane);
        self.collapse_if_empty(origin);
        Some(new_pane)
    }

    fn move_item(&mut self, item: SurfaceId, pane: PaneId, index: Option<usize>) -> bool {
        if self.slot_index(pane).is_none() {
            return false;
        }
        let Some((origin, _)) = self.locate(item) else {
            return false;
        };
        let title = match self
            .slot_index(origin)
            .and_then(|i| self.panes[i].remove(item))
        {
            Some((_, title)) => title,
            None => return false,
        };
        if let Some(target) = self.slot_index(pane) {
            self.panes[target].insert(item, title, index);
        }
        self.focused = Some(pane);
        if origin != pane {
            self.collapse_if_empty(origin);
        }
        true
    }

    fn detach(&mut self, item: SurfaceId) -> Option<TransferHandle> {
        let (origin, _) = self.locate(item)?;
        let index = self.slot_index(origin)?;
        let (_, title) = self.panes[index].remove(item)?;
        Some(TransferHandle::new(item, title))
    }

    fn attach(
        &mut self,
        handle: TransferHandle,
        pane: PaneId,
        index: Option<usize>,
    ) -> Result<SurfaceId, TransferHandle> {
        if self.title_of(handle.item()).is_some() {
            return Err(handle);
        }
        let Some(slot) = self.slot_index(pane) else {
            return Err(handle);
        };
        let item = handle.item();
        self.panes[slot].insert(item, handle.title().to_string(), index);
        Ok(item)
    }

    fn prune_empty(&mut self) {
        let empty: Vec<PaneId> = self
            .panes
            .iter()
            .filter(|slot| slot.items.is_empty())
            .map(|slot| slot.id)
            .collect();
        for pane in empty {
            self.collapse_if_empty(pane);
        }
    }
}

/// Factory for [`StackPaneTree`].
#[derive(Debug, Default, Clone, Copy)]
pub struct StackPaneTreeFactory;

impl PaneTreeFactory for StackPaneTreeFactory {
    fn create(&self) -> Box<dyn PaneTree> {
        Box::new(StackPaneTree::new())
    }
}
