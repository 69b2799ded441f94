//! Window server boundary.
//!
//! Everything the core needs from the OS windowing layer: window creation and
//! destruction, key/main window status, window frames and the attached
//! displays. [`HeadlessWindowServer`] keeps all of it in memory.

use std::collections::BTreeMap;

use crate::types::geometry::{DisplayDescriptor, Rect};
use crate::types::window::WindowHandle;

pub trait WindowServer {
    fn create_window(&mut self, frame: Rect) -> WindowHandle;
    fn close_window(&mut self, handle: WindowHandle) -> bool;
    /// The window receiving keyboard input.
    fn key_window(&self) -> Option<WindowHandle>;
    /// The frontmost document window; may differ from the key window.
    fn main_window(&self) -> Option<WindowHandle>;
    fn make_key(&mut self, handle: WindowHandle) -> bool;
    fn frame(&self, handle: WindowHandle) -> Option<Rect>;
    fn set_frame(&mut self, handle: WindowHandle, frame: Rect) -> bool;
    fn displays(&self) -> Vec<DisplayDescriptor>;
    /// The display the menu bar lives on; fallback target for restores.
    fn main_display(&self) -> Option<DisplayDescriptor>;

    /// Display hosting most of the window's area.
    fn display_for(&self, handle: WindowHandle) -> Option<DisplayDescriptor> {
        let frame = self.frame(handle)?;
        self.displays()
            .into_iter()
            .map(|display| (frame.intersection_area(&display.frame), display))
            .filter(|(area, _)| *area > 0.0)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, display)| display)
    }
}

/// In-memory window server used by the headless shell and tests.
///
/// Window numbers start at 1 and are never reused.
#[derive(Debug)]
pub struct HeadlessWindowServer {
    windows: BTreeMap<WindowHandle, Rect>,
    displays: Vec<DisplayDescriptor>,
    key: Option<WindowHandle>,
    main: Option<WindowHandle>,
    next_number: u64,
}

impl HeadlessWindowServer {
    pub fn new(displays: Vec<DisplayDescriptor>) -> Self {
        Self {
            windows: BTreeMap::new(),
            displays,
            key: None,
            main: None,
            next_number: 1,
        }
    }

    /// A single 1440x900 display with a 25pt menu bar.
    pub fn single_display() -> Self {
        Self::new(vec![DisplayDescriptor::new(
            Some(1),
            Rect::new(0.0, 0.0, 1440.0, 900.0),
            Rect::new(0.0, 0.0, 1440.0, 875.0),
        )])
    }

    pub fn set_displays(&mut self, displays: Vec<DisplayDescriptor>) {
        self.displays = displays;
    }

    /// Simulates the OS moving key status without going through the shell.
    pub fn set_key_window(&mut self, handle: Option<WindowHandle>) {
        self.key = handle.filter(|h| self.windows.contains_key(h));
    }

    pub fn set_main_window(&mut self, handle: Option<WindowHandle>) {
        self.main = handle.filter(|h| self.windows.contains_key(h));
    }

    /// Simulates the OS reassigning a window's number.
    pub fn renumber(&mut self, handle: WindowHandle) -> Option<WindowHandle> {
        let frame = self.windows.remove(&handle)?;
        let fresh = WindowHandle(self.next_number);
        self.next_number += 1;
        self.windows.insert(fresh, frame);
        if self.key == Some(handle) {
            self.key = Some(fresh);
        }
        if self.main == Some(handle) {
            self.main = Some(fresh);
        }
        Some(fresh)
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }
}

impl Default for HeadlessWindowServer {
    fn default() -> Self {
        Self::single_display()
    }
}

impl WindowServer for HeadlessWindowServer {
    fn create_window(&mut self, frame: Rect) -> WindowHandle {
        let handle = WindowHandle(self.next_number);
        self.next_number += 1;
        self.windows.insert(handle, frame);
        handle
    }

    fn close_window(&mut self, handle: WindowHandle) -> bool {
        if self.windows.remove(&handle).is_none() {
            return false;
        }
        if self.key == Some(handle) {
            self.key = None;
        }
        if self.main == Some(handle) {
            self.main = None;
        }
        true
    }

    fn key_window(&self) -> Option<WindowHandle> {
        self.key
    }

    fn main_window(&self) -> Option<WindowHandle> {
        self.main
    }

    fn make_key(&mut self, handle: WindowHandle) -> bool {
        if !self.windows.contains_key(&handle) {
            return false;
        }
        self.key = Some(handle);
        self.main = Some(handle);
        true
    }

    fn frame(&self, handle: WindowHandle) -> Option<Rect> {
        self.windows.get(&handle).copied()
    }

    fn set_frame(&mut self, handle: WindowHandle, frame: Rect) -> bool {
        match self.windows.get_mut(&handle) {
            Some(slot) => {
                *slot = frame;
                true
            }
            None => false,
        }
    }

    fn displays(&self) -> Vec<DisplayDescriptor> {
        self.displays.clone()
    }

    fn main_display(&self) -> Option<DisplayDescriptor> {
        self.displays.first().cloned()
    }
}
