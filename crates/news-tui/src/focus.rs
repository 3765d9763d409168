//! FocusRing — keyboard focus cycling between panes.

use crate::action::ComponentId;

pub struct FocusRing {
    items: Vec<ComponentId>,
    current: usize,
}

impl FocusRing {
    pub fn new(items: Vec<ComponentId>) -> Self {
        Self { items, current: 0 }
    }

    pub fn current(&self) -> Option<ComponentId> {
        self.items.get(self.current).copied()
    }

    pub fn next(&mut self) -> Option<ComponentId> {
        if self.items.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.items.len();
        self.current()
    }

    pub fn prev(&mut self) -> Option<ComponentId> {
        if self.items.is_empty() {
            return None;
        }
        self.current = self.current.checked_sub(1).unwrap_or(self.items.len() - 1);
        self.current()
    }

    /// Focus `id` if it is in the ring.
    pub fn set(&mut self, id: ComponentId) {
        if let Some(pos) = self.items.iter().position(|&x| x == id) {
            self.current = pos;
        }
    }

    pub fn is_focused(&self, id: ComponentId) -> bool {
        self.current() == Some(id)
    }

    /// Add or remove `id` (the log panel joins the ring only while open).
    /// Focus falls back to the first item when the focused one is removed.
    pub fn set_present(&mut self, id: ComponentId, present: bool) {
        let focused = self.current();
        let has = self.items.contains(&id);
        if present && !has {
            self.items.push(id);
        } else if !present && has {
            self.items.retain(|&x| x != id);
        }
        self.current = focused
            .and_then(|f| self.items.iter().position(|&x| x == f))
            .unwrap_or(0);
    }
}
