//! src/controller/focus_navigator.rs
//! Keyboard cursor over the rendered result rows.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use tracing::trace;

/// How a row should be brought into view after a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollRequest {
    /// Smooth motion, row centered in the viewport.
    SmoothCenter,
}

/// Handle bound to one rendered row for the current render cycle.
pub trait FocusableItem {
    /// Equivalent of the user clicking the row.
    fn activate(&mut self);

    fn scroll_into_view(&mut self, request: ScrollRequest);

    /// Visual highlight of the keyboard-active row.
    fn set_focused(&mut self, focused: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Up,
    Down,
    Enter,
}

impl NavKey {
    /// Maps arrow keys and Enter; everything else is not ours.
    #[must_use]
    pub fn from_key_event(event: &KeyEvent) -> Option<Self> {
        if event.kind == KeyEventKind::Release {
            return None;
        }

        match event.code {
            KeyCode::Up => Some(Self::Up),
            KeyCode::Down => Some(Self::Down),
            KeyCode::Enter => Some(Self::Enter),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not handled; the host should process the event normally.
    Ignored,

    /// Cursor moved (or was placed) on this index.
    Moved(usize),

    /// Row at this index was activated. The event is consumed.
    Activated(usize),
}

impl KeyOutcome {
    /// Whether the host must stop propagating the key event.
    #[must_use]
    pub const fn consumed(self) -> bool {
        matches!(self, Self::Activated(_))
    }
}

/// Single-selection cursor. Edges clamp: Down on the last row and Up on
/// the first row keep the cursor where it is.
#[derive(Debug)]
pub struct FocusNavigator<T> {
    items: Vec<T>,
    active: Option<usize>,
    open: bool,
}

impl<T> Default for FocusNavigator<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            active: None,
            open: false,
        }
    }
}

impl<T: FocusableItem> FocusNavigator<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn set_open(&mut self, open: bool) {
        self.open = open;
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub const fn active_index(&self) -> Option<usize> {
        self.active
    }

    #[must_use]
    pub fn active_item(&self) -> Option<&T> {
        self.active.and_then(|i| self.items.get(i))
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [T] {
        &mut self.items
    }

    /// Swap in the rows of a new render cycle. Highlight state of the old
    /// rows is cleared first and the cursor goes back to idle.
    pub fn replace_items(&mut self, items: Vec<T>) {
        self.clear_focus();
        self.items = items;
        self.active = None;
        trace!(rows = self.items.len(), "FocusNavigator: rows replaced");
    }

    /// Drop every row, as on deactivation.
    pub fn clear(&mut self) {
        self.replace_items(Vec::new());
    }

    pub fn handle_key_event(&mut self, event: &KeyEvent) -> KeyOutcome {
        NavKey::from_key_event(event).map_or(KeyOutcome::Ignored, |key| self.handle(key))
    }

    pub fn handle(&mut self, key: NavKey) -> KeyOutcome {
        if !self.open || self.items.is_empty() {
            return KeyOutcome::Ignored;
        }

        trace!(?key, active = ?self.active, "FocusNavigator: key");

        match key {
            NavKey::Up | NavKey::Down => {
                self.clear_focus();

                let index = match self.active {
                    // Idle: the first row becomes active, the move is not applied.
                    None => 0,
                    Some(i) if key == NavKey::Down => (i + 1).min(self.items.len() - 1),
                    Some(i) => i.saturating_sub(1),
                };
                self.set_active(index);

                let item = &mut self.items[index];
                item.scroll_into_view(ScrollRequest::SmoothCenter);
                KeyOutcome::Moved(index)
            }

            NavKey::Enter => {
                let index = self.resolve_active();
                self.items[index].activate();
                KeyOutcome::Activated(index)
            }
        }
    }

    // Caller guarantees a non-empty list.
    fn resolve_active(&mut self) -> usize {
        match self.active {
            Some(i) => i,
            None => {
                self.set_active(0);
                0
            }
        }
    }

    fn set_active(&mut self, index: usize) {
        self.active = Some(index);
        self.items[index].set_focused(true);
    }

    fn clear_focus(&mut self) {
        for item in &mut self.items {
            item.set_focused(false);
        }
    }
}
