//! Editing host collaborator
//!
//! Widgets that follow the document selection (the contextual toolbar)
//! talk to the editor through [`EditingHost`]. [`MemoryHost`] is a
//! self-contained implementation for embedding and tests.

use std::cell::{Cell, RefCell};

use lumen_core::{Emitter, Observable, Value};

use crate::balloon::Rect;

/// What a selection-following widget needs from the editor
///
/// - `selection()` fires `change:range` with `[directChange]`
/// - `editing_view()` carries `isFocused` and fires `render` after every
///   re-render of the editing view
/// - `focus_tracker()` carries `isFocused` for the whole editor UI
pub trait EditingHost {
    fn selection(&self) -> &Emitter;

    fn editing_view(&self) -> &Observable;

    fn focus_tracker(&self) -> &Observable;

    fn is_selection_collapsed(&self) -> bool;

    fn is_selection_backward(&self) -> bool;

    /// On-screen rectangles of the first selection range
    fn selection_rects(&self) -> Vec<Rect>;

    /// Area the overlay must stay inside
    fn limiter(&self) -> Option<Rect>;
}

/// In-memory editing host
pub struct MemoryHost {
    selection: Emitter,
    editing_view: Observable,
    focus_tracker: Observable,
    collapsed: Cell<bool>,
    backward: Cell<bool>,
    rects: RefCell<Vec<Rect>>,
    limiter: Cell<Option<Rect>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            selection: Emitter::new(),
            editing_view: Observable::with_attributes([("isFocused", Value::from(false))]),
            focus_tracker: Observable::with_attributes([("isFocused", Value::from(false))]),
            collapsed: Cell::new(true),
            backward: Cell::new(false),
            rects: RefCell::new(Vec::new()),
            limiter: Cell::new(None),
        }
    }

    /// Replace the selection state without notifying anyone
    pub fn set_selection(&self, collapsed: bool, backward: bool, rects: Vec<Rect>) {
        self.collapsed.set(collapsed);
        self.backward.set(backward);
        *self.rects.borrow_mut() = rects;
    }

    pub fn set_limiter(&self, limiter: Option<Rect>) {
        self.limiter.set(limiter);
    }

    /// Focus or blur both the editing view and the editor UI
    pub fn set_focused(&self, focused: bool) {
        for observable in [&self.editing_view, &self.focus_tracker] {
            if let Err(err) = observable.set("isFocused", focused) {
                tracing::warn!(%err, "focus state rejected");
            }
        }
    }

    pub fn fire_selection_change(&self, direct_change: bool) {
        self.selection
            .fire("change:range", &[Value::from(direct_change)]);
    }

    pub fn fire_render(&self) {
        self.editing_view.fire("render", &[]);
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl EditingHost for MemoryHost {
    fn selection(&self) -> &Emitter {
        &self.selection
    }

    fn editing_view(&self) -> &Observable {
        &self.editing_view
    }

    fn focus_tracker(&self) -> &Observable {
        &self.focus_tracker
    }

    fn is_selection_collapsed(&self) -> bool {
        self.collapsed.get()
    }

    fn is_selection_backward(&self) -> bool {
        self.backward.get()
    }

    fn selection_rects(&self) -> Vec<Rect> {
        self.rects.borrow().clone()
    }

    fn limiter(&self) -> Option<Rect> {
        self.limiter.get()
    }
}
