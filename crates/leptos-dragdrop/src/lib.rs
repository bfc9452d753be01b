//! Leptos DragDrop Utilities
//!
//! Sortable-list drag-and-drop for Leptos using mouse events.
//! Uses movement threshold to distinguish click from drag; once dragging,
//! the pointer's vertical position is streamed to the caller, which decides
//! where the row lands.

use leptos::prelude::*;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// Default movement threshold in pixels to start dragging
pub const DRAG_THRESHOLD_PX: i32 = 5;

/// DnD state signals
#[derive(Clone, Copy)]
pub struct DndSignals {
    pub dragging_id_read: ReadSignal<Option<u64>>,
    pub dragging_id_write: WriteSignal<Option<u64>>,
    pub drag_just_ended_read: ReadSignal<bool>,
    pub drag_just_ended_write: WriteSignal<bool>,
    /// Pending item id (mousedown but not yet dragging)
    pub pending_id_read: ReadSignal<Option<u64>>,
    pub pending_id_write: WriteSignal<Option<u64>>,
    /// Start position for movement detection
    pub start_x_read: ReadSignal<i32>,
    pub start_x_write: WriteSignal<i32>,
    pub start_y_read: ReadSignal<i32>,
    pub start_y_write: WriteSignal<i32>,
}

pub fn create_dnd_signals() -> DndSignals {
    let (dragging_id_read, dragging_id_write) = signal(None::<u64>);
    let (drag_just_ended_read, drag_just_ended_write) = signal(false);
    let (pending_id_read, pending_id_write) = signal(None::<u64>);
    let (start_x_read, start_x_write) = signal(0i32);
    let (start_y_read, start_y_write) = signal(0i32);
    DndSignals {
        dragging_id_read,
        dragging_id_write,
        drag_just_ended_read,
        drag_just_ended_write,
        pending_id_read,
        pending_id_write,
        start_x_read,
        start_x_write,
        start_y_read,
        start_y_write,
    }
}

/// Row geometry in client coordinates
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RowRect {
    pub top: f64,
    pub height: f64,
}

/// One arrow-key step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Up,
    Down,
}

/// End drag operation
pub fn end_drag(dnd: &DndSignals) {
    dnd.dragging_id_write.set(None);
    dnd.pending_id_write.set(None);
    dnd.drag_just_ended_write.set(true);

    // Swallow the click that follows the mouseup of a drag
    if let Some(win) = web_sys::window() {
        let clear = dnd.drag_just_ended_write;
        let cb = Closure::<dyn FnMut()>::new(move || {
            clear.set(false);
        });
        let _ = win.set_timeout_with_callback_and_timeout_and_arguments_0(cb.as_ref().unchecked_ref(), 100);
        cb.forget();
    }
}

/// Create mousedown handler for a drag handle
/// Records pending drag with start position
pub fn make_on_mousedown(dnd: DndSignals, item_id: u64) -> impl Fn(web_sys::MouseEvent) + Copy + 'static {
    move |ev: web_sys::MouseEvent| {
        if ev.button() != 0 {
            return;
        }
        // Keep text selection from starting while dragging
        ev.prevent_default();
        dnd.pending_id_write.set(Some(item_id));
        dnd.start_x_write.set(ev.client_x());
        dnd.start_y_write.set(ev.client_y());
    }
}

/// Create keydown handler moving a row one step per arrow press
pub fn make_on_keydown<F>(item_id: u64, on_step: F) -> impl Fn(web_sys::KeyboardEvent) + 'static
where
    F: Fn(u64, Step) + 'static,
{
    move |ev: web_sys::KeyboardEvent| {
        let step = match ev.key().as_str() {
            "ArrowUp" => Step::Up,
            "ArrowDown" => Step::Down,
            _ => return,
        };
        ev.prevent_default();
        on_step(item_id, step);
    }
}

/// Bounding boxes of every element matching `selector`, in document order
pub fn measure_rows(selector: &str) -> Vec<RowRect> {
    let Some(doc) = web_sys::window().and_then(|win| win.document()) else {
        return Vec::new();
    };
    let Ok(nodes) = doc.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..nodes.length())
        .filter_map(|i| nodes.item(i))
        .filter_map(|node| node.dyn_into::<web_sys::Element>().ok())
        .map(|el| {
            let rect = el.get_bounding_client_rect();
            RowRect { top: rect.top(), height: rect.height() }
        })
        .collect()
}

/// Bind document mousemove: starts a drag once the pointer moved past
/// `threshold`, then streams the pointer's clientY
pub fn bind_global_mousemove<S, M>(dnd: DndSignals, threshold: i32, on_start: S, on_move: M)
where
    S: Fn(u64, f64) + 'static,
    M: Fn(f64) + 'static,
{
    let on_mousemove = Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |ev: web_sys::MouseEvent| {
        if dnd.dragging_id_read.get_untracked().is_some() {
            on_move(f64::from(ev.client_y()));
            return;
        }

        // Pending drag that hasn't started yet
        let Some(pending) = dnd.pending_id_read.get_untracked() else {
            return;
        };
        let dx = (ev.client_x() - dnd.start_x_read.get_untracked()).abs();
        let dy = (ev.client_y() - dnd.start_y_read.get_untracked()).abs();
        if dx > threshold || dy > threshold {
            dnd.dragging_id_write.set(Some(pending));
            on_start(pending, f64::from(ev.client_y()));
        }
    });

    if let Some(doc) = web_sys::window().and_then(|win| win.document()) {
        let _ = doc.add_event_listener_with_callback("mousemove", on_mousemove.as_ref().unchecked_ref());
    }
    on_mousemove.forget();
}

/// Bind document mouseup for drop detection
pub fn bind_global_mouseup<F>(dnd: DndSignals, on_drop: F)
where
    F: Fn(u64) + 'static,
{
    let on_mouseup = Closure::<dyn FnMut(web_sys::MouseEvent)>::new(move |_ev: web_sys::MouseEvent| {
        match dnd.dragging_id_read.get_untracked() {
            Some(dragged) => {
                end_drag(&dnd);
                on_drop(dragged);
            }
            // Not dragging - click event will fire naturally on the element
            None => dnd.pending_id_write.set(None),
        }
    });

    if let Some(doc) = web_sys::window().and_then(|win| win.document()) {
        let _ = doc.add_event_listener_with_callback("mouseup", on_mouseup.as_ref().unchecked_ref());
    }
    on_mouseup.forget();
}

/// Bind both document handlers for one sortable list
pub fn bind_sortable<S, M, D>(dnd: DndSignals, threshold: i32, on_start: S, on_move: M, on_drop: D)
where
    S: Fn(u64, f64) + 'static,
    M: Fn(f64) + 'static,
    D: Fn(u64) + 'static,
{
    bind_global_mousemove(dnd, threshold, on_start, on_move);
    bind_global_mouseup(dnd, on_drop);
}
