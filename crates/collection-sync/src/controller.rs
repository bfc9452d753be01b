//! Reorder Controller
//!
//! Turns a gesture into a store move. Keyboard presses move exactly one
//! slot; pointer drags go through a [`PointerTracker`] so the candidate index
//! only changes past a slot midpoint.
//!
//! The capability check happens before anything touches the store: a
//! read-only viewer gets an error back and nothing else happens.

use log::{debug, error};

use crate::domain::{CollectionId, ItemKey};
use crate::error::{StoreError, SyncError};
use crate::pointer::{PointerTracker, SlotBounds};
use crate::store::{ChangeEvent, OrderedCollectionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    /// `ArrowUp` / `ArrowDown`
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowUp" => Some(Direction::Up),
            "ArrowDown" => Some(Direction::Down),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderTarget {
    Index(usize),
    Direction(Direction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Pointer,
    Keyboard,
}

/// Drag in progress
#[derive(Debug, Clone)]
struct DragGesture {
    key: ItemKey,
    from: usize,
    tracker: PointerTracker,
}

/// Net effect of a finished drag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragOutcome {
    pub key: ItemKey,
    pub from: usize,
    pub to: usize,
}

impl DragOutcome {
    pub fn moved(&self) -> bool {
        self.from != self.to
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReorderController {
    hysteresis: f64,
    drag: Option<DragGesture>,
}

impl ReorderController {
    pub fn new(hysteresis: f64) -> Self {
        Self { hysteresis, drag: None }
    }

    /// Refuse the gesture when the viewer may not edit
    pub fn guard(can_edit: bool, collection: &CollectionId) -> Result<(), SyncError> {
        if can_edit {
            return Ok(());
        }
        error!("[{}] reorder attempted without edit capability", collection);
        Err(SyncError::Permission { collection: collection.clone() })
    }

    /// Index the item should land on, or `None` when the gesture is a no-op
    /// (already there, or moving past either end)
    pub fn resolve<P: Clone>(
        store: &OrderedCollectionStore<P>,
        key: ItemKey,
        target: ReorderTarget,
    ) -> Result<Option<usize>, StoreError> {
        let from = store.index_of(key).ok_or(StoreError::UnknownId(key))?;
        let to = match target {
            ReorderTarget::Index(index) => {
                if index >= store.len() {
                    return Err(StoreError::InvalidIndex { index, len: store.len() });
                }
                index
            }
            ReorderTarget::Direction(Direction::Up) => match from.checked_sub(1) {
                Some(index) => index,
                None => return Ok(None),
            },
            ReorderTarget::Direction(Direction::Down) => {
                if from + 1 >= store.len() {
                    return Ok(None);
                }
                from + 1
            }
        };
        Ok((to != from).then_some(to))
    }

    /// Apply the gesture to the store
    pub fn reorder<P: Clone>(
        store: &mut OrderedCollectionStore<P>,
        key: ItemKey,
        target: ReorderTarget,
        mode: InputMode,
    ) -> Result<Option<ChangeEvent<P>>, StoreError> {
        let Some(to) = Self::resolve(store, key, target)? else {
            debug!("reorder {} {:?} via {:?}: no-op", key, target, mode);
            return Ok(None);
        };
        store.move_item(key, to).map(Some)
    }

    /// Start a pointer drag of `key`; `slots` are the rendered row bounds in
    /// display order
    pub fn begin_drag<P: Clone>(
        &mut self,
        store: &OrderedCollectionStore<P>,
        key: ItemKey,
        slots: Vec<SlotBounds>,
    ) -> Result<(), StoreError> {
        let from = store.index_of(key).ok_or(StoreError::UnknownId(key))?;
        self.drag = Some(DragGesture {
            key,
            from,
            tracker: PointerTracker::new(slots, from, self.hysteresis),
        });
        Ok(())
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn dragged(&self) -> Option<ItemKey> {
        self.drag.as_ref().map(|drag| drag.key)
    }

    /// Feed a pointer position; moves the item when the candidate index changed
    pub fn drag_to<P: Clone>(
        &mut self,
        store: &mut OrderedCollectionStore<P>,
        pointer_y: f64,
    ) -> Result<Option<ChangeEvent<P>>, StoreError> {
        let Some(drag) = self.drag.as_mut() else {
            return Ok(None);
        };
        let Some(index) = drag.tracker.update(pointer_y) else {
            return Ok(None);
        };
        Self::reorder(store, drag.key, ReorderTarget::Index(index), InputMode::Pointer)
    }

    /// Replace slot geometry mid-drag (after a re-render)
    pub fn remeasure(&mut self, slots: Vec<SlotBounds>) {
        if let Some(drag) = self.drag.as_mut() {
            drag.tracker.remeasure(slots);
        }
    }

    pub fn end_drag(&mut self) -> Option<DragOutcome> {
        let drag = self.drag.take()?;
        Some(DragOutcome { key: drag.key, from: drag.from, to: drag.tracker.current() })
    }
}
