//! Pointer-to-index mapping for drag reordering
//!
//! The dragged item's candidate index only changes once the pointer crosses
//! the midpoint of a neighbouring slot (plus a dead band), so a long drag does
//! not flicker between two positions.

/// Vertical extent of one rendered row, in client coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotBounds {
    pub top: f64,
    pub height: f64,
}

impl SlotBounds {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    pub fn midpoint(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Tracks one drag gesture
#[derive(Debug, Clone)]
pub struct PointerTracker {
    slots: Vec<SlotBounds>,
    current: usize,
    hysteresis: f64,
}

impl PointerTracker {
    /// `slots` are the row bounds in display order; `start` is the dragged
    /// item's index when the drag began
    pub fn new(slots: Vec<SlotBounds>, start: usize, hysteresis: f64) -> Self {
        let current = start.min(slots.len().saturating_sub(1));
        Self { slots, current, hysteresis: hysteresis.max(0.0) }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// Replace the row bounds after the list re-rendered
    pub fn remeasure(&mut self, slots: Vec<SlotBounds>) {
        self.current = self.current.min(slots.len().saturating_sub(1));
        self.slots = slots;
    }

    /// Feed a pointer position; returns the new index when it changed
    pub fn update(&mut self, pointer_y: f64) -> Option<usize> {
        if self.slots.len() < 2 {
            return None;
        }
        let mut next = self.current;
        while next > 0 && pointer_y < self.slots[next - 1].midpoint() - self.hysteresis {
            next -= 1;
        }
        while next + 1 < self.slots.len() && pointer_y > self.slots[next + 1].midpoint() + self.hysteresis {
            next += 1;
        }
        if next == self.current {
            return None;
        }
        self.current = next;
        Some(next)
    }
}
