//! Debounced falling-edge handlers for the three navigation controls.
//!
//! These run where interrupt service routines would on the device: they only
//! touch atomics in [`SharedState`], never allocate, never log and never take
//! a lock the audio loop could be holding. All three controls share a single
//! last-accepted timestamp, so a press on one control also masks the others
//! for the debounce window.

use std::sync::Arc;

use super::state::SharedState;

/// Logical events produced by the controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Next,
    Previous,
    Activate,
}

#[derive(Debug, Clone)]
pub struct EdgeInput {
    state: Arc<SharedState>,
    debounce_ms: u64,
}

impl EdgeInput {
    pub fn new(state: Arc<SharedState>, debounce_ms: u64) -> Self {
        Self { state, debounce_ms }
    }

    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    /// Dispatch a raw edge to its handler.
    pub fn on_edge(&self, event: InputEvent, now_ms: u64) -> bool {
        match event {
            InputEvent::Next => self.on_next_edge(now_ms),
            InputEvent::Previous => self.on_previous_edge(now_ms),
            InputEvent::Activate => self.on_activate_edge(now_ms),
        }
    }

    /// Move the cursor down one entry. Returns whether the cursor moved.
    pub fn on_next_edge(&self, now_ms: u64) -> bool {
        self.step(now_ms, true)
    }

    /// Move the cursor up one entry. Returns whether the cursor moved.
    pub fn on_previous_edge(&self, now_ms: u64) -> bool {
        self.step(now_ms, false)
    }

    /// Raise the pending-press flag for the navigation loop to classify.
    ///
    /// While a press is still pending further activate edges are ignored and
    /// do not consume the debounce window.
    pub fn on_activate_edge(&self, now_ms: u64) -> bool {
        if self.state.press_pending() {
            return false;
        }
        self.state.accept_edge(now_ms, self.debounce_ms) && self.state.raise_press(now_ms)
    }

    fn step(&self, now_ms: u64, forward: bool) -> bool {
        // The debounce window is consumed even when the cursor is pinned at
        // either end of the listing.
        if !self.state.accept_edge(now_ms, self.debounce_ms) {
            return false;
        }
        let moved = self.state.step_cursor(forward);
        if moved {
            self.state.request_redraw();
        }
        moved
    }
}
