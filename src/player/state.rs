//! Scalar state shared between the interrupt handlers and both activities.
//!
//! Every field is a lone atomic so the edge handlers can update it without
//! locking and without allocating. Anything larger than a word (the listing
//! itself, the open stream) lives elsewhere and is owned by one activity.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};

const NONE: usize = usize::MAX;
const NEVER: u64 = u64::MAX;

#[derive(Debug)]
pub struct SharedState {
    cursor: AtomicUsize,
    listing_len: AtomicUsize,
    redraw: AtomicBool,
    press_pending: AtomicBool,
    press_ms: AtomicU64,
    last_edge_ms: AtomicU64,
    streaming: AtomicBool,
    play_index: AtomicUsize,
    pending_advance: AtomicUsize,
    gain_bits: AtomicU32,
    shutdown: AtomicBool,
}

impl SharedState {
    pub fn new(initial_gain: f32) -> Self {
        Self {
            cursor: AtomicUsize::new(0),
            listing_len: AtomicUsize::new(0),
            redraw: AtomicBool::new(true),
            press_pending: AtomicBool::new(false),
            press_ms: AtomicU64::new(NEVER),
            last_edge_ms: AtomicU64::new(NEVER),
            streaming: AtomicBool::new(false),
            play_index: AtomicUsize::new(NONE),
            pending_advance: AtomicUsize::new(NONE),
            gain_bits: AtomicU32::new(initial_gain.to_bits()),
            shutdown: AtomicBool::new(false),
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }

    pub fn listing_len(&self) -> usize {
        self.listing_len.load(Ordering::Acquire)
    }

    /// Install a freshly enumerated listing length and put the cursor on its
    /// first entry.
    pub fn reset_listing(&self, len: usize) {
        self.listing_len.store(len, Ordering::Release);
        self.cursor.store(0, Ordering::Release);
    }

    /// Place the cursor, clamped to the listing.
    pub fn set_cursor(&self, index: usize) {
        let len = self.listing_len();
        let clamped = index.min(len.saturating_sub(1));
        self.cursor.store(clamped, Ordering::Release);
    }

    /// Move the cursor one step, staying inside `[0, len - 1]`.
    ///
    /// Returns false when the move would leave the listing; the cursor is
    /// left untouched in that case.
    pub fn step_cursor(&self, forward: bool) -> bool {
        let len = self.listing_len();
        self.cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cursor| {
                if forward {
                    (cursor + 1 < len).then_some(cursor + 1)
                } else {
                    cursor.checked_sub(1)
                }
            })
            .is_ok()
    }

    pub fn request_redraw(&self) {
        self.redraw.store(true, Ordering::Release);
    }

    /// Consume the redraw request, returning whether one was pending.
    pub fn take_redraw(&self) -> bool {
        self.redraw.swap(false, Ordering::AcqRel)
    }

    pub fn redraw_pending(&self) -> bool {
        self.redraw.load(Ordering::Acquire)
    }

    pub fn press_pending(&self) -> bool {
        self.press_pending.load(Ordering::Acquire)
    }

    /// Raise the pending-press flag for an activate edge accepted at `now`;
    /// false when one was already raised.
    ///
    /// The press start is kept apart from the debounce timestamp so next and
    /// previous edges during a hold do not shorten the press.
    pub fn raise_press(&self, now: u64) -> bool {
        if self.press_pending() {
            return false;
        }
        self.press_ms.store(now, Ordering::Release);
        !self.press_pending.swap(true, Ordering::AcqRel)
    }

    /// When the pending press started
    pub fn press_started_ms(&self) -> Option<u64> {
        match self.press_ms.load(Ordering::Acquire) {
            NEVER => None,
            ms => Some(ms),
        }
    }

    pub fn clear_press(&self) {
        self.press_pending.store(false, Ordering::Release);
    }

    /// Time of the last accepted edge, if any edge was ever accepted
    pub fn last_edge_ms(&self) -> Option<u64> {
        match self.last_edge_ms.load(Ordering::Acquire) {
            NEVER => None,
            ms => Some(ms),
        }
    }

    /// Record `now` as the last accepted edge if at least `window` ms have
    /// passed since the previous one. Returns whether the edge was accepted.
    pub fn accept_edge(&self, now: u64, window: u64) -> bool {
        self.last_edge_ms
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
                if last == NEVER || now.saturating_sub(last) >= window {
                    Some(now)
                } else {
                    None
                }
            })
            .is_ok()
    }

    /// Whether the frame streamer may pull audio (playing and not paused)
    pub fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::Acquire)
    }

    pub fn set_streaming(&self, streaming: bool) {
        self.streaming.store(streaming, Ordering::Release);
    }

    pub fn play_index(&self) -> Option<usize> {
        match self.play_index.load(Ordering::Acquire) {
            NONE => None,
            index => Some(index),
        }
    }

    pub fn set_play_index(&self, index: Option<usize>) {
        self.play_index.store(index.unwrap_or(NONE), Ordering::Release);
    }

    pub fn set_pending_advance(&self, index: usize) {
        self.pending_advance.store(index, Ordering::Release);
    }

    pub fn take_pending_advance(&self) -> Option<usize> {
        match self.pending_advance.swap(NONE, Ordering::AcqRel) {
            NONE => None,
            index => Some(index),
        }
    }

    pub fn gain(&self) -> f32 {
        f32::from_bits(self.gain_bits.load(Ordering::Relaxed))
    }

    pub fn set_gain(&self, gain: f32) {
        self.gain_bits.store(gain.to_bits(), Ordering::Relaxed);
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }
}
