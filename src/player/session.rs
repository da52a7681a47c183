//! Playback session: the open audio stream and which entry it belongs to.
//!
//! The stream handle sits in a [`StreamSlot`] shared with the frame
//! streamer. The navigation activity is the only writer (open, close,
//! reopen) and the streamer the only reader. The slot's `ready` flag is
//! dropped before the handle is touched and raised only once the new handle
//! is positioned past its header, so no frame read ever lands on a handle
//! that is mid-reopen.

use log::{debug, info};
use std::io::{self, Read, Seek, SeekFrom};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::state::SharedState;
use crate::constants::WAV_HEADER_LEN;
use crate::error::PlaybackError;
use crate::hal::{ByteStream, Storage};

type Handle = Option<Box<dyn ByteStream>>;

/// Stream handle plus the guard that serializes access to it
#[derive(Default)]
pub struct StreamSlot {
    ready: AtomicBool,
    generation: AtomicU64,
    stream: Mutex<Handle>,
}

impl StreamSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Bumped every time a handle is installed or removed
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Read the next chunk of the open stream.
    ///
    /// Returns `None` without touching the handle when the slot is not ready
    /// or the writer currently holds it.
    pub fn read_frame(&self, buf: &mut [u8]) -> Option<io::Result<usize>> {
        if !self.is_ready() {
            return None;
        }
        let mut guard = self.stream.try_lock().ok()?;
        guard.as_mut().map(|stream| stream.read(buf))
    }

    /// Stop reads of the current handle, unless it was replaced since
    /// `generation` was observed.
    pub fn suspend(&self, generation: u64) -> bool {
        if self.generation() != generation {
            return false;
        }
        self.ready.store(false, Ordering::Release);
        true
    }

    fn replace(&self, handle: Handle) {
        self.ready.store(false, Ordering::Release);
        let is_open = handle.is_some();
        *self.lock() = handle;
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.ready.store(is_open, Ordering::Release);
    }

    fn lock(&self) -> MutexGuard<'_, Handle> {
        self.stream.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Entry index to play once the entry at `play_index` has ended
pub fn advance_target(play_index: usize, len: usize) -> usize {
    if play_index + 1 < len { play_index + 1 } else { 0 }
}

pub struct PlaybackSession {
    slot: Arc<StreamSlot>,
    state: Arc<SharedState>,
    path: Option<String>,
    play_index: Option<usize>,
}

impl PlaybackSession {
    pub fn new(slot: Arc<StreamSlot>, state: Arc<SharedState>) -> Self {
        Self {
            slot,
            state,
            path: None,
            play_index: None,
        }
    }

    /// Open `path` and position it at the first sample.
    ///
    /// Any previously open stream is dropped first. On failure the session
    /// is left closed.
    pub fn start_session(
        &mut self,
        storage: &dyn Storage,
        path: &str,
        index: usize,
    ) -> Result<(), PlaybackError> {
        self.slot.replace(None);
        self.path = None;
        self.play_index = None;
        self.state.set_play_index(None);

        let mut stream = storage
            .open(path)
            .map_err(|source| PlaybackError::OpenFailed {
                path: path.to_string(),
                source,
            })?;
        stream
            .seek(SeekFrom::Start(WAV_HEADER_LEN))
            .map_err(|source| PlaybackError::Header {
                path: path.to_string(),
                source,
            })?;

        self.slot.replace(Some(stream));
        self.path = Some(path.to_string());
        self.play_index = Some(index);
        self.state.set_play_index(Some(index));
        info!("Playing '{path}' (entry {index})");
        Ok(())
    }

    pub fn close(&mut self) {
        if let Some(path) = self.path.take() {
            debug!("Closing '{path}'");
        }
        self.slot.replace(None);
        self.play_index = None;
        self.state.set_play_index(None);
        self.state.set_streaming(false);
    }

    pub fn is_open(&self) -> bool {
        self.path.is_some()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn play_index(&self) -> Option<usize> {
        self.play_index
    }

    /// File name of the open stream, without its directory
    pub fn file_name(&self) -> Option<&str> {
        self.path
            .as_deref()
            .map(|path| path.rsplit('/').next().unwrap_or(path))
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        if self.is_open() {
            self.close();
        }
    }
}
