//! Directory model: the single flat listing of the directory being shown.
//!
//! The listing is rebuilt wholesale on every directory change and capped at
//! [`LISTING_CAPACITY`] entries; anything past the cap is dropped without an
//! error. Entries come back in whatever order storage yields them. The cursor
//! itself lives in [`SharedState`] because the edge handlers move it.

use log::{debug, warn};
use std::sync::Arc;

use super::state::SharedState;
use crate::constants::{HIDDEN_PREFIX, LISTING_CAPACITY};
use crate::error::{ListingError, StorageError};
use crate::hal::{Entry, Storage};

pub struct DirectoryModel {
    storage: Arc<dyn Storage>,
    state: Arc<SharedState>,
    path: String,
    entries: Vec<Entry>,
    capacity: usize,
}

impl DirectoryModel {
    pub fn new(storage: Arc<dyn Storage>, state: Arc<SharedState>) -> Self {
        Self::with_capacity(storage, state, LISTING_CAPACITY)
    }

    pub fn with_capacity(
        storage: Arc<dyn Storage>,
        state: Arc<SharedState>,
        capacity: usize,
    ) -> Self {
        Self {
            storage,
            state,
            path: String::new(),
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Descend into `name` below the current path and list it.
    ///
    /// On failure the model still moves to the new path but shows an empty
    /// listing, so the caller can render the directory as blank.
    pub fn enter(&mut self, name: &str) -> Result<(), StorageError> {
        self.path = join_path(&self.path, name);
        self.reload()
    }

    /// Leave the current directory.
    ///
    /// This always returns to the storage root, not to the parent: the
    /// navigation only ever descends one level.
    pub fn exit(&mut self) -> Result<(), StorageError> {
        self.path.clear();
        self.reload()
    }

    /// Entry under the cursor
    pub fn current_entry(&self) -> Result<&Entry, ListingError> {
        let cursor = self.state.cursor();
        self.entries.get(cursor).ok_or(ListingError::OutOfRange {
            cursor,
            len: self.entries.len(),
        })
    }

    pub fn entry(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.state.cursor()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Storage path of an entry in the current directory
    pub fn entry_path(&self, name: &str) -> String {
        join_path(&self.path, name)
    }

    fn reload(&mut self) -> Result<(), StorageError> {
        self.entries.clear();
        let result = self.storage.enumerate(&self.path).map(|raw| {
            let total = raw.len();
            self.entries = collect_visible(raw, self.capacity);
            if total > self.entries.len() {
                debug!(
                    "Listing '{}' kept {} of {} entries",
                    self.path,
                    self.entries.len(),
                    total
                );
            }
        });
        if let Err(e) = &result {
            warn!("Could not list '{}': {e}", self.path);
        }

        for entry in &self.entries {
            if entry.is_directory() {
                debug!("  DIR : {}", entry.name);
            } else {
                debug!("  FILE: {}", entry.name);
            }
        }

        self.state.reset_listing(self.entries.len());
        self.state.request_redraw();
        result
    }
}

fn collect_visible(raw: Vec<Entry>, capacity: usize) -> Vec<Entry> {
    raw.into_iter()
        .filter(|entry| !entry.name.starts_with(HIDDEN_PREFIX))
        .take(capacity)
        .collect()
}

fn join_path(dir: &str, name: &str) -> String {
    let name = name.trim_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}
