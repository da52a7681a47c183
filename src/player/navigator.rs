//! Navigation state machine.
//!
//! Runs on Activity A. The activate edge handler only raises a flag; this
//! module measures how long ago that edge was accepted and, once the control
//! is released, turns it into a short or long press and applies it to the
//! directory model and the playback session.

use log::{debug, error, info, warn};
use std::sync::Arc;

use super::listing::DirectoryModel;
use super::render::{NowPlaying, View, ViewVariant};
use super::session::{PlaybackSession, StreamSlot};
use super::state::SharedState;
use crate::constants::{LONG_PRESS_MS, SHORT_PRESS_MIN_MS};
use crate::error::{PlaybackError, StorageError};
use crate::hal::{ControlLevel, Storage};

pub const ROOT_TITLE: &str = "Main Menu";
pub const NO_CARD: &str = "NO CARD";
pub const READ_ERROR: &str = "READ ERROR";
pub const OPEN_ERROR: &str = "OPEN ERROR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationState {
    AtRoot,
    InsideDirectory,
    /// A stream is open; `paused` stops the streamer without closing it
    Playing { paused: bool },
}

impl NavigationState {
    pub fn is_inside_directory(self) -> bool {
        !matches!(self, NavigationState::AtRoot)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Press {
    Short,
    Long,
}

/// Classify a released press by the time since its edge was accepted.
///
/// Returns `None` while the press is still inside the settle window.
pub fn classify_press(elapsed_ms: u64) -> Option<Press> {
    if elapsed_ms <= SHORT_PRESS_MIN_MS {
        None
    } else if elapsed_ms < LONG_PRESS_MS {
        Some(Press::Short)
    } else {
        Some(Press::Long)
    }
}

pub struct Navigator {
    storage: Arc<dyn Storage>,
    state: Arc<SharedState>,
    model: DirectoryModel,
    session: PlaybackSession,
    nav: NavigationState,
    fault: Option<&'static str>,
}

impl Navigator {
    pub fn new(storage: Arc<dyn Storage>, state: Arc<SharedState>, slot: Arc<StreamSlot>) -> Self {
        let model = DirectoryModel::new(storage.clone(), state.clone());
        let session = PlaybackSession::new(slot, state.clone());
        Self {
            storage,
            state,
            model,
            session,
            nav: NavigationState::AtRoot,
            fault: None,
        }
    }

    /// Mount the storage root and show it as the main menu.
    ///
    /// A failure leaves the device running with an empty menu and the
    /// `NO CARD` banner.
    pub fn load_root(&mut self) -> Result<(), StorageError> {
        self.nav = NavigationState::AtRoot;
        match self.model.exit() {
            Ok(()) => {
                self.fault = None;
                info!("Root lists {} entries", self.model.len());
                Ok(())
            }
            Err(e) => {
                self.fault = Some(NO_CARD);
                Err(e)
            }
        }
    }

    pub fn nav_state(&self) -> NavigationState {
        self.nav
    }

    pub fn fault(&self) -> Option<&'static str> {
        self.fault
    }

    pub fn model(&self) -> &DirectoryModel {
        &self.model
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    /// One pass of the navigation loop: classify a pending press and apply
    /// any auto-advance queued by the streamer.
    pub fn tick(&mut self, now_ms: u64, activate: &dyn ControlLevel) {
        self.poll_press(now_ms, activate);
        self.service_advance();
    }

    /// Classify and apply the pending press once the control is released.
    pub fn poll_press(&mut self, now_ms: u64, activate: &dyn ControlLevel) -> Option<Press> {
        if !self.state.press_pending() {
            return None;
        }
        let Some(edge_ms) = self.state.press_started_ms() else {
            self.state.clear_press();
            return None;
        };
        let press = classify_press(now_ms.saturating_sub(edge_ms))?;
        if !activate.is_released() {
            return None;
        }
        self.state.clear_press();
        self.apply_press(press);
        Some(press)
    }

    /// Apply a classified press to the current state.
    ///
    /// While the card is missing a press only retries the mount, so the
    /// `NO CARD` banner stays up until the root lists again.
    pub fn apply_press(&mut self, press: Press) -> NavigationState {
        debug!("{press:?} press in {:?}", self.nav);
        if self.fault == Some(NO_CARD) {
            match self.load_root() {
                Ok(()) => info!("Card mounted"),
                Err(e) => warn!("Card still unavailable: {e}"),
            }
            self.state.request_redraw();
            return self.nav;
        }
        self.fault = None;

        match (self.nav, press) {
            // Long presses at the root descend as well
            (NavigationState::AtRoot, _) => self.enter_cursor_entry(),
            (NavigationState::InsideDirectory, Press::Short) => {
                self.play_entry(self.state.cursor(), true)
            }
            (NavigationState::Playing { paused: false }, Press::Short) => {
                self.state.set_streaming(false);
                self.nav = NavigationState::Playing { paused: true };
                info!("Paused");
            }
            (NavigationState::Playing { paused: true }, Press::Short) => {
                let cursor = self.state.cursor();
                if self.session.play_index() == Some(cursor) {
                    self.state.set_streaming(true);
                    self.nav = NavigationState::Playing { paused: false };
                    info!("Resumed");
                } else {
                    self.play_entry(cursor, true);
                }
            }
            (NavigationState::InsideDirectory | NavigationState::Playing { .. }, Press::Long) => {
                self.return_to_root()
            }
        }

        self.state.request_redraw();
        self.nav
    }

    /// Reopen the stream on the entry queued by the streamer, if any.
    ///
    /// Only applies while a stream is open; a queued advance that arrives
    /// after leaving the directory is dropped.
    pub fn service_advance(&mut self) -> Option<usize> {
        let next = self.state.take_pending_advance()?;
        let NavigationState::Playing { paused } = self.nav else {
            debug!("Dropping advance to entry {next}");
            return None;
        };
        self.state.set_cursor(next);
        self.play_entry(next, !paused);
        self.state.request_redraw();
        Some(next)
    }

    /// Build the screen for the current state.
    pub fn view(&self) -> View<'_> {
        let variant = if self.nav.is_inside_directory() {
            ViewVariant::Directory
        } else {
            ViewVariant::Menu
        };
        let title = if self.model.is_root() {
            ROOT_TITLE
        } else {
            self.model.path()
        };
        let now_playing = match self.nav {
            NavigationState::Playing { paused } => self
                .session
                .file_name()
                .map(|name| NowPlaying { name, paused }),
            _ => None,
        };
        View {
            title,
            variant,
            entries: self.model.entries(),
            cursor: self.state.cursor(),
            now_playing,
            fault: self.fault,
        }
    }

    fn enter_cursor_entry(&mut self) {
        let name = match self.model.current_entry() {
            Ok(entry) => entry.name.clone(),
            Err(e) => {
                debug!("Nothing to enter: {e}");
                return;
            }
        };
        self.nav = NavigationState::InsideDirectory;
        if let Err(e) = self.model.enter(&name) {
            self.fault = Some(match e {
                StorageError::NotADirectory(_) => OPEN_ERROR,
                StorageError::Unavailable { .. } => READ_ERROR,
            });
        }
    }

    fn play_entry(&mut self, index: usize, streaming: bool) {
        let Some(entry) = self.model.entry(index) else {
            debug!("No entry {index} to play");
            return;
        };
        let path = self.model.entry_path(&entry.name);
        match self.session.start_session(self.storage.as_ref(), &path, index) {
            Ok(()) => {
                self.state.set_streaming(streaming);
                self.nav = NavigationState::Playing { paused: !streaming };
            }
            Err(e) => self.playback_failed(e),
        }
    }

    fn playback_failed(&mut self, e: PlaybackError) {
        error!("{e}");
        self.return_to_root();
        if self.fault.is_none() {
            self.fault = Some(OPEN_ERROR);
        }
    }

    fn return_to_root(&mut self) {
        self.session.close();
        self.nav = NavigationState::AtRoot;
        if let Err(e) = self.model.exit() {
            warn!("Could not list the root: {e}");
            self.fault = Some(NO_CARD);
        }
    }
}
