//! Render dispatcher: viewport selection and drawing of the two screens.
//!
//! The display has room for a header plus seven rows. The root menu uses all
//! seven for the listing; a directory view gives one of them to the
//! now-playing banner and lists six. Drawing only happens when the shared
//! redraw flag is set, and the flag is consumed by the draw.

use std::io;

use super::state::SharedState;
use crate::constants::{DIRECTORY_ROWS, MENU_ROWS};
use crate::hal::{Color, Display, Entry};

const HEADER_ROW: u16 = 0;
const BANNER_ROW: u16 = 1;
const HEADER_MARK: &str = ":)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewVariant {
    Menu,
    Directory,
}

impl ViewVariant {
    pub fn rows(self) -> usize {
        match self {
            ViewVariant::Menu => MENU_ROWS,
            ViewVariant::Directory => DIRECTORY_ROWS,
        }
    }

    fn first_row(self) -> u16 {
        match self {
            ViewVariant::Menu => BANNER_ROW,
            ViewVariant::Directory => BANNER_ROW + 1,
        }
    }
}

/// Window of the listing that is currently visible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportSlice {
    pub start: usize,
    pub len: usize,
    /// Row of the highlighted entry within the window
    pub highlight: Option<usize>,
}

impl ViewportSlice {
    pub fn entries<'a>(&self, listing: &'a [Entry]) -> &'a [Entry] {
        &listing[self.start..self.start + self.len]
    }

    pub fn highlighted<'a>(&self, listing: &'a [Entry]) -> Option<&'a Entry> {
        self.highlight.map(|row| &listing[self.start + row])
    }
}

/// Pick the visible window so the cursor stays on screen.
///
/// Short listings are shown whole. Longer ones show the first page while the
/// cursor is on it, then a window whose last row is the cursor. The menu
/// variant pins the highlight to that last row instead of deriving it from
/// the cursor; both land on the same entry.
pub fn compute_slice(
    listing: &[Entry],
    cursor: usize,
    viewport: usize,
    variant: ViewVariant,
) -> ViewportSlice {
    let total = listing.len();
    if total == 0 || viewport == 0 {
        return ViewportSlice {
            start: 0,
            len: 0,
            highlight: None,
        };
    }
    let cursor = cursor.min(total - 1);

    if total <= viewport || cursor < viewport {
        return ViewportSlice {
            start: 0,
            len: total.min(viewport),
            highlight: Some(cursor),
        };
    }

    let start = cursor + 1 - viewport;
    let highlight = match variant {
        ViewVariant::Menu => viewport - 1,
        ViewVariant::Directory => cursor - start,
    };
    ViewportSlice {
        start,
        len: viewport,
        highlight: Some(highlight),
    }
}

/// Name shown for an entry: everything before the first dot
pub fn display_stem(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NowPlaying<'a> {
    pub name: &'a str,
    pub paused: bool,
}

/// Everything needed to draw one screen
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    pub title: &'a str,
    pub variant: ViewVariant,
    pub entries: &'a [Entry],
    pub cursor: usize,
    pub now_playing: Option<NowPlaying<'a>>,
    pub fault: Option<&'a str>,
}

/// Draw `view` if a redraw was requested. Returns whether anything was drawn.
pub fn dispatch(state: &SharedState, display: &mut dyn Display, view: &View) -> io::Result<bool> {
    if !state.take_redraw() {
        return Ok(false);
    }
    if let Err(e) = draw(display, view) {
        // Try again on the next loop iteration
        state.request_redraw();
        return Err(e);
    }
    Ok(true)
}

pub fn draw(display: &mut dyn Display, view: &View) -> io::Result<()> {
    let width = usize::from(display.width());

    display.clear()?;
    display.set_colors(Color::White, None)?;
    display.set_cursor(0, HEADER_ROW)?;
    display.print_text(&fit(&format!("| {}", view.title), width.saturating_sub(3)))?;
    display.set_cursor(display.width().saturating_sub(2), HEADER_ROW)?;
    display.print_text(HEADER_MARK)?;

    if let Some(fault) = view.fault {
        display.set_cursor(0, BANNER_ROW)?;
        display.set_colors(Color::Red, None)?;
        display.print_text(&fit(&format!("! {fault}"), width))?;
    } else if view.variant == ViewVariant::Directory
        && let Some(playing) = view.now_playing
    {
        let color = if playing.paused {
            Color::Magenta
        } else {
            Color::Green
        };
        display.set_cursor(0, BANNER_ROW)?;
        display.set_colors(color, None)?;
        display.print_text(&fit(display_stem(playing.name), width))?;
    }

    // A fault banner takes the first listing row of the menu as well
    let (first_row, rows) = match (view.variant, view.fault) {
        (ViewVariant::Menu, Some(_)) => (BANNER_ROW + 1, DIRECTORY_ROWS),
        (variant, _) => (variant.first_row(), variant.rows()),
    };
    let slice = compute_slice(view.entries, view.cursor, rows, view.variant);
    for (row, entry) in slice.entries(view.entries).iter().enumerate() {
        if slice.highlight == Some(row) {
            display.set_colors(Color::Black, Some(Color::Yellow))?;
        } else {
            display.set_colors(Color::Yellow, None)?;
        }
        let label = match view.variant {
            ViewVariant::Menu => entry.name.as_str(),
            ViewVariant::Directory => display_stem(&entry.name),
        };
        display.set_cursor(0, first_row + row as u16)?;
        display.print_text(&fit(label, width))?;
    }

    display.flush()
}

fn fit(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}
