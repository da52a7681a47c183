//! The character display, drawn on the host terminal with crossterm.

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{self, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::io::{self, Write};

use crate::hal::{Color, Display};

/// Columns of the emulated panel
pub const PANEL_COLUMNS: u16 = 21;

pub struct TerminalDisplay<W: Write> {
    out: W,
    width: u16,
}

impl<W: Write> TerminalDisplay<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            width: PANEL_COLUMNS,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn term_color(color: Color) -> style::Color {
    match color {
        Color::Black => style::Color::Black,
        Color::White => style::Color::White,
        Color::Yellow => style::Color::Yellow,
        Color::Green => style::Color::Green,
        Color::Magenta => style::Color::Magenta,
        Color::Red => style::Color::Red,
        Color::Cyan => style::Color::Cyan,
        Color::Blue => style::Color::Blue,
    }
}

impl<W: Write> Display for TerminalDisplay<W> {
    fn clear(&mut self) -> io::Result<()> {
        queue!(self.out, ResetColor, Clear(ClearType::All), MoveTo(0, 0))
    }

    fn set_cursor(&mut self, col: u16, row: u16) -> io::Result<()> {
        queue!(self.out, MoveTo(col, row))
    }

    fn set_colors(&mut self, fg: Color, bg: Option<Color>) -> io::Result<()> {
        let bg = bg.map_or(style::Color::Reset, term_color);
        queue!(
            self.out,
            SetForegroundColor(term_color(fg)),
            SetBackgroundColor(bg)
        )
    }

    fn print_text(&mut self, text: &str) -> io::Result<()> {
        queue!(self.out, Print(text))
    }

    fn flush(&mut self) -> io::Result<()> {
        queue!(self.out, ResetColor)?;
        self.out.flush()
    }

    fn width(&self) -> u16 {
        self.width
    }
}
