//! Interfaces to the peripherals and services the player core drives.
//!
//! The core never talks to hardware directly. Storage, the audio output, the
//! display, the indicator pixels, the persistent byte region, the volume
//! potentiometer and the activate button level all sit behind these traits.
//! `crate::host` provides desktop implementations and in-memory doubles.

use crate::error::{PersistError, StorageError};
use std::io::{self, Read, Seek};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
}

/// One name yielded by enumerating a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
}

impl Entry {
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
        }
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// A readable, seekable audio stream handed out by [`Storage::open`]
pub trait ByteStream: Read + Seek + Send {}

impl<T: Read + Seek + Send> ByteStream for T {}

/// Hierarchical file enumeration and byte streams.
///
/// Paths are relative to the storage root and use `/` as separator; the empty
/// string is the root itself.
pub trait Storage: Send + Sync {
    fn enumerate(&self, path: &str) -> Result<Vec<Entry>, StorageError>;
    fn open(&self, path: &str) -> Result<Box<dyn ByteStream>, StorageError>;
}

/// Blocking sink for interleaved 16-bit stereo PCM at 44.1 kHz.
///
/// `write` returns once the samples are queued; it may block for as long as
/// the peripheral needs.
pub trait AudioSink {
    fn write(&mut self, samples: &[i16]) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black,
    White,
    Yellow,
    Green,
    Magenta,
    Red,
    Cyan,
    Blue,
}

/// Character display with a stateful cursor
pub trait Display {
    fn clear(&mut self) -> io::Result<()>;
    fn set_cursor(&mut self, col: u16, row: u16) -> io::Result<()>;
    fn set_colors(&mut self, fg: Color, bg: Option<Color>) -> io::Result<()>;
    fn print_text(&mut self, text: &str) -> io::Result<()>;

    /// Push buffered output to the device
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Width in columns
    fn width(&self) -> u16 {
        21
    }
}

pub trait IndicatorLights {
    fn set_pixel_color(&mut self, index: usize, r: u8, g: u8, b: u8);
    fn show(&mut self);
}

/// Small byte-addressed non-volatile region
pub trait PersistentStore {
    fn read(&self, addr: usize) -> Result<u8, PersistError>;
    fn write(&mut self, addr: usize, value: u8) -> Result<(), PersistError>;
    fn commit(&mut self) -> Result<(), PersistError>;
}

/// Raw reading of the volume potentiometer, 0..=ADC_MAX
pub trait AnalogInput {
    fn read(&mut self) -> u16;
}

/// Level of the activate control, polled to detect release
pub trait ControlLevel: Send + Sync {
    fn is_released(&self) -> bool;
}

/// Monotonic milliseconds since boot
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

pub struct SystemClock {
    boot: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            boot: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.boot.elapsed().as_millis() as u64
    }
}
