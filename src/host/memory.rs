//! In-memory peripherals.
//!
//! Built for unit tests and, through the `test-util` feature, for the
//! integration tests. The recording doubles share their contents between clones, so a test can hand
//! one clone to the device and inspect the other.

use std::io::{self, Cursor};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::constants::{EEPROM_SIZE, LED_COUNT};
use crate::error::{PersistError, StorageError};
use crate::hal::{
    AnalogInput, AudioSink, ByteStream, Clock, Color, ControlLevel, Display, Entry,
    IndicatorLights, PersistentStore, Storage,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone)]
struct Node {
    path: String,
    data: Option<Arc<Vec<u8>>>,
}

impl Node {
    fn parent(&self) -> &str {
        self.path.rsplit_once('/').map_or("", |(parent, _)| parent)
    }

    fn name(&self) -> &str {
        self.path.rsplit_once('/').map_or(self.path.as_str(), |(_, name)| name)
    }
}

/// Storage tree held in memory.
///
/// Enumeration yields entries in insertion order. Adding a file creates its
/// parent directories.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    nodes: Vec<Node>,
    unavailable: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: &str, data: Vec<u8>) -> Self {
        let path = path.trim_matches('/');
        if let Some((parent, _)) = path.rsplit_once('/') {
            self = self.with_dir(parent);
        }
        self.nodes.retain(|node| node.path != path);
        self.nodes.push(Node {
            path: path.to_string(),
            data: Some(Arc::new(data)),
        });
        self
    }

    pub fn with_dir(mut self, path: &str) -> Self {
        let path = path.trim_matches('/');
        if path.is_empty() || self.find(path).is_some() {
            return self;
        }
        if let Some((parent, _)) = path.rsplit_once('/') {
            self = self.with_dir(parent);
        }
        self.nodes.push(Node {
            path: path.to_string(),
            data: None,
        });
        self
    }

    /// Every call fails as if no card were inserted
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    fn find(&self, path: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.path == path)
    }

    fn check_mounted(&self, path: &str) -> Result<(), StorageError> {
        if self.unavailable {
            return Err(StorageError::unavailable(
                path,
                io::Error::new(io::ErrorKind::NotFound, "no card"),
            ));
        }
        Ok(())
    }
}

impl Storage for MemoryStorage {
    fn enumerate(&self, path: &str) -> Result<Vec<Entry>, StorageError> {
        self.check_mounted(path)?;
        if !path.is_empty() {
            match self.find(path) {
                None => {
                    return Err(StorageError::unavailable(
                        path,
                        io::Error::new(io::ErrorKind::NotFound, "no such directory"),
                    ));
                }
                Some(node) if node.data.is_some() => {
                    return Err(StorageError::NotADirectory(path.to_string()));
                }
                Some(_) => {}
            }
        }

        Ok(self
            .nodes
            .iter()
            .filter(|node| node.parent() == path)
            .map(|node| match node.data {
                Some(_) => Entry::file(node.name()),
                None => Entry::directory(node.name()),
            })
            .collect())
    }

    fn open(&self, path: &str) -> Result<Box<dyn ByteStream>, StorageError> {
        self.check_mounted(path)?;
        match self.find(path).map(|node| node.data.as_ref()) {
            Some(Some(data)) => Ok(Box::new(Cursor::new(data.to_vec()))),
            Some(None) => Err(StorageError::unavailable(
                path,
                io::Error::other("is a directory"),
            )),
            None => Err(StorageError::unavailable(
                path,
                io::Error::new(io::ErrorKind::NotFound, "no such file"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Option<Color>,
    bg: Option<Color>,
}

const BLANK: Cell = Cell {
    ch: ' ',
    fg: None,
    bg: None,
};

#[derive(Debug)]
struct Screen {
    width: u16,
    cells: Vec<Vec<Cell>>,
    col: u16,
    row: u16,
    fg: Color,
    bg: Option<Color>,
    clears: usize,
}

/// Character grid that remembers what was printed where
#[derive(Debug, Clone)]
pub struct RecordingDisplay {
    screen: Arc<Mutex<Screen>>,
}

impl RecordingDisplay {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            screen: Arc::new(Mutex::new(Screen {
                width,
                cells: vec![vec![BLANK; usize::from(width)]; usize::from(height)],
                col: 0,
                row: 0,
                fg: Color::White,
                bg: None,
                clears: 0,
            })),
        }
    }

    /// Full-width text of `row`, blanks as spaces
    pub fn row_text(&self, row: usize) -> String {
        let screen = lock(&self.screen);
        screen
            .cells
            .get(row)
            .map(|cells| cells.iter().map(|cell| cell.ch).collect())
            .unwrap_or_default()
    }

    /// Foreground colour of the first cell of `row`
    pub fn row_color(&self, row: usize) -> Option<Color> {
        let screen = lock(&self.screen);
        screen.cells.get(row)?.first()?.fg
    }

    /// Rows drawn with the highlight background
    pub fn highlighted_rows(&self) -> Vec<usize> {
        let screen = lock(&self.screen);
        screen
            .cells
            .iter()
            .enumerate()
            .filter(|(_, cells)| cells.first().and_then(|cell| cell.bg) == Some(Color::Yellow))
            .map(|(row, _)| row)
            .collect()
    }

    pub fn clears(&self) -> usize {
        lock(&self.screen).clears
    }
}

impl Display for RecordingDisplay {
    fn clear(&mut self) -> io::Result<()> {
        let mut screen = lock(&self.screen);
        for row in screen.cells.iter_mut() {
            row.fill(BLANK);
        }
        screen.col = 0;
        screen.row = 0;
        screen.clears += 1;
        Ok(())
    }

    fn set_cursor(&mut self, col: u16, row: u16) -> io::Result<()> {
        let mut screen = lock(&self.screen);
        screen.col = col;
        screen.row = row;
        Ok(())
    }

    fn set_colors(&mut self, fg: Color, bg: Option<Color>) -> io::Result<()> {
        let mut screen = lock(&self.screen);
        screen.fg = fg;
        screen.bg = bg;
        Ok(())
    }

    fn print_text(&mut self, text: &str) -> io::Result<()> {
        let mut screen = lock(&self.screen);
        let (fg, bg, row) = (screen.fg, screen.bg, usize::from(screen.row));
        for ch in text.chars() {
            let col = usize::from(screen.col);
            if let Some(cell) = screen.cells.get_mut(row).and_then(|cells| cells.get_mut(col)) {
                *cell = Cell {
                    ch,
                    fg: Some(fg),
                    bg,
                };
            }
            screen.col = screen.col.saturating_add(1);
        }
        Ok(())
    }

    fn width(&self) -> u16 {
        lock(&self.screen).width
    }
}

/// Sink that keeps every sample written to it
#[derive(Debug, Default)]
pub struct CollectingSink {
    samples: Vec<i16>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }
}

impl AudioSink for CollectingSink {
    fn write(&mut self, samples: &[i16]) -> io::Result<()> {
        self.samples.extend_from_slice(samples);
        Ok(())
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::AcqRel);
    }

    pub fn set(&self, ms: u64) {
        self.now.store(ms, Ordering::Release);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::Acquire)
    }
}

#[derive(Debug, Default)]
struct EepromCells {
    bytes: [u8; EEPROM_SIZE],
    commits: usize,
}

/// Persistent store that lives as long as its clones
#[derive(Debug, Clone, Default)]
pub struct MemoryEeprom {
    cells: Arc<Mutex<EepromCells>>,
}

impl MemoryEeprom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bytes(&self) -> [u8; EEPROM_SIZE] {
        lock(&self.cells).bytes
    }

    pub fn commits(&self) -> usize {
        lock(&self.cells).commits
    }
}

impl PersistentStore for MemoryEeprom {
    fn read(&self, addr: usize) -> Result<u8, PersistError> {
        lock(&self.cells)
            .bytes
            .get(addr)
            .copied()
            .ok_or(PersistError::Address(addr))
    }

    fn write(&mut self, addr: usize, value: u8) -> Result<(), PersistError> {
        let mut cells = lock(&self.cells);
        let byte = cells
            .bytes
            .get_mut(addr)
            .ok_or(PersistError::Address(addr))?;
        *byte = value;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), PersistError> {
        lock(&self.cells).commits += 1;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Pixels {
    colors: [(u8, u8, u8); LED_COUNT],
    shows: usize,
}

/// Indicator lights that remember the last colours shown
#[derive(Debug, Clone, Default)]
pub struct RecordingLights {
    pixels: Arc<Mutex<Pixels>>,
}

impl RecordingLights {
    pub fn pixels(&self) -> [(u8, u8, u8); LED_COUNT] {
        lock(&self.pixels).colors
    }

    pub fn shows(&self) -> usize {
        lock(&self.pixels).shows
    }
}

impl IndicatorLights for RecordingLights {
    fn set_pixel_color(&mut self, index: usize, r: u8, g: u8, b: u8) {
        if let Some(pixel) = lock(&self.pixels).colors.get_mut(index) {
            *pixel = (r, g, b);
        }
    }

    fn show(&mut self) {
        lock(&self.pixels).shows += 1;
    }
}

/// Activate control level set directly by the test
#[derive(Debug)]
pub struct HeldLevel {
    released: AtomicBool,
}

impl HeldLevel {
    pub fn released() -> Self {
        Self {
            released: AtomicBool::new(true),
        }
    }

    pub fn held() -> Self {
        Self {
            released: AtomicBool::new(false),
        }
    }

    pub fn set_released(&self, released: bool) {
        self.released.store(released, Ordering::Release);
    }
}

impl ControlLevel for HeldLevel {
    fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

/// Potentiometer parked at one reading
#[derive(Debug, Clone, Copy)]
pub struct FixedPot(pub u16);

impl AnalogInput for FixedPot {
    fn read(&mut self) -> u16 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_storage_lists_in_insertion_order() {
        let storage = MemoryStorage::new()
            .with_file("b.wav", vec![])
            .with_file("Album/x.wav", vec![])
            .with_dir("Empty");

        assert_eq!(
            storage.enumerate("").unwrap(),
            vec![
                Entry::file("b.wav"),
                Entry::directory("Album"),
                Entry::directory("Empty")
            ]
        );
        assert_eq!(storage.enumerate("Album").unwrap(), vec![Entry::file("x.wav")]);
        assert!(storage.enumerate("Empty").unwrap().is_empty());
    }

    #[test]
    fn test_storage_errors() {
        let storage = MemoryStorage::new().with_file("Album/x.wav", vec![1, 2]);

        assert!(matches!(
            storage.enumerate("Album/x.wav"),
            Err(StorageError::NotADirectory(_))
        ));
        assert!(storage.enumerate("Missing").is_err());
        assert!(storage.open("Album").is_err());
        assert!(storage.open("Album/y.wav").is_err());

        let mut bytes = Vec::new();
        storage
            .open("Album/x.wav")
            .unwrap()
            .read_to_end(&mut bytes)
            .unwrap();
        assert_eq!(bytes, vec![1, 2]);
    }

    #[test]
    fn test_unavailable_storage() {
        let storage = MemoryStorage::new().with_dir("Album").unavailable();
        assert!(matches!(
            storage.enumerate(""),
            Err(StorageError::Unavailable { .. })
        ));
    }

    #[test]
    fn test_recording_display_clips_rows() {
        let mut display = RecordingDisplay::new(4, 2);
        display.set_cursor(2, 1).unwrap();
        display.print_text("abcdef").unwrap();
        assert_eq!(display.row_text(1), "  ab");
        assert_eq!(display.row_text(5), "");
    }

    #[test]
    fn test_eeprom_rejects_out_of_range_address() {
        let mut store = MemoryEeprom::new();
        assert!(matches!(store.write(EEPROM_SIZE, 1), Err(PersistError::Address(_))));
        assert!(store.read(EEPROM_SIZE).is_err());
    }
}
