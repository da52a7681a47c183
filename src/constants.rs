//! Device-wide constants shared across the player modules.
//!
//! This module centralizes the timing windows, buffer sizes and display
//! geometry so the input handlers, the two activities and the tests all
//! agree on the same numbers.

/// Minimum interval between two accepted button edges, in milliseconds
pub const DEBOUNCE_MS: u64 = 300;

/// A press released before this many milliseconds is not yet evaluated
pub const SHORT_PRESS_MIN_MS: u64 = 200;

/// Presses released at or after this many milliseconds count as long presses
pub const LONG_PRESS_MS: u64 = 800;

/// Size of the PCM container header skipped when a stream is opened
pub const WAV_HEADER_LEN: u64 = 44;

/// Bytes pulled from the open stream per frame (512 16-bit samples)
pub const FRAME_BUFFER_BYTES: usize = 1024;

/// Zero-byte reads for longer than this are treated as end of stream
pub const END_OF_STREAM_TIMEOUT_MS: u64 = 500;

/// Pause before the next track is reopened, lets the sink drain
pub const SETTLE_DELAY_MS: u64 = 500;

/// Activity A loop period
pub const LOOP_INTERVAL_MS: u64 = 10;

/// Activity B back-off when there is nothing to stream
pub const IDLE_BACKOFF_MS: u64 = 2;

/// Upper bound on entries kept for a single directory
pub const LISTING_CAPACITY: usize = 100;

/// Visible listing rows on the root menu
pub const MENU_ROWS: usize = 7;

/// Visible listing rows inside a directory (one row is the now-playing banner)
pub const DIRECTORY_ROWS: usize = 6;

/// Entries whose names start with this character are hidden
pub const HIDDEN_PREFIX: char = '.';

/// Output format of the audio sink
pub const SAMPLE_RATE: u32 = 44_100;
pub const CHANNELS: u16 = 2;

/// Full-scale reading of the volume potentiometer ADC
pub const ADC_MAX: u16 = 4095;

/// Number of discrete volume steps the potentiometer is mapped onto
pub const VOLUME_LEVELS: u16 = 15;

/// Gain at the top volume step
pub const MAX_GAIN: f32 = 0.55;

/// Gain used before the smoothing window has settled
pub const INITIAL_GAIN: f32 = 0.1;

/// Samples kept in the volume smoothing ring
pub const VOLUME_WINDOW: usize = 10;

/// Agreeing samples needed before a new gain is adopted
pub const VOLUME_MAJORITY: usize = 7;

/// Size of the persisted region; bytes 0..6 hold two RGB triples
pub const EEPROM_SIZE: usize = 7;

/// Number of indicator pixels
pub const LED_COUNT: usize = 2;

/// Configuration request lines at or below this length are ignored
pub const MIN_CONFIG_REQUEST_LEN: usize = 72;

/// Number of colour fields carried by a configuration submission
pub const COLOR_FIELDS: usize = 6;
