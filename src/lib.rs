//! wavdeck: the core of a pocket WAV player.
//!
//! The device browses a directory tree on removable storage, streams raw PCM
//! to an audio sink, draws a small menu on a character display and takes
//! three buttons plus a volume potentiometer as input. A local HTTP form sets
//! the colours of two indicator pixels.
//!
//! [`player`] holds the core, [`hal`] the peripheral interfaces it is written
//! against and [`host`] the implementations that run it on a desktop.

pub mod config;
pub mod constants;
pub mod error;
pub mod hal;
pub mod host;
pub mod player;
