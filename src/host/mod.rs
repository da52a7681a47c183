//! Desktop implementations of the peripheral traits in [`crate::hal`].

pub mod eeprom;
pub mod fs;
pub mod keyboard;
pub mod lights;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod sink;
pub mod terminal;
