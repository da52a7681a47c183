//! Indicator colours persisted in the first six bytes of the store.

use log::info;

use crate::constants::{COLOR_FIELDS, LED_COUNT};
use crate::error::PersistError;
use crate::hal::{IndicatorLights, PersistentStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Two RGB triples, pixel 0 first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorConfig {
    pub leds: [Rgb; LED_COUNT],
}

impl ColorConfig {
    pub fn from_bytes(bytes: [u8; COLOR_FIELDS]) -> Self {
        let [r1, g1, b1, r2, g2, b2] = bytes;
        Self {
            leds: [
                Rgb {
                    r: r1,
                    g: g1,
                    b: b1,
                },
                Rgb {
                    r: r2,
                    g: g2,
                    b: b2,
                },
            ],
        }
    }

    pub fn to_bytes(&self) -> [u8; COLOR_FIELDS] {
        let [first, second] = self.leds;
        [first.r, first.g, first.b, second.r, second.g, second.b]
    }

    /// Read the colours stored at addresses 0..6.
    pub fn load(store: &dyn PersistentStore) -> Result<Self, PersistError> {
        let mut bytes = [0u8; COLOR_FIELDS];
        for (addr, byte) in bytes.iter_mut().enumerate() {
            *byte = store.read(addr)?;
        }
        Ok(Self::from_bytes(bytes))
    }

    /// Write the colours to addresses 0..6 and commit.
    pub fn persist(&self, store: &mut dyn PersistentStore) -> Result<(), PersistError> {
        for (addr, byte) in self.to_bytes().into_iter().enumerate() {
            store.write(addr, byte)?;
        }
        store.commit()?;
        info!("Persisted indicator colours {:?}", self.to_bytes());
        Ok(())
    }

    pub fn apply(&self, lights: &mut dyn IndicatorLights) {
        for (index, led) in self.leds.iter().enumerate() {
            lights.set_pixel_color(index, led.r, led.g, led.b);
        }
        lights.show();
    }
}
