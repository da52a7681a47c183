//! Indicator pixels on the host: latched colours reported to the log.

use log::info;

use crate::constants::LED_COUNT;
use crate::hal::IndicatorLights;

#[derive(Debug, Default)]
pub struct LogLights {
    staged: [(u8, u8, u8); LED_COUNT],
    shown: [(u8, u8, u8); LED_COUNT],
}

impl LogLights {
    /// Colours latched by the last `show`
    pub fn shown(&self) -> [(u8, u8, u8); LED_COUNT] {
        self.shown
    }
}

pub fn hex(rgb: (u8, u8, u8)) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb.0, rgb.1, rgb.2)
}

impl IndicatorLights for LogLights {
    fn set_pixel_color(&mut self, index: usize, r: u8, g: u8, b: u8) {
        if let Some(pixel) = self.staged.get_mut(index) {
            *pixel = (r, g, b);
        }
    }

    fn show(&mut self) {
        self.shown = self.staged;
        let colors: Vec<String> = self.shown.iter().copied().map(hex).collect();
        info!("Indicators: {}", colors.join(" "));
    }
}
