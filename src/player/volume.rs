//! Majority-vote smoothing of the volume potentiometer.
//!
//! The analog line is unfiltered, so single readings jump between adjacent
//! steps. Each reading is mapped to a gain and written into a ten-slot ring;
//! the active gain only changes once seven of the ten slots hold exactly the
//! value in slot zero. Real changes therefore show up a few readings late and
//! one-off spikes never do.

use crate::constants::{ADC_MAX, MAX_GAIN, VOLUME_LEVELS, VOLUME_MAJORITY, VOLUME_WINDOW};
use crate::hal::AnalogInput;

#[derive(Debug, Clone)]
pub struct VolumeWindow {
    samples: [f32; VOLUME_WINDOW],
    rotation: usize,
    gain: f32,
}

impl VolumeWindow {
    /// Window pre-filled with `initial_gain`, which is also the active gain.
    pub fn new(initial_gain: f32) -> Self {
        Self {
            samples: [initial_gain; VOLUME_WINDOW],
            rotation: 0,
            gain: initial_gain,
        }
    }

    /// Read the potentiometer once and return the (possibly unchanged) gain.
    pub fn sample(&mut self, input: &mut dyn AnalogInput) -> f32 {
        self.push_raw(input.read())
    }

    /// Record one raw reading and return the effective gain.
    pub fn push_raw(&mut self, raw: u16) -> f32 {
        self.samples[self.rotation] = raw_to_gain(raw);
        self.rotation = (self.rotation + 1) % VOLUME_WINDOW;
        self.effective_gain()
    }

    /// Adopt slot zero if it holds the majority, else keep the previous gain.
    pub fn effective_gain(&mut self) -> f32 {
        let candidate = self.samples[0];
        let count = self.samples.iter().filter(|&&s| s == candidate).count();
        if count >= VOLUME_MAJORITY {
            self.gain = candidate;
        }
        self.gain
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }
}

/// Integer step (0..=VOLUME_LEVELS) for a raw ADC reading
pub fn raw_to_level(raw: u16) -> u16 {
    let raw = u32::from(raw.min(ADC_MAX));
    (raw * u32::from(VOLUME_LEVELS) / u32::from(ADC_MAX)) as u16
}

pub fn raw_to_gain(raw: u16) -> f32 {
    (MAX_GAIN / f32::from(VOLUME_LEVELS)) * f32::from(raw_to_level(raw))
}

/// Scale samples in place, truncating toward zero.
pub fn apply_gain(samples: &mut [i16], gain: f32) {
    for sample in samples.iter_mut() {
        *sample = (f32::from(*sample) * gain) as i16;
    }
}
