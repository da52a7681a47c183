use hound::{SampleFormat, WavSpec, WavWriter};
use owo_colors::OwoColorize;
use std::error::Error;
use std::f32::consts::TAU;
use std::path::Path;
use wavdeck::constants::{CHANNELS, SAMPLE_RATE};

const AMPLITUDE: f32 = 0.8;

/// The only layout the player streams: 44-byte header, 16-bit stereo PCM
pub fn player_spec() -> WavSpec {
    WavSpec {
        channels: CHANNELS,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

pub fn write_tone(path: &Path, frequency: f32, seconds: f32) -> Result<u32, Box<dyn Error>> {
    if frequency <= 0.0 || seconds <= 0.0 {
        return Err("Frequency and duration must be positive".into());
    }

    let frames = (seconds * SAMPLE_RATE as f32) as u32;
    let mut writer = WavWriter::create(path, player_spec())?;
    for n in 0..frames {
        let t = n as f32 / SAMPLE_RATE as f32;
        let sample = ((TAU * frequency * t).sin() * AMPLITUDE * f32::from(i16::MAX)) as i16;
        for _ in 0..CHANNELS {
            writer.write_sample(sample)?;
        }
    }
    writer.finalize()?;
    Ok(frames)
}

pub fn handle_tone(path: &str, frequency: f32, seconds: f32) -> Result<(), Box<dyn Error>> {
    let expanded = shellexpand::tilde(path);
    let path = Path::new(expanded.as_ref());
    let frames = write_tone(path, frequency, seconds)?;

    println!(
        "{} {} ({} Hz, {} frames)",
        "Wrote".green(),
        path.display().to_string().cyan(),
        frequency,
        frames
    );
    Ok(())
}
