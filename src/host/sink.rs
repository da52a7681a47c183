//! Audio sinks for the host.
//!
//! [`PacedSink`] discards the samples but blocks for as long as real
//! hardware would take to play them, so the streamer runs at the real rate
//! without a sound device. [`RodioSink`] plays through the default output
//! device and is only built with the `speaker` feature.

use std::io;
use std::thread;
use std::time::{Duration, Instant};

use crate::constants::{CHANNELS, SAMPLE_RATE};
use crate::hal::AudioSink;

/// Playback time of `samples` interleaved samples
pub fn frame_duration(samples: usize) -> Duration {
    let frames = samples as u64 / u64::from(CHANNELS);
    Duration::from_micros(frames * 1_000_000 / u64::from(SAMPLE_RATE))
}

/// Sink that only keeps time
pub struct PacedSink {
    deadline: Option<Instant>,
    written: u64,
}

impl PacedSink {
    pub fn new() -> Self {
        Self {
            deadline: None,
            written: 0,
        }
    }

    /// Samples accepted so far
    pub fn written(&self) -> u64 {
        self.written
    }
}

impl Default for PacedSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink for PacedSink {
    fn write(&mut self, samples: &[i16]) -> io::Result<()> {
        let now = Instant::now();
        // Restart the timeline after a gap (pause, reopen)
        let start = match self.deadline {
            Some(deadline) if deadline > now => deadline,
            _ => now,
        };
        let deadline = start + frame_duration(samples.len());
        self.deadline = Some(deadline);
        self.written += samples.len() as u64;

        // Keep one frame queued like a DMA buffer would
        let wait_until = deadline.checked_sub(frame_duration(samples.len()));
        if let Some(wait_until) = wait_until
            && wait_until > now
        {
            thread::sleep(wait_until - now);
        }
        Ok(())
    }
}

#[cfg(feature = "speaker")]
pub use speaker::RodioSink;

#[cfg(feature = "speaker")]
mod speaker {
    use rodio::buffer::SamplesBuffer;
    use rodio::{OutputStream, OutputStreamHandle, Sink};
    use std::io;
    use std::thread;
    use std::time::Duration;

    use crate::constants::{CHANNELS, SAMPLE_RATE};
    use crate::hal::AudioSink;

    /// Buffers queued in rodio before `write` starts blocking
    const MAX_QUEUED: usize = 4;

    pub struct RodioSink {
        sink: Sink,
        // The stream must outlive the sink
        _stream: OutputStream,
        _handle: OutputStreamHandle,
    }

    impl RodioSink {
        /// Open the default output device. Must be called on the thread that
        /// will write to the sink.
        pub fn open() -> io::Result<Self> {
            let (stream, handle) = OutputStream::try_default().map_err(io::Error::other)?;
            let sink = Sink::try_new(&handle).map_err(io::Error::other)?;
            log::info!("Opened default audio output");
            Ok(Self {
                sink,
                _stream: stream,
                _handle: handle,
            })
        }
    }

    impl AudioSink for RodioSink {
        fn write(&mut self, samples: &[i16]) -> io::Result<()> {
            while self.sink.len() >= MAX_QUEUED {
                thread::sleep(Duration::from_millis(1));
            }
            self.sink
                .append(SamplesBuffer::new(CHANNELS, SAMPLE_RATE, samples.to_vec()));
            Ok(())
        }
    }
}
