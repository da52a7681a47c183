//! Activity B: the frame streaming loop.
//!
//! Pulls raw PCM from the open stream, applies the current gain and pushes it
//! to the audio sink. It runs on its own thread so a slow redraw or a
//! configuration client never starves the sink. The sink write blocks for as
//! long as the peripheral needs and is not interrupted by navigation.

use byteorder::{ByteOrder, LittleEndian};
use log::{debug, error, info, warn};
use std::error::Error;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::session::{StreamSlot, advance_target};
use super::state::SharedState;
use super::volume::apply_gain;
use crate::constants::{
    END_OF_STREAM_TIMEOUT_MS, FRAME_BUFFER_BYTES, IDLE_BACKOFF_MS, SETTLE_DELAY_MS,
};
use crate::error::PlaybackError;
use crate::hal::{AudioSink, Clock};

pub type SinkError = Box<dyn Error + Send + Sync>;
pub type SinkFactory<S> = Box<dyn FnOnce() -> Result<S, SinkError> + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Nothing to stream: paused, stopped, or the slot is being reopened
    Idle,
    /// The stream returned no data but has not timed out yet
    Waiting,
    /// Bytes read from the stream and written to the sink
    Streamed(usize),
    /// The stream ran dry; `next` is the entry queued for playback
    EndOfStream { next: usize },
}

pub struct FrameStreamer<S: AudioSink> {
    slot: Arc<StreamSlot>,
    state: Arc<SharedState>,
    clock: Arc<dyn Clock>,
    sink: S,
    bytes: [u8; FRAME_BUFFER_BYTES],
    samples: [i16; FRAME_BUFFER_BYTES / 2],
    generation: u64,
    last_data_ms: u64,
    settle_delay: Duration,
}

impl<S: AudioSink> FrameStreamer<S> {
    pub fn new(
        slot: Arc<StreamSlot>,
        state: Arc<SharedState>,
        clock: Arc<dyn Clock>,
        sink: S,
    ) -> Self {
        let now = clock.now_ms();
        Self {
            slot,
            state,
            clock,
            sink,
            bytes: [0; FRAME_BUFFER_BYTES],
            samples: [0; FRAME_BUFFER_BYTES / 2],
            generation: u64::MAX,
            last_data_ms: now,
            settle_delay: Duration::from_millis(SETTLE_DELAY_MS),
        }
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// One read, scale, write iteration.
    pub fn step(&mut self) -> Result<StepOutcome, PlaybackError> {
        if !self.state.is_streaming() {
            return Ok(StepOutcome::Idle);
        }

        let now = self.clock.now_ms();
        let generation = self.slot.generation();
        if generation != self.generation {
            // A new stream counts as fresh data for the end-of-stream timer
            self.generation = generation;
            self.last_data_ms = now;
        }

        let read = match self.slot.read_frame(&mut self.bytes) {
            None => return Ok(StepOutcome::Idle),
            Some(Ok(read)) => read,
            Some(Err(e)) if e.kind() == io::ErrorKind::Interrupted => 0,
            Some(Err(e)) => {
                warn!("Stream read failed: {e}");
                0
            }
        };

        if read == 0 {
            if now.saturating_sub(self.last_data_ms) > END_OF_STREAM_TIMEOUT_MS {
                return Ok(self.end_of_stream(generation));
            }
            return Ok(StepOutcome::Waiting);
        }

        let count = read / 2;
        LittleEndian::read_i16_into(&self.bytes[..count * 2], &mut self.samples[..count]);
        apply_gain(&mut self.samples[..count], self.state.gain());
        self.sink
            .write(&self.samples[..count])
            .map_err(PlaybackError::Sink)?;

        self.last_data_ms = self.clock.now_ms();
        Ok(StepOutcome::Streamed(read))
    }

    /// Queue the next entry after the current one ran out.
    ///
    /// Only the target is published here; the navigation loop updates the
    /// cursor and reopens the stream on its next pass.
    fn end_of_stream(&mut self, generation: u64) -> StepOutcome {
        if !self.slot.suspend(generation) {
            return StepOutcome::Idle;
        }
        let Some(play_index) = self.state.play_index() else {
            return StepOutcome::Idle;
        };
        let next = advance_target(play_index, self.state.listing_len());
        debug!("End of stream on entry {play_index}, next is {next}");

        thread::sleep(self.settle_delay);

        if self.slot.generation() != generation {
            // Navigation replaced the stream while the sink drained
            return StepOutcome::Idle;
        }
        self.state.set_pending_advance(next);
        self.state.request_redraw();
        StepOutcome::EndOfStream { next }
    }

    /// Stream until shutdown is requested.
    pub fn run(mut self) {
        info!("Frame streamer running");
        while !self.state.shutdown_requested() {
            match self.step() {
                Ok(StepOutcome::Streamed(_)) => {}
                Ok(_) => thread::sleep(Duration::from_millis(IDLE_BACKOFF_MS)),
                Err(e) => {
                    error!("{e}");
                    thread::sleep(Duration::from_millis(IDLE_BACKOFF_MS));
                }
            }
        }
        info!("Frame streamer stopped");
    }
}

/// Start Activity B on its own thread.
///
/// The sink is built on the new thread because some audio backends must be
/// used from the thread that created them.
pub fn spawn<S: AudioSink + 'static>(
    slot: Arc<StreamSlot>,
    state: Arc<SharedState>,
    clock: Arc<dyn Clock>,
    make_sink: SinkFactory<S>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("audio".to_string())
        .spawn(move || match make_sink() {
            Ok(sink) => FrameStreamer::new(slot, state, clock, sink).run(),
            Err(e) => error!("Could not open audio output: {e}"),
        })
}
