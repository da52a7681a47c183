use std::sync::Arc;
use std::time::Duration;

use wavdeck::constants::{DEBOUNCE_MS, END_OF_STREAM_TIMEOUT_MS, WAV_HEADER_LEN};
use wavdeck::hal::Clock;
use wavdeck::host::memory::{CollectingSink, HeldLevel, ManualClock, MemoryStorage};
use wavdeck::player::input::EdgeInput;
use wavdeck::player::navigator::{NavigationState, Navigator};
use wavdeck::player::session::StreamSlot;
use wavdeck::player::state::SharedState;
use wavdeck::player::streamer::{FrameStreamer, StepOutcome};

/// A file whose header bytes would be loud garbage if they were ever played
fn pcm_file(samples: &[i16]) -> Vec<u8> {
    let mut bytes = vec![0x7f; WAV_HEADER_LEN as usize];
    for sample in samples {
        bytes.extend_from_slice(&sample.to_le_bytes());
    }
    bytes
}

struct Player {
    navigator: Navigator,
    streamer: FrameStreamer<CollectingSink>,
    input: EdgeInput,
    state: Arc<SharedState>,
    clock: Arc<ManualClock>,
}

fn boot(storage: MemoryStorage) -> Player {
    let state = Arc::new(SharedState::new(1.0));
    let slot = Arc::new(StreamSlot::new());
    let clock = Arc::new(ManualClock::new());
    clock.set(1_000);

    let mut navigator = Navigator::new(Arc::new(storage), state.clone(), slot.clone());
    navigator.load_root().unwrap();
    let streamer = FrameStreamer::new(slot, state.clone(), clock.clone(), CollectingSink::new())
        .with_settle_delay(Duration::ZERO);

    Player {
        navigator,
        streamer,
        input: EdgeInput::new(state.clone(), DEBOUNCE_MS),
        state,
        clock,
    }
}

impl Player {
    /// Press and release activate after `held` ms, then run the navigation loop
    fn press(&mut self, held: u64) {
        self.clock.advance(DEBOUNCE_MS);
        assert!(self.input.on_activate_edge(self.clock.now_ms()));
        self.clock.advance(held);
        self.navigator
            .tick(self.clock.now_ms(), &HeldLevel::released());
    }

    fn next(&mut self) {
        self.clock.advance(DEBOUNCE_MS);
        assert!(self.input.on_next_edge(self.clock.now_ms()));
    }
}

fn card() -> MemoryStorage {
    MemoryStorage::new()
        .with_file("intro.wav", pcm_file(&[1, 1]))
        .with_file("Album/first.wav", pcm_file(&[1000, -1000, 500, -500]))
        .with_file("Album/second.wav", pcm_file(&[7, -7]))
        .with_file(".hidden.wav", pcm_file(&[9, 9]))
        .with_file("outro.wav", pcm_file(&[2, 2]))
}

#[test]
fn test_browse_play_and_auto_advance() {
    let mut player = boot(card());
    assert_eq!(player.navigator.nav_state(), NavigationState::AtRoot);
    assert_eq!(player.navigator.model().len(), 3);

    player.next();
    assert_eq!(player.state.cursor(), 1);

    player.press(300);
    assert_eq!(player.navigator.nav_state(), NavigationState::InsideDirectory);
    assert_eq!(player.navigator.model().path(), "Album");
    assert_eq!(player.navigator.model().len(), 2);
    assert_eq!(player.state.cursor(), 0);

    player.press(300);
    assert_eq!(
        player.navigator.nav_state(),
        NavigationState::Playing { paused: false }
    );
    assert_eq!(player.navigator.session().path(), Some("Album/first.wav"));

    // Streaming starts right after the header
    assert_eq!(player.streamer.step().unwrap(), StepOutcome::Streamed(8));
    assert_eq!(player.streamer.sink().samples(), &[1000, -1000, 500, -500]);

    player.clock.advance(END_OF_STREAM_TIMEOUT_MS + 1);
    assert_eq!(
        player.streamer.step().unwrap(),
        StepOutcome::EndOfStream { next: 1 }
    );

    player
        .navigator
        .tick(player.clock.now_ms(), &HeldLevel::released());
    assert_eq!(player.state.cursor(), 1);
    assert_eq!(player.navigator.session().path(), Some("Album/second.wav"));
    assert_eq!(player.streamer.step().unwrap(), StepOutcome::Streamed(4));
    assert_eq!(&player.streamer.sink().samples()[4..], &[7, -7]);
}

#[test]
fn test_pause_stops_streaming_until_resumed() {
    let mut player = boot(card());
    player.next();
    player.press(300);
    player.press(300);

    player.press(300);
    assert_eq!(
        player.navigator.nav_state(),
        NavigationState::Playing { paused: true }
    );
    assert_eq!(player.streamer.step().unwrap(), StepOutcome::Idle);
    assert!(player.streamer.sink().samples().is_empty());

    player.press(300);
    assert_eq!(player.streamer.step().unwrap(), StepOutcome::Streamed(8));
}

#[test]
fn test_long_press_returns_to_root() {
    let mut player = boot(card());
    player.next();
    player.press(300);
    player.press(300);

    player.press(1_000);
    assert_eq!(player.navigator.nav_state(), NavigationState::AtRoot);
    assert!(player.navigator.model().is_root());
    assert!(!player.navigator.session().is_open());
    assert!(!player.state.is_streaming());
    assert_eq!(player.streamer.step().unwrap(), StepOutcome::Idle);
}

#[test]
fn test_bounce_is_ignored() {
    let mut player = boot(card());
    let now = player.clock.now_ms();
    assert!(player.input.on_next_edge(now));
    assert!(!player.input.on_next_edge(now + 50));
    assert_eq!(player.state.cursor(), 1);

    // Inside the bounce window the press is not classified yet
    player.clock.advance(DEBOUNCE_MS);
    assert!(player.input.on_activate_edge(player.clock.now_ms()));
    player.clock.advance(100);
    player
        .navigator
        .tick(player.clock.now_ms(), &HeldLevel::released());
    assert_eq!(player.navigator.nav_state(), NavigationState::AtRoot);
    assert!(player.state.press_pending());
}
