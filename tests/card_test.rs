use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use wavdeck::constants::{CHANNELS, SAMPLE_RATE};
use wavdeck::hal::{EntryKind, Storage};
use wavdeck::host::fs::FsStorage;
use wavdeck::host::memory::{CollectingSink, ManualClock};
use wavdeck::player::navigator::{NavigationState, Navigator, Press};
use wavdeck::player::session::StreamSlot;
use wavdeck::player::state::SharedState;
use wavdeck::player::streamer::{FrameStreamer, StepOutcome};

fn write_wav(path: &Path, samples: &[i16]) {
    let spec = WavSpec {
        channels: CHANNELS,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for &sample in samples {
        writer.write_sample(sample).unwrap();
    }
    writer.finalize().unwrap();
}

fn create_card() -> TempDir {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir(temp.path().join("Album")).unwrap();
    write_wav(
        &temp.path().join("Album").join("tone.wav"),
        &[1200, -1200, 300, -300],
    );
    std::fs::write(temp.path().join(".DS_Store"), b"junk").unwrap();
    temp
}

#[test]
fn test_hound_file_streams_from_directory_card() {
    let card = create_card();
    let storage: Arc<dyn Storage> = Arc::new(FsStorage::new(card.path()));
    let state = Arc::new(SharedState::new(1.0));
    let slot = Arc::new(StreamSlot::new());
    let clock = Arc::new(ManualClock::new());

    let mut navigator = Navigator::new(storage, state.clone(), slot.clone());
    navigator.load_root().unwrap();
    assert_eq!(navigator.model().len(), 1);
    assert_eq!(navigator.model().entries()[0].kind, EntryKind::Directory);

    navigator.apply_press(Press::Short);
    assert_eq!(navigator.nav_state(), NavigationState::InsideDirectory);
    navigator.apply_press(Press::Short);
    assert_eq!(navigator.session().path(), Some("Album/tone.wav"));

    let mut streamer = FrameStreamer::new(slot, state, clock, CollectingSink::new())
        .with_settle_delay(Duration::ZERO);
    assert_eq!(streamer.step().unwrap(), StepOutcome::Streamed(8));
    assert_eq!(streamer.sink().samples(), &[1200, -1200, 300, -300]);
}

#[test]
fn test_missing_card_directory_shows_no_card() {
    let card = TempDir::new().unwrap();
    let storage: Arc<dyn Storage> = Arc::new(FsStorage::new(card.path().join("absent")));
    let state = Arc::new(SharedState::new(1.0));
    let mut navigator = Navigator::new(storage, state, Arc::new(StreamSlot::new()));

    assert!(navigator.load_root().is_err());
    assert_eq!(navigator.fault(), Some(wavdeck::player::navigator::NO_CARD));
    assert!(navigator.model().is_empty());
}

#[test]
fn test_press_remounts_once_card_appears() {
    let card = TempDir::new().unwrap();
    let root = card.path().join("card");
    let storage: Arc<dyn Storage> = Arc::new(FsStorage::new(&root));
    let state = Arc::new(SharedState::new(1.0));
    let mut navigator = Navigator::new(storage, state, Arc::new(StreamSlot::new()));
    assert!(navigator.load_root().is_err());

    navigator.apply_press(Press::Short);
    assert_eq!(navigator.fault(), Some(wavdeck::player::navigator::NO_CARD));

    std::fs::create_dir(&root).unwrap();
    write_wav(&root.join("song.wav"), &[1, 2]);
    navigator.apply_press(Press::Short);
    assert_eq!(navigator.fault(), None);
    assert_eq!(navigator.nav_state(), NavigationState::AtRoot);
    assert_eq!(navigator.model().len(), 1);
}
