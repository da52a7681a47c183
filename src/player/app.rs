//! Boot sequence and Activity A: the navigation loop.
//!
//! [`Device`] owns everything the navigation activity touches: the volume
//! window, the navigator, the display, the indicator lights, the persistent
//! store and the configuration endpoint. [`run`] wires it to the host
//! peripherals, starts the frame streamer and the keyboard, and loops until
//! shutdown.

use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info, warn};
use std::error::Error;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::colors::ColorConfig;
use super::endpoint::ConfigEndpoint;
use super::input::EdgeInput;
use super::navigator::Navigator;
use super::render;
use super::session::StreamSlot;
use super::state::SharedState;
use super::streamer::{self, SinkError};
use super::volume::VolumeWindow;
use crate::config::Config;
use crate::constants::{INITIAL_GAIN, LOOP_INTERVAL_MS};
use crate::hal::{
    AnalogInput, Clock, ControlLevel, Display, IndicatorLights, PersistentStore, Storage,
    SystemClock,
};
use crate::host::eeprom::FileEeprom;
use crate::host::fs::FsStorage;
use crate::host::keyboard::{self, HoldLevel, KeyboardPot};
use crate::host::lights::LogLights;
use crate::host::sink::PacedSink;
use crate::host::terminal::TerminalDisplay;

/// The peripherals Activity A drives
pub struct Peripherals {
    pub storage: Arc<dyn Storage>,
    pub display: Box<dyn Display>,
    pub lights: Box<dyn IndicatorLights>,
    pub store: Box<dyn PersistentStore>,
    pub pot: Box<dyn AnalogInput>,
    pub activate: Arc<dyn ControlLevel>,
    pub clock: Arc<dyn Clock>,
}

pub struct Device {
    state: Arc<SharedState>,
    clock: Arc<dyn Clock>,
    navigator: Navigator,
    volume: VolumeWindow,
    pot: Box<dyn AnalogInput>,
    activate: Arc<dyn ControlLevel>,
    display: Box<dyn Display>,
    lights: Box<dyn IndicatorLights>,
    store: Box<dyn PersistentStore>,
    endpoint: Option<ConfigEndpoint>,
}

impl Device {
    /// Light the indicators from the persisted colours and mount the root.
    ///
    /// Neither step is fatal: a store that cannot be read leaves the lights
    /// dark and a missing card leaves the device on the `NO CARD` screen.
    pub fn boot(
        peripherals: Peripherals,
        state: Arc<SharedState>,
        slot: Arc<StreamSlot>,
        endpoint: Option<ConfigEndpoint>,
    ) -> Self {
        let Peripherals {
            storage,
            display,
            mut lights,
            store,
            pot,
            activate,
            clock,
        } = peripherals;

        match ColorConfig::load(store.as_ref()) {
            Ok(colors) => colors.apply(lights.as_mut()),
            Err(e) => warn!("Could not read indicator colours: {e}"),
        }

        let mut navigator = Navigator::new(storage, state.clone(), slot);
        if let Err(e) = navigator.load_root() {
            error!("Storage mount failed: {e}");
        }

        Self {
            volume: VolumeWindow::new(state.gain()),
            state,
            clock,
            navigator,
            pot,
            activate,
            display,
            lights,
            store,
            endpoint,
        }
    }

    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// One iteration of the navigation loop.
    pub fn step(&mut self) {
        let gain = self.volume.sample(self.pot.as_mut());
        self.state.set_gain(gain);

        self.navigator
            .tick(self.clock.now_ms(), self.activate.as_ref());

        if let Err(e) = render::dispatch(&self.state, self.display.as_mut(), &self.navigator.view())
        {
            warn!("Render failed: {e}");
        }

        if let Some(endpoint) = &self.endpoint {
            match endpoint.poll(self.store.as_mut()) {
                Ok(Some(colors)) => info!("New indicator colours take effect on next boot: {colors:?}"),
                Ok(None) => {}
                Err(e) => warn!("Configuration client failed: {e}"),
            }
        }
    }

    /// Loop until shutdown is requested.
    pub fn run(&mut self) {
        info!("Navigation loop running");
        while !self.state.shutdown_requested() {
            self.step();
            thread::sleep(Duration::from_millis(LOOP_INTERVAL_MS));
        }
        // Indicators off on the way out
        ColorConfig::default().apply(self.lights.as_mut());
        info!("Navigation loop stopped");
    }
}

/// Start the frame streamer with the output the configuration asks for.
fn spawn_audio(
    config: &Config,
    slot: Arc<StreamSlot>,
    state: Arc<SharedState>,
    clock: Arc<dyn Clock>,
) -> io::Result<JoinHandle<()>> {
    #[cfg(feature = "speaker")]
    if config.speaker {
        use crate::host::sink::RodioSink;
        return streamer::spawn(
            slot,
            state,
            clock,
            Box::new(|| -> Result<RodioSink, SinkError> { Ok(RodioSink::open()?) }),
        );
    }

    #[cfg(not(feature = "speaker"))]
    if config.speaker {
        warn!("Speaker output requested but wavdeck was built without the 'speaker' feature");
    }
    streamer::spawn(
        slot,
        state,
        clock,
        Box::new(|| -> Result<PacedSink, SinkError> { Ok(PacedSink::new()) }),
    )
}

/// Run the player on the terminal until the user quits.
pub fn run(config: &Config) -> Result<(), Box<dyn Error>> {
    init_logging(&config.log_file_path())?;
    info!("Starting wavdeck");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let state = Arc::new(SharedState::new(INITIAL_GAIN));
    let slot = Arc::new(StreamSlot::new());

    let music_root = config.music_root_path();
    info!("Music root: {}", music_root.display());
    let storage: Arc<dyn Storage> = Arc::new(FsStorage::new(music_root));
    let store = FileEeprom::open(Config::eeprom_path()?)?;

    let endpoint = match ConfigEndpoint::bind((config.bind_address.as_str(), config.port)) {
        Ok(endpoint) => Some(endpoint),
        Err(e) => {
            warn!(
                "Configuration endpoint disabled, could not bind {}:{}: {e}",
                config.bind_address, config.port
            );
            None
        }
    };

    let audio = spawn_audio(config, slot.clone(), state.clone(), clock.clone())?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide)?;

    let activate = Arc::new(HoldLevel::new(clock.clone()));
    let pot = KeyboardPot::new();
    let keys = keyboard::spawn(
        EdgeInput::new(state.clone(), config.debounce_ms),
        activate.clone(),
        pot.clone(),
        clock.clone(),
    );

    let result = keys.map_err(Box::<dyn Error>::from).map(|keys| {
        let peripherals = Peripherals {
            storage,
            display: Box::new(TerminalDisplay::new(io::stdout())),
            lights: Box::new(LogLights::default()),
            store: Box::new(store),
            pot: Box::new(pot),
            activate,
            clock,
        };
        let mut device = Device::boot(peripherals, state.clone(), slot, endpoint);
        device.run();
        keys
    });

    state.request_shutdown();

    // Always restore the terminal, even if the keyboard never started
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, Show)?;

    let keys = result?;
    if keys.join().is_err() {
        error!("Keyboard thread panicked");
    }
    if audio.join().is_err() {
        error!("Audio thread panicked");
    }
    info!("wavdeck stopped");
    Ok(())
}

fn init_logging(log_file: &Path) -> Result<(), Box<dyn Error>> {
    use simplelog::{CombinedLogger, LevelFilter, WriteLogger};
    use std::fs::File;

    CombinedLogger::init(vec![WriteLogger::new(
        LevelFilter::Debug,
        simplelog::Config::default(),
        File::create(log_file)?,
    )])?;

    Ok(())
}
