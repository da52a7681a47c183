//! Keyboard stand-ins for the three buttons and the volume potentiometer.
//!
//! Terminals report key presses but not releases, so the activate control is
//! modelled as released right away for a short press and held for a fixed
//! time after a long-press key.
//!
//! | key                  | control                 |
//! |----------------------|-------------------------|
//! | Down, `j`            | next                    |
//! | Up, `k`              | previous                |
//! | Enter, Space, `l`    | activate (short press)  |
//! | Backspace, Esc, `h`  | activate (long press)   |
//! | `+`, `=` / `-`       | volume up / down        |
//! | `q`, Ctrl-C          | quit                    |

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::{error, info};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::constants::{ADC_MAX, VOLUME_LEVELS};
use crate::hal::{AnalogInput, Clock, ControlLevel};
use crate::player::input::{EdgeInput, InputEvent};

/// How long a long-press key keeps the activate control down
pub const LONG_HOLD_MS: u64 = 1_000;

/// Raw potentiometer change per volume key
pub const POT_STEP: u16 = ADC_MAX / VOLUME_LEVELS;

const START_LEVEL: u16 = 3;
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Activate control level driven by the keyboard
pub struct HoldLevel {
    clock: Arc<dyn Clock>,
    held_until: AtomicU64,
}

impl HoldLevel {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            held_until: AtomicU64::new(0),
        }
    }

    pub fn hold_for(&self, ms: u64) {
        let until = self.clock.now_ms().saturating_add(ms);
        self.held_until.store(until, Ordering::Release);
    }
}

impl ControlLevel for HoldLevel {
    fn is_released(&self) -> bool {
        self.clock.now_ms() >= self.held_until.load(Ordering::Acquire)
    }
}

/// Potentiometer position moved by the volume keys
#[derive(Debug, Clone)]
pub struct KeyboardPot {
    raw: Arc<AtomicU16>,
}

impl KeyboardPot {
    pub fn new() -> Self {
        Self {
            raw: Arc::new(AtomicU16::new(START_LEVEL * POT_STEP)),
        }
    }

    pub fn raw(&self) -> u16 {
        self.raw.load(Ordering::Relaxed)
    }

    pub fn turn(&self, up: bool) {
        let _ = self
            .raw
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |raw| {
                Some(if up {
                    raw.saturating_add(POT_STEP).min(ADC_MAX)
                } else {
                    raw.saturating_sub(POT_STEP)
                })
            });
    }
}

impl Default for KeyboardPot {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalogInput for KeyboardPot {
    fn read(&mut self) -> u16 {
        self.raw()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Edge(InputEvent),
    LongPress,
    Volume { up: bool },
    Quit,
}

pub fn map_key(key: &KeyEvent) -> Option<KeyAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(KeyAction::Quit);
    }
    let action = match key.code {
        KeyCode::Down | KeyCode::Char('j') => KeyAction::Edge(InputEvent::Next),
        KeyCode::Up | KeyCode::Char('k') => KeyAction::Edge(InputEvent::Previous),
        KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('l') => {
            KeyAction::Edge(InputEvent::Activate)
        }
        KeyCode::Backspace | KeyCode::Esc | KeyCode::Char('h') => KeyAction::LongPress,
        KeyCode::Char('+') | KeyCode::Char('=') => KeyAction::Volume { up: true },
        KeyCode::Char('-') => KeyAction::Volume { up: false },
        KeyCode::Char('q') => KeyAction::Quit,
        _ => return None,
    };
    Some(action)
}

pub struct Keyboard {
    input: EdgeInput,
    level: Arc<HoldLevel>,
    pot: KeyboardPot,
    clock: Arc<dyn Clock>,
}

impl Keyboard {
    pub fn new(
        input: EdgeInput,
        level: Arc<HoldLevel>,
        pot: KeyboardPot,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            input,
            level,
            pot,
            clock,
        }
    }

    /// Apply one key action. Returns false once the user asked to quit.
    pub fn handle(&self, action: KeyAction) -> bool {
        let now = self.clock.now_ms();
        match action {
            KeyAction::Edge(event) => {
                self.input.on_edge(event, now);
            }
            KeyAction::LongPress => {
                if self.input.on_edge(InputEvent::Activate, now) {
                    self.level.hold_for(LONG_HOLD_MS);
                }
            }
            KeyAction::Volume { up } => self.pot.turn(up),
            KeyAction::Quit => {
                self.input.state().request_shutdown();
                return false;
            }
        }
        true
    }

    fn run(self) {
        let state = self.input.state().clone();
        while !state.shutdown_requested() {
            let ready = match event::poll(POLL_INTERVAL) {
                Ok(ready) => ready,
                Err(e) => {
                    error!("Keyboard poll failed: {e}");
                    break;
                }
            };
            if !ready {
                continue;
            }
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    if let Some(action) = map_key(&key)
                        && !self.handle(action)
                    {
                        info!("Quit requested");
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!("Keyboard read failed: {e}");
                    break;
                }
            }
        }
        state.request_shutdown();
    }
}

/// Read keys on their own thread, as the button interrupts would fire.
pub fn spawn(
    input: EdgeInput,
    level: Arc<HoldLevel>,
    pot: KeyboardPot,
    clock: Arc<dyn Clock>,
) -> io::Result<JoinHandle<()>> {
    let keyboard = Keyboard::new(input, level, pot, clock);
    thread::Builder::new()
        .name("keyboard".to_string())
        .spawn(move || keyboard.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::ManualClock;
    use crate::player::state::SharedState;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn create_test_keyboard() -> (Keyboard, Arc<SharedState>, Arc<ManualClock>) {
        let state = Arc::new(SharedState::new(0.1));
        state.reset_listing(5);
        let clock = Arc::new(ManualClock::new());
        let level = Arc::new(HoldLevel::new(clock.clone()));
        let keyboard = Keyboard::new(
            EdgeInput::new(state.clone(), 300),
            level,
            KeyboardPot::new(),
            clock.clone(),
        );
        (keyboard, state, clock)
    }

    #[test]
    fn test_map_key() {
        assert_eq!(map_key(&key(KeyCode::Down)), Some(KeyAction::Edge(InputEvent::Next)));
        assert_eq!(map_key(&key(KeyCode::Char('k'))), Some(KeyAction::Edge(InputEvent::Previous)));
        assert_eq!(map_key(&key(KeyCode::Enter)), Some(KeyAction::Edge(InputEvent::Activate)));
        assert_eq!(map_key(&key(KeyCode::Esc)), Some(KeyAction::LongPress));
        assert_eq!(map_key(&key(KeyCode::Char('-'))), Some(KeyAction::Volume { up: false }));
        assert_eq!(map_key(&key(KeyCode::Char('x'))), None);
        assert_eq!(
            map_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(KeyAction::Quit)
        );
    }

    #[test]
    fn test_keys_go_through_debounce() {
        let (keyboard, state, clock) = create_test_keyboard();
        keyboard.handle(KeyAction::Edge(InputEvent::Next));
        keyboard.handle(KeyAction::Edge(InputEvent::Next));
        assert_eq!(state.cursor(), 1);

        clock.advance(300);
        keyboard.handle(KeyAction::Edge(InputEvent::Next));
        assert_eq!(state.cursor(), 2);
    }

    #[test]
    fn test_long_press_holds_level() {
        let (keyboard, state, clock) = create_test_keyboard();
        clock.set(5_000);
        keyboard.handle(KeyAction::LongPress);
        assert!(state.press_pending());
        assert!(!keyboard.level.is_released());

        clock.advance(LONG_HOLD_MS);
        assert!(keyboard.level.is_released());
    }

    #[test]
    fn test_short_press_is_released_immediately() {
        let (keyboard, state, _) = create_test_keyboard();
        keyboard.handle(KeyAction::Edge(InputEvent::Activate));
        assert!(state.press_pending());
        assert!(keyboard.level.is_released());
    }

    #[test]
    fn test_pot_is_clamped() {
        let pot = KeyboardPot::new();
        for _ in 0..40 {
            pot.turn(true);
        }
        assert_eq!(pot.raw(), ADC_MAX);
        for _ in 0..40 {
            pot.turn(false);
        }
        assert_eq!(pot.raw(), 0);
    }

    #[test]
    fn test_quit_requests_shutdown() {
        let (keyboard, state, _) = create_test_keyboard();
        assert!(!keyboard.handle(KeyAction::Quit));
        assert!(state.shutdown_requested());
    }
}
