use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use autopot_core::ControlSignals;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, info};

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Toggle,
    Reset,
    Quit,
}

/// Spawn a thread that turns key presses into control signals.
///
/// - Space or `t`: toggle auto potion
/// - `r`: reset learned state
/// - Esc, `q` or Ctrl+C: quit
///
/// The thread exits once shutdown has been requested from anywhere.
pub fn spawn_keyboard_monitor(signals: Arc<ControlSignals>) -> JoinHandle<()> {
    thread::spawn(move || {
        debug!("Keyboard monitor started");

        while !signals.is_shutting_down() {
            // Poll with a timeout so shutdown from elsewhere is noticed
            if event::poll(Duration::from_millis(100)).unwrap_or(false)
                && let Ok(Event::Key(key_event)) = event::read()
                && let Some(command) = command_for(&key_event)
            {
                debug!("Key pressed: {:?} -> {:?}", key_event.code, command);
                apply(&signals, command);
            }
        }

        debug!("Keyboard monitor stopped");
    })
}

fn apply(signals: &ControlSignals, command: KeyCommand) {
    match command {
        KeyCommand::Toggle => {
            let enabled = signals.toggle();
            info!("Auto potion {}", if enabled { "enabled" } else { "disabled" });
        }
        KeyCommand::Reset => {
            info!("Reset requested");
            signals.request_reset();
        }
        KeyCommand::Quit => signals.request_shutdown(),
    }
}

/// Map a key event to a command. Releases and repeats are ignored.
fn command_for(event: &KeyEvent) -> Option<KeyCommand> {
    if event.kind != KeyEventKind::Press {
        return None;
    }
    match event.code {
        KeyCode::Esc => Some(KeyCommand::Quit),
        KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(KeyCommand::Quit)
        }
        KeyCode::Char('q') | KeyCode::Char('Q') => Some(KeyCommand::Quit),
        KeyCode::Char(' ') | KeyCode::Char('t') | KeyCode::Char('T') => Some(KeyCommand::Toggle),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(KeyCommand::Reset),
        _ => None,
    }
}
