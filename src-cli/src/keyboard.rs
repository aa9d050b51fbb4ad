//! Keyboard Input Thread
//!
//! Polls crossterm key events and forwards them to the engine as commands.
//! The same thread logs the events the engine sends back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use crossterm::event::{self, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use matrixviz_core::{Command, Event};
use tracing::{debug, error, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Command bound to a key press, if any
pub fn command_for(key: &KeyEvent) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C')).then_some(Command::Quit);
    }

    let command = match key.code {
        KeyCode::Esc => Command::Quit,
        KeyCode::Char(c) => match c {
            'q' => Command::Quit,
            't' => Command::NextTheme,
            'T' => Command::PrevTheme,
            'g' => Command::ToggleGradient,
            'o' => Command::ToggleOverflow,
            'r' => Command::NextZoom,
            'R' => Command::PrevZoom,
            'b' => Command::ToggleBars,
            'f' => Command::ToggleFull,
            'd' => Command::ToggleDebug,
            's' => Command::ToggleShadow,
            'p' => Command::TogglePeaks,
            'P' => Command::CyclePeakColor,
            'm' => Command::ToggleLayers,
            'v' => Command::ToggleLayerVisible,
            ']' => Command::LayerForward,
            '[' => Command::LayerBackward,
            '+' | '=' => Command::LayerBoostUp,
            '-' => Command::LayerBoostDown,
            '0' => Command::ResetScaling,
            'w' => Command::SaveSettings,
            '1'..='9' => Command::SelectLayer(c as usize - '1' as usize),
            _ => return None,
        },
        _ => return None,
    };
    Some(command)
}

fn log_event(event: &Event) {
    match event {
        Event::Error { message } => warn!("{}", message),
        Event::ThemeChanged { name } => info!("Theme: {}", name),
        Event::ModeChanged { name, enabled } => {
            info!("{}: {}", name, if *enabled { "on" } else { "off" })
        }
        Event::SettingsSaved { path } => info!("Settings saved to {}", path),
        other => debug!("{:?}", other),
    }
}

/// Start the input thread. It stops after forwarding `Quit`, when the
/// engine hangs up, or once `shutdown` is set.
pub fn spawn(
    commands: Sender<Command>,
    events: Receiver<Event>,
    shutdown: Arc<AtomicBool>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("matrixviz-input".to_string())
        .spawn(move || input_loop(&commands, &events, &shutdown))
}

fn input_loop(commands: &Sender<Command>, events: &Receiver<Event>, shutdown: &AtomicBool) {
    while !shutdown.load(Ordering::Relaxed) {
        for event in events.try_iter() {
            log_event(&event);
        }

        let key = match event::poll(POLL_INTERVAL) {
            Ok(true) => match event::read() {
                Ok(event::Event::Key(key)) => key,
                Ok(_) => continue,
                Err(e) => {
                    error!("Failed to read terminal input: {}", e);
                    let _ = commands.send(Command::Quit);
                    break;
                }
            },
            Ok(false) => continue,
            Err(e) => {
                error!("Failed to poll terminal input: {}", e);
                let _ = commands.send(Command::Quit);
                break;
            }
        };

        if let Some(command) = command_for(&key) {
            if commands.send(command).is_err() || command == Command::Quit {
                break;
            }
        }
    }
    debug!("Input thread finished");
}
