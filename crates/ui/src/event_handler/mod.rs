mod key_action;
mod normal_mode;
mod settings_mode;

pub use key_action::KeyAction;

use crate::state::{AppState, Focus};

use crossterm::event::{Event, KeyEvent, KeyEventKind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc;

use self::{normal_mode::handle_normal_key, settings_mode::handle_settings_key};

/// Event handler for the TUI application
pub struct EventHandler;

impl EventHandler {
    /// Read a single event from the terminal
    ///
    /// Returns `Some(event)` if an event is available, `None` on timeout or error.
    /// Terminal errors are logged but not propagated; the loop simply polls again.
    pub fn read(timeout: Duration) -> Option<Event> {
        match crossterm::event::poll(timeout) {
            Ok(true) => match crossterm::event::read() {
                Ok(event) => Some(event),
                Err(e) => {
                    tracing::warn!("Terminal error: {}", e);
                    None
                }
            },
            Ok(false) => None,
            Err(e) => {
                tracing::warn!("Event poll error: {}", e);
                None
            }
        }
    }

    /// Start a reader thread that forwards terminal events to the async loop
    pub fn spawn_reader(poll: Duration) -> std::io::Result<EventReader> {
        EventReader::spawn(move || Self::read(poll))
    }

    /// Handle a keyboard event, routing to the open dialog first
    pub fn handle_key_event(event: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
        if event.kind != KeyEventKind::Press {
            return None;
        }

        match state.dialog {
            Some(_) => handle_settings_key(event, state),
            None => handle_normal_key(event, state),
        }
    }

    /// Handle any terminal event. Pasted text goes to whichever editor has focus.
    pub fn handle_event(event: &Event, state: &mut AppState) -> Option<KeyAction> {
        match event {
            Event::Key(key_event) => Self::handle_key_event(*key_event, state),
            Event::Paste(text) => Self::handle_paste(text, state),
            _ => None,
        }
    }

    fn handle_paste(text: &str, state: &mut AppState) -> Option<KeyAction> {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        if let Some(dialog) = state.dialog.as_mut() {
            dialog.key.insert_str(text.trim());
            return Some(KeyAction::SettingsEdited);
        }

        if state.focus != Focus::Input {
            return None;
        }
        state.editor.insert_str(&text);
        Some(KeyAction::InputChanged { text: state.editor.text().to_string() })
    }
}

/// Terminal events read on a dedicated thread.
///
/// The channel keeps events that arrive while the loop is busy redrawing for stream updates,
/// so keys are never lost to a dropped poll. The thread stops once the reader is dropped.
pub struct EventReader {
    events: mpsc::UnboundedReceiver<Event>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl EventReader {
    /// Run `source` in a loop on a new thread; `None` means nothing arrived within its poll window.
    pub fn spawn<F>(mut source: F) -> std::io::Result<Self>
    where
        F: FnMut() -> Option<Event> + Send + 'static,
    {
        let (tx, events) = mpsc::unbounded_channel();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = std::thread::Builder::new()
            .name("peditor-events".to_string())
            .spawn(move || {
                while !stop_flag.load(Ordering::Relaxed) {
                    if let Some(event) = source()
                        && tx.send(event).is_err()
                    {
                        break;
                    }
                }
                tracing::debug!("Event reader stopped");
            })?;

        Ok(Self { events, stop, handle: Some(handle) })
    }

    /// Next terminal event. Cancel-safe, so it can sit in a `select!` beside other branches.
    pub async fn next(&mut self) -> Option<Event> {
        self.events.recv().await
    }
}

impl Drop for EventReader {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        self.events.close();
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("Event reader thread panicked");
        }
    }
}
