pub mod app;
pub mod clipboard;
pub mod components;
pub mod event_handler;
pub mod layout;
pub mod markdown;
pub mod state;
pub mod syntax;
pub mod theme;

pub use app::{App, run};
pub use clipboard::{Clipboard, MemoryClipboard, SystemClipboard};
pub use event_handler::{EventHandler, EventReader, KeyAction};
pub use layout::{EditorLayout, LayoutMode};
pub use state::{AppState, Focus};
pub use theme::Theme;
