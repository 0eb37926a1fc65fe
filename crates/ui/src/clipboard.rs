use peditor_core::{Error, Result};
use std::sync::{Arc, Mutex};

/// Where copied text goes
pub trait Clipboard: Send {
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// The desktop clipboard
#[derive(Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "clipboard")]
impl Clipboard for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        arboard::Clipboard::new()
            .and_then(|mut clipboard| clipboard.set_text(text.to_string()))
            .map_err(|e| Error::Clipboard(e.to_string()))
    }
}

#[cfg(not(feature = "clipboard"))]
impl Clipboard for SystemClipboard {
    fn write_text(&mut self, _text: &str) -> Result<()> {
        Err(Error::Clipboard("built without clipboard support".to_string()))
    }
}

/// In-process clipboard; clones share the same contents
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    contents: Arc<Mutex<Option<String>>>,
    fail: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clipboard whose writes always fail
    pub fn failing() -> Self {
        Self { contents: Arc::default(), fail: true }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().ok().and_then(|c| c.clone())
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        if self.fail {
            return Err(Error::Clipboard("clipboard unavailable".to_string()));
        }
        let mut contents = self
            .contents
            .lock()
            .map_err(|_| Error::Other("clipboard lock poisoned".to_string()))?;
        *contents = Some(text.to_string());
        Ok(())
    }
}
