// ABOUTME: System clipboard access for copy buttons
// ABOUTME: Wraps arboard behind the navigator's clipboard interface

use async_trait::async_trait;
use log::debug;
use parking_lot::Mutex;

use crate::errors::{DeckError, Result};
use crate::navigator::Clipboard;

/// Clipboard backed by the operating system via `arboard`.
///
/// The handle is opened lazily and kept for the process lifetime, since on
/// X11 the owning process has to stay alive to serve the copied text.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Mutex<Option<arboard::Clipboard>>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        let mut guard = self.inner.lock();
        if guard.is_none() {
            let clipboard = arboard::Clipboard::new()
                .map_err(|e| DeckError::ClipboardError(e.to_string()))?;
            *guard = Some(clipboard);
        }
        if let Some(clipboard) = guard.as_mut() {
            clipboard
                .set_text(text)
                .map_err(|e| DeckError::ClipboardError(e.to_string()))?;
        }
        debug!("Wrote {} bytes to the system clipboard", text.len());
        Ok(())
    }
}
