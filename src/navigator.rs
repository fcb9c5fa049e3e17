// ABOUTME: Deck state and user-driven navigation
// ABOUTME: Owns slide selection with wraparound, the modal flag and transient copy flags

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use parking_lot::Mutex;
use tokio::task::AbortHandle;

use crate::errors::{DeckError, Result};
use crate::view::{ViewHandle, ViewUpdate};

/// Write-only text clipboard.
#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<()>;
}

/// Mutable presentation state. Exactly one slide is active at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeckState {
    current_index: usize,
    export_in_flight: bool,
    modal_open: bool,
    copied: HashMap<String, bool>,
}

impl DeckState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn is_export_in_flight(&self) -> bool {
        self.export_in_flight
    }

    pub fn is_modal_open(&self) -> bool {
        self.modal_open
    }

    pub fn is_copied(&self, key: &str) -> bool {
        self.copied.get(key).copied().unwrap_or(false)
    }

    pub(crate) fn select(&mut self, index: usize) {
        self.current_index = index;
    }

    pub(crate) fn set_export_in_flight(&mut self, in_flight: bool) {
        self.export_in_flight = in_flight;
    }
}

/// Shared handle to the single [`DeckState`] value.
///
/// The lock is only ever taken for a single read or write and never held
/// across an await point.
pub type SharedState = Arc<Mutex<DeckState>>;

/// Relative slide navigation plus the modal and copy-to-clipboard actions.
pub struct DeckNavigator {
    len: usize,
    state: SharedState,
    clipboard: Arc<dyn Clipboard>,
    copy_reset: Duration,
    view: ViewHandle,
    copy_timers: Arc<Mutex<HashMap<String, CopyTimer>>>,
}

/// Pending reset for one copy key. Only the newest generation may fire.
struct CopyTimer {
    generation: u64,
    handle: AbortHandle,
}

impl DeckNavigator {
    /// Create a navigator over a deck of `len` slides. `len` must be at least 1.
    pub fn new(
        len: usize,
        state: SharedState,
        clipboard: Arc<dyn Clipboard>,
        copy_reset: Duration,
        view: ViewHandle,
    ) -> Result<Self> {
        if len == 0 {
            return Err(DeckError::ValidationError(
                "A deck needs at least one slide".to_string(),
            ));
        }
        Ok(Self {
            len,
            state,
            clipboard,
            copy_reset,
            view,
            copy_timers: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn current_index(&self) -> usize {
        self.state.lock().current_index()
    }

    /// Move by `offset` slides, wrapping around both ends. Returns the new index.
    pub fn advance(&self, offset: i64) -> usize {
        let index = {
            let mut state = self.state.lock();
            let index = wrap_index(state.current_index, offset, self.len);
            state.select(index);
            index
        };
        debug!("Advanced by {} to slide {}", offset, index + 1);
        self.view.slide(index, self.len);
        index
    }

    pub fn open_modal(&self) {
        self.set_modal(true);
    }

    pub fn close_modal(&self) {
        self.set_modal(false);
    }

    fn set_modal(&self, open: bool) {
        self.state.lock().modal_open = open;
        self.view.publish(ViewUpdate::Modal { open });
    }

    /// Copy `text` to the clipboard and flag `key` as copied for the reset window.
    ///
    /// A failed copy never sets the flag. A repeated copy under the same key
    /// restarts that key's reset window. Returns whether the copy succeeded.
    pub async fn set_copied(&self, key: &str, text: &str) -> bool {
        if let Err(e) = self.clipboard.write_text(text).await {
            warn!("Copy for '{}' failed: {}", key, e);
            return false;
        }

        self.set_flag(key, true);
        info!("Copied '{}' to clipboard", key);

        let state = Arc::clone(&self.state);
        let view = self.view.clone();
        let timers = Arc::clone(&self.copy_timers);
        let reset = self.copy_reset;
        let owned_key = key.to_string();

        // Hold the timer map while spawning so the new task cannot look itself
        // up before it is registered.
        let mut guard = self.copy_timers.lock();
        let generation = guard.get(key).map_or(0, |timer| timer.generation + 1);
        let task = tokio::spawn(async move {
            tokio::time::sleep(reset).await;
            {
                let mut timers = timers.lock();
                if timers.get(&owned_key).map(|t| t.generation) != Some(generation) {
                    return;
                }
                timers.remove(&owned_key);
            }
            state.lock().copied.insert(owned_key.clone(), false);
            view.publish(ViewUpdate::Copied {
                key: owned_key,
                copied: false,
            });
        });
        let timer = CopyTimer {
            generation,
            handle: task.abort_handle(),
        };
        if let Some(previous) = guard.insert(key.to_string(), timer) {
            previous.handle.abort();
        }
        true
    }

    fn set_flag(&self, key: &str, copied: bool) {
        self.state.lock().copied.insert(key.to_string(), copied);
        self.view.publish(ViewUpdate::Copied {
            key: key.to_string(),
            copied,
        });
    }
}

/// `(index + offset) mod len`, always in `[0, len)` for any offset.
pub fn wrap_index(index: usize, offset: i64, len: usize) -> usize {
    let len = len as i128;
    (index as i128 + offset as i128).rem_euclid(len) as usize
}
