// ABOUTME: Composition root wiring navigation, viewport fitting and export to user input
// ABOUTME: Maps keyboard and control events onto the deck's documented operations

use std::sync::Arc;

use log::{debug, error, info, warn};
use parking_lot::Mutex;
use serde::Deserialize;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::errors::{DeckError, Result};
use crate::export::{ExportPipeline, ExportReport, ImageSink, Rasterizer};
use crate::navigator::{Clipboard, DeckNavigator, DeckState, SharedState};
use crate::slides::SlideDeck;
use crate::view::{ViewHandle, ViewUpdate};
use crate::viewport::ViewportFitter;

/// What a key press asks the deck to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Next,
    Previous,
    ToggleFullscreen,
}

impl Command {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowRight" | "PageDown" | " " => Some(Command::Next),
            "ArrowLeft" | "PageUp" | "Backspace" => Some(Command::Previous),
            "f" | "F" => Some(Command::ToggleFullscreen),
            _ => None,
        }
    }
}

/// Input arriving from the view
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DeckEvent {
    Key { key: String },
    Navigate { offset: i64 },
    Resize { width: f64, height: f64 },
    Export { all: bool },
    Copy { key: String },
    OpenModal,
    CloseModal,
    ToggleFullscreen,
    FullscreenFailed { reason: String },
}

/// External capabilities the deck is wired to
pub struct Collaborators {
    pub clipboard: Arc<dyn Clipboard>,
    pub rasterizer: Option<Arc<dyn Rasterizer>>,
    pub sink: Arc<dyn ImageSink>,
}

/// The presentation controller. All state changes go through its operations.
pub struct Deck {
    slides: SlideDeck,
    state: SharedState,
    navigator: DeckNavigator,
    fitter: Mutex<ViewportFitter>,
    pipeline: ExportPipeline,
    view: ViewHandle,
}

impl Deck {
    pub fn new(
        slides: SlideDeck,
        config: &Config,
        collaborators: Collaborators,
        view: ViewHandle,
    ) -> Result<Self> {
        let state: SharedState = Arc::new(Mutex::new(DeckState::new()));
        let navigator = DeckNavigator::new(
            slides.len(),
            Arc::clone(&state),
            collaborators.clipboard,
            config.copy_reset(),
            view.clone(),
        )?;
        let pipeline = ExportPipeline::new(
            slides.len(),
            Arc::clone(&state),
            collaborators.rasterizer,
            collaborators.sink,
            config.get_export_config(),
            view.clone(),
        );
        info!("Deck ready with {} slides", slides.len());
        Ok(Self {
            slides,
            state,
            navigator,
            fitter: Mutex::new(ViewportFitter::default()),
            pipeline,
            view,
        })
    }

    pub fn slides(&self) -> &SlideDeck {
        &self.slides
    }

    pub fn view(&self) -> &ViewHandle {
        &self.view
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> DeckState {
        self.state.lock().clone()
    }

    pub fn current_index(&self) -> usize {
        self.state.lock().current_index()
    }

    /// Updates that bring a freshly connected view up to date
    pub fn sync_updates(&self) -> Vec<ViewUpdate> {
        let state = self.snapshot();
        let mut updates = vec![
            ViewUpdate::Slide {
                index: state.current_index(),
                label: crate::view::slide_counter(state.current_index(), self.slides.len()),
            },
            ViewUpdate::Modal {
                open: state.is_modal_open(),
            },
            ViewUpdate::Exporting {
                in_flight: state.is_export_in_flight(),
            },
        ];
        if let Some(scale) = self.fitter.lock().current_scale() {
            updates.push(ViewUpdate::Scale { scale });
        }
        updates
    }

    /// Handle one input event.
    ///
    /// Events that suspend (export, copy) run as their own task so input keeps
    /// flowing; their handle is returned. Everything else completes inline.
    pub fn dispatch(self: &Arc<Self>, event: DeckEvent) -> Option<JoinHandle<()>> {
        match event {
            DeckEvent::Key { key } => {
                match Command::from_key(&key) {
                    Some(Command::Next) => {
                        self.navigate(1);
                    }
                    Some(Command::Previous) => {
                        self.navigate(-1);
                    }
                    Some(Command::ToggleFullscreen) => self.toggle_fullscreen(),
                    None => debug!("Ignoring key {:?}", key),
                }
                None
            }
            DeckEvent::Navigate { offset } => {
                self.navigate(offset);
                None
            }
            DeckEvent::Resize { width, height } => {
                self.resize(width, height);
                None
            }
            DeckEvent::OpenModal => {
                self.navigator.open_modal();
                None
            }
            DeckEvent::CloseModal => {
                self.navigator.close_modal();
                None
            }
            DeckEvent::ToggleFullscreen => {
                self.toggle_fullscreen();
                None
            }
            DeckEvent::FullscreenFailed { reason } => {
                self.fullscreen_failed(&reason);
                None
            }
            DeckEvent::Export { all } => {
                let deck = Arc::clone(self);
                Some(tokio::spawn(async move {
                    deck.export_and_report(all).await;
                }))
            }
            DeckEvent::Copy { key } => {
                let deck = Arc::clone(self);
                Some(tokio::spawn(async move {
                    deck.copy(&key).await;
                }))
            }
        }
    }

    /// Relative navigation. Ignored while an export owns the selection.
    pub fn navigate(&self, offset: i64) -> usize {
        if self.state.lock().is_export_in_flight() {
            debug!("Ignoring navigation by {} during export", offset);
            return self.current_index();
        }
        self.navigator.advance(offset)
    }

    /// Refit the canvas for a new container size
    pub fn resize(&self, width: f64, height: f64) -> f64 {
        self.fitter.lock().fit(width, height, &self.view)
    }

    pub fn toggle_fullscreen(&self) {
        self.view.publish(ViewUpdate::Fullscreen);
    }

    /// Surface a rejected fullscreen request to the user
    pub fn fullscreen_failed(&self, reason: &str) {
        let err = DeckError::FullscreenError(reason.to_string());
        error!("{}", err);
        self.view.notice(err.to_string());
    }

    /// Copy the snippet registered under `key`. Returns whether it was copied.
    pub async fn copy(&self, key: &str) -> bool {
        match self.slides.snippet(key) {
            Some(text) => self.navigator.set_copied(key, text).await,
            None => {
                warn!("No snippet registered for copy key '{}'", key);
                false
            }
        }
    }

    pub async fn export_one(&self) -> Result<ExportReport> {
        self.pipeline.export_one().await
    }

    pub async fn export_slide(&self, index: usize) -> Result<ExportReport> {
        self.pipeline.export_slide(index).await
    }

    pub async fn export_all(&self) -> Result<ExportReport> {
        self.pipeline.export_all().await
    }

    /// Run an export and tell the user about anything that went wrong
    async fn export_and_report(&self, all: bool) {
        let result = if all {
            self.export_all().await
        } else {
            self.export_one().await
        };
        match result {
            Ok(report) => {
                if let Some(failure) = &report.failure {
                    self.view.notice(format!(
                        "Export stopped at slide {}: {}",
                        failure.slide + 1,
                        failure.message
                    ));
                }
            }
            Err(e) => self.view.notice(e.to_string()),
        }
    }
}
