// ABOUTME: Test doubles for the deck's external collaborators
// ABOUTME: Recording rasterizer, in-memory sink and scripted clipboard

use std::io::Cursor;
use std::sync::Arc;

use async_trait::async_trait;
use image::{DynamicImage, ImageOutputFormat, RgbaImage};
use parking_lot::Mutex;

use crate::errors::{DeckError, Result};
use crate::export::{CaptureOptions, ImageSink, Rasterizer, SlideImage};
use crate::navigator::{Clipboard, SharedState};

/// Encode a transparent PNG of the given size
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(RgbaImage::new(width, height))
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .expect("Failed to encode test PNG");
    bytes
}

/// Rasterizer that records every capture and optionally fails on one slide
#[derive(Default)]
pub struct RecordingRasterizer {
    fail_at: Option<usize>,
    observed: Mutex<Option<SharedState>>,
    visits: Mutex<Vec<usize>>,
    displayed: Mutex<Vec<usize>>,
    options: Mutex<Vec<CaptureOptions>>,
}

impl RecordingRasterizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_at(index: usize) -> Arc<Self> {
        Arc::new(Self {
            fail_at: Some(index),
            ..Self::default()
        })
    }

    /// Record which slide the deck displays at each capture
    pub fn observe(&self, state: SharedState) {
        *self.observed.lock() = Some(state);
    }

    pub fn visits(&self) -> Vec<usize> {
        self.visits.lock().clone()
    }

    pub fn displayed(&self) -> Vec<usize> {
        self.displayed.lock().clone()
    }

    pub fn options(&self) -> Vec<CaptureOptions> {
        self.options.lock().clone()
    }
}

#[async_trait]
impl Rasterizer for RecordingRasterizer {
    async fn capture(&self, index: usize, options: &CaptureOptions) -> Result<SlideImage> {
        self.visits.lock().push(index);
        self.options.lock().push(*options);
        if let Some(state) = self.observed.lock().as_ref() {
            self.displayed.lock().push(state.lock().current_index());
        }
        if self.fail_at == Some(index) {
            return Err(DeckError::CaptureError {
                slide: index,
                message: "surface is not attached".to_string(),
            });
        }
        SlideImage::from_png(png_bytes(16, 9))
    }
}

/// Sink that keeps written file names in memory
#[derive(Default)]
pub struct MemorySink {
    fail: bool,
    names: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn names(&self) -> Vec<String> {
        self.names.lock().clone()
    }
}

impl ImageSink for MemorySink {
    fn persist(&self, file_name: &str, _image: &SlideImage) -> Result<()> {
        if self.fail {
            return Err(DeckError::IoError(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only output",
            )));
        }
        self.names.lock().push(file_name.to_string());
        Ok(())
    }
}

/// Clipboard that remembers what was written
#[derive(Default)]
pub struct MemoryClipboard {
    fail: bool,
    texts: Mutex<Vec<String>>,
}

impl MemoryClipboard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Self::default()
        })
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().clone()
    }
}

#[async_trait]
impl Clipboard for MemoryClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        if self.fail {
            return Err(DeckError::ClipboardError("clipboard unavailable".to_string()));
        }
        self.texts.lock().push(text.to_string());
        Ok(())
    }
}
