// ABOUTME: Error types for the deckview application
// ABOUTME: Provides structured error handling for navigation, export and presentation

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Headless browser error: {message}")]
    BrowserError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to capture slide {slide}: {message}")]
    CaptureError { slide: usize, message: String },

    #[error("Rasterization is unavailable: {0}")]
    RasterizerUnavailable(String),

    #[error("An export is already in progress")]
    ExportBusy,

    #[error("Slide index {index} is out of range for a deck of {len} slides")]
    InvalidSlide { index: usize, len: usize },

    #[error("Failed to decode slide image: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Clipboard error: {0}")]
    ClipboardError(String),

    #[error("Error attempting to enable full-screen mode: {0}")]
    FullscreenError(String),

    #[error("Input validation error: {0}")]
    ValidationError(String),

    #[error("Path not found: {0}")]
    PathNotFoundError(PathBuf),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Presenter server error: {0}")]
    ServerError(String),

    #[error("Unknown error: {0}")]
    UnknownError(String),
}

// Implement conversion from anyhow::Error to our DeckError
impl From<anyhow::Error> for DeckError {
    fn from(err: anyhow::Error) -> Self {
        DeckError::UnknownError(err.to_string())
    }
}

impl From<serde_json::Error> for DeckError {
    fn from(err: serde_json::Error) -> Self {
        DeckError::ServerError(format!("Malformed message: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, DeckError>;
