// ABOUTME: Library module for the deckview program.
// ABOUTME: Contains the deck controller, its view bridge, and slide export.

// Reexport modules
pub mod clipboard;
pub mod config;
pub mod deck;
pub mod errors;
pub mod export;
pub mod html;
pub mod navigator;
pub mod render;
pub mod reveal;
pub mod server;
pub mod sink;
pub mod slides;
pub mod utils;
pub mod view;
pub mod viewport;

// Reexport common types and functions
pub use clipboard::SystemClipboard;
pub use config::Config;
pub use deck::{Collaborators, Command, Deck, DeckEvent};
pub use errors::{DeckError, Result};
pub use export::{
    export_file_name, CaptureOptions, ExportPipeline, ExportReport, ImageSink, Rasterizer,
    SlideImage,
};
pub use html::{generate_html, write_html_to_file, HtmlOptions};
pub use navigator::{wrap_index, Clipboard, DeckNavigator, DeckState, SharedState};
pub use render::ChromeRasterizer;
pub use reveal::RevealTimer;
pub use server::run_presenter;
pub use sink::{DirectorySink, DownloadSink};
pub use slides::{Slide, SlideDeck, Snippet};
pub use view::{ViewHandle, ViewUpdate};
pub use viewport::{ScaleTarget, ViewportFitter};

#[cfg(test)]
mod testing;
