// ABOUTME: Browser rasterization module for the deckview application
// ABOUTME: Captures individual slides of the rendered deck using a headless browser

use std::env;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use headless_chrome::protocol::cdp::{Emulation, Page, DOM};
use headless_chrome::{Browser, LaunchOptionsBuilder, Tab};
use log::{debug, info, warn};

use crate::config::RenderConfig;
use crate::errors::{DeckError, Result};
use crate::export::{CaptureOptions, Rasterizer, SlideImage};
use crate::utils;

/// Freezes the page for capture: no entrance animation, no fit transform, no backdrop.
const PREPARE_JS: &str = r#"
    document.documentElement.classList.add('no-motion');
    document.getElementById('deck').style.transform = 'none';
    typeof window.deckShow === 'function';
"#;

/// Shows a slide and resolves once the page has painted it twice
fn show_slide_js(index: usize) -> String {
    format!(
        "window.deckShow({}); \
         new Promise(resolve => requestAnimationFrame(() => requestAnimationFrame(() => resolve(true))))",
        index
    )
}

/// Rasterizer backed by a headless Chrome tab showing the rendered deck
pub struct ChromeRasterizer {
    _browser: Browser,
    tab: Arc<Tab>,
    len: usize,
}

impl ChromeRasterizer {
    /// Launch a headless browser and load the deck document at `html_path`
    pub fn launch(html_path: &Path, len: usize, config: &RenderConfig) -> Result<Self> {
        if !html_path.exists() {
            return Err(DeckError::PathNotFoundError(html_path.to_path_buf()));
        }

        // Configure browser launch options
        let mut launch_options_builder = LaunchOptionsBuilder::default();
        launch_options_builder.window_size(Some((config.width, config.height)));
        launch_options_builder.headless(true);

        // Use custom browser path if specified
        if let Some(browser_path) = &config.browser_path {
            launch_options_builder.path(Some(browser_path.into()));
        } else if let Ok(path) = env::var("BROWSER_PATH") {
            if !path.is_empty() {
                launch_options_builder.path(Some(path.into()));
            }
        }

        let launch_options = launch_options_builder
            .build()
            .map_err(|e| DeckError::BrowserError {
                message: format!("Failed to build browser options: {:?}", e),
                source: None,
            })?;

        info!("Launching headless browser");
        let browser = Browser::new(launch_options).map_err(|e| DeckError::BrowserError {
            message: format!("Failed to launch browser: {}", e),
            source: Some(e.into()),
        })?;

        let html_path_abs = utils::get_absolute_path(html_path)?;
        let url = format!("file://{}", html_path_abs.to_string_lossy());
        info!("Opening deck at URL: {}", url);

        let tab = browser.new_tab().map_err(|e| DeckError::BrowserError {
            message: format!("Failed to create new tab: {}", e),
            source: None,
        })?;

        tab.navigate_to(&url).map_err(|e| DeckError::BrowserError {
            message: format!("Failed to navigate to deck: {}", e),
            source: None,
        })?;

        tab.wait_until_navigated()
            .map_err(|e| DeckError::BrowserError {
                message: format!("Navigation failed: {}", e),
                source: None,
            })?;

        tab.wait_for_element_with_custom_timeout("#deck", Duration::from_millis(config.timeout_ms))
            .map_err(|e| DeckError::BrowserError {
                message: format!("Failed to wait for deck element: {}", e),
                source: None,
            })?;

        tab.evaluate(PREPARE_JS, false)
            .map_err(|e| DeckError::BrowserError {
                message: format!("Failed to prepare deck for capture: {}", e),
                source: None,
            })?;

        info!("Loaded! Ready to capture {} slides", len);
        Ok(Self {
            _browser: browser,
            tab,
            len,
        })
    }

    /// Launch the rasterizer, or log why the capability is unavailable
    pub fn try_launch(
        html_path: &Path,
        len: usize,
        config: &RenderConfig,
    ) -> Option<Arc<dyn Rasterizer>> {
        match Self::launch(html_path, len, config) {
            Ok(rasterizer) => Some(Arc::new(rasterizer)),
            Err(e) => {
                warn!("Slide export is unavailable: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl Rasterizer for ChromeRasterizer {
    async fn capture(&self, index: usize, options: &CaptureOptions) -> Result<SlideImage> {
        if index >= self.len {
            return Err(DeckError::InvalidSlide {
                index,
                len: self.len,
            });
        }
        let tab = Arc::clone(&self.tab);
        let options = *options;
        tokio::task::spawn_blocking(move || capture_slide(&tab, index, &options))
            .await
            .map_err(|e| DeckError::CaptureError {
                slide: index,
                message: format!("capture task failed: {}", e),
            })?
    }
}

fn capture_slide(tab: &Tab, index: usize, options: &CaptureOptions) -> Result<SlideImage> {
    let capture_error = |message: String| DeckError::CaptureError {
        slide: index,
        message,
    };

    tab.evaluate(&show_slide_js(index), true)
        .map_err(|e| capture_error(format!("failed to show slide: {}", e)))?;

    let color = if options.transparent_background {
        Some(DOM::RGBA {
            r: 0,
            g: 0,
            b: 0,
            a: Some(0.0),
        })
    } else {
        None
    };
    tab.call_method(Emulation::SetDefaultBackgroundColorOverride { color })
        .map_err(|e| capture_error(format!("failed to set background: {}", e)))?;

    let element = tab
        .find_element(&format!("#slide-{}", index))
        .map_err(|e| capture_error(format!("slide is not in the document: {}", e)))?;
    let mut viewport = element
        .get_box_model()
        .map_err(|e| capture_error(format!("failed to measure slide: {}", e)))?
        .border_viewport();
    viewport.scale = options.scale;
    debug!(
        "Capturing slide {} at {}x{} scale {}",
        index + 1,
        viewport.width,
        viewport.height,
        viewport.scale
    );

    let png = tab
        .capture_screenshot(
            Page::CaptureScreenshotFormatOption::Png,
            None,
            Some(viewport),
            true,
        )
        .map_err(|e| capture_error(format!("screenshot failed: {}", e)))?;

    SlideImage::from_png(png)
}
