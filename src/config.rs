// ABOUTME: Configuration module for the deckview application
// ABOUTME: Provides timing constants, canvas dimensions and environment variable handling

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{DeckError, Result};

/// Logical width of the design canvas
pub const CANVAS_WIDTH: f64 = 1600.0;
/// Logical height of the design canvas
pub const CANVAS_HEIGHT: f64 = 900.0;

const DEFAULT_SETTLE_MS: u64 = 100;
const DEFAULT_PACING_MS: u64 = 60;
const DEFAULT_CAPTURE_SCALE: f64 = 2.0;
const DEFAULT_COPY_RESET_MS: u64 = 1200;
const DEFAULT_REVEAL_UNIT_MS: u64 = 120;
const DEFAULT_TIMEOUT_MS: u64 = 30000;
const DEFAULT_PORT: u16 = 8080;

/// Global configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub browser_path: Option<String>,
    pub output_dir: PathBuf,
    pub settle_ms: u64,
    pub pacing_ms: u64,
    pub capture_scale: f64,
    pub copy_reset_ms: u64,
    pub reveal_unit_ms: u64,
    pub timeout_ms: u64,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_path: env::var("BROWSER_PATH").ok(),
            output_dir: PathBuf::from("."),
            settle_ms: DEFAULT_SETTLE_MS,
            pacing_ms: DEFAULT_PACING_MS,
            capture_scale: DEFAULT_CAPTURE_SCALE,
            copy_reset_ms: DEFAULT_COPY_RESET_MS,
            reveal_unit_ms: DEFAULT_REVEAL_UNIT_MS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    /// Create a new configuration instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let browser_path = env::var("BROWSER_PATH").ok().filter(|p| !p.is_empty());
        let output_dir = env::var("DECK_OUTPUT_DIR")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let capture_scale = env_parse("DECK_CAPTURE_SCALE", DEFAULT_CAPTURE_SCALE)?;
        if !(capture_scale.is_finite() && capture_scale > 0.0) {
            return Err(DeckError::ConfigError(format!(
                "DECK_CAPTURE_SCALE must be a positive number, got {}",
                capture_scale
            )));
        }

        Ok(Self {
            browser_path,
            output_dir,
            settle_ms: env_parse("DECK_SETTLE_MS", DEFAULT_SETTLE_MS)?,
            pacing_ms: env_parse("DECK_PACING_MS", DEFAULT_PACING_MS)?,
            capture_scale,
            copy_reset_ms: env_parse("DECK_COPY_RESET_MS", DEFAULT_COPY_RESET_MS)?,
            reveal_unit_ms: env_parse("DECK_REVEAL_UNIT_MS", DEFAULT_REVEAL_UNIT_MS)?,
            timeout_ms: env_parse("DECK_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)?,
            port: env_parse("DECK_PORT", DEFAULT_PORT)?,
        })
    }

    /// Get an export configuration with defaults from this config
    pub fn get_export_config(&self) -> ExportConfig {
        ExportConfig {
            settle: Duration::from_millis(self.settle_ms),
            pacing: Duration::from_millis(self.pacing_ms),
            capture_scale: self.capture_scale,
        }
    }

    /// Get a render configuration with defaults from this config
    pub fn get_render_config(&self) -> RenderConfig {
        RenderConfig {
            width: CANVAS_WIDTH as u32,
            height: CANVAS_HEIGHT as u32,
            timeout_ms: self.timeout_ms,
            browser_path: self.browser_path.clone(),
        }
    }

    /// Get a presenter configuration, optionally overriding the HTTP port.
    ///
    /// The websocket listens one port above HTTP, so the top port is rejected.
    pub fn get_present_config(&self, port: Option<u16>) -> Result<PresentConfig> {
        let port = port.unwrap_or(self.port);
        let socket_port = port.checked_add(1).ok_or_else(|| {
            DeckError::ConfigError(format!(
                "Port {} leaves no room for the websocket on the next port",
                port
            ))
        })?;
        Ok(PresentConfig { port, socket_port })
    }

    pub fn copy_reset(&self) -> Duration {
        Duration::from_millis(self.copy_reset_ms)
    }

    pub fn reveal_unit(&self) -> Duration {
        Duration::from_millis(self.reveal_unit_ms)
    }
}

/// Timing and quality settings for the export pipeline
#[derive(Debug, Clone, Copy)]
pub struct ExportConfig {
    /// Pause after selecting a slide so the view can repaint before capture
    pub settle: Duration,
    /// Pause between targets so the file sink is not flooded
    pub pacing: Duration,
    /// Oversampling factor requested from the rasterizer
    pub capture_scale: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(DEFAULT_SETTLE_MS),
            pacing: Duration::from_millis(DEFAULT_PACING_MS),
            capture_scale: DEFAULT_CAPTURE_SCALE,
        }
    }
}

/// Configuration for the headless browser rasterizer
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub timeout_ms: u64,
    pub browser_path: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: CANVAS_WIDTH as u32,
            height: CANVAS_HEIGHT as u32,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            browser_path: None,
        }
    }
}

/// Configuration for the interactive presenter
#[derive(Debug, Clone, Copy)]
pub struct PresentConfig {
    pub port: u16,
    pub socket_port: u16,
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| DeckError::ConfigError(format!("Invalid value for {}: {}", key, e))),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timings() {
        let config = Config::new();
        let export = config.get_export_config();
        assert_eq!(export.settle, Duration::from_millis(100));
        assert_eq!(export.pacing, Duration::from_millis(60));
        assert_eq!(export.capture_scale, 2.0);
        assert_eq!(config.copy_reset(), Duration::from_millis(1200));
        assert_eq!(config.reveal_unit(), Duration::from_millis(120));
    }

    #[test]
    fn test_render_config_uses_canvas_size() {
        let render = Config::new().get_render_config();
        assert_eq!((render.width, render.height), (1600, 900));
    }

    #[test]
    fn test_present_config_socket_port_follows_http_port() {
        let present = Config::new().get_present_config(Some(9000)).unwrap();
        assert_eq!(present.port, 9000);
        assert_eq!(present.socket_port, 9001);
    }

    #[test]
    fn test_present_config_rejects_top_port() {
        let result = Config::new().get_present_config(Some(u16::MAX));
        assert!(matches!(result, Err(DeckError::ConfigError(_))));
        assert!(Config::new().get_present_config(Some(u16::MAX - 1)).is_ok());
    }
}
