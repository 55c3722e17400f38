//! Configuration for the terminal emulator

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::DEFAULT_BLINK_TICKS;
use crate::input::{DEFAULT_INPUT_CAPACITY, DEFAULT_MOUSE_SCALE};
use crate::renderer::Palette;

/// Terminal configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Grid width in cells
    pub cols: u16,
    /// Grid height in cells
    pub rows: u16,
    /// Shell to run; `$SHELL` when unset
    pub shell: Option<String>,
    /// Loop iterations per cursor blink phase
    pub blink_ticks: u32,
    /// Sleep after an iteration that moved no bytes
    pub tick_interval_ms: u64,
    /// Keyboard line buffer capacity
    pub input_capacity: usize,
    /// Mouse sub-cell scale
    pub mouse_scale: u32,
    /// The 16 ANSI colours
    pub palette: Palette,
    pub font: FontConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cols: 80,
            rows: 24,
            shell: None,
            blink_ticks: DEFAULT_BLINK_TICKS,
            tick_interval_ms: 10,
            input_capacity: DEFAULT_INPUT_CAPACITY,
            mouse_scale: DEFAULT_MOUSE_SCALE,
            palette: Palette::default(),
            font: FontConfig::default(),
        }
    }
}

/// Glyph source for the window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// PSF1 console font; takes precedence over the outline font
    pub bitmap_path: Option<PathBuf>,
    /// TrueType/OpenType font; a system monospace font when unset
    pub outline_path: Option<PathBuf>,
    /// Outline font size in pixels
    pub size: f32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            bitmap_path: None,
            outline_path: None,
            size: 16.0,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from default location or return default config
    pub fn load_or_default() -> Self {
        let Some(config_path) = default_config_path() else {
            return Self::default();
        };
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load(&config_path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to load config from {:?}: {}", config_path, e);
                Self::default()
            }
        }
    }

    /// The shell to spawn
    pub fn shell(&self) -> String {
        self.shell
            .clone()
            .or_else(|| std::env::var("SHELL").ok())
            .unwrap_or_else(|| "/bin/sh".to_string())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cols == 0 || self.rows == 0 {
            return Err(ConfigError::Invalid {
                field: "cols/rows",
                message: format!("grid must be at least 1x1, got {}x{}", self.cols, self.rows),
            });
        }
        if self.input_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "input_capacity",
                message: "must be positive".to_string(),
            });
        }
        if self.font.size.is_nan() || self.font.size <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "font.size",
                message: format!("must be positive, got {}", self.font.size),
            });
        }
        Ok(())
    }
}

/// `$HOME/.config/sumi/config.json`
pub fn default_config_path() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("sumi")
            .join("config.json")
    })
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config error in '{field}': {message}")]
    Invalid { field: &'static str, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::Rgb;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!((config.cols, config.rows), (80, 24));
        assert_eq!(config.input_capacity, 1024);
        assert_eq!(config.mouse_scale, 6);
        assert_eq!(config.tick_interval(), Duration::from_millis(10));
    }

    #[test]
    fn test_config_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.cols = 100;
        config.shell = Some("/bin/zsh".to_string());
        config.palette.ansi[1] = Rgb::new(200, 10, 10);
        config.save(&path).unwrap();

        let restored = Config::load(&path).unwrap();
        assert_eq!(restored, config);
        assert_eq!(restored.shell(), "/bin/zsh");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "rows": 40, "font": { "size": 20.0 } }"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.rows, 40);
        assert_eq!(config.cols, 80);
        assert_eq!(config.font.size, 20.0);
        assert_eq!(config.palette, Palette::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "cols": 0 }"#).unwrap();
        assert!(matches!(
            Config::load(&path),
            Err(ConfigError::Invalid { field: "cols/rows", .. })
        ));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Json(_))));
    }
}
