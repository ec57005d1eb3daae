//! Editor configuration.
//!
//! A flat JSON object. Every key is optional: `#[serde(default)]` fills in
//! whatever a file leaves out, so older files keep loading.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::recent::RecentFiles;

/// Allowed font sizes in points
pub const FONT_SIZE_RANGE: RangeInclusive<u32> = 8..=24;

/// Allowed tab widths in spaces
pub const TAB_SIZE_RANGE: RangeInclusive<usize> = 2..=8;

/// Font size restored by reset-zoom
pub const DEFAULT_FONT_SIZE: u32 = 14;

/// Main editor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Color theme
    pub theme: Theme,

    /// Font size in points
    pub font_size: u32,

    /// Tab width in spaces
    pub tab_size: usize,

    /// Wrap long lines at the viewport edge
    pub word_wrap: bool,

    /// Show the line number gutter
    pub show_line_numbers: bool,

    /// Seconds between autosaves (0 to disable)
    pub autosave_interval: u64,

    /// Most-recent-first list of opened files
    pub recent_files: RecentFiles,

    /// Font family
    pub font_family: String,

    /// Copy the current line's indentation on Enter
    pub auto_indent: bool,

    /// Highlight the line holding the caret
    pub highlight_current_line: bool,

    /// Show minimap
    pub show_minimap: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::Dark,
            font_size: DEFAULT_FONT_SIZE,
            tab_size: 4,
            word_wrap: false,
            show_line_numbers: true,
            autosave_interval: 120,
            recent_files: RecentFiles::new(),
            font_family: "Consolas".to_string(),
            auto_indent: true,
            highlight_current_line: true,
            show_minimap: false,
        }
    }
}

impl Config {
    /// Returns the default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("scribe").join("config.json"))
    }

    /// Loads config from a file.
    ///
    /// Out-of-range values are clamped rather than rejected.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config: Self = serde_json::from_str(&content)?;
        config.clamp();
        Ok(config)
    }

    /// Loads config from `path`, falling back to defaults.
    ///
    /// A missing file is not an error. A file that cannot be read or parsed
    /// is logged and left untouched.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load_from(path) {
            Ok(config) => {
                tracing::info!("Loaded config from {}", path.display());
                config
            }
            Err(err) => {
                tracing::warn!("Ignoring config at {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    /// Saves the config, creating parent directories as needed.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Pulls font and tab size back into their allowed ranges and restores
    /// the recent-files bounds.
    pub fn clamp(&mut self) {
        self.font_size = self
            .font_size
            .clamp(*FONT_SIZE_RANGE.start(), *FONT_SIZE_RANGE.end());
        self.tab_size = self
            .tab_size
            .clamp(*TAB_SIZE_RANGE.start(), *TAB_SIZE_RANGE.end());
        self.recent_files.normalize();
    }

    // ==================== Zoom ====================

    /// Grows the font by one point. Returns false at the upper bound.
    pub fn zoom_in(&mut self) -> bool {
        self.set_font_size(self.font_size + 1)
    }

    /// Shrinks the font by one point. Returns false at the lower bound.
    pub fn zoom_out(&mut self) -> bool {
        self.set_font_size(self.font_size.saturating_sub(1))
    }

    /// Restores the default font size. Returns true if it changed.
    pub fn reset_zoom(&mut self) -> bool {
        self.set_font_size(DEFAULT_FONT_SIZE)
    }

    fn set_font_size(&mut self, size: u32) -> bool {
        if !FONT_SIZE_RANGE.contains(&size) || size == self.font_size {
            return false;
        }
        self.font_size = size;
        true
    }

    /// Autosave period, or `None` when disabled.
    pub fn autosave_period(&self) -> Option<Duration> {
        (self.autosave_interval > 0).then(|| Duration::from_secs(self.autosave_interval))
    }
}

/// Color theme names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    Monokai,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
            Theme::Monokai => "monokai",
        }
    }
}

impl std::str::FromStr for Theme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            "monokai" => Ok(Theme::Monokai),
            _ => Err(ConfigError::InvalidValue {
                key: "theme".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config directory not found")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.theme, Theme::Dark);
        assert_eq!(config.font_size, 14);
        assert_eq!(config.tab_size, 4);
        assert!(!config.word_wrap);
        assert!(config.show_line_numbers);
        assert_eq!(config.autosave_interval, 120);
        assert!(config.recent_files.is_empty());
        assert_eq!(config.font_family, "Consolas");
        assert!(config.auto_indent);
        assert!(config.highlight_current_line);
        assert!(!config.show_minimap);
    }

    #[test]
    fn test_missing_keys_take_defaults() {
        let config: Config = serde_json::from_str(r#"{"theme": "light", "font_size": 18}"#).unwrap();
        assert_eq!(config.theme, Theme::Light);
        assert_eq!(config.font_size, 18);
        assert_eq!(config.tab_size, 4);
        assert_eq!(config.font_family, "Consolas");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/config.json");

        let mut config = Config::default();
        config.theme = Theme::Monokai;
        config.recent_files.push("/tmp/a.py");
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"theme\": \"monokai\""));
        assert!(raw.contains("\"recent_files\": ["));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join("absent.json"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_malformed_file_gives_defaults_and_is_kept() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(Config::load_from(&path).is_err());
        assert_eq!(Config::load_or_default(&path), Config::default());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_loaded_values_are_clamped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"font_size": 72, "tab_size": 1}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.font_size, 24);
        assert_eq!(config.tab_size, 2);
    }

    #[test]
    fn test_zoom_bounds() {
        let mut config = Config::default();
        assert!(config.zoom_in());
        assert_eq!(config.font_size, 15);

        config.font_size = 24;
        assert!(!config.zoom_in());
        assert_eq!(config.font_size, 24);

        config.font_size = 8;
        assert!(!config.zoom_out());
        assert_eq!(config.font_size, 8);

        assert!(config.reset_zoom());
        assert_eq!(config.font_size, DEFAULT_FONT_SIZE);
        assert!(!config.reset_zoom());
    }

    #[test]
    fn test_theme_parse() {
        assert_eq!("Light".parse::<Theme>().unwrap(), Theme::Light);
        assert!("solarized".parse::<Theme>().is_err());
    }

    #[test]
    fn test_autosave_period() {
        let mut config = Config::default();
        assert_eq!(config.autosave_period(), Some(Duration::from_secs(120)));
        config.autosave_interval = 0;
        assert_eq!(config.autosave_period(), None);
    }
}
