//! Configuration file support.
//!
//! Settings are stored as JSON. Every field has a serde default so partial or
//! older files still load.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnnotatorError, Result};
use crate::keybindings::{Action, KeyBindings, KeyChord};

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Get the display name for this log level.
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Annotator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatorConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Canvas tunables
    #[serde(default)]
    pub preferences: Preferences,

    /// Keybinding configuration
    #[serde(default)]
    pub keybindings: KeyBindingsConfig,
}

/// Canvas tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    /// Zoom factor per wheel step
    #[serde(default = "default_scale_by")]
    pub scale_by: f32,

    /// Wheel delta multiplier when panning
    #[serde(default = "default_scroll_smoothing")]
    pub scroll_smoothing: f32,

    /// Hit radius around a polygon's first vertex, in screen pixels
    #[serde(default = "default_start_point_radius")]
    pub start_point_radius: f32,

    /// Radius around the cursor when testing for a closed loop, in screen pixels
    #[serde(default = "default_close_test_radius")]
    pub close_test_radius: f32,

    /// Vertex/corner handle radius, in screen pixels
    #[serde(default = "default_handle_size")]
    pub handle_size: f32,

    /// Shape outline width, in screen pixels
    #[serde(default = "default_stroke_width")]
    pub stroke_width: f32,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_scale_by() -> f32 {
    1.05
}

fn default_scroll_smoothing() -> f32 {
    0.3
}

fn default_start_point_radius() -> f32 {
    4.0
}

fn default_close_test_radius() -> f32 {
    12.0
}

fn default_handle_size() -> f32 {
    4.0
}

fn default_stroke_width() -> f32 {
    2.0
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            scale_by: default_scale_by(),
            scroll_smoothing: default_scroll_smoothing(),
            start_point_radius: default_start_point_radius(),
            close_test_radius: default_close_test_radius(),
            handle_size: default_handle_size(),
            stroke_width: default_stroke_width(),
            log_level: LogLevel::default(),
        }
    }
}

/// One serialized binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingConfig {
    pub chord: KeyChord,
    pub action: Action,
}

/// Keybinding configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyBindingsConfig {
    pub bindings: Vec<BindingConfig>,
}

impl Default for KeyBindingsConfig {
    fn default() -> Self {
        Self::from(&KeyBindings::default())
    }
}

impl From<&KeyBindings> for KeyBindingsConfig {
    fn from(bindings: &KeyBindings) -> Self {
        Self {
            bindings: bindings
                .iter()
                .map(|(chord, action)| BindingConfig {
                    chord: *chord,
                    action: *action,
                })
                .collect(),
        }
    }
}

impl KeyBindingsConfig {
    /// Convert back to KeyBindings. Later entries win on duplicate chords.
    pub fn to_keybindings(&self) -> KeyBindings {
        let mut bindings = KeyBindings::empty();
        for binding in &self.bindings {
            if let Some(previous) = bindings.key_conflict(binding.chord, None) {
                log::warn!(
                    "Duplicate binding for {:?}: replacing {}",
                    binding.chord,
                    previous
                );
            }
            bindings.set_binding(binding.chord, binding.action);
        }
        bindings
    }
}

impl AnnotatorConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            preferences: Preferences::default(),
            keybindings: KeyBindingsConfig::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(AnnotatorError::VersionMismatch {
                expected: CONFIG_VERSION,
                found: config.version,
            });
        }

        Ok(config)
    }

    /// Get the default filename for config export.
    pub fn default_filename() -> &'static str {
        "imgannot-config.json"
    }

    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load configuration from `path`, falling back to defaults when the file
    /// is missing or unreadable.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save configuration to a JSON file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_json()?)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self::new()
    }
}
