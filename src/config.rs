//! Configuration types for http-playback

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::storage::{RecordingStore, DEFAULT_RECORD_FILE_NAME};
use crate::{PlaybackError, Result};

/// Operating mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Pass requests through to the transport
    #[default]
    Live,
    /// Pass requests through and capture their outcomes
    Record,
    /// Serve captured outcomes without touching the network
    Playback,
}

impl Mode {
    /// Whether outcomes are being captured
    #[must_use]
    pub fn is_record(self) -> bool {
        self == Self::Record
    }

    /// Whether outcomes are served from a recording
    #[must_use]
    pub fn is_playback(self) -> bool {
        self == Self::Playback
    }

    /// Whether this mode reads or writes a recording file
    #[must_use]
    pub fn uses_recording(self) -> bool {
        self != Self::Live
    }
}

fn default_record_file_name() -> String {
    DEFAULT_RECORD_FILE_NAME.to_string()
}

/// Client configuration
///
/// Compared structurally; two configurations with equal fields select the
/// same client from a [`ClientRegistry`](crate::factory::ClientRegistry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Operating mode
    #[serde(default)]
    pub mode: Mode,
    /// Directory holding the recording file
    #[serde(default)]
    pub record_location: Option<PathBuf>,
    /// Recording file name
    #[serde(default = "default_record_file_name")]
    pub record_file_name: String,
    /// Options passed through to the transport
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Live,
            record_location: None,
            record_file_name: default_record_file_name(),
            options: Map::new(),
        }
    }
}

impl ClientConfig {
    /// Configuration for `mode` with default file name and no options
    #[must_use]
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Set the recording directory
    #[must_use]
    pub fn with_record_location(mut self, location: impl Into<PathBuf>) -> Self {
        self.record_location = Some(location.into());
        self
    }

    /// Set the recording file name
    #[must_use]
    pub fn with_record_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.record_file_name = file_name.into();
        self
    }

    /// Add a transport option
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Split a flat option map into wrapper settings and transport options
    ///
    /// `mode`, `recordLocation` and `recordFileName` are taken out; every other
    /// key is kept for the transport. Null values count as absent.
    ///
    /// # Errors
    ///
    /// Returns error if a recognized key has the wrong type
    pub fn from_options(mut options: Map<String, Value>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = options.remove("mode").filter(|value| !value.is_null()) {
            config.mode = serde_json::from_value(value).map_err(|e| {
                PlaybackError::ConfigError(format!("Invalid mode: {e}"))
            })?;
        }

        if let Some(value) = options.remove("recordLocation").filter(|value| !value.is_null()) {
            let location = value.as_str().ok_or_else(|| {
                PlaybackError::ConfigError("recordLocation must be a string".to_string())
            })?;
            config.record_location = Some(PathBuf::from(location));
        }

        if let Some(value) = options.remove("recordFileName").filter(|value| !value.is_null()) {
            let file_name = value.as_str().ok_or_else(|| {
                PlaybackError::ConfigError("recordFileName must be a string".to_string())
            })?;
            config.record_file_name = file_name.to_string();
        }

        config.options = options;
        Ok(config)
    }

    /// Load configuration from TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, parsed or validated
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PlaybackError::ConfigError(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| PlaybackError::ConfigError(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid
    pub fn validate(&self) -> Result<()> {
        if self.mode.uses_recording() && self.record_location.is_none() {
            return Err(PlaybackError::ConfigError(format!(
                "{:?} mode requires a record location",
                self.mode
            )));
        }

        if self.record_file_name.is_empty() {
            return Err(PlaybackError::ConfigError(
                "Record file name cannot be empty".to_string(),
            ));
        }

        // Sub-directories are allowed; the name must stay under the record location
        if self.record_file_name.starts_with(['/', '\\'])
            || self
                .record_file_name
                .split(['/', '\\'])
                .any(|component| component == "..")
        {
            return Err(PlaybackError::ConfigError(format!(
                "Record file name must be a relative path without '..': {}",
                self.record_file_name
            )));
        }

        Ok(())
    }

    /// Full path of the recording file, if a location is configured
    #[must_use]
    pub fn record_path(&self) -> Option<PathBuf> {
        self.record_location
            .as_deref()
            .map(|location| RecordingStore::resolve_path(location, &self.record_file_name))
    }
}
