//! Configuration management for termbridge
//!
//! Subsystem settings for output capture, buffer search, and
//! working-directory sync, loaded from a TOML file under the platform
//! configuration directory. A missing file yields defaults; every field
//! carries a serde default so partial files load cleanly.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};

/// Which part of oversized output survives truncation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TruncationMode {
    /// Keep the head, drop the tail
    KeepStart,
    /// Keep the tail, drop the head
    KeepEnd,
    /// Keep head and tail halves, drop the middle
    #[default]
    KeepBoth,
}

/// When a terminal's directory change propagates to the explorer view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AutoSyncMode {
    /// Never propagate automatically
    Manual,
    /// Always propagate; the subscriber decides relevance
    #[default]
    ActiveTerminalOnly,
    /// Propagate only for sessions linked to a workspace
    AllLinkedTerminals,
}

/// Output capture and processing settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Character ceiling for processed output
    pub max_capture_length: usize,
    /// Line ceiling for processed output
    pub max_capture_lines: usize,
    /// Which part of oversized output is kept
    pub truncation_mode: TruncationMode,
    /// Remove ANSI/OSC escape sequences
    pub strip_ansi_sequences: bool,
    /// Normalize CRLF/CR line endings to LF
    pub normalize_line_endings: bool,
    /// Captures retained per session before the oldest is evicted
    pub capture_history_size: usize,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            max_capture_length: 50_000,
            max_capture_lines: 1_000,
            truncation_mode: TruncationMode::KeepBoth,
            strip_ansi_sequences: true,
            normalize_line_endings: true,
            capture_history_size: 20,
        }
    }
}

/// Buffer search settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Queries shorter than this return no results without scanning
    pub min_query_length: usize,
    /// Hard cap on results across a whole search
    pub max_results: usize,
    /// Lines scanned between cancellation checks
    pub cancel_check_interval: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            min_query_length: 2,
            max_results: 1_000,
            cancel_check_interval: 100,
        }
    }
}

/// Working-directory synchronization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Propagation policy for terminal directory changes
    pub auto_sync_mode: AutoSyncMode,
    /// Translate /mnt/<drive> paths reported from WSL shells
    pub translate_wsl_paths: bool,
    /// Drop directory reports whose path does not exist on disk
    pub verify_directory_exists: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            auto_sync_mode: AutoSyncMode::default(),
            translate_wsl_paths: cfg!(windows),
            verify_directory_exists: true,
        }
    }
}

/// Settings validation errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid capture length ceiling: {0} (must be at least 1)")]
    InvalidCaptureLength(usize),

    #[error("Invalid capture line ceiling: {0} (must be at least 1)")]
    InvalidCaptureLines(usize),

    #[error("Invalid capture history size: {0} (must be at least 1)")]
    InvalidHistorySize(usize),

    #[error("Invalid minimum query length: {0} (must be at least 1)")]
    InvalidMinQueryLength(usize),

    #[error("Invalid result cap: {0} (must be at least 1)")]
    InvalidMaxResults(usize),
}

/// Root settings document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermbridgeConfig {
    /// Output capture settings
    pub capture: CaptureSettings,
    /// Buffer search settings
    pub search: SearchSettings,
    /// Directory sync settings
    pub sync: SyncSettings,
}

impl TermbridgeConfig {
    /// Check that every ceiling is usable
    pub fn validate(&self) -> std::result::Result<(), SettingsError> {
        if self.capture.max_capture_length == 0 {
            return Err(SettingsError::InvalidCaptureLength(
                self.capture.max_capture_length,
            ));
        }
        if self.capture.max_capture_lines == 0 {
            return Err(SettingsError::InvalidCaptureLines(
                self.capture.max_capture_lines,
            ));
        }
        if self.capture.capture_history_size == 0 {
            return Err(SettingsError::InvalidHistorySize(
                self.capture.capture_history_size,
            ));
        }
        if self.search.min_query_length == 0 {
            return Err(SettingsError::InvalidMinQueryLength(
                self.search.min_query_length,
            ));
        }
        if self.search.max_results == 0 {
            return Err(SettingsError::InvalidMaxResults(self.search.max_results));
        }
        Ok(())
    }
    /// Default location: `<config dir>/termbridge/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("termbridge").join("config.toml"))
    }

    /// Load from the default location; a missing file yields defaults
    pub fn load() -> Result<Self> {
        match Self::default_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from a specific path; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path).map_err(|e| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config: Self = toml::from_str(&text)?;
        config.validate().map_err(|e| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Save to a specific path, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::ConfigSaveFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        let text = toml::to_string_pretty(self).map_err(|e| Error::ConfigSaveFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        fs::write(path, text).map_err(|e| Error::ConfigSaveFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
