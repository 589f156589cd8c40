//! Error types and Result aliases for termbridge

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for termbridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for termbridge
#[derive(Debug)]
pub enum Error {
    // === Session errors ===
    /// Referenced session does not exist
    SessionNotFound {
        session_id: String,
    },

    /// Failed to write input to a session
    SessionWriteFailed {
        session_id: String,
        reason: String,
    },

    /// Failed to spawn a new session
    SessionSpawnFailed {
        reason: String,
    },

    /// Failed to deliver a signal to a session
    SignalSendFailed {
        session_id: String,
        signal: String,
        reason: String,
    },

    // === Shell errors ===
    /// Shell path is empty or does not point to a usable executable
    InvalidShellPath {
        path: String,
        reason: String,
    },

    /// Shell validation did not finish within the allotted time
    ValidationTimeout {
        path: String,
        duration: Duration,
    },

    // === Profile errors ===
    /// Referenced profile does not exist
    ProfileNotFound {
        profile_id: String,
    },

    /// Profile name collides with an existing profile
    DuplicateProfileName {
        name: String,
    },

    /// Built-in profiles cannot be modified or deleted
    BuiltInProfileImmutable {
        name: String,
    },

    /// Profile import payload could not be parsed
    ProfileImportFailed {
        reason: String,
    },

    // === Capture errors ===
    /// Referenced capture does not exist
    CaptureNotFound {
        capture_id: String,
    },

    /// No text is selected in the target buffer
    NoSelection {
        session_id: String,
    },

    // === Search errors ===
    /// Search pattern failed to compile
    InvalidSearchPattern {
        pattern: String,
        reason: String,
    },

    // === Clipboard errors ===
    /// Clipboard access failed
    ClipboardFailed {
        reason: String,
    },

    // === Configuration errors ===
    /// Failed to load configuration file
    ConfigLoadFailed {
        path: PathBuf,
        reason: String,
    },

    /// Failed to save configuration file
    ConfigSaveFailed {
        path: PathBuf,
        reason: String,
    },

    // === Cancellation ===
    /// Operation was cancelled by the caller
    Cancelled,

    // === I/O and serialization errors ===
    /// I/O errors
    Io(std::io::Error),

    /// Serialization errors
    Serde(serde_json::Error),

    /// TOML parsing errors
    Toml(toml::de::Error),

    /// Regex compilation errors
    Regex(regex::Error),

    // === Generic fallback (use sparingly) ===
    /// Generic errors (for cases not yet categorized)
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Session errors
            Error::SessionNotFound { session_id } => {
                write!(f, "Session '{}' not found", session_id)
            }
            Error::SessionWriteFailed { session_id, reason } => {
                write!(f, "Failed to write to session '{}': {}", session_id, reason)
            }
            Error::SessionSpawnFailed { reason } => {
                write!(f, "Failed to spawn session: {}", reason)
            }
            Error::SignalSendFailed {
                session_id,
                signal,
                reason,
            } => {
                write!(
                    f,
                    "Failed to send {} to session '{}': {}",
                    signal, session_id, reason
                )
            }

            // Shell errors
            Error::InvalidShellPath { path, reason } => {
                write!(f, "Invalid shell path '{}': {}", path, reason)
            }
            Error::ValidationTimeout { path, duration } => {
                write!(
                    f,
                    "Shell validation for '{}' timed out after {:?}",
                    path, duration
                )
            }

            // Profile errors
            Error::ProfileNotFound { profile_id } => {
                write!(f, "Shell profile '{}' not found", profile_id)
            }
            Error::DuplicateProfileName { name } => {
                write!(f, "A shell profile named '{}' already exists", name)
            }
            Error::BuiltInProfileImmutable { name } => {
                write!(f, "Built-in profile '{}' cannot be modified or deleted", name)
            }
            Error::ProfileImportFailed { reason } => {
                write!(f, "Failed to import profiles: {}", reason)
            }

            // Capture errors
            Error::CaptureNotFound { capture_id } => {
                write!(f, "Output capture '{}' not found", capture_id)
            }
            Error::NoSelection { session_id } => {
                write!(f, "No text selected in session '{}'", session_id)
            }

            // Search errors
            Error::InvalidSearchPattern { pattern, reason } => {
                write!(f, "Invalid search pattern '{}': {}", pattern, reason)
            }

            // Clipboard errors
            Error::ClipboardFailed { reason } => {
                write!(f, "Clipboard operation failed: {}", reason)
            }

            // Configuration errors
            Error::ConfigLoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path.display(), reason)
            }
            Error::ConfigSaveFailed { path, reason } => {
                write!(f, "Failed to save config to '{}': {}", path.display(), reason)
            }

            // Cancellation
            Error::Cancelled => {
                write!(f, "Operation cancelled")
            }

            // I/O and serialization errors
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Serde(err) => write!(f, "Serialization error: {}", err),
            Error::Toml(err) => write!(f, "TOML parsing error: {}", err),
            Error::Regex(err) => write!(f, "Regex compilation error: {}", err),

            // Generic fallback
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Toml(err)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Regex(err)
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}

impl Error {
    /// True when this error represents a caller cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}
