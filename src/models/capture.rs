//! Terminal Output Capture Model
//!
//! A capture is a finalized, processed snapshot of terminal output
//! intended for downstream AI-context consumption. Captures are
//! immutable once created; the capture manager keeps a bounded
//! per-session history of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// How a capture's text was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureMode {
    /// Accumulated from the live output stream between start and stop
    Stream,
    /// Snapshot of the full rendered buffer
    FullBuffer,
    /// Snapshot of the last N buffer lines
    LastLines,
    /// Snapshot of the user's selection
    Selection,
}

/// Immutable snapshot of processed terminal output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalOutputCapture {
    /// Unique identifier
    pub id: String,
    /// Session the output came from
    pub session_id: String,
    /// Session display name, when known
    pub session_name: Option<String>,
    /// Command this capture is labelled with, if any
    pub command: Option<String>,
    /// Processed output text
    pub output: String,
    /// Whether truncation shortened the output
    pub truncated: bool,
    /// Length of the raw text before processing, in characters
    pub original_length: usize,
    /// When capturing began
    pub started_at: DateTime<Utc>,
    /// When the capture was finalized
    pub ended_at: DateTime<Utc>,
    /// Session working directory at capture time, when known
    pub working_directory: Option<PathBuf>,
    /// How the text was obtained
    pub mode: CaptureMode,
}

impl TerminalOutputCapture {
    /// Build a capture snapshot, stamping a fresh id and end time
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_id: &str,
        session_name: Option<String>,
        command: Option<String>,
        output: String,
        truncated: bool,
        original_length: usize,
        started_at: DateTime<Utc>,
        working_directory: Option<PathBuf>,
        mode: CaptureMode,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            session_name,
            command,
            output,
            truncated,
            original_length,
            started_at,
            ended_at: Utc::now(),
            working_directory,
            mode,
        }
    }

    /// Number of lines in the processed output
    pub fn line_count(&self) -> usize {
        if self.output.is_empty() {
            0
        } else {
            self.output.lines().count()
        }
    }
}
