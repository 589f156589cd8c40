//! Output processing pipeline
//!
//! Turns raw terminal output into text fit for AI context: escape
//! sequences stripped, line endings normalized, size bounded by both a
//! line and a character ceiling. Processing happens once, when a
//! capture is finalized; the streaming hot path never runs it.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{CaptureSettings, TruncationMode};

/// Marker inserted where output was removed by truncation
pub const TRUNCATION_MARKER: &str = "[... output truncated ...]";

/// One pattern covering CSI (`ESC [ params final`) and OSC
/// (`ESC ] ... BEL/ST`) sequences; an unterminated trailing OSC is
/// consumed to the end of input.
static ESCAPE_SEQUENCES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x1b\[[0-9;:?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)?")
        .unwrap()
});

/// Result of running the processing pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedOutput {
    /// Processed text
    pub text: String,
    /// Whether truncation removed anything
    pub truncated: bool,
    /// Character count of the raw input
    pub original_length: usize,
}

/// Applies the capture processing pipeline
#[derive(Debug, Clone)]
pub struct OutputProcessor {
    settings: CaptureSettings,
}

impl OutputProcessor {
    /// Create a processor with the given settings
    pub fn new(settings: CaptureSettings) -> Self {
        Self { settings }
    }

    /// Run the full pipeline: strip, normalize, truncate, trim
    pub fn process(&self, raw: &str) -> ProcessedOutput {
        let original_length = raw.chars().count();

        let text = if self.settings.strip_ansi_sequences {
            strip_ansi(raw)
        } else {
            raw.to_string()
        };

        let text = if self.settings.normalize_line_endings {
            normalize_line_endings(&text)
        } else {
            text
        };

        let (text, truncated) = truncate(&text, &self.settings);

        ProcessedOutput {
            text: text.trim().to_string(),
            truncated,
            original_length,
        }
    }
}

/// Remove CSI and OSC escape sequences
pub fn strip_ansi(text: &str) -> String {
    ESCAPE_SEQUENCES.replace_all(text, "").into_owned()
}

/// Normalize CRLF and lone CR to LF
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Enforce the line ceiling, then the character ceiling, independently
fn truncate(text: &str, settings: &CaptureSettings) -> (String, bool) {
    let mut truncated = false;
    let mut result = text.to_string();

    let max_lines = settings.max_capture_lines;
    if max_lines > 0 && result.lines().count() > max_lines {
        result = truncate_lines(&result, max_lines, settings.truncation_mode);
        truncated = true;
    }

    let max_chars = settings.max_capture_length;
    if max_chars > 0 && result.chars().count() > max_chars {
        result = truncate_chars(&result, max_chars, settings.truncation_mode);
        truncated = true;
    }

    (result, truncated)
}

fn truncate_lines(text: &str, max_lines: usize, mode: TruncationMode) -> String {
    let lines: Vec<&str> = text.lines().collect();
    match mode {
        TruncationMode::KeepStart => {
            let mut kept = lines[..max_lines].join("\n");
            kept.push('\n');
            kept.push_str(TRUNCATION_MARKER);
            kept
        }
        TruncationMode::KeepEnd => {
            let mut kept = String::from(TRUNCATION_MARKER);
            kept.push('\n');
            kept.push_str(&lines[lines.len() - max_lines..].join("\n"));
            kept
        }
        TruncationMode::KeepBoth => {
            let head = max_lines / 2;
            let tail = max_lines - head;
            let mut kept = lines[..head].join("\n");
            kept.push('\n');
            kept.push_str(TRUNCATION_MARKER);
            kept.push('\n');
            kept.push_str(&lines[lines.len() - tail..].join("\n"));
            kept
        }
    }
}

fn truncate_chars(text: &str, max_chars: usize, mode: TruncationMode) -> String {
    match mode {
        TruncationMode::KeepStart => {
            format!("{}\n{}", prefix_chars(text, max_chars), TRUNCATION_MARKER)
        }
        TruncationMode::KeepEnd => {
            format!("{}\n{}", TRUNCATION_MARKER, suffix_chars(text, max_chars))
        }
        TruncationMode::KeepBoth => {
            let head = max_chars / 2;
            let tail = max_chars - head;
            format!(
                "{}\n{}\n{}",
                prefix_chars(text, head),
                TRUNCATION_MARKER,
                suffix_chars(text, tail)
            )
        }
    }
}

/// First `n` characters, respecting char boundaries
fn prefix_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Last `n` characters, respecting char boundaries
fn suffix_chars(text: &str, n: usize) -> &str {
    let count = text.chars().count();
    if count <= n {
        return text;
    }
    match text.char_indices().nth(count - n) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}
