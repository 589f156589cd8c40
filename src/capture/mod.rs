//! Output Capture
//!
//! Subscribes to session output, accumulates per-session stream
//! captures, and takes on-demand buffer snapshots. Raw text is appended
//! untouched on the output hot path; the processing pipeline runs when
//! a capture is finalized. Finished captures land in a bounded
//! per-session history plus a global id-indexed lookup.

pub mod processor;

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::config::CaptureSettings;
use crate::error::{Error, Result};
use crate::models::{CaptureMode, TerminalOutputCapture};
use crate::session::{SessionEvent, SessionOrchestrator};

use self::processor::OutputProcessor;

/// A stream capture in progress for one session
struct ActiveCapture {
    command: Option<String>,
    started_at: DateTime<Utc>,
    buffer: String,
}

#[derive(Default)]
struct HistoryState {
    /// Capture ids per session, oldest first
    per_session: HashMap<String, VecDeque<String>>,
    /// All retained captures by id
    by_id: HashMap<String, TerminalOutputCapture>,
}

/// Per-session output capture service
pub struct CaptureManager {
    orchestrator: Arc<dyn SessionOrchestrator>,
    settings: RwLock<CaptureSettings>,
    active: Mutex<HashMap<String, ActiveCapture>>,
    history: Mutex<HistoryState>,
}

impl CaptureManager {
    /// Create a manager with default settings
    pub fn new(orchestrator: Arc<dyn SessionOrchestrator>) -> Self {
        Self::with_settings(orchestrator, CaptureSettings::default())
    }

    /// Create a manager with explicit settings
    pub fn with_settings(
        orchestrator: Arc<dyn SessionOrchestrator>,
        settings: CaptureSettings,
    ) -> Self {
        Self {
            orchestrator,
            settings: RwLock::new(settings),
            active: Mutex::new(HashMap::new()),
            history: Mutex::new(HistoryState::default()),
        }
    }

    /// Replace the capture settings
    pub fn configure(&self, settings: CaptureSettings) {
        *self.settings.write().unwrap_or_else(|e| e.into_inner()) = settings;
    }

    /// Current capture settings
    pub fn settings(&self) -> CaptureSettings {
        self.settings
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Route an orchestrator event into the capture service.
    ///
    /// May be called from an I/O thread concurrently with foreground
    /// calls.
    pub fn handle_session_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::Output { session_id, text } => {
                self.handle_session_output(session_id, text);
            }
            SessionEvent::Closed { session_id } => {
                let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
                if active.remove(session_id).is_some() {
                    debug!(session = %session_id, "dropped active capture, session closed");
                }
            }
            SessionEvent::Created { .. } => {}
        }
    }

    /// Append a raw output chunk to the session's active capture, if any
    pub fn handle_session_output(&self, session_id: &str, text: &str) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(capture) = active.get_mut(session_id) {
            capture.buffer.push_str(text);
        }
    }

    /// Begin a stream capture for a session.
    ///
    /// A capture already running for the session is discarded.
    pub fn start_capture(&self, session_id: &str, command: Option<String>) {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        let previous = active.insert(
            session_id.to_string(),
            ActiveCapture {
                command,
                started_at: Utc::now(),
                buffer: String::new(),
            },
        );
        if previous.is_some() {
            info!(session = %session_id, "discarding previous active capture");
        }
    }

    /// Whether a stream capture is running for a session
    pub fn is_capture_active(&self, session_id: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(session_id)
    }

    /// Finish a stream capture and record the processed snapshot.
    ///
    /// Returns `None` when no capture was running.
    pub fn stop_capture(&self, session_id: &str) -> Option<TerminalOutputCapture> {
        let context = self
            .active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(session_id)?;

        let capture = self.build_capture(
            session_id,
            context.command,
            &context.buffer,
            context.started_at,
            CaptureMode::Stream,
        );
        self.record(capture.clone());
        Some(capture)
    }

    /// Snapshot a session's rendered buffer.
    ///
    /// `mode` selects the whole buffer or the last `line_count` lines.
    pub fn capture_buffer(
        &self,
        session_id: &str,
        mode: CaptureMode,
        line_count: Option<usize>,
    ) -> Result<TerminalOutputCapture> {
        let buffer = self
            .orchestrator
            .buffer(session_id)
            .ok_or_else(|| Error::SessionNotFound {
                session_id: session_id.to_string(),
            })?;

        let text = match mode {
            CaptureMode::FullBuffer => buffer.all_text(),
            CaptureMode::LastLines => {
                let all = buffer.all_text();
                let count = line_count
                    .unwrap_or_else(|| self.settings().max_capture_lines);
                let lines: Vec<&str> = all.lines().collect();
                let start = lines.len().saturating_sub(count);
                lines[start..].join("\n")
            }
            CaptureMode::Selection => {
                return self
                    .capture_selection(session_id)?
                    .ok_or_else(|| Error::NoSelection {
                        session_id: session_id.to_string(),
                    });
            }
            CaptureMode::Stream => {
                return Err(Error::Other(
                    "stream captures are driven by start_capture/stop_capture".to_string(),
                ));
            }
        };

        let capture = self.build_capture(session_id, None, &text, Utc::now(), mode);
        self.record(capture.clone());
        Ok(capture)
    }

    /// Snapshot the current selection, `None` when nothing is selected
    pub fn capture_selection(&self, session_id: &str) -> Result<Option<TerminalOutputCapture>> {
        let buffer = self
            .orchestrator
            .buffer(session_id)
            .ok_or_else(|| Error::SessionNotFound {
                session_id: session_id.to_string(),
            })?;

        let selected = match buffer.selected_text() {
            Some(text) if !text.is_empty() => text,
            _ => return Ok(None),
        };

        let capture =
            self.build_capture(session_id, None, &selected, Utc::now(), CaptureMode::Selection);
        self.record(capture.clone());
        Ok(Some(capture))
    }

    /// Most recent captures for a session, newest first
    pub fn recent_captures(&self, session_id: &str, count: usize) -> Vec<TerminalOutputCapture> {
        let history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        let Some(ids) = history.per_session.get(session_id) else {
            return Vec::new();
        };
        ids.iter()
            .rev()
            .take(count)
            .filter_map(|id| history.by_id.get(id).cloned())
            .collect()
    }

    /// Look up a capture by id
    pub fn get_capture(&self, capture_id: &str) -> Option<TerminalOutputCapture> {
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .by_id
            .get(capture_id)
            .cloned()
    }

    /// Drop all retained captures for a session
    pub fn clear_history(&self, session_id: &str) {
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(ids) = history.per_session.remove(session_id) {
            for id in ids {
                history.by_id.remove(&id);
            }
        }
    }

    fn build_capture(
        &self,
        session_id: &str,
        command: Option<String>,
        raw: &str,
        started_at: DateTime<Utc>,
        mode: CaptureMode,
    ) -> TerminalOutputCapture {
        let processed = OutputProcessor::new(self.settings()).process(raw);
        let session = self.orchestrator.session(session_id);
        TerminalOutputCapture::new(
            session_id,
            session.as_ref().map(|s| s.name.clone()),
            command,
            processed.text,
            processed.truncated,
            processed.original_length,
            started_at,
            session.and_then(|s| s.working_directory),
            mode,
        )
    }

    /// Insert into the per-session queue and the id map, evicting the
    /// oldest entries past the configured history size
    fn record(&self, capture: TerminalOutputCapture) {
        let limit = self.settings().capture_history_size;
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());

        let queue = history
            .per_session
            .entry(capture.session_id.clone())
            .or_default();
        queue.push_back(capture.id.clone());

        let mut evicted = Vec::new();
        while queue.len() > limit {
            if let Some(oldest) = queue.pop_front() {
                evicted.push(oldest);
            }
        }
        history.by_id.insert(capture.id.clone(), capture);
        for id in evicted {
            history.by_id.remove(&id);
            debug!(capture = %id, "evicted capture past history limit");
        }
    }
}
