//! Mock session orchestrator for testing
//!
//! Records writes and signals instead of touching a PTY, and serves
//! scripted buffers. Shared by the integration test suites.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use termbridge::error::{Error, Result};
use termbridge::models::ShellKind;
use termbridge::platform::ShellProbe;
use termbridge::session::{
    Clipboard, SessionEvent, SessionInfo, SessionOptions, SessionOrchestrator, SignalKind,
    TerminalBuffer,
};

/// Scripted terminal buffer
pub struct MockBuffer {
    pub lines: Vec<String>,
    pub selection: Option<String>,
    pub first_visible: usize,
}

impl MockBuffer {
    pub fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|s| s.to_string()).collect(),
            selection: None,
            first_visible: 0,
        }
    }
}

impl TerminalBuffer for MockBuffer {
    fn all_text(&self) -> String {
        self.lines.join("\n")
    }

    fn selected_text(&self) -> Option<String> {
        self.selection.clone()
    }

    fn first_visible_line(&self) -> usize {
        self.first_visible
    }

    fn total_line_count(&self) -> usize {
        self.lines.len()
    }

    fn line_text(&self, index: usize) -> Option<String> {
        self.lines.get(index).cloned()
    }
}

#[derive(Default)]
struct MockState {
    sessions: Vec<SessionInfo>,
    active: Option<String>,
    writes: Vec<(String, String)>,
    write_counts: HashMap<String, usize>,
    signals: Vec<(String, SignalKind)>,
    /// Session id -> number of writes allowed before failures begin
    failing_writes: HashMap<String, usize>,
    buffers: HashMap<String, Arc<MockBuffer>>,
    next_id: usize,
}

/// In-memory orchestrator double
#[derive(Default)]
pub struct MockOrchestrator {
    state: Mutex<MockState>,
}

impl MockOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live session
    pub fn add_session(&self, id: &str, kind: ShellKind) -> SessionInfo {
        let info = SessionInfo {
            id: id.to_string(),
            name: format!("{}-session", kind.as_str()),
            shell_kind: kind,
            working_directory: None,
        };
        let mut state = self.state.lock().unwrap();
        state.sessions.push(info.clone());
        info
    }

    /// Mark a session as the UI-active one
    pub fn set_active(&self, id: &str) {
        self.state.lock().unwrap().active = Some(id.to_string());
    }

    /// Make every write to a session fail
    pub fn fail_writes(&self, id: &str) {
        self.fail_writes_after(id, 0);
    }

    /// Let `allowed` writes succeed for a session, then fail the rest
    pub fn fail_writes_after(&self, id: &str, allowed: usize) {
        self.state
            .lock()
            .unwrap()
            .failing_writes
            .insert(id.to_string(), allowed);
    }

    /// Attach a scripted buffer to a session
    pub fn set_buffer(&self, id: &str, buffer: MockBuffer) {
        self.state
            .lock()
            .unwrap()
            .buffers
            .insert(id.to_string(), Arc::new(buffer));
    }

    /// Everything written so far, as (session id, text) pairs
    pub fn writes(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().writes.clone()
    }

    /// Signals delivered so far
    pub fn signals(&self) -> Vec<(String, SignalKind)> {
        self.state.lock().unwrap().signals.clone()
    }
}

#[async_trait]
impl SessionOrchestrator for MockOrchestrator {
    async fn create_session(&self, options: SessionOptions) -> Result<SessionInfo> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let kind = options
            .shell_path
            .as_deref()
            .map(ShellKind::from_executable)
            .unwrap_or_default();
        let info = SessionInfo {
            id: format!("mock-{}", state.next_id),
            name: options.name.unwrap_or_else(|| "mock".to_string()),
            shell_kind: kind,
            working_directory: options.working_directory,
        };
        state.sessions.push(info.clone());
        if state.active.is_none() {
            state.active = Some(info.id.clone());
        }
        Ok(info)
    }

    async fn write_input(&self, session_id: &str, text: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.sessions.iter().any(|s| s.id == session_id) {
            return Err(Error::SessionNotFound {
                session_id: session_id.to_string(),
            });
        }
        let attempted = {
            let count = state.write_counts.entry(session_id.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        if let Some(allowed) = state.failing_writes.get(session_id) {
            if attempted > *allowed {
                return Err(Error::SessionWriteFailed {
                    session_id: session_id.to_string(),
                    reason: "scripted write failure".to_string(),
                });
            }
        }
        state.writes.push((session_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn send_signal(&self, session_id: &str, signal: SignalKind) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if !state.sessions.iter().any(|s| s.id == session_id) {
            return Err(Error::SessionNotFound {
                session_id: session_id.to_string(),
            });
        }
        state.signals.push((session_id.to_string(), signal));
        Ok(())
    }

    fn buffer(&self, session_id: &str) -> Option<Arc<dyn TerminalBuffer>> {
        let state = self.state.lock().unwrap();
        state
            .buffers
            .get(session_id)
            .map(|b| Arc::clone(b) as Arc<dyn TerminalBuffer>)
    }

    fn session(&self, session_id: &str) -> Option<SessionInfo> {
        let state = self.state.lock().unwrap();
        state.sessions.iter().find(|s| s.id == session_id).cloned()
    }

    fn active_session(&self) -> Option<SessionInfo> {
        let state = self.state.lock().unwrap();
        let active = state.active.as_ref()?;
        state.sessions.iter().find(|s| &s.id == active).cloned()
    }

    fn sessions(&self) -> Vec<SessionInfo> {
        self.state.lock().unwrap().sessions.clone()
    }
}

/// Clipboard double that records what was copied
#[derive(Default)]
pub struct MockClipboard {
    pub contents: Mutex<Vec<String>>,
}

impl MockClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<String> {
        self.contents.lock().unwrap().last().cloned()
    }
}

impl Clipboard for MockClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        self.contents.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Shell probe reporting a fixed set of shells
pub struct FixedProbe {
    pub default: PathBuf,
    pub installed: Vec<(String, PathBuf)>,
}

impl FixedProbe {
    pub fn new(default: &str, installed: &[(&str, &str)]) -> Self {
        Self {
            default: PathBuf::from(default),
            installed: installed
                .iter()
                .map(|(name, path)| (name.to_string(), PathBuf::from(path)))
                .collect(),
        }
    }
}

impl ShellProbe for FixedProbe {
    fn default_shell_path(&self) -> PathBuf {
        self.default.clone()
    }

    fn installed_shells(&self) -> Vec<(String, PathBuf)> {
        self.installed.clone()
    }

    fn path_candidates(&self) -> &'static [&'static str] {
        &[]
    }
}

/// Convenience constructor for output events
pub fn output_event(session_id: &str, text: &str) -> SessionEvent {
    SessionEvent::Output {
        session_id: session_id.to_string(),
        text: text.to_string(),
    }
}
