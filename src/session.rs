//! Session Orchestrator Interface
//!
//! The terminal integration layer does not own PTY lifecycle. Spawning,
//! reading, and writing the underlying pseudo-terminal belong to the
//! session orchestrator, specified here only at its interface boundary.
//! The same applies to clipboard access.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::models::ShellKind;

/// Options for spawning a new terminal session
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Shell executable to launch; orchestrator default when `None`
    pub shell_path: Option<PathBuf>,
    /// Arguments passed to the shell
    pub args: Vec<String>,
    /// Initial working directory
    pub working_directory: Option<PathBuf>,
    /// Environment variable overrides
    pub environment: HashMap<String, String>,
    /// Display name for the session
    pub name: Option<String>,
    /// Command run once after the shell starts
    pub startup_command: Option<String>,
}

/// Signals deliverable to a session's foreground process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Ctrl+C equivalent
    Interrupt,
    /// Graceful shutdown request
    Terminate,
    /// Forceful termination
    Kill,
}

impl SignalKind {
    /// Name used in diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Interrupt => "interrupt",
            SignalKind::Terminate => "terminate",
            SignalKind::Kill => "kill",
        }
    }
}

/// Descriptor of a live terminal session
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// Unique session id
    pub id: String,
    /// Display name
    pub name: String,
    /// Shell kind running in the session
    pub shell_kind: ShellKind,
    /// Session working directory, when the orchestrator tracks one
    pub working_directory: Option<PathBuf>,
}

/// Lifecycle and output notifications from the orchestrator.
///
/// Output events may arrive on an I/O thread; consumers must treat
/// handlers as running concurrently with foreground calls.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A session was created
    Created {
        /// The new session
        session: SessionInfo,
    },
    /// A session ended
    Closed {
        /// Id of the closed session
        session_id: String,
    },
    /// A raw output chunk arrived
    Output {
        /// Session that produced the output
        session_id: String,
        /// Raw text, escape sequences included
        text: String,
    },
}

/// Read access to a session's rendered buffer
pub trait TerminalBuffer: Send + Sync {
    /// Entire buffer text, scrollback included
    fn all_text(&self) -> String;

    /// Currently selected text, if a selection exists
    fn selected_text(&self) -> Option<String>;

    /// Index of the first line visible in the viewport
    fn first_visible_line(&self) -> usize;

    /// Total number of lines, scrollback included
    fn total_line_count(&self) -> usize;

    /// Text of one line, `None` past the end
    fn line_text(&self, index: usize) -> Option<String>;
}

/// External owner of PTY sessions
#[async_trait]
pub trait SessionOrchestrator: Send + Sync {
    /// Spawn a new session
    async fn create_session(&self, options: SessionOptions) -> Result<SessionInfo>;

    /// Write raw text into a session's input
    async fn write_input(&self, session_id: &str, text: &str) -> Result<()>;

    /// Deliver a signal to a session's foreground process
    async fn send_signal(&self, session_id: &str, signal: SignalKind) -> Result<()>;

    /// Rendered buffer for a session, `None` for unknown ids
    fn buffer(&self, session_id: &str) -> Option<Arc<dyn TerminalBuffer>>;

    /// Descriptor for one session, `None` for unknown ids
    fn session(&self, session_id: &str) -> Option<SessionInfo>;

    /// The session currently focused in the UI, if any
    fn active_session(&self) -> Option<SessionInfo>;

    /// All live sessions
    fn sessions(&self) -> Vec<SessionInfo>;
}

/// Write access to the system clipboard
pub trait Clipboard: Send + Sync {
    /// Replace the clipboard contents with `text`
    fn set_text(&self, text: &str) -> Result<()>;
}

/// Clipboard backed by the operating system via `arboard`
pub struct SystemClipboard {
    inner: Mutex<arboard::Clipboard>,
}

impl SystemClipboard {
    /// Connect to the system clipboard
    pub fn new() -> Result<Self> {
        let inner = arboard::Clipboard::new().map_err(|e| Error::ClipboardFailed {
            reason: e.to_string(),
        })?;
        Ok(Self {
            inner: Mutex::new(inner),
        })
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<()> {
        let mut clipboard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        clipboard
            .set_text(text.to_string())
            .map_err(|e| Error::ClipboardFailed {
                reason: e.to_string(),
            })
    }
}
