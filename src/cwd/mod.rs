//! Working-Directory Sync
//!
//! Tracks each session's current directory from OSC7 escape-sequence
//! reports, translates WSL-style paths to host paths, and propagates
//! directory changes between terminal and file-explorer views under a
//! configurable policy. Malformed reports are logged and swallowed;
//! they never surface as errors.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, warn};

use crate::config::{AutoSyncMode, SyncSettings};
use crate::error::{Error, Result};
use crate::events::{
    DirectoryChangeSource, EventEmitter, ExplorerSyncRequested, ExplorerSyncScope,
    SubscriptionId, TerminalDirectoryChanged,
};
use crate::session::{SessionEvent, SessionOrchestrator};
use crate::shells::format;

/// Tracked sync state for one session
#[derive(Debug, Clone)]
pub struct SessionSyncState {
    /// Session this state belongs to
    pub session_id: String,
    /// Last directory the session reported or was driven to
    pub current_directory: Option<PathBuf>,
    /// Whether automatic propagation is enabled for this session
    pub auto_sync: bool,
    /// Workspace the session is linked to, if any
    pub workspace_id: Option<String>,
}

/// Bidirectional directory synchronization service
pub struct DirectorySync {
    orchestrator: Arc<dyn SessionOrchestrator>,
    settings: RwLock<SyncSettings>,
    sessions: Mutex<HashMap<String, SessionSyncState>>,
    /// Directory currently shown in the explorer view, fed by the host
    explorer_directory: Mutex<Option<PathBuf>>,
    terminal_events: EventEmitter<TerminalDirectoryChanged>,
    explorer_events: EventEmitter<ExplorerSyncRequested>,
}

impl DirectorySync {
    /// Create the service with default settings
    pub fn new(orchestrator: Arc<dyn SessionOrchestrator>) -> Self {
        Self::with_settings(orchestrator, SyncSettings::default())
    }

    /// Create the service with explicit settings
    pub fn with_settings(orchestrator: Arc<dyn SessionOrchestrator>, settings: SyncSettings) -> Self {
        Self {
            orchestrator,
            settings: RwLock::new(settings),
            sessions: Mutex::new(HashMap::new()),
            explorer_directory: Mutex::new(None),
            terminal_events: EventEmitter::new(),
            explorer_events: EventEmitter::new(),
        }
    }

    /// Replace the sync settings
    pub fn configure(&self, settings: SyncSettings) {
        *self.settings.write().unwrap_or_else(|e| e.into_inner()) = settings;
    }

    /// Subscribe to terminal directory changes
    pub fn on_terminal_directory_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&TerminalDirectoryChanged) + Send + Sync + 'static,
    {
        self.terminal_events.subscribe(callback)
    }

    /// Subscribe to explorer sync requests
    pub fn on_explorer_sync_requested<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ExplorerSyncRequested) + Send + Sync + 'static,
    {
        self.explorer_events.subscribe(callback)
    }

    /// Route an orchestrator event into the sync service.
    ///
    /// Creates per-session state on `Created`, tears it down on
    /// `Closed`, and scans output chunks for OSC7 reports.
    pub fn handle_session_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::Created { session } => {
                let auto_sync = self.settings().auto_sync_mode != AutoSyncMode::Manual;
                let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
                sessions.insert(
                    session.id.clone(),
                    SessionSyncState {
                        session_id: session.id.clone(),
                        current_directory: session.working_directory.clone(),
                        auto_sync,
                        workspace_id: None,
                    },
                );
            }
            SessionEvent::Closed { session_id } => {
                let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
                sessions.remove(session_id);
            }
            SessionEvent::Output { session_id, text } => {
                if let Some(uri) = extract_osc7_uri(text) {
                    let uri = uri.to_string();
                    self.process_osc7(session_id, &uri);
                }
            }
        }
    }

    /// Last known directory for a session
    pub fn terminal_directory(&self, session_id: &str) -> Option<PathBuf> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(session_id)
            .and_then(|state| state.current_directory.clone())
    }

    /// Whether auto-sync is enabled for a session
    pub fn is_auto_sync_enabled(&self, session_id: &str) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(session_id)
            .map(|state| state.auto_sync)
            .unwrap_or(false)
    }

    /// Enable or disable auto-sync for a session
    pub fn set_auto_sync(&self, session_id: &str, enabled: bool) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(state) = sessions.get_mut(session_id) {
            state.auto_sync = enabled;
        }
    }

    /// Link a session to a workspace for `AllLinkedTerminals` propagation
    pub fn link_to_workspace(&self, session_id: &str, workspace_id: &str) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(state) = sessions.get_mut(session_id) {
            state.workspace_id = Some(workspace_id.to_string());
        }
    }

    /// Remove a session's workspace link
    pub fn unlink(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(state) = sessions.get_mut(session_id) {
            state.workspace_id = None;
        }
    }

    /// Snapshot of a session's sync state
    pub fn sync_state(&self, session_id: &str) -> Option<SessionSyncState> {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(session_id)
            .cloned()
    }

    /// Record the directory currently shown in the explorer view
    pub fn set_explorer_directory(&self, path: Option<PathBuf>) {
        *self
            .explorer_directory
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = path;
    }

    /// Drive a session's shell to a new directory.
    ///
    /// Writes the shell-appropriate cd command and updates tracked
    /// state optimistically, without waiting for OSC7 confirmation.
    pub async fn change_terminal_directory(&self, session_id: &str, path: &Path) -> Result<()> {
        self.drive_directory(session_id, path, DirectoryChangeSource::Api)
            .await
    }

    /// Push a terminal's directory to the explorer view
    pub fn sync_terminal_to_explorer(&self, session_id: &str, path: &Path) {
        let scope = {
            let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
            match sessions.get(session_id).and_then(|s| s.workspace_id.clone()) {
                Some(workspace_id) => ExplorerSyncScope::LinkedWorkspace { workspace_id },
                None => ExplorerSyncScope::ActiveTerminal,
            }
        };
        self.explorer_events.emit(&ExplorerSyncRequested {
            session_id: session_id.to_string(),
            directory: path.to_path_buf(),
            scope,
        });
    }

    /// Drive a session's shell to the explorer's current directory
    pub async fn sync_explorer_to_terminal(&self, session_id: &str) -> Result<()> {
        let target = self
            .explorer_directory
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        let Some(target) = target else {
            debug!(session = %session_id, "no explorer directory to sync from");
            return Ok(());
        };
        self.drive_directory(session_id, &target, DirectoryChangeSource::ExplorerSync)
            .await
    }

    /// Handle an OSC7 working-directory report.
    ///
    /// Parses the `file://` URI, percent-decodes the path, applies WSL
    /// translation when configured, validates existence, updates
    /// tracked state, and applies the auto-sync policy. Malformed
    /// input is swallowed with a diagnostic log.
    pub fn process_osc7(&self, session_id: &str, uri: &str) {
        let settings = self.settings();

        let Some(path) = parse_osc7_uri(uri, settings.translate_wsl_paths) else {
            debug!(session = %session_id, uri = %uri, "ignoring malformed OSC7 report");
            return;
        };

        if settings.verify_directory_exists && !path.exists() {
            debug!(session = %session_id, path = %path.display(), "ignoring OSC7 report, path does not exist");
            return;
        }

        let (old_directory, auto_sync, workspace_id) = {
            let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
            let Some(state) = sessions.get_mut(session_id) else {
                debug!(session = %session_id, "OSC7 report for untracked session");
                return;
            };
            if state.current_directory.as_deref() == Some(path.as_path()) {
                return;
            }
            let old = state.current_directory.replace(path.clone());
            (old, state.auto_sync, state.workspace_id.clone())
        };

        self.terminal_events.emit(&TerminalDirectoryChanged {
            session_id: session_id.to_string(),
            old_directory,
            new_directory: path.clone(),
            source: DirectoryChangeSource::Osc7,
        });

        if !auto_sync {
            return;
        }
        match settings.auto_sync_mode {
            AutoSyncMode::Manual => {}
            AutoSyncMode::ActiveTerminalOnly => {
                self.explorer_events.emit(&ExplorerSyncRequested {
                    session_id: session_id.to_string(),
                    directory: path,
                    scope: ExplorerSyncScope::ActiveTerminal,
                });
            }
            AutoSyncMode::AllLinkedTerminals => {
                if let Some(workspace_id) = workspace_id {
                    self.explorer_events.emit(&ExplorerSyncRequested {
                        session_id: session_id.to_string(),
                        directory: path,
                        scope: ExplorerSyncScope::LinkedWorkspace { workspace_id },
                    });
                }
            }
        }
    }

    fn settings(&self) -> SyncSettings {
        self.settings
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    async fn drive_directory(
        &self,
        session_id: &str,
        path: &Path,
        source: DirectoryChangeSource,
    ) -> Result<()> {
        let session = self
            .orchestrator
            .session(session_id)
            .ok_or_else(|| Error::SessionNotFound {
                session_id: session_id.to_string(),
            })?;

        let mut command = format::change_directory_command(session.shell_kind, path);
        command.push_str(format::line_terminator());
        if let Err(e) = self.orchestrator.write_input(session_id, &command).await {
            warn!(session = %session_id, error = %e, "failed to write cd command");
            return Err(e);
        }

        let old_directory = {
            let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
            match sessions.get_mut(session_id) {
                Some(state) => state.current_directory.replace(path.to_path_buf()),
                None => None,
            }
        };

        self.terminal_events.emit(&TerminalDirectoryChanged {
            session_id: session_id.to_string(),
            old_directory,
            new_directory: path.to_path_buf(),
            source,
        });
        Ok(())
    }
}

/// Pull the payload of the last OSC7 sequence out of a raw output chunk
pub fn extract_osc7_uri(text: &str) -> Option<&str> {
    let start = text.rfind("\x1b]7;")? + 4;
    let rest = &text[start..];
    let end = rest.find(['\x07', '\x1b'])?;
    Some(&rest[..end])
}

/// Parse an OSC7 `file://` URI into a host path.
///
/// Handles `file:///path`, `file://hostname/path`, and (with
/// translation enabled) WSL `/mnt/<drive>` paths and `/C:/...`
/// drive-letter forms.
pub fn parse_osc7_uri(uri: &str, translate_windows_paths: bool) -> Option<PathBuf> {
    let remainder = uri.trim().strip_prefix("file://")?;

    let path = match remainder.find('/') {
        // file://hostname/path; the hostname is not needed for sync
        Some(0) => remainder,
        Some(slash) => &remainder[slash..],
        None => return None,
    };

    let decoded = percent_decode(path);
    if decoded.is_empty() {
        return None;
    }

    if translate_windows_paths {
        if let Some(translated) = translate_wsl_path(&decoded) {
            return Some(PathBuf::from(translated));
        }
        if let Some(drive_path) = strip_drive_slash(&decoded) {
            return Some(PathBuf::from(drive_path));
        }
    }

    Some(PathBuf::from(decoded))
}

/// Translate a WSL mount path (`/mnt/c/Users/dev`) to a Windows path
/// (`C:\Users\dev`). Returns `None` for anything else.
pub fn translate_wsl_path(path: &str) -> Option<String> {
    let rest = path.strip_prefix("/mnt/")?;
    let mut chars = rest.chars();
    let drive = chars.next()?;
    if !drive.is_ascii_alphabetic() {
        return None;
    }
    let remainder = chars.as_str();
    if !remainder.is_empty() && !remainder.starts_with('/') {
        return None;
    }

    let mut translated = format!("{}:", drive.to_ascii_uppercase());
    if remainder.is_empty() {
        translated.push('\\');
    } else {
        translated.push_str(&remainder.replace('/', "\\"));
    }
    Some(translated)
}

/// Convert a URI path like `/C:/Users/dev` to `C:\Users\dev`
fn strip_drive_slash(path: &str) -> Option<String> {
    let rest = path.strip_prefix('/')?;
    let bytes = rest.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        Some(rest.replace('/', "\\"))
    } else {
        None
    }
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2]));
            if let (Some(hi), Some(lo)) = hex {
                out.push(hi * 16 + lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
