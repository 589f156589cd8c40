//! Command Execution Coordination
//!
//! Drives the per-command status state machine (copy, send, execute,
//! cancel), resolves or creates the target session, and delegates all
//! I/O to the session orchestrator. A command is marked `Executed` as
//! soon as its text is written successfully; there is no
//! shell-integration hook to observe actual completion, which is a
//! known limitation of write-based submission.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::capture::CaptureManager;
use crate::error::{Error, Result};
use crate::events::{CommandStatusChanged, EventEmitter, SubscriptionId};
use crate::models::{CommandBlock, CommandStatus, ExecutionResult, ShellKind};
use crate::profiles::ProfileStore;
use crate::session::{Clipboard, SessionInfo, SessionOptions, SessionOrchestrator, SignalKind};
use crate::shells::format;

/// Pause between commands in a batch, letting the shell consume each
/// line before the next arrives
const INTER_COMMAND_DELAY: Duration = Duration::from_millis(150);

/// Coordinates command submission into terminal sessions
pub struct ExecutionCoordinator {
    orchestrator: Arc<dyn SessionOrchestrator>,
    profiles: Arc<ProfileStore>,
    clipboard: Arc<dyn Clipboard>,
    capture: Option<Arc<CaptureManager>>,
    status: Mutex<HashMap<String, CommandStatus>>,
    events: EventEmitter<CommandStatusChanged>,
    command_delay: Duration,
}

impl ExecutionCoordinator {
    /// Create a coordinator
    pub fn new(
        orchestrator: Arc<dyn SessionOrchestrator>,
        profiles: Arc<ProfileStore>,
        clipboard: Arc<dyn Clipboard>,
    ) -> Self {
        Self {
            orchestrator,
            profiles,
            clipboard,
            capture: None,
            status: Mutex::new(HashMap::new()),
            events: EventEmitter::new(),
            command_delay: INTER_COMMAND_DELAY,
        }
    }

    /// Attach a capture manager so executions can record output
    pub fn with_capture(mut self, capture: Arc<CaptureManager>) -> Self {
        self.capture = Some(capture);
        self
    }

    /// Subscribe to status change notifications
    pub fn on_status_change<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&CommandStatusChanged) + Send + Sync + 'static,
    {
        self.events.subscribe(callback)
    }

    /// Remove a status subscription
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Tracked status for a command; `Pending` when never transitioned
    pub fn status(&self, command_id: &str) -> CommandStatus {
        self.status
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(command_id)
            .copied()
            .unwrap_or_default()
    }

    /// Copy a command's text to the clipboard
    pub fn copy_to_clipboard(&self, block: &CommandBlock) -> Result<()> {
        self.clipboard.set_text(&block.command)?;
        self.transition(&block.id, CommandStatus::Copied, None);
        Ok(())
    }

    /// Write a command into a terminal without the line terminator, so
    /// the user can review and submit it themselves
    pub async fn send_to_terminal(
        &self,
        block: &CommandBlock,
        session_id: Option<&str>,
    ) -> Result<String> {
        let session = self.resolve_session(block, session_id).await?;
        self.orchestrator
            .write_input(&session.id, &block.command)
            .await?;
        self.transition(&block.id, CommandStatus::SentToTerminal, Some(&session.id));
        Ok(session.id)
    }

    /// Submit a command for execution.
    ///
    /// Marks `Executing` before the write and `Executed` immediately
    /// after a successful write. Write and resolution failures become a
    /// `Failed` result with a message; cancellation becomes a
    /// `Cancelled` result. Neither is propagated as an error.
    pub async fn execute(
        &self,
        block: &CommandBlock,
        session_id: Option<&str>,
        capture_output: bool,
        cancel: Option<&CancelToken>,
    ) -> ExecutionResult {
        let started_at = Utc::now();

        if cancel.map(|c| c.is_cancelled()).unwrap_or(false) {
            self.transition(&block.id, CommandStatus::Cancelled, session_id);
            return ExecutionResult::cancelled(&block.id, session_id, started_at);
        }

        let session = match self.resolve_session(block, session_id).await {
            Ok(session) => session,
            Err(e) => {
                warn!(command = %block.id, error = %e, "failed to resolve session");
                self.transition(&block.id, CommandStatus::Failed, session_id);
                return ExecutionResult::failed(&block.id, session_id, e.to_string(), started_at);
            }
        };

        if capture_output {
            if let Some(capture) = &self.capture {
                capture.start_capture(&session.id, Some(block.command.clone()));
            }
        }

        self.transition(&block.id, CommandStatus::Executing, Some(&session.id));

        let mut text = block.command.clone();
        text.push_str(format::line_terminator());
        match self.orchestrator.write_input(&session.id, &text).await {
            Ok(()) => {
                debug!(command = %block.id, session = %session.id, "command submitted");
                self.transition(&block.id, CommandStatus::Executed, Some(&session.id));
                ExecutionResult::executed(&block.id, &session.id, started_at)
            }
            Err(e) => {
                warn!(command = %block.id, session = %session.id, error = %e, "write failed");
                self.transition(&block.id, CommandStatus::Failed, Some(&session.id));
                ExecutionResult::failed(&block.id, Some(&session.id), e.to_string(), started_at)
            }
        }
    }

    /// Run a batch strictly sequentially on one shared session.
    ///
    /// Sequencing preserves environment and working-directory
    /// continuity. A cancellation observed before a command yields a
    /// `Cancelled` entry and ends the batch; with `stop_on_error`, the
    /// first `Failed` entry ends it too. When capturing, each command's
    /// capture is finalized after the inter-command delay and its id
    /// attached to the result.
    pub async fn execute_all(
        &self,
        blocks: &[CommandBlock],
        session_id: Option<&str>,
        stop_on_error: bool,
        capture_output: bool,
        cancel: Option<&CancelToken>,
    ) -> Vec<ExecutionResult> {
        let mut results = Vec::with_capacity(blocks.len());
        let mut shared_session: Option<String> = session_id.map(str::to_string);

        for (index, block) in blocks.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.command_delay).await;
            }

            if cancel.map(|c| c.is_cancelled()).unwrap_or(false) {
                self.transition(&block.id, CommandStatus::Cancelled, shared_session.as_deref());
                results.push(ExecutionResult::cancelled(
                    &block.id,
                    shared_session.as_deref(),
                    Utc::now(),
                ));
                break;
            }

            let mut result = self
                .execute(block, shared_session.as_deref(), capture_output, cancel)
                .await;

            // Later commands reuse whatever session the first one landed in
            if shared_session.is_none() {
                shared_session = result.session_id.clone();
            }

            if capture_output && result.is_success() {
                if let (Some(capture), Some(session)) = (&self.capture, &result.session_id) {
                    tokio::time::sleep(self.command_delay).await;
                    result.capture_id = capture.stop_capture(session).map(|c| c.id);
                }
            }

            let failed = result.status == CommandStatus::Failed;
            let cancelled = result.status == CommandStatus::Cancelled;
            results.push(result);

            if cancelled || (failed && stop_on_error) {
                break;
            }
        }

        results
    }

    /// Interrupt whatever is running in a session (Ctrl+C equivalent).
    ///
    /// Sends an interrupt signal only; the process is never
    /// force-killed.
    pub async fn cancel(&self, session_id: &str) -> Result<()> {
        self.orchestrator
            .send_signal(session_id, SignalKind::Interrupt)
            .await
    }

    /// Resolve the target session for a command, spawning one when
    /// needed.
    ///
    /// The active session is reused only when no specific shell kind is
    /// requested; otherwise a matching profile (falling back to the
    /// default profile) backs a fresh session.
    pub async fn ensure_session(
        &self,
        kind: Option<ShellKind>,
        working_directory: Option<&Path>,
    ) -> Result<SessionInfo> {
        if kind.is_none() {
            if let Some(active) = self.orchestrator.active_session() {
                return Ok(active);
            }
        }

        let profile = match kind {
            Some(kind) => match self.profiles.find_by_kind(kind).await? {
                Some(profile) => profile,
                None => {
                    debug!(kind = kind.as_str(), "no profile for shell kind, using default");
                    self.profiles.get_default().await?
                }
            },
            None => self.profiles.get_default().await?,
        };

        let options = SessionOptions {
            shell_path: Some(profile.shell_path.clone()),
            args: profile.argument_list(),
            working_directory: working_directory
                .map(Path::to_path_buf)
                .or_else(|| profile.starting_directory.clone()),
            environment: profile.environment.clone(),
            name: Some(profile.name.clone()),
            startup_command: profile.startup_command.clone(),
        };

        let session = self.orchestrator.create_session(options).await?;
        info!(session = %session.id, profile = %profile.name, "spawned session for execution");
        Ok(session)
    }

    async fn resolve_session(
        &self,
        block: &CommandBlock,
        session_id: Option<&str>,
    ) -> Result<SessionInfo> {
        if let Some(session_id) = session_id {
            return self
                .orchestrator
                .session(session_id)
                .ok_or_else(|| Error::SessionNotFound {
                    session_id: session_id.to_string(),
                });
        }

        let kind = match block.shell_kind {
            ShellKind::Unknown => None,
            kind => Some(kind),
        };
        self.ensure_session(kind, block.working_directory.as_deref())
            .await
    }

    /// Record a status transition and notify subscribers
    fn transition(&self, command_id: &str, new_status: CommandStatus, session_id: Option<&str>) {
        let old_status = {
            let mut status = self.status.lock().unwrap_or_else(|e| e.into_inner());
            status
                .insert(command_id.to_string(), new_status)
                .unwrap_or_default()
        };

        self.events.emit(&CommandStatusChanged {
            command_id: command_id.to_string(),
            old_status,
            new_status,
            session_id: session_id.map(str::to_string),
        });
    }
}
