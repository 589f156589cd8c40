//! Command Block Model
//!
//! A command block is the unit of work handed to the execution
//! coordinator: a piece of command text detected in a conversation,
//! together with the shell kind it was written for. The coordinator
//! never mutates a block's content, only the status tracked for its id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::models::ShellKind;

/// Execution status of a command block
///
/// Absence of a status entry means `Pending`. Each of the non-pending
/// states is a sink for one invocation; re-running a command starts a
/// fresh status entry under the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CommandStatus {
    /// No action has been taken yet
    #[default]
    Pending,
    /// Command text was copied to the clipboard
    Copied,
    /// Command text was written to a terminal without executing
    SentToTerminal,
    /// Command has been written and submitted for execution
    Executing,
    /// Command was submitted successfully
    Executed,
    /// Command was cancelled before or during submission
    Cancelled,
    /// Command submission failed
    Failed,
}

impl CommandStatus {
    /// Whether this status is a sink for the current invocation
    pub fn is_terminal(&self) -> bool {
        !matches!(self, CommandStatus::Pending | CommandStatus::Executing)
    }
}

/// A command proposed for execution in a terminal session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandBlock {
    /// Unique identifier for the block
    pub id: String,

    /// The command text to run
    pub command: String,

    /// Shell kind the command was detected/written for
    pub shell_kind: ShellKind,

    /// Directory the command expects to run in
    pub working_directory: Option<PathBuf>,
}

impl CommandBlock {
    /// Create a new command block with a generated id
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            command: command.into(),
            shell_kind: ShellKind::Unknown,
            working_directory: None,
        }
    }

    /// Set the detected shell kind
    pub fn with_shell_kind(mut self, kind: ShellKind) -> Self {
        self.shell_kind = kind;
        self
    }

    /// Set the working directory
    pub fn with_working_directory(mut self, dir: PathBuf) -> Self {
        self.working_directory = Some(dir);
        self
    }
}

/// Outcome of a single `execute` invocation
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Id of the command block this result belongs to
    pub command_id: String,
    /// Final status for this invocation
    pub status: CommandStatus,
    /// Session the command was routed to, when one was resolved
    pub session_id: Option<String>,
    /// Error message accompanying a `Failed` status
    pub error_message: Option<String>,
    /// Id of the output capture recorded for this command, if any
    pub capture_id: Option<String>,
    /// When the invocation started
    pub started_at: DateTime<Utc>,
    /// When the invocation finished
    pub finished_at: DateTime<Utc>,
}

impl ExecutionResult {
    /// Successful submission to the given session
    pub fn executed(command_id: &str, session_id: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            command_id: command_id.to_string(),
            status: CommandStatus::Executed,
            session_id: Some(session_id.to_string()),
            error_message: None,
            capture_id: None,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Failed submission with a user-facing message
    pub fn failed(
        command_id: &str,
        session_id: Option<&str>,
        message: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            command_id: command_id.to_string(),
            status: CommandStatus::Failed,
            session_id: session_id.map(str::to_string),
            error_message: Some(message.into()),
            capture_id: None,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Cancelled before or during submission
    pub fn cancelled(command_id: &str, session_id: Option<&str>, started_at: DateTime<Utc>) -> Self {
        Self {
            command_id: command_id.to_string(),
            status: CommandStatus::Cancelled,
            session_id: session_id.map(str::to_string),
            error_message: None,
            capture_id: None,
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// Whether the command was submitted successfully
    pub fn is_success(&self) -> bool {
        self.status == CommandStatus::Executed
    }
}
