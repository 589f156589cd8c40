//! Event Handling and Subscriptions
//!
//! Change notifications for the terminal integration layer, enabling
//! loose coupling between components and their UI subscribers. Events
//! are delivered synchronously on the thread that triggered the change;
//! subscribers must not block and must not assume delivery on any
//! specific thread.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::models::{CommandStatus, ShellProfile};

/// Handle returned by [`EventEmitter::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<T> = Box<dyn Fn(&T) + Send + Sync>;

/// Subscription registry for one event type.
///
/// `emit` invokes every registered callback in subscription order on the
/// calling thread. Emitting component holds no other lock while
/// dispatching.
pub struct EventEmitter<T> {
    subscribers: Mutex<Vec<(SubscriptionId, Callback<T>)>>,
    next_id: AtomicU64,
}

impl<T> EventEmitter<T> {
    /// Create an emitter with no subscribers
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a callback; returns a handle for unsubscribing
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a previously registered callback
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        subscribers.len() != before
    }

    /// Deliver an event to all subscribers on the current thread
    pub fn emit(&self, event: &T) {
        let subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        for (_, callback) in subscribers.iter() {
            callback(event);
        }
    }

    /// Number of active subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

impl<T> Default for EventEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A command block's tracked status changed
#[derive(Debug, Clone)]
pub struct CommandStatusChanged {
    /// Id of the command block
    pub command_id: String,
    /// Status before the transition
    pub old_status: CommandStatus,
    /// Status after the transition
    pub new_status: CommandStatus,
    /// Session the command is associated with, when resolved
    pub session_id: Option<String>,
}

/// What kind of change a profile notification describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileChangeKind {
    /// A profile was created
    Added,
    /// A profile was modified
    Updated,
    /// A profile was removed
    Deleted,
    /// The default profile selection moved
    DefaultChanged,
    /// The store was reset to detected defaults
    Reset,
}

/// The profile store changed
#[derive(Debug, Clone)]
pub struct ProfilesChanged {
    /// Kind of change
    pub kind: ProfileChangeKind,
    /// Id of the affected profile, when the change targets one
    pub profile_id: Option<String>,
    /// Snapshot of the affected profile after the change
    pub profile: Option<ShellProfile>,
}

/// Where a directory change originated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryChangeSource {
    /// Explicit API call
    Api,
    /// Explorer-to-terminal synchronization
    ExplorerSync,
    /// The shell itself (cd typed by the user)
    Shell,
    /// OSC7 working-directory report
    Osc7,
    /// Workspace-link synchronization
    WorkspaceSync,
}

/// A session's tracked working directory changed
#[derive(Debug, Clone)]
pub struct TerminalDirectoryChanged {
    /// Session whose directory changed
    pub session_id: String,
    /// Previously tracked directory, if any
    pub old_directory: Option<PathBuf>,
    /// Newly tracked directory
    pub new_directory: PathBuf,
    /// What triggered the change
    pub source: DirectoryChangeSource,
}

/// Scope of an explorer synchronization request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplorerSyncScope {
    /// Propagate for the active terminal; the subscriber decides relevance
    ActiveTerminal,
    /// Propagate to the linked workspace
    LinkedWorkspace {
        /// Workspace the session is linked to
        workspace_id: String,
    },
}

/// Request to move the file-explorer view to a terminal's directory
#[derive(Debug, Clone)]
pub struct ExplorerSyncRequested {
    /// Session whose directory should be shown
    pub session_id: String,
    /// Directory to show
    pub directory: PathBuf,
    /// Propagation scope derived from the auto-sync policy
    pub scope: ExplorerSyncScope,
}
