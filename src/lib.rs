//! termbridge - Terminal integration for AI-assisted development
//!
//! This library is the layer between an AI conversation surface and a
//! live terminal: it discovers installed shells, manages shell launch
//! profiles, brokers proposed commands into PTY sessions, captures and
//! normalizes terminal output for model context, searches rendered
//! buffers, and keeps a shell's working directory synchronized with a
//! file-explorer view.
//!
//! ## Module Organization
//!
//! ### Core Functionality
//!
//! - [`shells`] - Shell discovery, validation, and version probing
//! - [`profiles`] - JSON-persisted shell launch profiles
//! - [`execution`] - Command status state machine and session routing
//! - [`capture`] - Output capture and the processing pipeline
//! - [`search`] - Background buffer search with cancellation
//! - [`cwd`] - OSC7-driven working-directory synchronization
//!
//! ### Supporting Modules
//!
//! - [`models`] - Domain value types
//! - [`session`] - Interfaces to the external session orchestrator
//! - [`events`] - Synchronous change-notification registry
//! - [`config`] - TOML-backed subsystem settings
//! - [`mod@error`] - Error types and Result alias
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use termbridge::{TerminalIntegration, TermbridgeConfig};
//! # use termbridge::session::{Clipboard, SessionOrchestrator};
//!
//! # fn demo(orchestrator: Arc<dyn SessionOrchestrator>, clipboard: Arc<dyn Clipboard>) -> termbridge::Result<()> {
//! let config = TermbridgeConfig::load()?;
//! let bridge = TerminalIntegration::new(orchestrator, clipboard, config)?;
//!
//! // Feed orchestrator events into the bridge:
//! // bridge.handle_session_event(&event);
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod capture;
pub mod config;
pub mod cwd;
pub mod error;
pub mod events;
pub mod execution;
pub mod models;
pub mod platform;
pub mod profiles;
pub mod search;
pub mod session;
pub mod shells;

use std::sync::Arc;

pub use cancel::CancelToken;
pub use capture::CaptureManager;
pub use config::TermbridgeConfig;
pub use cwd::DirectorySync;
pub use error::{Error, Result};
pub use execution::ExecutionCoordinator;
pub use models::{
    CaptureMode, CommandBlock, CommandStatus, ExecutionResult, SearchOptions, ShellInfo,
    ShellKind, ShellProfile, TerminalOutputCapture, TerminalSearchResult, TerminalSearchState,
};
pub use profiles::ProfileStore;
pub use search::BufferSearch;
pub use shells::ShellCatalog;

use session::{Clipboard, SessionEvent, SessionOrchestrator};

/// The fully wired terminal integration layer.
///
/// Owns one instance of every component, sharing the shell catalog and
/// profile store across them. Host code feeds orchestrator events in
/// through [`handle_session_event`](Self::handle_session_event).
pub struct TerminalIntegration {
    /// Shell discovery and validation
    pub catalog: Arc<ShellCatalog>,
    /// Shell launch profiles
    pub profiles: Arc<ProfileStore>,
    /// Command submission
    pub executor: Arc<ExecutionCoordinator>,
    /// Output capture
    pub capture: Arc<CaptureManager>,
    /// Buffer search
    pub search: Arc<BufferSearch>,
    /// Working-directory sync
    pub cwd: Arc<DirectorySync>,
}

impl TerminalIntegration {
    /// Wire up the integration layer against an orchestrator and clipboard
    pub fn new(
        orchestrator: Arc<dyn SessionOrchestrator>,
        clipboard: Arc<dyn Clipboard>,
        config: TermbridgeConfig,
    ) -> Result<Self> {
        let catalog = Arc::new(ShellCatalog::new());
        let profiles = Arc::new(ProfileStore::new(Arc::clone(&catalog))?);
        let capture = Arc::new(CaptureManager::with_settings(
            Arc::clone(&orchestrator),
            config.capture,
        ));
        let executor = Arc::new(
            ExecutionCoordinator::new(
                Arc::clone(&orchestrator),
                Arc::clone(&profiles),
                clipboard,
            )
            .with_capture(Arc::clone(&capture)),
        );
        let search = Arc::new(BufferSearch::new(config.search));
        let cwd = Arc::new(DirectorySync::with_settings(orchestrator, config.sync));

        Ok(Self {
            catalog,
            profiles,
            executor,
            capture,
            search,
            cwd,
        })
    }

    /// Fan an orchestrator event out to every interested component
    pub fn handle_session_event(&self, event: &SessionEvent) {
        self.capture.handle_session_event(event);
        self.cwd.handle_session_event(event);
    }
}

/// Install a `tracing` subscriber honoring `RUST_LOG`.
///
/// Intended for binaries and examples embedding the library; returns an
/// error when a global subscriber is already set.
pub fn init_logging() -> Result<()> {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .map_err(|e| Error::Other(format!("failed to install tracing subscriber: {}", e)))
}
