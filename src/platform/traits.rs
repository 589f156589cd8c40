//! Platform-specific operation traits
//!
//! These traits define the interface for platform-specific shell
//! probing, allowing for clean abstraction and easier testing.

use std::path::PathBuf;

/// Platform-specific shell discovery
pub trait ShellProbe: Send + Sync {
    /// Best guess at the operating system's default shell.
    ///
    /// The result is a hint; the catalog validates it before use and
    /// falls back to platform defaults when validation fails.
    fn default_shell_path(&self) -> PathBuf;

    /// Well-known install locations that exist on this machine,
    /// as (name, path) pairs
    fn installed_shells(&self) -> Vec<(String, PathBuf)>;

    /// Shell executable names worth resolving through `PATH`
    fn path_candidates(&self) -> &'static [&'static str];
}
