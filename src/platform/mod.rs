//! Platform abstraction layer
//!
//! This module provides a unified interface for platform-specific shell
//! probing, abstracting away differences between Unix-like systems and
//! Windows.

mod traits;
mod unix;
mod windows;

pub use traits::ShellProbe;
pub use unix::UnixShellProbe;
pub use windows::WindowsShellProbe;

/// Platform implementation factory
pub struct Platform;

impl Platform {
    /// Get the shell probe for the host operating system
    pub fn shell_probe() -> Box<dyn ShellProbe> {
        #[cfg(unix)]
        {
            Box::new(unix::UnixShellProbe::new())
        }

        #[cfg(windows)]
        {
            Box::new(windows::WindowsShellProbe::new())
        }

        #[cfg(not(any(unix, windows)))]
        {
            compile_error!("Unsupported platform");
        }
    }
}
