//! Shell Classification and Discovery Results
//!
//! Canonical definition of the shell kinds the integration layer knows
//! about, plus the immutable `ShellInfo` value produced by shell
//! discovery.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Kind of shell executable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ShellKind {
    /// Bourne Again Shell
    Bash,
    /// Z Shell
    Zsh,
    /// POSIX sh (or dash acting as sh)
    Sh,
    /// Fish Shell
    Fish,
    /// Windows Command Prompt
    Cmd,
    /// Windows PowerShell (5.x)
    PowerShell,
    /// PowerShell Core (7+)
    Pwsh,
    /// Nushell
    Nushell,
    /// Tcsh
    Tcsh,
    /// Korn Shell
    Ksh,
    /// Windows Subsystem for Linux launcher
    Wsl,
    /// Unrecognized shell
    #[default]
    Unknown,
}

impl ShellKind {
    /// Get a string representation of the shell kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ShellKind::Bash => "bash",
            ShellKind::Zsh => "zsh",
            ShellKind::Sh => "sh",
            ShellKind::Fish => "fish",
            ShellKind::Cmd => "cmd",
            ShellKind::PowerShell => "powershell",
            ShellKind::Pwsh => "pwsh",
            ShellKind::Nushell => "nu",
            ShellKind::Tcsh => "tcsh",
            ShellKind::Ksh => "ksh",
            ShellKind::Wsl => "wsl",
            ShellKind::Unknown => "unknown",
        }
    }

    /// Get shell kind from a name (case-insensitive)
    pub fn from_name(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "bash" => ShellKind::Bash,
            "zsh" => ShellKind::Zsh,
            "sh" | "dash" => ShellKind::Sh,
            "fish" => ShellKind::Fish,
            "cmd" => ShellKind::Cmd,
            "powershell" => ShellKind::PowerShell,
            "pwsh" => ShellKind::Pwsh,
            "nu" | "nushell" => ShellKind::Nushell,
            "tcsh" | "csh" => ShellKind::Tcsh,
            "ksh" => ShellKind::Ksh,
            "wsl" => ShellKind::Wsl,
            _ => ShellKind::Unknown,
        }
    }

    /// Classify an executable path by its basename alone.
    ///
    /// The path does not need to exist; classification is a pure lookup.
    pub fn from_executable(path: &Path) -> Self {
        let basename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_lowercase();
        let basename = basename
            .strip_suffix(".exe")
            .unwrap_or(basename.as_str());
        Self::from_name(basename)
    }

    /// Whether this shell follows POSIX cd/quoting conventions
    pub fn is_posix(&self) -> bool {
        matches!(
            self,
            ShellKind::Bash
                | ShellKind::Zsh
                | ShellKind::Sh
                | ShellKind::Fish
                | ShellKind::Tcsh
                | ShellKind::Ksh
        )
    }

    /// Flag used to query the shell's version, if it has one.
    ///
    /// cmd.exe has no version flag and is special-cased as valid by the
    /// catalog without running it.
    pub fn version_flag(&self) -> Option<&'static str> {
        match self {
            ShellKind::Cmd => None,
            ShellKind::PowerShell | ShellKind::Pwsh => Some("-Version"),
            ShellKind::Unknown => Some("--version"),
            _ => Some("--version"),
        }
    }

    /// Default launch arguments for an interactive session of this shell
    pub fn default_args(&self) -> Vec<String> {
        match self {
            ShellKind::Bash | ShellKind::Zsh => vec!["-l".to_string()],
            ShellKind::Fish => vec!["-l".to_string()],
            ShellKind::PowerShell | ShellKind::Pwsh => vec!["-NoLogo".to_string()],
            _ => Vec::new(),
        }
    }
}

/// Immutable description of an installed shell, produced by discovery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellInfo {
    /// Display name (basename of the executable)
    pub name: String,
    /// Absolute path to the executable
    pub path: PathBuf,
    /// Classified shell kind
    pub kind: ShellKind,
    /// Default launch arguments
    pub default_args: Vec<String>,
    /// Whether this is the operating system's default shell
    pub is_system_default: bool,
    /// Version string, when it could be determined
    pub version: Option<String>,
}

impl ShellInfo {
    /// Build a `ShellInfo` for an executable path, classifying it by basename
    pub fn from_path(path: PathBuf) -> Self {
        let kind = ShellKind::from_executable(&path);
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("shell")
            .to_string();
        Self {
            name,
            path,
            kind,
            default_args: kind.default_args(),
            is_system_default: false,
            version: None,
        }
    }
}
