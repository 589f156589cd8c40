//! Shell command formatting
//!
//! Builds the cd-equivalent command for each shell family, with quoting
//! appropriate to that family. Used by working-directory sync when it
//! drives a terminal to a new directory.

use std::path::Path;

use crate::models::ShellKind;

/// Line terminator appended when writing a command into a session
pub fn line_terminator() -> &'static str {
    if cfg!(windows) {
        "\r\n"
    } else {
        "\n"
    }
}

/// Command that changes the working directory in the given shell
pub fn change_directory_command(kind: ShellKind, path: &Path) -> String {
    let raw = path.to_string_lossy();
    match kind {
        ShellKind::Cmd => format!("cd /d \"{}\"", raw),
        ShellKind::PowerShell | ShellKind::Pwsh => {
            format!("Set-Location -Path {}", quote_powershell(&raw))
        }
        ShellKind::Nushell => format!("cd {}", quote_double(&raw)),
        _ => format!("cd {}", quote_posix(&raw)),
    }
}

/// Single-quote for POSIX shells; embedded quotes become '\''
fn quote_posix(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Single-quote for PowerShell; embedded quotes are doubled
fn quote_powershell(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Double-quote with escaped embedded double quotes
fn quote_double(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\\\""))
}
