//! Unix shell probing

use crate::platform::traits::ShellProbe;
use std::env;
use std::path::PathBuf;

pub struct UnixShellProbe;

impl UnixShellProbe {
    pub fn new() -> Self {
        Self
    }

    /// Look up the login shell for the current user in /etc/passwd
    fn passwd_shell() -> Option<PathBuf> {
        let user = env::var("USER").or_else(|_| env::var("LOGNAME")).ok()?;
        let passwd = std::fs::read_to_string("/etc/passwd").ok()?;
        for line in passwd.lines() {
            let mut fields = line.split(':');
            if fields.next() == Some(user.as_str()) {
                let shell = fields.nth(5)?;
                if !shell.is_empty() {
                    return Some(PathBuf::from(shell));
                }
            }
        }
        None
    }
}

impl Default for UnixShellProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellProbe for UnixShellProbe {
    fn default_shell_path(&self) -> PathBuf {
        // $SHELL first, then the login shell from /etc/passwd
        if let Ok(shell) = env::var("SHELL") {
            if !shell.is_empty() {
                return PathBuf::from(shell);
            }
        }

        Self::passwd_shell().unwrap_or_else(|| PathBuf::from("/bin/bash"))
    }

    fn installed_shells(&self) -> Vec<(String, PathBuf)> {
        let mut shells = Vec::new();

        let shell_paths = vec![
            ("bash", "/bin/bash"),
            ("bash", "/usr/bin/bash"),
            ("bash", "/opt/homebrew/bin/bash"),
            ("zsh", "/bin/zsh"),
            ("zsh", "/usr/bin/zsh"),
            ("zsh", "/opt/homebrew/bin/zsh"),
            ("fish", "/usr/bin/fish"),
            ("fish", "/usr/local/bin/fish"),
            ("fish", "/opt/homebrew/bin/fish"),
            ("nu", "/usr/bin/nu"),
            ("nu", "/usr/local/bin/nu"),
            ("nu", "/opt/homebrew/bin/nu"),
            ("pwsh", "/usr/bin/pwsh"),
            ("pwsh", "/usr/local/bin/pwsh"),
            ("tcsh", "/bin/tcsh"),
            ("tcsh", "/usr/bin/tcsh"),
            ("ksh", "/bin/ksh"),
            ("ksh", "/usr/bin/ksh"),
            ("sh", "/bin/sh"),
        ];

        for (name, path) in shell_paths {
            let path_buf = PathBuf::from(path);
            if path_buf.exists() && !shells.iter().any(|(_, p)| p == &path_buf) {
                shells.push((name.to_string(), path_buf));
            }
        }

        // $SHELL may point at something not in the well-known list
        if let Ok(shell_env) = env::var("SHELL") {
            let shell_path = PathBuf::from(&shell_env);
            if shell_path.exists() && !shells.iter().any(|(_, p)| p == &shell_path) {
                let shell_name = shell_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("shell")
                    .to_string();
                shells.push((shell_name, shell_path));
            }
        }

        shells
    }

    fn path_candidates(&self) -> &'static [&'static str] {
        &["bash", "zsh", "fish", "nu", "pwsh", "tcsh", "ksh", "sh"]
    }
}
