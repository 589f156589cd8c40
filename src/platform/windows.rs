//! Windows shell probing

use crate::platform::traits::ShellProbe;
use std::env;
use std::path::PathBuf;

pub struct WindowsShellProbe;

impl WindowsShellProbe {
    pub fn new() -> Self {
        Self
    }

    fn system_root() -> PathBuf {
        env::var("SystemRoot")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(r"C:\Windows"))
    }

    fn well_known() -> Vec<(String, PathBuf)> {
        let system32 = Self::system_root().join("System32");
        let mut candidates = vec![
            (
                "pwsh".to_string(),
                PathBuf::from(r"C:\Program Files\PowerShell\7\pwsh.exe"),
            ),
            (
                "powershell".to_string(),
                system32.join(r"WindowsPowerShell\v1.0\powershell.exe"),
            ),
            ("cmd".to_string(), system32.join("cmd.exe")),
            ("wsl".to_string(), system32.join("wsl.exe")),
        ];

        if let Ok(profile) = env::var("USERPROFILE") {
            candidates.push((
                "nu".to_string(),
                PathBuf::from(profile).join(r"AppData\Local\Programs\nu\bin\nu.exe"),
            ));
        }

        candidates
    }
}

impl Default for WindowsShellProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellProbe for WindowsShellProbe {
    fn default_shell_path(&self) -> PathBuf {
        // PowerShell 7 first, then Windows PowerShell, then cmd.exe
        for (_, path) in Self::well_known() {
            if path.exists() {
                return path;
            }
        }

        Self::system_root().join(r"System32\cmd.exe")
    }

    fn installed_shells(&self) -> Vec<(String, PathBuf)> {
        Self::well_known()
            .into_iter()
            .filter(|(_, path)| path.exists())
            .collect()
    }

    fn path_candidates(&self) -> &'static [&'static str] {
        &["pwsh", "powershell", "cmd", "nu", "wsl", "bash"]
    }
}
