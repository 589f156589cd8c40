//! Shell Catalog
//!
//! Discovers installed shells, validates candidate executables, and
//! extracts version strings. Detection and enumeration results are
//! cached for the process lifetime; repeated calls are O(1) after the
//! first probe. The catalog never errors for an absent shell; absence
//! degrades to "not available".

pub mod format;

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::models::{ShellInfo, ShellKind};
use crate::platform::{Platform, ShellProbe};

/// How long a validation probe may run before the child is killed
const VALIDATION_TIMEOUT: Duration = Duration::from_secs(3);

/// How long a version query may run; shorter than validation because a
/// missing version string is not an error
const VERSION_TIMEOUT: Duration = Duration::from_millis(1500);

#[derive(Default)]
struct CatalogCache {
    default_shell: Option<ShellInfo>,
    available: Option<Vec<ShellInfo>>,
    versions: HashMap<PathBuf, Option<String>>,
}

/// Process-lifetime registry of installed shells
pub struct ShellCatalog {
    probe: Box<dyn ShellProbe>,
    cache: Mutex<CatalogCache>,
    validation_timeout: Duration,
    version_timeout: Duration,
}

impl ShellCatalog {
    /// Create a catalog probing the host operating system
    pub fn new() -> Self {
        Self::with_probe(Platform::shell_probe())
    }

    /// Create a catalog with a custom probe (used by tests)
    pub fn with_probe(probe: Box<dyn ShellProbe>) -> Self {
        Self {
            probe,
            cache: Mutex::new(CatalogCache::default()),
            validation_timeout: VALIDATION_TIMEOUT,
            version_timeout: VERSION_TIMEOUT,
        }
    }

    /// Classify an executable path by basename alone.
    ///
    /// Pure lookup; the path does not need to exist.
    pub fn classify_shell(path: &Path) -> ShellKind {
        ShellKind::from_executable(path)
    }

    /// Detect the operating system's default shell.
    ///
    /// Consults the platform hint ($SHELL / passwd on Unix, well-known
    /// system paths on Windows) and falls back to the first available
    /// shell when the hint does not validate. Cached after first call.
    pub async fn detect_default_shell(&self) -> ShellInfo {
        {
            let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(info) = &cache.default_shell {
                return info.clone();
            }
        }

        let hint = self.probe.default_shell_path();
        let mut info = if self.validate_path(&hint).await {
            ShellInfo::from_path(hint)
        } else {
            debug!(path = %hint.display(), "default shell hint failed validation");
            match self.list_available_shells().await.into_iter().next() {
                Some(first) => first,
                None => ShellInfo::from_path(hint),
            }
        };
        info.is_system_default = true;
        info.version = self.get_version(&info.path).await;

        info!(shell = %info.path.display(), kind = info.kind.as_str(), "detected default shell");

        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.default_shell = Some(info.clone());
        info
    }

    /// Enumerate installed shells.
    ///
    /// Scans well-known install locations plus `PATH`, deduplicated by
    /// executable path. Cached after first call.
    pub async fn list_available_shells(&self) -> Vec<ShellInfo> {
        {
            let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(shells) = &cache.available {
                return shells.clone();
            }
        }

        let default_path = self.probe.default_shell_path();
        let mut seen: Vec<PathBuf> = Vec::new();
        let mut shells: Vec<ShellInfo> = Vec::new();

        for (_, path) in self.probe.installed_shells() {
            if seen.contains(&path) {
                continue;
            }
            seen.push(path.clone());
            let mut info = ShellInfo::from_path(path);
            info.is_system_default = info.path == default_path;
            shells.push(info);
        }

        for name in self.probe.path_candidates() {
            if let Some(path) = self.resolve_in_path(name) {
                if seen.contains(&path) {
                    continue;
                }
                seen.push(path.clone());
                let mut info = ShellInfo::from_path(path);
                info.is_system_default = info.path == default_path;
                shells.push(info);
            }
        }

        let versions =
            futures::future::join_all(shells.iter().map(|info| self.get_version(&info.path)))
                .await;
        for (info, version) in shells.iter_mut().zip(versions) {
            info.version = version;
        }

        debug!(count = shells.len(), "enumerated installed shells");

        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.available = Some(shells.clone());
        shells
    }

    /// Check that a path points at a runnable shell.
    ///
    /// Executes the candidate with its version flag under a bounded
    /// timeout; any exit that is not a crash counts as valid. Shells
    /// with no version flag are valid if the executable exists.
    /// Missing binaries, spawn failures, and timeouts all yield `false`.
    pub async fn validate_path(&self, path: &Path) -> bool {
        if path.as_os_str().is_empty() || !path.exists() {
            return false;
        }

        let kind = Self::classify_shell(path);
        let flag = match kind.version_flag() {
            Some(flag) => flag,
            // No version flag to probe with; existence is the best we can do
            None => return true,
        };

        match run_with_timeout(path, flag, self.validation_timeout).await {
            Some(output) => output.status.code().is_some(),
            None => false,
        }
    }

    /// Best-effort version string for a shell executable.
    ///
    /// Returns the first line of version output, cached per path.
    pub async fn get_version(&self, path: &Path) -> Option<String> {
        {
            let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(version) = cache.versions.get(path) {
                return version.clone();
            }
        }

        let flag = Self::classify_shell(path).version_flag();
        let version = match flag {
            Some(flag) => run_with_timeout(path, flag, self.version_timeout)
                .await
                .and_then(|output| first_line(&output.stdout).or_else(|| first_line(&output.stderr))),
            None => None,
        };

        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache
            .versions
            .insert(path.to_path_buf(), version.clone());
        version
    }

    /// Resolve an executable name through `PATH`
    pub fn resolve_in_path(&self, name: &str) -> Option<PathBuf> {
        let path_var = env::var_os("PATH")?;
        for dir in env::split_paths(&path_var) {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
            if cfg!(windows) {
                let candidate = dir.join(format!("{}.exe", name));
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
        None
    }
}

impl Default for ShellCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Run `path flag` and collect its output, killing the child on timeout
async fn run_with_timeout(path: &Path, flag: &str, duration: Duration) -> Option<std::process::Output> {
    let child = Command::new(path)
        .arg(flag)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let child = match child {
        Ok(child) => child,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "failed to spawn shell probe");
            return None;
        }
    };

    match timeout(duration, child.wait_with_output()).await {
        Ok(Ok(output)) => Some(output),
        Ok(Err(e)) => {
            debug!(path = %path.display(), error = %e, "shell probe I/O failed");
            None
        }
        Err(_) => {
            // Dropping the wait future kills the child via kill_on_drop
            debug!(path = %path.display(), ?duration, "shell probe timed out");
            None
        }
    }
}

fn first_line(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let line = text.lines().find(|l| !l.trim().is_empty())?;
    Some(line.trim().to_string())
}
