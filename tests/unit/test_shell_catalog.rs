//! Unit tests for shell discovery and classification

use std::path::Path;

use termbridge::models::ShellKind;
use termbridge::shells::ShellCatalog;

#[path = "../test_utils/mock_session.rs"]
mod test_utils;
use test_utils::FixedProbe;

#[test]
fn test_classification_by_basename() {
    assert_eq!(
        ShellCatalog::classify_shell(Path::new("/bin/bash")),
        ShellKind::Bash
    );
    assert_eq!(
        ShellCatalog::classify_shell(Path::new("/usr/bin/zsh")),
        ShellKind::Zsh
    );
    assert_eq!(
        ShellCatalog::classify_shell(Path::new(r"C:\Windows\System32\cmd.exe")),
        ShellKind::Cmd
    );
    assert_eq!(
        ShellCatalog::classify_shell(Path::new("powershell.exe")),
        ShellKind::PowerShell
    );
}

#[test]
fn test_classification_does_not_require_existence() {
    // Nonexistent paths still classify by basename alone
    assert_eq!(
        ShellCatalog::classify_shell(Path::new("/definitely/not/here/fish")),
        ShellKind::Fish
    );
    assert_eq!(
        ShellCatalog::classify_shell(Path::new("/definitely/not/here/whatever")),
        ShellKind::Unknown
    );
}

#[tokio::test]
async fn test_validate_nonexistent_paths() {
    let catalog = ShellCatalog::new();
    assert!(!catalog.validate_path(Path::new("/definitely/not/here/bash")).await);
    assert!(!catalog.validate_path(Path::new("")).await);
}

#[cfg(unix)]
#[tokio::test]
async fn test_validate_existing_shell() {
    let catalog = ShellCatalog::new();
    assert!(catalog.validate_path(Path::new("/bin/sh")).await);
}

#[cfg(unix)]
#[tokio::test]
async fn test_default_detection_with_fixed_probe() {
    let catalog = ShellCatalog::with_probe(Box::new(FixedProbe::new(
        "/bin/sh",
        &[("sh", "/bin/sh")],
    )));

    let default = catalog.detect_default_shell().await;
    assert_eq!(default.path, Path::new("/bin/sh"));
    assert!(default.is_system_default);
    assert_eq!(default.kind, ShellKind::Sh);
}

#[cfg(unix)]
#[tokio::test]
async fn test_enumeration_marks_system_default() {
    let catalog = ShellCatalog::with_probe(Box::new(FixedProbe::new(
        "/bin/sh",
        &[("bash", "/bin/bash"), ("sh", "/bin/sh")],
    )));

    let shells = catalog.list_available_shells().await;
    assert_eq!(shells.len(), 2);
    let default: Vec<_> = shells.iter().filter(|s| s.is_system_default).collect();
    assert_eq!(default.len(), 1);
    assert_eq!(default[0].path, Path::new("/bin/sh"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_repeated_enumeration_is_stable() {
    let catalog = ShellCatalog::with_probe(Box::new(FixedProbe::new(
        "/bin/sh",
        &[("sh", "/bin/sh")],
    )));

    let first = catalog.list_available_shells().await;
    let second = catalog.list_available_shells().await;
    assert_eq!(first, second);
}

#[cfg(unix)]
#[tokio::test]
async fn test_version_extraction_for_missing_binary() {
    let catalog = ShellCatalog::new();
    assert_eq!(
        catalog.get_version(Path::new("/definitely/not/here/zsh")).await,
        None
    );
}

#[tokio::test]
async fn test_resolve_in_path() {
    let catalog = ShellCatalog::new();
    assert!(catalog
        .resolve_in_path("no-such-binary-termbridge-test")
        .is_none());

    #[cfg(unix)]
    {
        // `sh` is on PATH in any sane environment
        let resolved = catalog.resolve_in_path("sh");
        assert!(resolved.is_some());
        assert!(resolved.unwrap().is_file());
    }
}
