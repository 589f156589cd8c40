//! Integration tests for command execution coordination

#![cfg(unix)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use termbridge::cancel::CancelToken;
use termbridge::execution::ExecutionCoordinator;
use termbridge::models::{CommandBlock, CommandStatus, ShellKind};
use termbridge::profiles::ProfileStore;
use termbridge::session::{Clipboard, SessionOrchestrator, SignalKind};
use termbridge::shells::ShellCatalog;

#[path = "../test_utils/mock_session.rs"]
mod test_utils;
use test_utils::{FixedProbe, MockClipboard, MockOrchestrator};

struct Fixture {
    orchestrator: Arc<MockOrchestrator>,
    clipboard: Arc<MockClipboard>,
    coordinator: ExecutionCoordinator,
    _dir: tempfile::TempDir,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = Arc::new(MockOrchestrator::new());
    let clipboard = Arc::new(MockClipboard::new());
    let catalog = Arc::new(ShellCatalog::with_probe(Box::new(FixedProbe::new(
        "/bin/sh",
        &[("sh", "/bin/sh"), ("bash", "/bin/bash")],
    ))));
    let profiles = Arc::new(ProfileStore::with_path(
        catalog,
        dir.path().join("profiles.json"),
    ));
    let orchestrator_dyn: Arc<dyn SessionOrchestrator> = orchestrator.clone();
    let clipboard_dyn: Arc<dyn Clipboard> = clipboard.clone();
    let coordinator = ExecutionCoordinator::new(orchestrator_dyn, profiles, clipboard_dyn);
    Fixture {
        orchestrator,
        clipboard,
        coordinator,
        _dir: dir,
    }
}

#[tokio::test]
async fn test_copy_to_clipboard_transitions_status() {
    let f = fixture();
    let block = CommandBlock::new("echo hi");

    assert_eq!(f.coordinator.status(&block.id), CommandStatus::Pending);
    f.coordinator.copy_to_clipboard(&block).unwrap();

    assert_eq!(f.clipboard.last().as_deref(), Some("echo hi"));
    assert_eq!(f.coordinator.status(&block.id), CommandStatus::Copied);
}

#[tokio::test]
async fn test_execute_on_existing_session() {
    let f = fixture();
    f.orchestrator.add_session("sess-1", ShellKind::Bash);

    let block = CommandBlock::new("cargo build");
    let result = f.coordinator.execute(&block, Some("sess-1"), false, None).await;

    assert_eq!(result.status, CommandStatus::Executed);
    assert_eq!(result.session_id.as_deref(), Some("sess-1"));
    assert_eq!(f.coordinator.status(&block.id), CommandStatus::Executed);

    let writes = f.orchestrator.writes();
    assert_eq!(writes.len(), 1);
    assert!(writes[0].1.starts_with("cargo build"));
    assert!(writes[0].1.ends_with('\n'));
}

#[tokio::test]
async fn test_execute_reuses_active_session_without_kind() {
    let f = fixture();
    f.orchestrator.add_session("sess-active", ShellKind::Zsh);
    f.orchestrator.set_active("sess-active");

    let block = CommandBlock::new("ls");
    let result = f.coordinator.execute(&block, None, false, None).await;
    assert_eq!(result.session_id.as_deref(), Some("sess-active"));
}

#[tokio::test]
async fn test_execute_spawns_for_specific_shell_kind() {
    let f = fixture();
    f.orchestrator.add_session("sess-active", ShellKind::Zsh);
    f.orchestrator.set_active("sess-active");

    // A bash-specific command must not reuse the zsh session
    let block = CommandBlock::new("ls").with_shell_kind(ShellKind::Bash);
    let result = f.coordinator.execute(&block, None, false, None).await;

    assert_eq!(result.status, CommandStatus::Executed);
    let session_id = result.session_id.unwrap();
    assert_ne!(session_id, "sess-active");
    let spawned = f.orchestrator.session(&session_id).unwrap();
    assert_eq!(spawned.shell_kind, ShellKind::Bash);
}

#[tokio::test]
async fn test_write_failure_becomes_failed_result() {
    let f = fixture();
    f.orchestrator.add_session("sess-1", ShellKind::Bash);
    f.orchestrator.fail_writes("sess-1");

    let block = CommandBlock::new("echo doomed");
    let result = f.coordinator.execute(&block, Some("sess-1"), false, None).await;

    assert_eq!(result.status, CommandStatus::Failed);
    assert!(result.error_message.as_deref().unwrap_or("").len() > 0);
    assert_eq!(f.coordinator.status(&block.id), CommandStatus::Failed);
}

#[tokio::test]
async fn test_unknown_session_becomes_failed_result() {
    let f = fixture();
    let block = CommandBlock::new("echo hi");
    let result = f.coordinator.execute(&block, Some("ghost"), false, None).await;

    assert_eq!(result.status, CommandStatus::Failed);
    assert!(result.error_message.unwrap().contains("ghost"));
}

#[tokio::test]
async fn test_execute_all_stops_on_error() {
    let f = fixture();
    f.orchestrator.add_session("flaky", ShellKind::Bash);
    // First command lands, the second write fails
    f.orchestrator.fail_writes_after("flaky", 1);

    let blocks = vec![
        CommandBlock::new("first"),
        CommandBlock::new("second"),
        CommandBlock::new("third"),
    ];
    let results = f
        .coordinator
        .execute_all(&blocks, Some("flaky"), true, false, None)
        .await;

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].status, CommandStatus::Executed);
    assert_eq!(results[1].status, CommandStatus::Failed);
    // The third command was never sent
    assert_eq!(f.orchestrator.writes().len(), 1);
    assert_eq!(f.coordinator.status(&blocks[2].id), CommandStatus::Pending);
}

#[tokio::test]
async fn test_execute_all_continues_without_stop_on_error() {
    let f = fixture();
    f.orchestrator.add_session("flaky", ShellKind::Bash);
    f.orchestrator.fail_writes_after("flaky", 1);

    let blocks = vec![
        CommandBlock::new("first"),
        CommandBlock::new("second"),
        CommandBlock::new("third"),
    ];
    let results = f
        .coordinator
        .execute_all(&blocks, Some("flaky"), false, false, None)
        .await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].status, CommandStatus::Executed);
    assert_eq!(results[1].status, CommandStatus::Failed);
    assert_eq!(results[2].status, CommandStatus::Failed);
}

#[tokio::test]
async fn test_execute_all_sequential_on_one_session() {
    let f = fixture();
    f.orchestrator.add_session("shared", ShellKind::Bash);

    let blocks = vec![
        CommandBlock::new("cd /tmp"),
        CommandBlock::new("ls"),
        CommandBlock::new("pwd"),
    ];
    let results = f
        .coordinator
        .execute_all(&blocks, Some("shared"), false, false, None)
        .await;

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.status == CommandStatus::Executed));

    let writes = f.orchestrator.writes();
    assert_eq!(writes.len(), 3);
    assert!(writes.iter().all(|(session, _)| session == "shared"));
    // Submission order is preserved
    assert!(writes[0].1.starts_with("cd /tmp"));
    assert!(writes[1].1.starts_with("ls"));
    assert!(writes[2].1.starts_with("pwd"));
}

#[tokio::test]
async fn test_execute_all_cancellation_mid_batch() {
    let f = fixture();
    f.orchestrator.add_session("shared", ShellKind::Bash);

    let cancel = CancelToken::new();
    let blocks = vec![CommandBlock::new("one"), CommandBlock::new("two")];

    // Cancel before the batch starts its second command
    cancel.cancel();
    let results = f
        .coordinator
        .execute_all(&blocks, Some("shared"), false, false, Some(&cancel))
        .await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, CommandStatus::Cancelled);
    assert!(results[0].error_message.is_none());
}

#[tokio::test]
async fn test_cancel_sends_interrupt_only() {
    let f = fixture();
    f.orchestrator.add_session("sess-1", ShellKind::Bash);

    f.coordinator.cancel("sess-1").await.unwrap();
    assert_eq!(
        f.orchestrator.signals(),
        vec![("sess-1".to_string(), SignalKind::Interrupt)]
    );
}

#[tokio::test]
async fn test_status_events_carry_old_and_new() {
    let f = fixture();
    f.orchestrator.add_session("sess-1", ShellKind::Bash);

    let transitions: Arc<Mutex<Vec<(CommandStatus, CommandStatus)>>> =
        Arc::new(Mutex::new(Vec::new()));
    {
        let transitions = Arc::clone(&transitions);
        f.coordinator.on_status_change(move |event| {
            transitions
                .lock()
                .unwrap()
                .push((event.old_status, event.new_status));
        });
    }

    let block = CommandBlock::new("echo events");
    f.coordinator.execute(&block, Some("sess-1"), false, None).await;

    let transitions = transitions.lock().unwrap();
    assert_eq!(
        *transitions,
        vec![
            (CommandStatus::Pending, CommandStatus::Executing),
            (CommandStatus::Executing, CommandStatus::Executed),
        ]
    );
}

#[tokio::test]
async fn test_send_to_terminal_does_not_submit() {
    let f = fixture();
    f.orchestrator.add_session("sess-1", ShellKind::Bash);

    let block = CommandBlock::new("rm -rf build");
    f.coordinator
        .send_to_terminal(&block, Some("sess-1"))
        .await
        .unwrap();

    assert_eq!(
        f.coordinator.status(&block.id),
        CommandStatus::SentToTerminal
    );
    let writes = f.orchestrator.writes();
    // No line terminator: the user submits it themselves
    assert_eq!(writes[0].1, "rm -rf build");
}

#[tokio::test]
async fn test_concurrent_status_reads() {
    let f = Arc::new(fixture());
    f.orchestrator.add_session("sess-1", ShellKind::Bash);

    let block = CommandBlock::new("echo racing");
    f.coordinator.execute(&block, Some("sess-1"), false, None).await;

    let hits = Arc::new(AtomicUsize::new(0));
    let mut handles = Vec::new();
    for _ in 0..8 {
        let f = Arc::clone(&f);
        let hits = Arc::clone(&hits);
        let id = block.id.clone();
        handles.push(tokio::spawn(async move {
            if f.coordinator.status(&id) == CommandStatus::Executed {
                hits.fetch_add(1, Ordering::SeqCst);
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(hits.load(Ordering::SeqCst), 8);
}
