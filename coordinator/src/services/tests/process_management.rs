//! Tests for RealProcessManager
//!
//! These spawn real short-lived processes (`sh`, `sleep`) and exercise the
//! readiness poll and the SIGTERM → SIGKILL escalation end to end.

use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;

use super::common::{temp_manager, ABSENT_PID, TEST_GRACE};
use crate::core::lifecycle::SessionState;
use crate::error::CoordinatorError;
use crate::traits::{ProcessLifecycle, SessionRegistry, StopOutcome};

/// Worker stand-in that records its own pid like the real worker does
const PID_WRITING_WORKER: &str =
    r#"echo $$ > "$MODEL_ROUTER_HOME/sessions/$MODEL_ROUTER_SESSION_ID/worker.pid"; exec sleep 30"#;

/// Spawn `sh -c script` and reap it in the background so exit is observable
async fn spawn_reaped(script: &str) -> u32 {
    let mut child = Command::new("sh").arg("-c").arg(script).spawn().expect("spawn sh");
    let pid = child.id().expect("child pid");
    tokio::spawn(async move {
        let _ = child.wait().await;
    });
    pid
}

#[tokio::test]
async fn test_wait_until_ready_times_out_without_pid_file() {
    let home = TempDir::new().unwrap();
    let (registry, manager) = temp_manager(&home);
    let descriptor = registry.get_or_create("never-ready").await.unwrap();

    let started = tokio::time::Instant::now();
    let ready = manager
        .wait_until_ready(&descriptor, Duration::from_millis(300), Duration::ZERO)
        .await;

    assert!(!ready);
    assert!(started.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_wait_until_ready_sees_recorded_pid() {
    let home = TempDir::new().unwrap();
    let (registry, manager) = temp_manager(&home);
    let descriptor = registry.get_or_create("ready").await.unwrap();

    let recorder = {
        let registry = registry.clone();
        let descriptor = descriptor.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            registry.record_pid(&descriptor, std::process::id()).await.unwrap();
        })
    };

    let ready = manager
        .wait_until_ready(&descriptor, Duration::from_secs(2), Duration::ZERO)
        .await;
    recorder.await.unwrap();

    assert!(ready);
}

#[tokio::test]
async fn test_stop_without_pid_file_is_already_stopped() {
    let home = TempDir::new().unwrap();
    let (registry, manager) = temp_manager(&home);
    let descriptor = registry.get_or_create("idle").await.unwrap();
    registry.increment_reference_count(&descriptor).await.unwrap();

    let outcome = manager.stop(&descriptor).await.unwrap();

    assert_eq!(outcome, StopOutcome::AlreadyStopped);
    assert!(!descriptor.paths.reference_count_file.exists());
}

#[tokio::test]
async fn test_stop_with_absent_process_cleans_up() {
    let home = TempDir::new().unwrap();
    let (registry, manager) = temp_manager(&home);
    let descriptor = registry.get_or_create("gone").await.unwrap();
    registry.record_pid(&descriptor, ABSENT_PID).await.unwrap();
    registry.increment_reference_count(&descriptor).await.unwrap();
    registry.increment_reference_count(&descriptor).await.unwrap();

    let outcome = manager.stop(&descriptor).await.unwrap();

    assert_eq!(outcome, StopOutcome::AlreadyStopped);
    assert!(!descriptor.paths.pid_file.exists());
    assert!(!descriptor.paths.reference_count_file.exists());
}

#[tokio::test]
async fn test_stop_terminates_cooperative_process() {
    let home = TempDir::new().unwrap();
    let (registry, manager) = temp_manager(&home);
    let descriptor = registry.get_or_create("cooperative").await.unwrap();

    let pid = spawn_reaped("exec sleep 30").await;
    registry.record_pid(&descriptor, pid).await.unwrap();

    let outcome = manager.stop(&descriptor).await.unwrap();

    assert_eq!(outcome, StopOutcome::Terminated);
    assert!(!descriptor.paths.pid_file.exists());
    assert!(!registry.is_alive(&descriptor).await);
}

#[tokio::test]
async fn test_stop_escalates_to_sigkill() {
    let home = TempDir::new().unwrap();
    let (registry, manager) = temp_manager(&home);
    let descriptor = registry.get_or_create("stubborn").await.unwrap();

    let pid = spawn_reaped(r#"trap "" TERM; exec sleep 30"#).await;
    // Let the shell install its trap before signalling
    tokio::time::sleep(Duration::from_millis(200)).await;
    registry.record_pid(&descriptor, pid).await.unwrap();

    let started = tokio::time::Instant::now();
    let outcome = manager.stop(&descriptor).await.unwrap();

    assert_eq!(outcome, StopOutcome::Killed);
    assert!(started.elapsed() >= TEST_GRACE);
    assert!(!descriptor.paths.pid_file.exists());
}

#[tokio::test]
async fn test_start_spawns_worker_and_assigns_port() {
    let home = TempDir::new().unwrap();
    let (registry, manager) = temp_manager(&home);
    let manager = manager.with_worker_command("sh", vec!["-c".to_string(), PID_WRITING_WORKER.to_string()]);
    let mut descriptor = registry.get_or_create("openai,gpt-4o").await.unwrap();

    let pid = manager.start(&mut descriptor).await.unwrap();
    assert_eq!(manager.state(&descriptor.session_id).await, SessionState::Starting);

    // Port is allocated and persisted before the spawn
    let port = descriptor.port.expect("port assigned");
    let persisted = registry.find(&descriptor.session_id).await.unwrap();
    assert_eq!(persisted.port, Some(port));

    let ready = manager
        .wait_until_ready(&descriptor, Duration::from_secs(5), Duration::ZERO)
        .await;
    assert!(ready);
    assert_eq!(manager.state(&descriptor.session_id).await, SessionState::Running);
    assert_eq!(registry.read_pid(&descriptor).await, Some(pid as i32));

    // The spawned worker is reaped on exit, so SIGTERM alone is enough
    let outcome = manager.stop(&descriptor).await.unwrap();
    assert_eq!(outcome, StopOutcome::Terminated);
    assert_eq!(manager.state(&descriptor.session_id).await, SessionState::NotRunning);
    assert!(!descriptor.paths.pid_file.exists());
}

#[tokio::test]
async fn test_start_keeps_existing_port() {
    let home = TempDir::new().unwrap();
    let (registry, manager) = temp_manager(&home);
    let manager = manager.with_worker_command("sh", vec!["-c".to_string(), "exit 0".to_string()]);
    let mut descriptor = registry.get_or_create("pinned").await.unwrap();
    descriptor.port = Some(3777);

    manager.start(&mut descriptor).await.unwrap();

    assert_eq!(descriptor.port, Some(3777));
    assert_eq!(registry.find(&descriptor.session_id).await.unwrap().port, Some(3777));
}

#[tokio::test]
async fn test_start_with_missing_binary_fails() {
    let home = TempDir::new().unwrap();
    let (registry, manager) = temp_manager(&home);
    let manager = manager.with_worker_command(home.path().join("no-such-worker"), Vec::new());
    let mut descriptor = registry.get_or_create("missing").await.unwrap();

    let result = manager.start(&mut descriptor).await;

    assert!(matches!(result, Err(CoordinatorError::SpawnFailed { .. })));
    assert_eq!(manager.state(&descriptor.session_id).await, SessionState::NotRunning);
}

#[tokio::test]
async fn test_restart_after_crash_starts_fresh() {
    let home = TempDir::new().unwrap();
    let (registry, manager) = temp_manager(&home);
    let manager = manager.with_worker_command("sh", vec!["-c".to_string(), PID_WRITING_WORKER.to_string()]);
    let mut descriptor = registry.get_or_create("crashed").await.unwrap();
    descriptor.port = Some(3801);
    // Left behind by a worker that died without cleaning up
    registry.record_pid(&descriptor, ABSENT_PID).await.unwrap();

    let pid = manager.restart(&mut descriptor).await.unwrap();
    assert!(
        manager
            .wait_until_ready(&descriptor, Duration::from_secs(5), Duration::ZERO)
            .await
    );
    assert_eq!(registry.read_pid(&descriptor).await, Some(pid as i32));
    assert_eq!(descriptor.port, Some(3801));

    manager.stop(&descriptor).await.unwrap();
}
