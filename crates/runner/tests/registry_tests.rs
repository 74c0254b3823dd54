//! Process registry lifecycle tests.
//!
//! Spawn real `sh`/`sleep` children and verify the SIGTERM-then-SIGKILL
//! escalation and the idempotence of cleanup.

use std::process::Stdio;
use std::time::{Duration, Instant};

use assert_matches::assert_matches;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};

use launchpad_runner::{ProcessRegistry, StopOutcome};

fn spawn_sh(script: &str) -> Child {
    Command::new("sh")
        .args(["-c", script])
        .stdout(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .expect("sh should be available")
}

/// Spawn a process that ignores SIGTERM and wait until the trap is in place.
async fn spawn_term_ignoring() -> Child {
    let mut child = spawn_sh("trap '' TERM; echo ready; exec sleep 30");
    let stdout = child.stdout.take().expect("stdout is piped");
    let mut line = String::new();
    BufReader::new(stdout)
        .read_line(&mut line)
        .await
        .expect("read readiness line");
    assert_eq!(line.trim(), "ready");
    child
}

#[tokio::test]
async fn cooperative_process_is_terminated_within_grace() {
    let mut registry = ProcessRegistry::new(Duration::from_secs(5));
    registry.track("sleeper", spawn_sh("exec sleep 30"));

    let started = Instant::now();
    let outcomes = registry.shutdown().await;

    assert_eq!(outcomes, vec![("sleeper".to_string(), StopOutcome::Terminated)]);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn stubborn_process_is_killed_after_grace() {
    let grace = Duration::from_millis(300);
    let mut registry = ProcessRegistry::new(grace);
    registry.track("stubborn", spawn_term_ignoring().await);

    let started = Instant::now();
    let outcomes = registry.shutdown().await;

    assert_eq!(outcomes, vec![("stubborn".to_string(), StopOutcome::Killed)]);
    assert!(started.elapsed() >= grace);
    assert_matches!(
        registry.poll_exited(),
        Some((label, status)) if label == "stubborn" && !status.success()
    );
}

#[tokio::test]
async fn shutdown_twice_is_a_no_op() {
    let mut registry = ProcessRegistry::new(Duration::from_millis(300));
    registry.track("sleeper", spawn_sh("exec sleep 30"));
    registry.track("stubborn", spawn_term_ignoring().await);

    let first = registry.shutdown().await;
    assert_eq!(first.len(), 2);

    let second = registry.shutdown().await;
    assert_eq!(
        second,
        vec![
            ("sleeper".to_string(), StopOutcome::AlreadyExited),
            ("stubborn".to_string(), StopOutcome::AlreadyExited),
        ]
    );
    assert!(registry.pids().is_empty());
}

#[tokio::test]
async fn poll_exited_reports_finished_process() {
    let mut registry = ProcessRegistry::default();
    registry.track("long", spawn_sh("exec sleep 30"));
    registry.track("short", spawn_sh("exit 3"));
    assert_eq!(registry.len(), 2);

    let deadline = Instant::now() + Duration::from_secs(5);
    let exited = loop {
        if let Some(exited) = registry.poll_exited() {
            break exited;
        }
        assert!(Instant::now() < deadline, "short process never exited");
        tokio::time::sleep(Duration::from_millis(20)).await;
    };

    assert_eq!(exited.0, "short");
    assert_eq!(exited.1.code(), Some(3));

    registry.shutdown().await;
}

#[tokio::test]
async fn empty_registry_shutdown_is_harmless() {
    let mut registry = ProcessRegistry::default();
    assert!(registry.is_empty());
    assert!(registry.shutdown().await.is_empty());
    assert!(registry.poll_exited().is_none());
}
