use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use watchrun::config::ProcessConfig;
use watchrun::exec::Runner;

fn spec(dir: &Path, command: &str, args: &[&str]) -> ProcessConfig {
    ProcessConfig {
        command: command.to_string(),
        args: args.iter().map(|s| s.to_string()).collect(),
        dir: dir.display().to_string(),
        env: BTreeMap::new(),
    }
}

fn sh(dir: &Path, script: String) -> ProcessConfig {
    ProcessConfig {
        command: "sh".to_string(),
        args: vec!["-c".to_string(), script],
        dir: dir.display().to_string(),
        env: BTreeMap::new(),
    }
}

fn line_count(path: &Path) -> usize {
    fs::read_to_string(path)
        .map(|s| s.lines().count())
        .unwrap_or(0)
}

#[tokio::test]
async fn failed_build_gates_the_run_step() {
    let dir = TempDir::new().unwrap();
    let marker = dir.path().join("ran");

    let build = spec(dir.path(), "false", &[]);
    let run = spec(dir.path(), "touch", &[&marker.display().to_string()]);

    let (_tx, rx) = mpsc::channel(1);
    let token = CancellationToken::new();
    let runner = Runner::new("test", build, run, rx, token.clone());
    let handle = tokio::spawn(runner.run());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(!marker.exists(), "run must never start after a failed build");

    token.cancel();
    timeout(Duration::from_secs(3), handle)
        .await
        .expect("runner exits on cancellation")
        .unwrap();
    assert!(!marker.exists());
}

#[tokio::test]
async fn restart_signal_retries_a_failed_build() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("build.log");
    let marker = dir.path().join("ran");

    let build = sh(dir.path(), format!("echo b >> {}; exit 1", log.display()));
    let run = spec(dir.path(), "touch", &[&marker.display().to_string()]);

    let (tx, rx) = mpsc::channel(1);
    let token = CancellationToken::new();
    let runner = Runner::new("test", build, run, rx, token.clone());
    let handle = tokio::spawn(runner.run());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(line_count(&log), 1, "exactly one build before any signal");

    tx.send(()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(line_count(&log), 2, "signal retries the build once");
    assert!(!marker.exists(), "still-failing build keeps the run gated");

    token.cancel();
    timeout(Duration::from_secs(3), handle)
        .await
        .expect("runner exits on cancellation")
        .unwrap();
}

#[tokio::test]
async fn cancellation_terminates_active_run_without_rebuilding() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("build.log");

    let build = sh(dir.path(), format!("echo b >> {}", log.display()));
    let run = spec(dir.path(), "sleep", &["30"]);

    let (_tx, rx) = mpsc::channel(1);
    let token = CancellationToken::new();
    let runner = Runner::new("test", build, run, rx, token.clone());
    let handle = tokio::spawn(runner.run());

    tokio::time::sleep(Duration::from_millis(400)).await;
    token.cancel();

    // The 30s sleep must be killed, not waited out.
    timeout(Duration::from_secs(3), handle)
        .await
        .expect("runner exits promptly on cancellation")
        .unwrap();
    assert_eq!(line_count(&log), 1, "no rebuild after cancellation");
}

#[tokio::test]
async fn restart_signal_restarts_the_run_process() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("run.log");

    let build = spec(dir.path(), "true", &[]);
    let run = sh(dir.path(), format!("echo r >> {}; sleep 30", log.display()));

    let (tx, rx) = mpsc::channel(1);
    let token = CancellationToken::new();
    let runner = Runner::new("test", build, run, rx, token.clone());
    let handle = tokio::spawn(runner.run());

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(line_count(&log), 1, "first run attempt started");

    tx.send(()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(line_count(&log), 2, "restart kills and relaunches the run");

    token.cancel();
    timeout(Duration::from_secs(3), handle)
        .await
        .expect("runner exits on cancellation")
        .unwrap();
}

#[tokio::test]
async fn restart_channel_holds_at_most_one_signal() {
    let dir = TempDir::new().unwrap();
    let log = dir.path().join("build.log");

    // A slow build keeps the runner away from its wait state while signals
    // pile up.
    let build = sh(dir.path(), format!("echo b >> {}; sleep 0.5", log.display()));
    let run = spec(dir.path(), "sleep", &["30"]);

    let (tx, rx) = mpsc::channel(1);
    let token = CancellationToken::new();
    let runner = Runner::new("test", build, run, rx, token.clone());
    let handle = tokio::spawn(runner.run());

    tokio::time::sleep(Duration::from_millis(150)).await;
    tx.try_send(()).expect("first signal fills the slot");
    assert!(
        tx.try_send(()).is_err(),
        "a second signal must block/fail, never queue"
    );

    // The one buffered signal coalesces into a single rebuild.
    tokio::time::sleep(Duration::from_millis(900)).await;
    assert_eq!(line_count(&log), 2, "exactly one rebuild for the coalesced signals");

    token.cancel();
    timeout(Duration::from_secs(3), handle)
        .await
        .expect("runner exits on cancellation")
        .unwrap();
}
