use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use tempfile::TempDir;
use tokio::time::timeout;
use watchrun::config::{ConfigFile, GroupConfig, ProcessConfig};
use watchrun::supervisor::Supervisor;

fn spec(dir: &Path, command: &str, args: &[&str]) -> ProcessConfig {
    ProcessConfig {
        command: command.to_string(),
        args: args.iter().map(|s| s.to_string()).collect(),
        dir: dir.display().to_string(),
        env: BTreeMap::new(),
    }
}

fn group(dir: &Path, build: ProcessConfig, run: ProcessConfig) -> GroupConfig {
    GroupConfig {
        description: String::new(),
        watch: vec![format!("{}/*.txt", dir.display())],
        heartbeat: "100ms".to_string(),
        build,
        run,
    }
}

fn config_with(groups: Vec<(&str, GroupConfig)>) -> ConfigFile {
    ConfigFile {
        name: String::new(),
        description: String::new(),
        tls_cert_file: None,
        tls_key_file: None,
        group: groups
            .into_iter()
            .map(|(name, group)| (name.to_string(), group))
            .collect(),
        proxy: None,
        static_server: None,
    }
}

#[tokio::test]
async fn groups_are_independent_and_unwind_on_root_cancel() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("watched.txt"), "x").unwrap();

    let marker_a = dir.path().join("a-ran");
    let marker_b = dir.path().join("b-ran");

    // Group A's build always fails; group B builds and runs normally.
    let a = group(
        dir.path(),
        spec(dir.path(), "false", &[]),
        spec(dir.path(), "touch", &[&marker_a.display().to_string()]),
    );
    let b = group(
        dir.path(),
        spec(dir.path(), "true", &[]),
        spec(dir.path(), "touch", &[&marker_b.display().to_string()]),
    );

    let cfg = config_with(vec![("a", a), ("b", b)]);
    let supervisor = Supervisor::from_config(&cfg, &[]).unwrap();
    let root = supervisor.root_token();
    let handle = tokio::spawn(supervisor.run());

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(marker_b.exists(), "healthy group runs despite the broken one");
    assert!(!marker_a.exists(), "failed build gates the broken group's run");

    root.cancel();
    timeout(Duration::from_secs(3), handle)
        .await
        .expect("all groups unwind on root cancellation")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn group_filter_selects_a_subset() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("watched.txt"), "x").unwrap();

    let marker_a = dir.path().join("a-ran");
    let marker_b = dir.path().join("b-ran");

    let a = group(
        dir.path(),
        spec(dir.path(), "true", &[]),
        spec(dir.path(), "touch", &[&marker_a.display().to_string()]),
    );
    let b = group(
        dir.path(),
        spec(dir.path(), "true", &[]),
        spec(dir.path(), "touch", &[&marker_b.display().to_string()]),
    );

    let cfg = config_with(vec![("a", a), ("b", b)]);
    let supervisor = Supervisor::from_config(&cfg, &["b".to_string()]).unwrap();
    let root = supervisor.root_token();
    let handle = tokio::spawn(supervisor.run());

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(marker_b.exists(), "selected group runs");
    assert!(!marker_a.exists(), "unselected group never starts");

    root.cancel();
    timeout(Duration::from_secs(3), handle)
        .await
        .expect("shutdown")
        .unwrap()
        .unwrap();
}

#[test]
fn unknown_group_filter_is_an_error() {
    let dir = TempDir::new().unwrap();
    let g = group(
        dir.path(),
        spec(dir.path(), "true", &[]),
        spec(dir.path(), "true", &[]),
    );
    let cfg = config_with(vec![("a", g)]);

    let err = Supervisor::from_config(&cfg, &["nope".to_string()]).unwrap_err();
    assert!(err.to_string().contains("unknown build group"));
}

#[test]
fn zero_selected_groups_is_an_error() {
    let cfg = config_with(vec![]);
    let err = Supervisor::from_config(&cfg, &[]).unwrap_err();
    assert!(err.to_string().contains("no build groups selected"));
}
