//! Integration tests for top-level CLI behavior.

use std::path::Path;
use std::process::{Command, Output};

fn run_retrofs(data_dir: &Path, args: &[&str]) -> Output {
    let bin = env!("CARGO_BIN_EXE_retrofs");
    Command::new(bin)
        .current_dir(data_dir)
        .env("RETROFS_DATA_DIR", data_dir)
        .env("RETROFS_USER", "neo")
        .env_remove("RETROFS_REMOTE_URL")
        .env_remove("RETROFS_TOKEN")
        .args(args)
        .output()
        .expect("failed to run retrofs binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_retrofs(dir.path(), &["--help"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("mkdir") && text.contains("recycle"), "{text}");
}

#[test]
fn fresh_data_dir_shows_bootstrap_tree() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_retrofs(dir.path(), &["ls", "/home/neo"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "readme.txt\ndocuments/\n");
    assert!(!dir.path().join("fs.json").exists(), "read-only commands must not save");
}

#[test]
fn edits_persist_between_invocations() {
    let dir = tempfile::tempdir().unwrap();
    assert!(run_retrofs(dir.path(), &["write", "/home/neo/documents/plan.txt", "exfiltrate", "--create"])
        .status
        .success());
    assert!(dir.path().join("fs.json").exists());

    let output = run_retrofs(dir.path(), &["cat", "/home/neo/documents/plan.txt"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "exfiltrate\n");
}

#[test]
fn failed_command_exits_nonzero_with_message() {
    let dir = tempfile::tempdir().unwrap();
    run_retrofs(dir.path(), &["mkdir", "/home/neo/level1"]);
    let output = run_retrofs(dir.path(), &["mkdir", "/home/neo/level1/level2"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nesting limit"));
}

#[test]
fn recycle_round_trip_across_processes() {
    let dir = tempfile::tempdir().unwrap();
    let deleted = run_retrofs(dir.path(), &["recycle", "delete", "/home/neo/readme.txt"]);
    assert!(deleted.status.success());
    let recycle_path = stdout(&deleted).trim().rsplit(' ').next().unwrap().to_string();

    let listing = stdout(&run_retrofs(dir.path(), &["recycle", "list"]));
    assert!(listing.contains(&recycle_path), "{listing}");

    assert!(run_retrofs(dir.path(), &["recycle", "restore", &recycle_path]).status.success());
    let output = run_retrofs(dir.path(), &["cat", "/home/neo/readme.txt"]);
    assert!(stdout(&output).starts_with("Welcome, operator."));
}

#[test]
fn ephemeral_mode_never_writes() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_retrofs(dir.path(), &["--ephemeral", "touch", "/tmp/ghost"]);
    assert!(output.status.success());
    assert!(!dir.path().join("fs.json").exists());
}
