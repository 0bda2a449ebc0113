//! Command-line tests.
//!
//! Every remote URL points at a closed local port, so these only exercise
//! cache hits, fallbacks and argument handling.

use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Nothing listens on the discard port, so connections are refused quickly
const UNREACHABLE: &str = "http://127.0.0.1:9";

const CACHED_ROW: &str = r#"{"name":"repo1","default_branch":"main","description":"","archived":false,"is_fork":false,"issues":0,"stars":5,"forks":1,"size":100}"#;

fn reswirl(cache_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("reswirl").expect("binary builds");
    cmd.env_remove("GITHUB_TOKEN")
        .env_remove("RUST_LOG")
        .env("RESWIRL_CACHE_DIR", cache_dir)
        .env("RESWIRL_GITHUB_API_URL", UNREACHABLE)
        .env("RESWIRL_PYPI_URL", UNREACHABLE)
        .args(["--timeout", "2"]);
    cmd
}

fn seed_cache(cache_dir: &Path, user: &str) {
    let dir = cache_dir.join("github");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{user}.jsonl")), format!("{CACHED_ROW}\n")).unwrap();
}

fn stdout_of(cmd: &mut Command) -> String {
    let out = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(out).unwrap()
}

#[test]
fn repos_are_served_from_cache() {
    let tmp = TempDir::new().unwrap();
    seed_cache(tmp.path(), "alice");

    let out = stdout_of(reswirl(tmp.path()).args(["repos", "alice", "--format", "json"]));

    let rows: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["name"], "repo1");
    assert_eq!(rows[0]["stars"], 5);
}

#[test]
fn refresh_falls_back_to_cache_when_remote_is_down() {
    let tmp = TempDir::new().unwrap();
    seed_cache(tmp.path(), "alice");

    let assert = reswirl(tmp.path())
        .args(["repos", "alice", "--refresh", "-f", "csv"])
        .assert()
        .success();
    let output = assert.get_output();

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stdout.contains("repo1,main,,false,false,0,5,1,100"));
    assert!(stderr.contains("Warning: remote fetch failed"));
}

#[test]
fn remote_failure_without_cache_exits_non_zero() {
    let tmp = TempDir::new().unwrap();

    let assert = reswirl(tmp.path()).args(["repos", "alice"]).assert().failure().code(1);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();

    assert!(stderr.starts_with("Error: Failed to fetch repositories for alice"));
    assert!(!tmp.path().join("github").join("alice.jsonl").exists());
}

#[test]
fn no_cache_ignores_existing_snapshot() {
    let tmp = TempDir::new().unwrap();
    seed_cache(tmp.path(), "alice");

    reswirl(tmp.path())
        .args(["repos", "alice", "--no-cache"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn docs_discovery_failure_is_reported() {
    let tmp = TempDir::new().unwrap();

    let assert = reswirl(tmp.path()).args(["docs", "polars"]).assert().failure().code(1);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();

    assert!(stderr.starts_with("Error: Could not fetch PyPI metadata for polars"));
}

#[test]
fn path_like_subjects_are_rejected() {
    let tmp = TempDir::new().unwrap();

    let assert = reswirl(tmp.path()).args(["repos", "../etc"]).assert().failure().code(1);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();

    assert!(stderr.starts_with("Error: invalid subject '../etc'"));
}

#[test]
fn unknown_format_is_a_usage_error() {
    let tmp = TempDir::new().unwrap();
    reswirl(tmp.path())
        .args(["repos", "alice", "--format", "xml"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn cache_commands() {
    let tmp = TempDir::new().unwrap();
    seed_cache(tmp.path(), "alice");
    seed_cache(tmp.path(), "bob");

    let path = stdout_of(reswirl(tmp.path()).args(["cache", "path"]));
    assert_eq!(path.trim(), tmp.path().display().to_string());

    let listed = stdout_of(reswirl(tmp.path()).args(["cache", "list", "-f", "csv"]));
    let lines: Vec<_> = listed.lines().collect();
    assert_eq!(lines[0], "namespace,subject,records,size_bytes,cached_at");
    assert!(lines[1].starts_with("github,alice,1,"));
    assert!(lines[2].starts_with("github,bob,1,"));

    let cleared = stdout_of(reswirl(tmp.path()).args(["cache", "clear", "bob"]));
    assert_eq!(cleared.trim(), "Removed cached listing for bob");
    assert!(!tmp.path().join("github").join("bob.jsonl").exists());

    let cleared = stdout_of(reswirl(tmp.path()).args(["cache", "clear", "bob"]));
    assert_eq!(cleared.trim(), "No cached listing for bob");
}

#[test]
fn table_output_is_default() {
    let tmp = TempDir::new().unwrap();
    seed_cache(tmp.path(), "alice");

    let out = stdout_of(reswirl(tmp.path()).args(["repos", "alice"]));

    assert!(out.trim_end().ends_with("shape: (1, 9)"));
    assert!(out.contains("repo1"));
}

#[test]
fn rust_log_sets_the_level_without_verbose_flags() {
    let tmp = TempDir::new().unwrap();
    seed_cache(tmp.path(), "alice");

    let assert = reswirl(tmp.path())
        .env("RUST_LOG", "debug")
        .args(["repos", "alice", "-f", "json"])
        .assert()
        .success();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(stderr.contains("DEBUG"));
    assert!(stderr.contains("configured"));
    assert!(stderr.contains("serving cached snapshot"));

    let assert = reswirl(tmp.path())
        .args(["repos", "alice", "-f", "json"])
        .assert()
        .success();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(!stderr.contains("DEBUG"));
}
