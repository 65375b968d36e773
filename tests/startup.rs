//! Startup contract tests for the lbwatch binary.

use assert_cmd::Command;
use predicates::prelude::*;

const ENV_VARS: [&str; 6] = [
    "GITHUB_TOKEN",
    "GITHUB_REPO",
    "WORKFLOW_FILE",
    "TENANT",
    "PROJECT",
    "GITHUB_API_URL",
];

fn lbwatch() -> (Command, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("lbwatch").unwrap();
    // Run from an empty directory so no config file is picked up.
    cmd.current_dir(dir.path());
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    (cmd, dir)
}

#[test]
fn missing_token_exits_with_code_1() {
    let (mut cmd, _dir) = lbwatch();

    cmd.assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("GITHUB_TOKEN"));
}

#[test]
fn missing_token_with_json_logs_still_exits_with_code_1() {
    let (mut cmd, _dir) = lbwatch();

    cmd.arg("--json-logs")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("GITHUB_TOKEN"));
}

#[test]
fn malformed_config_file_is_a_startup_error() {
    let (mut cmd, dir) = lbwatch();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "cooldown: [not, a, map]\n").unwrap();

    cmd.arg("--config")
        .arg(path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn help_describes_the_daemon() {
    let (mut cmd, _dir) = lbwatch();

    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("LoadBalancer"));
}
