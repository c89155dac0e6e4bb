use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// The binary with every backend and gateway setting cleared, so tests never
/// touch the network.
#[allow(deprecated)]
fn devinsight() -> Command {
    let mut cmd = Command::cargo_bin("devinsight").unwrap();
    for var in [
        "UPSTASH_REDIS_REST_URL",
        "UPSTASH_REDIS_REST_TOKEN",
        "REDIS_URL",
        "REDIS_HOST",
        "GOOGLE_API_KEY",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.ts"), "const x=1;").unwrap();
    dir
}

#[test]
fn help_lists_subcommands() {
    devinsight()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("upload").and(predicate::str::contains("quick")));
}

#[test]
fn upload_without_readable_files_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("logo.png"), [0x89, b'P', b'N', b'G']).unwrap();

    devinsight()
        .arg("upload")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("readable"));
}

#[test]
fn upload_without_store_is_a_storage_failure() {
    let dir = project();
    devinsight()
        .arg("upload")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("storage failure"));
}

#[test]
fn info_for_malformed_id_reports_missing() {
    devinsight()
        .args(["info", "not-a-session", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"exists\": false"));
}

#[test]
fn review_requires_api_key() {
    let dir = project();
    let patch = dir.path().join("bump.diff");
    fs::write(&patch, "+++ b/a.ts\n+const x=2;\n").unwrap();

    devinsight()
        .args(["review", "0123456789abcdef0123456789abcdef", "--changes"])
        .arg(&patch)
        .args(["--description", "bump x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GOOGLE_API_KEY"));
}

#[test]
fn quick_with_missing_changes_fails() {
    let dir = project();
    devinsight()
        .arg("quick")
        .arg(dir.path())
        .arg("--changes")
        .arg(dir.path().join("nope.diff"))
        .args(["--description", "bump x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.diff"));
}
