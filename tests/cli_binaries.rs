//! End-to-end tests for the `bak` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Session {
    _dir: TempDir,
    root: PathBuf,
    file: PathBuf,
}

impl Session {
    fn new(initial: &[u8]) -> Self {
        let dir = tempfile::tempdir().expect("create tempdir");
        let root = dir.path().join("store");
        let file = dir.path().join("notes.txt");
        fs::write(&file, initial).expect("write tracked file");
        Self {
            _dir: dir,
            root,
            file,
        }
    }

    fn bak(&self) -> Command {
        let mut cmd = Command::cargo_bin("bak").expect("bak binary should be built");
        cmd.arg("--root").arg(&self.root).env_remove("BAK_HOME");
        cmd
    }

    fn stdout_of(&self, args: &[&str]) -> String {
        let output = self.bak().args(args).output().expect("run bak");
        assert!(output.status.success(), "bak {args:?} failed: {output:?}");
        String::from_utf8(output.stdout).expect("stdout is UTF-8")
    }

    fn track(&self) -> String {
        let output = self
            .bak()
            .arg("track")
            .arg(&self.file)
            .output()
            .expect("run bak track");
        assert!(output.status.success());
        String::from_utf8(output.stdout).expect("stdout is UTF-8").trim().to_owned()
    }

    fn write(&self, content: &[u8]) {
        fs::write(&self.file, content).expect("rewrite tracked file");
    }

    fn read(&self) -> Vec<u8> {
        fs::read(&self.file).expect("read tracked file")
    }
}

fn store_files(root: &Path) -> usize {
    fs::read_dir(root.join("0").join("deltas"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

// ============================================================================
// Basic invocation
// ============================================================================

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("bak")
        .expect("bak binary should be built")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("track"))
        .stdout(predicate::str::contains("restore"))
        .stdout(predicate::str::contains("verify"))
        .stderr(predicate::str::is_empty());
}

#[test]
fn version_reports_program_name() {
    Command::cargo_bin("bak")
        .expect("bak binary should be built")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("bak "));
}

#[test]
fn unknown_subcommand_is_usage_error() {
    Command::cargo_bin("bak")
        .expect("bak binary should be built")
        .arg("rewind")
        .assert()
        .code(1);
}

#[test]
fn root_falls_back_to_environment() {
    let dir = tempfile::tempdir().expect("create tempdir");
    let file = dir.path().join("a.txt");
    fs::write(&file, b"x").expect("write file");

    Command::cargo_bin("bak")
        .expect("bak binary should be built")
        .env("BAK_HOME", dir.path().join("env-root"))
        .arg("track")
        .arg(&file)
        .assert()
        .success()
        .stdout("0\n");
    assert!(dir.path().join("env-root").join("tracked.json").is_file());
}

// ============================================================================
// Version lifecycle
// ============================================================================

#[test]
fn create_log_restore_cycle() {
    let session = Session::new(b"first draft\n");
    assert_eq!(session.track(), "0");

    let first = session.stdout_of(&["create", "0", "-m", "draft"]);
    let first = first.trim();
    assert!(first.parse::<u64>().is_ok());

    session.write(b"first draft\nwith a second line\n");
    let second = session.stdout_of(&["create", "0"]);
    assert_ne!(first, second.trim());
    assert_eq!(store_files(&session.root), 2);

    session
        .bak()
        .args(["log", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains(first))
        .stdout(predicate::str::contains("draft"));

    session.bak().args(["restore", "0", first]).assert().success();
    assert_eq!(session.read(), b"first draft\n");

    session.bak().args(["restore", "0", second.trim()]).assert().success();
    assert_eq!(session.read(), b"first draft\nwith a second line\n");
}

#[test]
fn create_without_changes_exits_with_condition() {
    let session = Session::new(b"steady");
    session.track();
    session.bak().args(["create", "0"]).assert().success();

    session
        .bak()
        .args(["create", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no changes"));
}

#[test]
fn restore_refuses_unsaved_changes_without_force() {
    let session = Session::new(b"alpha");
    session.track();
    let first = session.stdout_of(&["create", "0"]);
    session.write(b"alpha beta");
    session.stdout_of(&["create", "0"]);
    session.write(b"alpha beta gamma");

    session
        .bak()
        .args(["restore", "0", first.trim()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not saved"));
    assert_eq!(session.read(), b"alpha beta gamma");

    session
        .bak()
        .args(["restore", "0", first.trim(), "--force"])
        .assert()
        .success();
    assert_eq!(session.read(), b"alpha");
}

#[test]
fn restore_to_unknown_timestamp_exits_with_condition() {
    let session = Session::new(b"content");
    session.track();
    session.stdout_of(&["create", "0"]);

    session
        .bak()
        .args(["restore", "0", "12345"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("12345"));
}

#[test]
fn message_replaces_version_text() {
    let session = Session::new(b"content");
    session.track();
    let ts = session.stdout_of(&["create", "0", "-m", "before"]);

    session
        .bak()
        .args(["message", "0", ts.trim(), "after"])
        .assert()
        .success();
    session
        .bak()
        .args(["log", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("after"))
        .stdout(predicate::str::contains("before").not());
}

// ============================================================================
// Verification
// ============================================================================

#[test]
fn verify_reports_every_version() {
    let session = Session::new(b"one");
    session.track();
    session.stdout_of(&["create", "0"]);
    session.write(b"one two");
    session
        .bak()
        .args(["--compression", "gzip", "create", "0"])
        .assert()
        .success();

    let verdicts = session.stdout_of(&["verify", "0"]);
    assert_eq!(verdicts.lines().count(), 2);
    assert!(verdicts.lines().all(|line| line.ends_with(" ok")));
}

#[test]
fn verify_flags_tampered_checksum() {
    let session = Session::new(b"one");
    session.track();
    let ts = session.stdout_of(&["create", "0"]);
    let ts = ts.trim();

    let checksums = session.root.join("0").join("checksums.json");
    let tampered = format!("{{\n  \"{ts}\": \"{}\"\n}}\n", "0".repeat(64));
    fs::write(&checksums, tampered).expect("tamper checksums");

    session
        .bak()
        .args(["verify", "0", ts])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("MISMATCH"));
}
