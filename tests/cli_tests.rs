//! Binary smoke tests for the respaldo CLI.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn respaldo() -> Command {
    Command::cargo_bin("respaldo").expect("binary built")
}

#[test]
fn test_list_prints_entries_and_totals() {
    let src = TempDir::new().expect("create src tempdir");
    fs::write(src.path().join("a.txt"), vec![b'a'; 100]).expect("write a.txt");
    fs::create_dir(src.path().join("sub")).expect("create sub");
    fs::write(src.path().join("sub/b.txt"), vec![b'b'; 50]).expect("write b.txt");

    respaldo()
        .arg("list")
        .arg(src.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("a.txt"))
        .stdout(predicate::str::contains("b.txt"))
        .stdout(predicate::str::contains("2 files"));
}

#[test]
fn test_list_respects_exclude() {
    let src = TempDir::new().expect("create src tempdir");
    fs::write(src.path().join("keep.txt"), b"keep").expect("write keep");
    fs::write(src.path().join("skip.log"), b"skip").expect("write log");

    respaldo()
        .arg("list")
        .arg(src.path())
        .arg("--exclude")
        .arg("*.log")
        .assert()
        .success()
        .stdout(predicate::str::contains("keep.txt"))
        .stdout(predicate::str::contains("skip.log").not());
}

#[test]
fn test_mirror_copies_selected_file() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");
    fs::write(src.path().join("a.txt"), b"payload").expect("write a.txt");
    fs::write(src.path().join("other.txt"), b"other").expect("write other.txt");

    respaldo()
        .arg("mirror")
        .arg(src.path())
        .arg(dst.path())
        .arg("--select")
        .arg("a.txt")
        .arg("--strategy")
        .arg("recursive")
        .arg("--no-report")
        .assert()
        .success();

    assert_eq!(
        fs::read(dst.path().join("a.txt")).expect("read copied file"),
        b"payload"
    );
    assert!(!dst.path().join("other.txt").exists());
}

#[test]
fn test_mirror_dry_run_prints_plan() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");
    fs::write(src.path().join("a.txt"), b"payload").expect("write a.txt");

    respaldo()
        .arg("mirror")
        .arg(src.path())
        .arg(dst.path())
        .arg("--strategy")
        .arg("recursive")
        .arg("--dry-run")
        .arg("--no-report")
        .assert()
        .success()
        .stdout(predicate::str::contains("COPY   a.txt"))
        .stdout(predicate::str::contains("no changes were made"));

    assert!(!dst.path().join("a.txt").exists());
}

#[test]
fn test_mirror_missing_destination_fails() {
    let src = TempDir::new().expect("create src tempdir");

    respaldo()
        .arg("mirror")
        .arg(src.path())
        .arg("/definitely/not/a/destination")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Destination path"));
}

#[test]
fn test_missing_subcommand_shows_usage() {
    respaldo()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}
