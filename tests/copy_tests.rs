//! Copy executor integration tests
//!
//! Strategy behavior against real directories: recursive copies with
//! verification, idempotence, per-item failure tolerance, and the
//! bulk-to-recursive fallback.

use respaldo::executor::{execute_copy, StrategyKind};
use respaldo::scanner::compute_delta;
use respaldo::{Config, Selection, Strategy};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn config_for(source: &Path, destination: &Path, strategy: Strategy) -> Config {
    Config {
        source: source.to_path_buf(),
        destination: destination.to_path_buf(),
        strategy,
        ..Config::default()
    }
}

#[cfg(unix)]
fn fake_tool(dir: &TempDir, name: &str, script: &str) -> String {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.path().join(name);
    fs::write(&path, script).expect("write fake tool");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod fake tool");
    path.to_string_lossy().into_owned()
}

#[test]
fn test_recursive_copy_round_trip_sizes() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");
    fs::write(src.path().join("data.bin"), vec![b'd'; 4096]).expect("write source");

    let selection = Selection::from_paths(["data.bin"]);
    let config = config_for(src.path(), dst.path(), Strategy::Recursive);
    let outcome = execute_copy(&config, Some(&selection), &[], None);

    assert!(outcome.success);
    let source_size = fs::metadata(src.path().join("data.bin"))
        .expect("source metadata")
        .len();
    let dest_size = fs::metadata(dst.path().join("data.bin"))
        .expect("dest metadata")
        .len();
    assert_eq!(source_size, dest_size);
}

#[test]
fn test_copy_then_recompute_delta_is_empty() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");
    fs::write(src.path().join("a.txt"), vec![b'a'; 100]).expect("write a.txt");
    fs::create_dir(src.path().join("sub")).expect("create sub");
    fs::write(src.path().join("sub/b.txt"), vec![b'b'; 50]).expect("write b.txt");

    let config = config_for(src.path(), dst.path(), Strategy::Recursive);
    let outcome = execute_copy(&config, None, &[], None);
    assert!(outcome.success);
    assert_eq!(outcome.ledger.file_count(), 2);

    let delta = compute_delta(src.path(), dst.path(), None, None).expect("compute delta");
    assert!(
        delta.is_empty(),
        "a second analysis right after a copy must find nothing, got {delta:?}"
    );
}

#[test]
fn test_copy_twice_second_ledger_is_empty() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");
    fs::create_dir(src.path().join("sub")).expect("create sub");
    fs::write(src.path().join("sub/file.txt"), b"payload").expect("write file");

    let selection = Selection::from_paths(["sub"]);
    let config = config_for(src.path(), dst.path(), Strategy::Recursive);

    let first = execute_copy(&config, Some(&selection), &[], None);
    assert!(first.success);
    assert!(!first.ledger.is_empty());

    let second = execute_copy(&config, Some(&selection), &[], None);
    assert!(second.success);
    assert!(second.ledger.is_empty());
}

#[test]
#[cfg(unix)]
fn test_one_unreadable_file_among_ten_yields_nine_entries() {
    use std::os::unix::fs::PermissionsExt;

    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");

    let mut selection = Selection::new();
    for i in 0..9 {
        let name = format!("f{i}.txt");
        fs::write(src.path().join(&name), b"readable").expect("write file");
        selection.insert(name);
    }
    let locked = src.path().join("locked.txt");
    fs::write(&locked, b"secret").expect("write locked file");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).expect("lock file");
    selection.insert("locked.txt");

    let config = config_for(src.path(), dst.path(), Strategy::Recursive);
    let outcome = execute_copy(&config, Some(&selection), &[], None);

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).expect("unlock file");

    assert!(outcome.success, "a per-item failure must not fail the run");
    assert_eq!(outcome.ledger.len(), 9);
    assert!(!dst.path().join("locked.txt").exists());
}

#[test]
#[cfg(unix)]
fn test_bulk_exit_code_nine_falls_back_without_duplicates() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");
    let bin = TempDir::new().expect("create bin tempdir");

    fs::write(src.path().join("a.txt"), vec![b'a'; 100]).expect("write a.txt");
    // Simulate an earlier partial transfer: the destination already has
    // one of the files.
    fs::create_dir(src.path().join("sub")).expect("create sub");
    fs::write(src.path().join("sub/b.txt"), b"partial-able").expect("write b.txt");
    fs::create_dir(dst.path().join("sub")).expect("create dst sub");
    fs::copy(src.path().join("sub/b.txt"), dst.path().join("sub/b.txt")).expect("preseed dest");

    let tool = fake_tool(
        &bin,
        "failing-mirror",
        "#!/bin/sh\necho ERROR 5 accessing destination\nexit 9\n",
    );

    let mut config = config_for(src.path(), dst.path(), Strategy::Auto);
    config.bulk_tool = tool;

    let selection = Selection::from_paths(["a.txt", "sub"]);
    let outcome = execute_copy(&config, Some(&selection), &[], None);

    assert!(outcome.success, "fallback must complete the operation");
    assert!(outcome.fell_back);
    assert_eq!(outcome.strategy, Some(StrategyKind::Recursive));

    // The preseeded file was already identical in size, so only a.txt
    // was written; nothing is duplicated or corrupted.
    assert_eq!(outcome.ledger.file_count(), 1);
    assert_eq!(
        fs::read(dst.path().join("a.txt")).expect("read a.txt").len(),
        100
    );
    assert_eq!(
        fs::read(dst.path().join("sub/b.txt")).expect("read b.txt"),
        b"partial-able"
    );
}

#[test]
#[cfg(unix)]
fn test_bulk_success_populates_ledger_from_delta() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");
    let bin = TempDir::new().expect("create bin tempdir");

    fs::write(src.path().join("a.txt"), vec![b'a'; 100]).expect("write a.txt");

    let tool = fake_tool(&bin, "ok-mirror", "#!/bin/sh\necho 1 file copied\nexit 1\n");
    let mut config = config_for(src.path(), dst.path(), Strategy::Bulk);
    config.bulk_tool = tool;

    let selection = Selection::from_paths(["a.txt"]);
    let delta = compute_delta(src.path(), dst.path(), Some(&selection), None)
        .expect("compute delta");
    let outcome = execute_copy(&config, Some(&selection), &delta, None);

    assert!(outcome.success);
    assert_eq!(outcome.strategy, Some(StrategyKind::Bulk));
    assert_eq!(outcome.ledger.entries(), delta.as_slice());
}

#[test]
#[cfg(unix)]
fn test_bulk_receives_inclusion_list_and_flags() {
    let src = TempDir::new().expect("create src tempdir");
    let dst = TempDir::new().expect("create dst tempdir");
    let bin = TempDir::new().expect("create bin tempdir");

    // Echo all arguments, then exit in the success family.
    let tool = fake_tool(&bin, "arg-echo", "#!/bin/sh\necho \"$@\"\nexit 0\n");
    let mut config = config_for(src.path(), dst.path(), Strategy::Bulk);
    config.bulk_tool = tool;
    config.threads = 8;
    config.verify = true;

    let selection = Selection::from_paths(["sub/deep"]);
    let lines = std::sync::Mutex::new(Vec::<String>::new());
    let callback = |event: &respaldo::executor::CopyEvent| {
        if let respaldo::executor::CopyEvent::BulkOutput { line } = event {
            lines.lock().expect("lock lines").push(line.clone());
        }
    };

    let outcome = execute_copy(&config, Some(&selection), &[], Some(&callback));
    assert!(outcome.success);

    let captured = lines.lock().expect("lock captured").join("\n");
    assert!(captured.contains("/E"));
    assert!(captured.contains("/XA:SH"));
    assert!(captured.contains("/MT:8"));
    assert!(captured.contains("/V"));
    assert!(captured.contains("/IF"));
    assert!(captured.contains("$RECYCLE.BIN"));
}

#[test]
fn test_missing_roots_fail_before_any_work() {
    let dst = TempDir::new().expect("create dst tempdir");
    let config = config_for(
        Path::new("/definitely/not/here"),
        dst.path(),
        Strategy::Recursive,
    );

    let outcome = execute_copy(&config, None, &[], None);
    assert!(!outcome.success);
    assert!(outcome.ledger.is_empty());
    assert!(outcome.diagnostic.is_some());
}
