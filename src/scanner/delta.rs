//! Delta computation - what must be copied from source to destination
//!
//! Walks the source tree, prunes subtrees the selection does not touch,
//! and flags every entry that is missing or differs in the destination.

use crate::scanner::meta::{read_metadata, Metadata};
use crate::types::{join_rel, DeltaList, Entry, RespaldoError, Selection};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Callback for reporting analysis progress.
///
/// Arguments:
/// - `files_examined`: source files compared so far
/// - `entries_flagged`: delta entries produced so far
pub type AnalysisProgress = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Compare the selected subset of `source_root` against `dest_root`.
///
/// Returns the ordered list of entries that require copying:
/// - a directory entry (size 0) for every traversed directory whose
///   mirror is missing under the destination,
/// - a file entry (source size) for every selected file whose
///   destination is absent or differs in size or modification time.
///
/// With `selection = None` the entire tree is compared. Traversal order
/// is deterministic: within each directory the directory record comes
/// first, then its files, then subdirectory contents, names sorted.
///
/// # Errors
/// Only an unreadable `source_root` fails the call. Unreadable entries
/// below the root are logged, excluded, and traversal continues with
/// their siblings.
pub fn compute_delta(
    source_root: &Path,
    dest_root: &Path,
    selection: Option<&Selection>,
    on_progress: Option<&AnalysisProgress>,
) -> Result<DeltaList, RespaldoError> {
    let mut walk = Walk {
        source_root,
        dest_root,
        selection,
        on_progress,
        delta: Vec::new(),
        files_examined: 0,
    };

    walk.visit_dir("", true)?;
    Ok(walk.delta)
}

struct Walk<'a> {
    source_root: &'a Path,
    dest_root: &'a Path,
    selection: Option<&'a Selection>,
    on_progress: Option<&'a AnalysisProgress>,
    delta: Vec<Entry>,
    files_examined: u64,
}

impl Walk<'_> {
    fn visit_dir(&mut self, rel: &str, is_root: bool) -> Result<(), RespaldoError> {
        let source_dir = join_rel(self.source_root, rel);

        let read = match fs::read_dir(&source_dir) {
            Ok(read) => read,
            Err(err) if is_root => return Err(err.into()),
            Err(err) => {
                warn!(path = %source_dir.display(), error = %err, "skipping unreadable directory");
                return Ok(());
            }
        };

        // The root's mirror is a validated precondition; only nested
        // directories produce delta records.
        if !is_root && !join_rel(self.dest_root, rel).exists() {
            self.delta.push(Entry::directory(rel));
            self.emit_progress();
        }

        let mut files: Vec<String> = Vec::new();
        let mut dirs: Vec<String> = Vec::new();

        for item in read {
            let item = match item {
                Ok(item) => item,
                Err(err) => {
                    warn!(path = %source_dir.display(), error = %err, "skipping unreadable entry");
                    continue;
                }
            };

            let name = item.file_name().to_string_lossy().into_owned();
            match classify(&item) {
                Some(Classified::Directory) => dirs.push(name),
                Some(Classified::File) => files.push(name),
                None => continue,
            }
        }

        files.sort();
        dirs.sort();

        for name in files {
            let file_rel = child_rel(rel, &name);
            if let Some(selection) = self.selection {
                if !selection.is_selected(&file_rel) {
                    continue;
                }
            }
            self.compare_file(&file_rel);
        }

        for name in dirs {
            let dir_rel = child_rel(rel, &name);
            if let Some(selection) = self.selection {
                if !selection.touches(&dir_rel) {
                    continue;
                }
            }
            self.visit_dir(&dir_rel, false)?;
        }

        Ok(())
    }

    fn compare_file(&mut self, file_rel: &str) {
        self.files_examined += 1;

        let source_path = join_rel(self.source_root, file_rel);
        let source_meta = match read_metadata(&source_path) {
            Some(meta) => meta,
            None => {
                warn!(path = %source_path.display(), "source file unreadable, excluded from delta");
                self.emit_progress();
                return;
            }
        };

        let dest_meta = read_metadata(&join_rel(self.dest_root, file_rel));
        if needs_copy(&source_meta, dest_meta.as_ref()) {
            self.delta.push(Entry::file(file_rel, source_meta.size));
        }
        self.emit_progress();
    }

    fn emit_progress(&self) {
        if let Some(callback) = self.on_progress {
            callback(self.files_examined, self.delta.len() as u64);
        }
    }
}

/// A file needs copying when the destination is absent or either size or
/// mtime differs.
fn needs_copy(source: &Metadata, dest: Option<&Metadata>) -> bool {
    match dest {
        None => true,
        Some(dest) => !source.matches(dest),
    }
}

enum Classified {
    File,
    Directory,
}

/// Classify a directory entry, resolving symlinks to their target kind.
///
/// Broken symlinks and special files (sockets, pipes, devices) are
/// skipped; symlinked directories are skipped as well to avoid cycles.
fn classify(item: &fs::DirEntry) -> Option<Classified> {
    let file_type = match item.file_type() {
        Ok(file_type) => file_type,
        Err(err) => {
            warn!(path = %item.path().display(), error = %err, "skipping entry with unreadable type");
            return None;
        }
    };

    if file_type.is_dir() {
        return Some(Classified::Directory);
    }
    if file_type.is_file() {
        return Some(Classified::File);
    }
    if file_type.is_symlink() {
        return match fs::metadata(item.path()) {
            Ok(resolved) if resolved.is_file() => Some(Classified::File),
            Ok(_) => None,
            Err(err) => {
                warn!(path = %item.path().display(), error = %err, "skipping broken symlink");
                None
            }
        };
    }
    None
}

fn child_rel(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntryKind;
    use std::fs;
    use tempfile::TempDir;

    fn flagged(delta: &[Entry]) -> Vec<(&str, EntryKind, u64)> {
        delta
            .iter()
            .map(|e| (e.path.as_str(), e.kind, e.size))
            .collect()
    }

    #[test]
    fn test_empty_destination_flags_everything() {
        let src = TempDir::new().expect("create src");
        let dst = TempDir::new().expect("create dst");
        fs::write(src.path().join("a.txt"), vec![b'x'; 100]).expect("write a.txt");
        fs::create_dir(src.path().join("sub")).expect("create sub");
        fs::write(src.path().join("sub/b.txt"), vec![b'y'; 50]).expect("write b.txt");

        let delta = compute_delta(src.path(), dst.path(), None, None).expect("compute delta");

        assert_eq!(
            flagged(&delta),
            vec![
                ("a.txt", EntryKind::File, 100),
                ("sub", EntryKind::Directory, 0),
                ("sub/b.txt", EntryKind::File, 50),
            ]
        );
    }

    #[test]
    fn test_selection_prunes_unrelated_subtrees() {
        let src = TempDir::new().expect("create src");
        let dst = TempDir::new().expect("create dst");
        fs::create_dir(src.path().join("wanted")).expect("create wanted");
        fs::write(src.path().join("wanted/in.txt"), b"in").expect("write in.txt");
        fs::create_dir(src.path().join("other")).expect("create other");
        fs::write(src.path().join("other/out.txt"), b"out").expect("write out.txt");

        let selection = Selection::from_paths(["wanted"]);
        let delta =
            compute_delta(src.path(), dst.path(), Some(&selection), None).expect("compute delta");

        let paths: Vec<&str> = delta.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["wanted", "wanted/in.txt"]);
    }

    #[test]
    fn test_selected_leaf_keeps_ancestor_directories() {
        let src = TempDir::new().expect("create src");
        let dst = TempDir::new().expect("create dst");
        fs::create_dir_all(src.path().join("a/b")).expect("create nested");
        fs::write(src.path().join("a/b/leaf.txt"), b"leaf").expect("write leaf");
        fs::write(src.path().join("a/sibling.txt"), b"sib").expect("write sibling");

        let selection = Selection::from_paths(["a/b/leaf.txt"]);
        let delta =
            compute_delta(src.path(), dst.path(), Some(&selection), None).expect("compute delta");

        let paths: Vec<&str> = delta.iter().map(|e| e.path.as_str()).collect();
        // Parents of the selected leaf are traversed and flagged; the
        // unselected sibling file is not.
        assert_eq!(paths, vec!["a", "a/b", "a/b/leaf.txt"]);
    }

    #[test]
    fn test_unchanged_file_is_excluded() {
        let src = TempDir::new().expect("create src");
        let dst = TempDir::new().expect("create dst");
        fs::write(src.path().join("same.txt"), b"same").expect("write source");
        fs::copy(src.path().join("same.txt"), dst.path().join("same.txt")).expect("copy to dest");

        // Align mtimes so the content-blind identity check passes.
        let mtime = fs::metadata(src.path().join("same.txt"))
            .expect("source metadata")
            .modified()
            .expect("source mtime");
        filetime::set_file_mtime(
            dst.path().join("same.txt"),
            filetime::FileTime::from_system_time(mtime),
        )
        .expect("set dest mtime");

        let delta = compute_delta(src.path(), dst.path(), None, None).expect("compute delta");
        assert!(delta.is_empty(), "identical size+mtime must be skipped");
    }

    #[test]
    fn test_size_difference_flags_file() {
        let src = TempDir::new().expect("create src");
        let dst = TempDir::new().expect("create dst");
        fs::write(src.path().join("grown.txt"), b"longer-content").expect("write source");
        fs::write(dst.path().join("grown.txt"), b"short").expect("write dest");

        let delta = compute_delta(src.path(), dst.path(), None, None).expect("compute delta");
        assert_eq!(flagged(&delta), vec![("grown.txt", EntryKind::File, 14)]);
    }

    #[test]
    fn test_selection_prefix_is_boundary_delimited() {
        let src = TempDir::new().expect("create src");
        let dst = TempDir::new().expect("create dst");
        fs::create_dir(src.path().join("foo")).expect("create foo");
        fs::write(src.path().join("foo/x.txt"), b"x").expect("write foo/x");
        fs::create_dir(src.path().join("foobar")).expect("create foobar");
        fs::write(src.path().join("foobar/y.txt"), b"y").expect("write foobar/y");

        let selection = Selection::from_paths(["foo"]);
        let delta =
            compute_delta(src.path(), dst.path(), Some(&selection), None).expect("compute delta");

        let paths: Vec<&str> = delta.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["foo", "foo/x.txt"]);
    }

    #[test]
    fn test_missing_source_root_is_fatal() {
        let dst = TempDir::new().expect("create dst");
        let result = compute_delta(Path::new("/no/such/root"), dst.path(), None, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_progress_reports_examined_and_flagged() {
        use std::sync::atomic::{AtomicU64, Ordering};
        use std::sync::Arc;

        let src = TempDir::new().expect("create src");
        let dst = TempDir::new().expect("create dst");
        for i in 0..4 {
            fs::write(src.path().join(format!("f{i}.txt")), b"data").expect("write file");
        }

        let calls = Arc::new(AtomicU64::new(0));
        let calls_ref = Arc::clone(&calls);
        let progress: AnalysisProgress = Box::new(move |examined, flagged| {
            calls_ref.fetch_add(1, Ordering::SeqCst);
            assert!(flagged <= examined);
        });

        let delta =
            compute_delta(src.path(), dst.path(), None, Some(&progress)).expect("compute delta");
        assert_eq!(delta.len(), 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    #[cfg(unix)]
    fn test_unreadable_file_is_excluded_not_fatal() {
        use std::os::unix::fs::PermissionsExt;

        let src = TempDir::new().expect("create src");
        let dst = TempDir::new().expect("create dst");
        fs::write(src.path().join("ok.txt"), b"ok").expect("write ok");
        let locked = src.path().join("locked");
        fs::create_dir(&locked).expect("create locked dir");
        fs::write(locked.join("hidden.txt"), b"hidden").expect("write hidden");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).expect("lock dir");

        let delta = compute_delta(src.path(), dst.path(), None, None).expect("compute delta");

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).expect("unlock dir");

        let paths: Vec<&str> = delta.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"ok.txt"));
        assert!(
            !paths.contains(&"locked/hidden.txt"),
            "contents of an unreadable directory must be excluded"
        );
    }
}
