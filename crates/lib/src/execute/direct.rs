//! Direct application of operations to the filesystem.
//!
//! Safety rules:
//!
//! - a delete only ever removes a symlink; real files and directories are
//!   skipped even when an operation names them
//! - a create never overwrites real content
//! - a link that already points where it should is left untouched, so a
//!   second run over the same operations reports zero successes

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::platform::TargetOs;
use crate::settings::LinkMode;
use crate::snapshot::{Operation, OperationKind};
use crate::util::fs::{exists_no_follow, is_symlink};
use crate::vpath::{VirtualPath, relativize, to_native};

use super::types::{ExecuteError, ExecutionReport, OperationFailure};

/// Apply `ops` below `root` in order.
///
/// Returns `Err` only when `root` itself cannot be accessed; every other
/// problem is recorded in the report and the batch continues.
pub fn execute_operations(ops: &[Operation], root: &Path, mode: LinkMode) -> Result<ExecutionReport, ExecuteError> {
  match fs::metadata(root) {
    Ok(meta) if meta.is_dir() => {}
    Ok(_) => {
      return Err(ExecuteError::RootInaccessible {
        path: root.to_path_buf(),
        source: io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
      });
    }
    Err(source) => {
      return Err(ExecuteError::RootInaccessible {
        path: root.to_path_buf(),
        source,
      });
    }
  }

  let mut report = ExecutionReport::default();
  for op in ops {
    match op.kind {
      OperationKind::Delete => delete_link(op, root, &mut report),
      OperationKind::Create => create_link(op, root, mode, &mut report),
    }
  }

  info!(
    success = report.success,
    failed = report.failed,
    skipped = report.skipped,
    "executed operations"
  );
  Ok(report)
}

/// Text a link at `target` should contain to reach `source`.
pub fn link_text(target: &VirtualPath, source: &VirtualPath, root: &Path, mode: LinkMode) -> PathBuf {
  match mode {
    LinkMode::Absolute => source.to_host_path(root),
    LinkMode::Relative => PathBuf::from(TargetOs::current().native_separators(&relativize(target, source))),
  }
}

fn delete_link(op: &Operation, root: &Path, report: &mut ExecutionReport) {
  let path = op.target.to_host_path(root);
  if !is_symlink(&path) {
    debug!(target = %op.target, "not a symlink, nothing to delete");
    report.skipped += 1;
    return;
  }

  match remove_symlink(&path) {
    Ok(()) => {
      debug!(target = %op.target, "removed link");
      report.success += 1;
    }
    Err(cause) => report.record_failure(OperationFailure::SymlinkSyscallFailure {
      path: native(&op.target, root),
      cause,
    }),
  }
}

fn create_link(op: &Operation, root: &Path, mode: LinkMode, report: &mut ExecutionReport) {
  let Some(source) = &op.source else {
    report.record_failure(OperationFailure::SourceNotFound(String::new()));
    return;
  };

  let source_path = source.to_host_path(root);
  if !source_path.exists() {
    report.record_failure(OperationFailure::SourceNotFound(native(source, root)));
    return;
  }

  let link = op.target.to_host_path(root);
  if let Some(parent) = link.parent()
    && let Err(cause) = fs::create_dir_all(parent)
  {
    report.record_failure(OperationFailure::TargetParentUncreatable {
      path: parent.display().to_string(),
      cause,
    });
    return;
  }

  let text = link_text(&op.target, source, root, mode);

  if is_symlink(&link) {
    if fs::read_link(&link).is_ok_and(|existing| existing == text) {
      debug!(target = %op.target, "link already up to date");
      report.skipped += 1;
      return;
    }
    if let Err(cause) = remove_symlink(&link) {
      report.record_failure(OperationFailure::SymlinkSyscallFailure {
        path: native(&op.target, root),
        cause,
      });
      return;
    }
  } else if exists_no_follow(&link) {
    report.record_failure(OperationFailure::TargetBlockedByRealFile(native(&op.target, root)));
    return;
  }

  match make_symlink(&text, &link, op.is_directory) {
    Ok(()) => {
      debug!(target = %op.target, source = %source, text = %text.display(), "created link");
      report.success += 1;
    }
    Err(cause) => report.record_failure(OperationFailure::SymlinkSyscallFailure {
      path: native(&op.target, root),
      cause,
    }),
  }
}

fn native(path: &VirtualPath, root: &Path) -> String {
  to_native(path, &root.to_string_lossy(), TargetOs::current())
}

#[cfg(unix)]
fn make_symlink(text: &Path, link: &Path, _is_directory: bool) -> io::Result<()> {
  std::os::unix::fs::symlink(text, link)
}

#[cfg(windows)]
fn make_symlink(text: &Path, link: &Path, is_directory: bool) -> io::Result<()> {
  if is_directory {
    std::os::windows::fs::symlink_dir(text, link)
  } else {
    std::os::windows::fs::symlink_file(text, link)
  }
}

/// Remove a symlink without touching what it points to.
///
/// Directory links on Windows are directories to the filesystem and need
/// `remove_dir`.
fn remove_symlink(path: &Path) -> io::Result<()> {
  match fs::remove_file(path) {
    Ok(()) => Ok(()),
    Err(e) if cfg!(windows) => fs::remove_dir(path).map_err(|_| e),
    Err(e) => Err(e),
  }
}

#[cfg(all(test, unix))]
mod tests {
  use super::*;
  use crate::snapshot::{DiffMode, compute_diff, snapshot};
  use crate::manifest::{LinkDocument, LinkEntry, LinkKind};
  use crate::util::testutil::{canonical, make_dir, symlink, write_file};
  use crate::walk::ScanFilter;
  use tempfile::TempDir;

  fn vp(text: &str) -> VirtualPath {
    VirtualPath::parse(text).unwrap()
  }

  fn create(target: &str, source: &str, is_directory: bool) -> Operation {
    Operation {
      kind: OperationKind::Create,
      target: vp(target),
      source: Some(vp(source)),
      is_directory,
    }
  }

  fn delete(target: &str) -> Operation {
    Operation {
      kind: OperationKind::Delete,
      target: vp(target),
      source: None,
      is_directory: false,
    }
  }

  #[test]
  fn missing_source_is_reported_not_fatal() {
    let temp = TempDir::new().unwrap();
    let root = canonical(temp.path());

    let report = execute_operations(&[create("@a", "@missing", false)], &root, LinkMode::Relative).unwrap();

    assert_eq!(report.success, 0);
    assert_eq!(report.failed, 1);
    assert_eq!(
      report.errors,
      vec![format!("Source not found: {}", root.join("missing").display())]
    );
    assert!(!exists_no_follow(&root.join("a")));
  }

  #[test]
  fn second_run_changes_nothing() {
    let temp = TempDir::new().unwrap();
    let root = canonical(temp.path());
    write_file(&root, "shared/x.txt", "x");
    make_dir(&root, "shared/assets");
    let ops = vec![
      create("@app/assets", "@shared/assets", true),
      create("@pkg/x.txt", "@shared/x.txt", false),
    ];

    let first = execute_operations(&ops, &root, LinkMode::Relative).unwrap();
    let second = execute_operations(&ops, &root, LinkMode::Relative).unwrap();

    assert_eq!((first.success, first.failed), (2, 0));
    assert_eq!((second.success, second.failed, second.skipped), (0, 0, 2));
    assert_eq!(fs::read_to_string(root.join("pkg/x.txt")).unwrap(), "x");
  }

  #[test]
  fn relative_and_absolute_link_text() {
    let temp = TempDir::new().unwrap();
    let root = canonical(temp.path());
    write_file(&root, "shared/x.txt", "x");

    execute_operations(&[create("@pkg/rel.txt", "@shared/x.txt", false)], &root, LinkMode::Relative).unwrap();
    execute_operations(&[create("@pkg/abs.txt", "@shared/x.txt", false)], &root, LinkMode::Absolute).unwrap();

    assert_eq!(fs::read_link(root.join("pkg/rel.txt")).unwrap(), PathBuf::from("../shared/x.txt"));
    assert_eq!(fs::read_link(root.join("pkg/abs.txt")).unwrap(), root.join("shared/x.txt"));
  }

  #[test]
  fn delete_never_touches_real_content() {
    let temp = TempDir::new().unwrap();
    let root = canonical(temp.path());
    write_file(&root, "real.txt", "keep");
    make_dir(&root, "real-dir");

    let report = execute_operations(&[delete("@real.txt"), delete("@real-dir")], &root, LinkMode::Relative).unwrap();

    assert_eq!((report.success, report.skipped), (0, 2));
    assert_eq!(fs::read_to_string(root.join("real.txt")).unwrap(), "keep");
    assert!(root.join("real-dir").is_dir());
  }

  #[test]
  fn create_refuses_to_overwrite_real_file() {
    let temp = TempDir::new().unwrap();
    let root = canonical(temp.path());
    write_file(&root, "shared/x.txt", "x");
    write_file(&root, "pkg/x.txt", "mine");

    let report = execute_operations(&[create("@pkg/x.txt", "@shared/x.txt", false)], &root, LinkMode::Relative).unwrap();

    assert_eq!(report.failed, 1);
    assert!(report.errors[0].starts_with("Target blocked by existing file"));
    assert_eq!(fs::read_to_string(root.join("pkg/x.txt")).unwrap(), "mine");
  }

  #[test]
  fn stale_link_is_replaced() {
    let temp = TempDir::new().unwrap();
    let root = canonical(temp.path());
    write_file(&root, "old.txt", "old");
    write_file(&root, "new.txt", "new");
    symlink("old.txt", root.join("link"));

    let report = execute_operations(&[create("@link", "@new.txt", false)], &root, LinkMode::Relative).unwrap();

    assert_eq!(report.success, 1);
    assert_eq!(fs::read_to_string(root.join("link")).unwrap(), "new");
  }

  #[test]
  fn delete_removes_link_but_not_its_source() {
    let temp = TempDir::new().unwrap();
    let root = canonical(temp.path());
    make_dir(&root, "shared/assets");
    write_file(&root, "shared/assets/a.png", "");
    symlink("shared/assets", root.join("assets"));

    let report = execute_operations(&[delete("@assets")], &root, LinkMode::Relative).unwrap();

    assert_eq!(report.success, 1);
    assert!(!exists_no_follow(&root.join("assets")));
    assert!(root.join("shared/assets/a.png").exists());
  }

  #[test]
  fn inaccessible_root_aborts_the_batch() {
    let temp = TempDir::new().unwrap();
    let err = execute_operations(&[], &temp.path().join("gone"), LinkMode::Relative).unwrap_err();
    assert!(matches!(err, ExecuteError::RootInaccessible { .. }));
  }

  #[test]
  fn applied_diff_is_observed_by_snapshot() {
    let temp = TempDir::new().unwrap();
    let root = canonical(temp.path());
    write_file(&root, "shared/x.txt", "x");
    let next = LinkDocument::from_entries([(
      LinkKind::File,
      LinkEntry {
        target: vp("@pkg/x.txt"),
        source: vp("@shared/x.txt"),
        config_path: vp("@pkg"),
      },
    )]);

    let ops = compute_diff(&next, &LinkDocument::default(), DiffMode::Incremental);
    execute_operations(&ops, &root, LinkMode::Relative).unwrap();

    let current = snapshot(&root, &ScanFilter::default());
    assert!(compute_diff(&next, &current, DiffMode::Incremental).is_empty());
  }
}
