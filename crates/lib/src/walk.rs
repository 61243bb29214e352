//! Project tree traversal shared by the aggregator and the snapshotter.

use std::cmp::Ordering;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Decides which directories a project walk never enters.
///
/// Dot-directories are always skipped. Exclusion globs are matched against
/// both the directory name and its root-relative path (forward slashes), so
/// `node_modules` skips every `node_modules` while `vendor/**` only skips
/// below a top-level `vendor`.
#[derive(Debug, Clone)]
pub struct ScanFilter {
  exclude: GlobSet,
}

impl Default for ScanFilter {
  fn default() -> Self {
    Self { exclude: GlobSet::empty() }
  }
}

impl ScanFilter {
  /// Build a filter from glob patterns. Invalid patterns are logged and ignored.
  pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
      match Glob::new(pattern.as_ref()) {
        Ok(glob) => {
          builder.add(glob);
        }
        Err(e) => warn!(pattern = pattern.as_ref(), error = %e, "ignoring invalid exclude pattern"),
      }
    }
    let exclude = builder.build().unwrap_or_else(|e| {
      warn!(error = %e, "failed to compile exclude patterns");
      GlobSet::empty()
    });
    Self { exclude }
  }

  /// True if the walk should not descend into `entry`.
  fn skips(&self, root: &Path, entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
      return false;
    }

    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
      return true;
    }

    let rel = entry
      .path()
      .strip_prefix(root)
      .map(|p| p.to_string_lossy().replace('\\', "/"))
      .unwrap_or_default();
    if self.exclude.is_match(name.as_ref()) || self.exclude.is_match(&rel) {
      debug!(dir = %rel, "skipping excluded directory");
      return true;
    }
    false
  }
}

/// Depth-first walk of `root` honoring `filter`.
///
/// Symlinks are never followed. Within a directory, non-directories come
/// before subdirectories and both are sorted by name, so a directory's own
/// declaration is always read before any nested one. Unreadable entries are
/// logged and skipped.
pub fn walk_project<'a>(root: &'a Path, filter: &'a ScanFilter) -> impl Iterator<Item = DirEntry> + 'a {
  WalkDir::new(root)
    .follow_links(false)
    .sort_by(|a, b| match (a.file_type().is_dir(), b.file_type().is_dir()) {
      (false, true) => Ordering::Less,
      (true, false) => Ordering::Greater,
      _ => a.file_name().cmp(b.file_name()),
    })
    .into_iter()
    .filter_entry(move |entry| !filter.skips(root, entry))
    .filter_map(|result| match result {
      Ok(entry) => Some(entry),
      Err(e) => {
        warn!(error = %e, "skipping unreadable entry");
        None
      }
    })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::write_file;
  use tempfile::TempDir;

  fn names(root: &Path, filter: &ScanFilter) -> Vec<String> {
    walk_project(root, filter)
      .filter(|e| e.depth() > 0)
      .map(|e| e.path().strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
      .collect()
  }

  #[test]
  fn files_come_before_subdirectories() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "a/inner.txt", "");
    write_file(temp.path(), "z.txt", "");

    assert_eq!(names(temp.path(), &ScanFilter::default()), vec!["z.txt", "a", "a/inner.txt"]);
  }

  #[test]
  fn dot_directories_are_never_entered() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), ".git/config", "");
    write_file(temp.path(), ".env", "");

    assert_eq!(names(temp.path(), &ScanFilter::default()), vec![".env"]);
  }

  #[test]
  fn excluded_directories_match_by_name_or_path() {
    let temp = TempDir::new().unwrap();
    write_file(temp.path(), "pkg/node_modules/x.json", "");
    write_file(temp.path(), "vendor/lib/y.json", "");
    write_file(temp.path(), "src/vendor/z.json", "");

    let filter = ScanFilter::new(&["node_modules", "vendor/**"]);
    let found = names(temp.path(), &filter);

    assert!(!found.iter().any(|p| p.contains("node_modules")));
    assert!(found.contains(&"vendor".to_string()));
    assert!(!found.contains(&"vendor/lib".to_string()));
    assert!(found.contains(&"src/vendor/z.json".to_string()));
  }
}
