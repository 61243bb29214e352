//! Test utilities for symconf-lib.
//!
//! Helpers to lay out small project trees and create links without caring
//! about the host platform.

use std::fs;
use std::path::{Path, PathBuf};

/// Writes `content` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &str) -> PathBuf {
  let path = root.join(rel);
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  fs::write(&path, content).unwrap();
  path
}

/// Creates `root/rel` as a directory.
pub fn make_dir(root: &Path, rel: &str) -> PathBuf {
  let path = root.join(rel);
  fs::create_dir_all(&path).unwrap();
  path
}

/// Creates a symlink at `link` whose text is `target`.
#[cfg(unix)]
pub fn symlink(target: impl AsRef<Path>, link: impl AsRef<Path>) {
  std::os::unix::fs::symlink(target, link).unwrap();
}

#[cfg(windows)]
pub fn symlink(target: impl AsRef<Path>, link: impl AsRef<Path>) {
  let link = link.as_ref();
  let resolved = link.parent().unwrap().join(target.as_ref());
  if resolved.is_dir() {
    std::os::windows::fs::symlink_dir(target, link).unwrap();
  } else {
    std::os::windows::fs::symlink_file(target, link).unwrap();
  }
}

/// Canonical temp root so host paths compare equal with discovered ones.
pub fn canonical(path: &Path) -> PathBuf {
  dunce::canonicalize(path).unwrap()
}
