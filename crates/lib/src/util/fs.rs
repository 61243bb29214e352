//! Small filesystem helpers shared by every artifact writer.

use std::fs;
use std::io;
use std::path::Path;

/// Reads a UTF-8 file, mapping "not found" to `None`.
pub fn read_optional(path: &Path) -> io::Result<Option<String>> {
  match fs::read_to_string(path) {
    Ok(content) => Ok(Some(content)),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
    Err(e) => Err(e),
  }
}

/// Writes `content` to `path` atomically (write to temp, then rename).
///
/// Creates the parent directory when missing.
pub fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
  let parent = path.parent().unwrap_or_else(|| Path::new("."));
  if !parent.as_os_str().is_empty() {
    fs::create_dir_all(parent)?;
  }

  let file_name = path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default();
  let temp_path = parent.join(format!(".{}.tmp", file_name));

  fs::write(&temp_path, content)?;
  fs::rename(&temp_path, path)
}

/// True if `path` itself (not its target) is a symbolic link.
pub fn is_symlink(path: &Path) -> bool {
  fs::symlink_metadata(path)
    .map(|m| m.file_type().is_symlink())
    .unwrap_or(false)
}

/// True if anything exists at `path`, including a dangling symlink.
pub fn exists_no_follow(path: &Path) -> bool {
  fs::symlink_metadata(path).is_ok()
}
