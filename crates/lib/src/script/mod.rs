//! Script emission.
//!
//! The same operation list renders to a Windows batch file or a POSIX shell
//! script. Both dialects follow one control flow per operation:
//!
//! - delete: if the target is a symlink, remove it
//! - create: if the source is missing, report and count a failure; else
//!   ensure the parent directory; if the target is a symlink, remove it; if
//!   anything still occupies the target, report it as blocked; else link
//!
//! Every path is written relative to a `ROOT` variable the script computes
//! from its own location, so the files keep working when the project moves.

mod batch;
mod safety;
mod shell;

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{ADMIN_SCRIPT_FILENAME, APP_NAME, APPLY_SCRIPT_STEM, CLEAN_SCRIPT_STEM};
use crate::platform::TargetOs;
use crate::settings::LinkMode;
use crate::snapshot::Operation;
use crate::util::fs::{read_optional, write_atomic};
use crate::vpath::{VirtualPath, relativize};

pub use safety::DangerousSources;

/// First comment line of every generated script.
const GENERATED_NOTICE: &str = "Generated by symconf. Do not edit; changes are overwritten.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptDialect {
  /// Windows `cmd.exe` batch file.
  Batch,
  /// POSIX `sh` script.
  Shell,
}

impl ScriptDialect {
  pub fn for_os(os: TargetOs) -> Self {
    match os {
      TargetOs::Windows => Self::Batch,
      TargetOs::Unix => Self::Shell,
    }
  }

  pub fn os(self) -> TargetOs {
    match self {
      Self::Batch => TargetOs::Windows,
      Self::Shell => TargetOs::Unix,
    }
  }

  pub fn extension(self) -> &'static str {
    match self {
      Self::Batch => "bat",
      Self::Shell => "sh",
    }
  }

  fn line_ending(self) -> &'static str {
    match self {
      Self::Batch => "\r\n",
      Self::Shell => "\n",
    }
  }
}

/// What a generated script does when run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptKind {
  /// Bring the links in line with the declarations.
  Apply,
  /// Remove every managed link.
  Clean,
}

impl ScriptKind {
  fn stem(self) -> &'static str {
    match self {
      Self::Apply => APPLY_SCRIPT_STEM,
      Self::Clean => CLEAN_SCRIPT_STEM,
    }
  }
}

/// File name of a script, e.g. `apply.symlink-config.sh`.
pub fn script_file_name(kind: ScriptKind, dialect: ScriptDialect) -> String {
  format!("{}.{}", kind.stem(), dialect.extension())
}

#[derive(Debug, Error)]
pub enum ScriptError {
  #[error("failed to read script {}: {source}", path.display())]
  Read { path: PathBuf, source: io::Error },

  #[error("failed to write script {}: {source}", path.display())]
  Write { path: PathBuf, source: io::Error },
}

/// Render `ops` as a script in `dialect`.
pub fn render_script(ops: &[Operation], dialect: ScriptDialect, mode: LinkMode) -> String {
  match dialect {
    ScriptDialect::Batch => batch::render(ops, mode),
    ScriptDialect::Shell => shell::render(ops, mode),
  }
}

/// Batch file that re-runs another script from the same directory with
/// administrator rights. Creating symlinks on Windows needs them unless
/// developer mode is on.
pub fn render_admin_relauncher() -> String {
  batch::render_admin_relauncher()
}

/// Every script for the given target OS families, keyed by file name.
///
/// The admin relauncher is included whenever Windows is a target.
pub fn render_all(
  apply_ops: &[Operation],
  clean_ops: &[Operation],
  targets: &[TargetOs],
  mode: LinkMode,
) -> BTreeMap<String, String> {
  let mut scripts = BTreeMap::new();
  for &os in targets {
    let dialect = ScriptDialect::for_os(os);
    scripts.insert(
      script_file_name(ScriptKind::Apply, dialect),
      render_script(apply_ops, dialect, mode),
    );
    scripts.insert(
      script_file_name(ScriptKind::Clean, dialect),
      render_script(clean_ops, dialect, mode),
    );
    if os == TargetOs::Windows {
      scripts.insert(ADMIN_SCRIPT_FILENAME.to_string(), render_admin_relauncher());
    }
  }
  scripts
}

/// File names [`render_all`] produces for `targets`.
pub fn script_file_names(targets: &[TargetOs]) -> Vec<String> {
  let mut names = Vec::new();
  for &os in targets {
    let dialect = ScriptDialect::for_os(os);
    names.push(script_file_name(ScriptKind::Apply, dialect));
    names.push(script_file_name(ScriptKind::Clean, dialect));
    if os == TargetOs::Windows {
      names.push(ADMIN_SCRIPT_FILENAME.to_string());
    }
  }
  names
}

/// Read a generated script from the project root.
pub fn read_script(root: &Path, file_name: &str) -> Result<Option<String>, ScriptError> {
  let path = root.join(file_name);
  read_optional(&path).map_err(|source| ScriptError::Read { path, source })
}

/// Write a script to the project root unless it already has this content.
///
/// Shell scripts are made executable. Returns whether the file changed.
pub fn write_script(root: &Path, file_name: &str, content: &str) -> Result<bool, ScriptError> {
  let path = root.join(file_name);
  if read_script(root, file_name)?.as_deref() == Some(content) {
    debug!(path = %path.display(), "script unchanged");
    return Ok(false);
  }

  write_atomic(&path, content.as_bytes()).map_err(|source| ScriptError::Write {
    path: path.clone(),
    source,
  })?;

  if file_name.ends_with(ScriptDialect::Shell.extension()) {
    make_executable(&path).map_err(|source| ScriptError::Write {
      path: path.clone(),
      source,
    })?;
  }

  debug!(path = %path.display(), "wrote script");
  Ok(true)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> io::Result<()> {
  use std::os::unix::fs::PermissionsExt;
  std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> io::Result<()> {
  Ok(())
}

/// Accumulates script lines with the dialect's line ending.
struct ScriptWriter {
  buf: String,
  eol: &'static str,
}

impl ScriptWriter {
  fn new(dialect: ScriptDialect) -> Self {
    Self {
      buf: String::new(),
      eol: dialect.line_ending(),
    }
  }

  fn line(&mut self, text: impl AsRef<str>) {
    self.buf.push_str(text.as_ref());
    self.buf.push_str(self.eol);
  }

  fn blank(&mut self) {
    self.buf.push_str(self.eol);
  }

  fn finish(self) -> String {
    self.buf
  }
}

/// One-line description of an operation for script comments.
fn describe(op: &Operation) -> String {
  let text = match (&op.source, op.is_create()) {
    (Some(source), true) => format!("create {} from {}", op.target, source),
    _ => format!("delete {}", op.target),
  };
  text.replace(['\r', '\n'], " ")
}

/// Root-relative path of `path` with `os` separators (empty for the root).
fn relative_native(path: &VirtualPath, os: TargetOs) -> String {
  os.native_separators(path.relative())
}

/// Link text relative to the link's own directory, with `os` separators.
fn relative_link_text(target: &VirtualPath, source: &VirtualPath, os: TargetOs) -> String {
  os.native_separators(&relativize(target, source))
}

fn notice() -> String {
  format!("{GENERATED_NOTICE} ({APP_NAME} {})", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::snapshot::OperationKind;

  fn op(kind: OperationKind, target: &str, source: &str, is_directory: bool) -> Operation {
    Operation {
      kind,
      target: VirtualPath::parse(target).unwrap(),
      source: VirtualPath::parse(source),
      is_directory,
    }
  }

  #[test]
  fn file_names_follow_kind_and_dialect() {
    assert_eq!(
      script_file_name(ScriptKind::Apply, ScriptDialect::Shell),
      "apply.symlink-config.sh"
    );
    assert_eq!(
      script_file_name(ScriptKind::Clean, ScriptDialect::Batch),
      "clean.symlink-config.bat"
    );
  }

  #[test]
  fn render_all_adds_admin_script_for_windows_only() {
    let ops = [op(OperationKind::Create, "@a", "@b", false)];

    let unix = render_all(&ops, &[], &[TargetOs::Unix], LinkMode::Relative);
    let both = render_all(&ops, &[], &[TargetOs::Windows, TargetOs::Unix], LinkMode::Relative);

    assert_eq!(
      unix.keys().collect::<Vec<_>>(),
      vec!["apply.symlink-config.sh", "clean.symlink-config.sh"]
    );
    assert_eq!(both.len(), 5);
    assert!(both.contains_key(ADMIN_SCRIPT_FILENAME));

    let mut names = script_file_names(&[TargetOs::Windows, TargetOs::Unix]);
    names.sort();
    assert_eq!(names, both.into_keys().collect::<Vec<_>>());
  }

  #[test]
  fn dialects_share_control_flow() {
    let ops = [
      op(OperationKind::Delete, "@old", "@x", false),
      op(OperationKind::Create, "@pkg/x.txt", "@shared/x.txt", false),
    ];
    let batch = render_script(&ops, ScriptDialect::Batch, LinkMode::Relative);
    let shell = render_script(&ops, ScriptDialect::Shell, LinkMode::Relative);

    for script in [&batch, &shell] {
      assert!(script.contains("delete @old"));
      assert!(script.contains("create @pkg/x.txt from @shared/x.txt"));
      assert!(script.contains("Source not found: "));
      assert!(script.contains("Cannot create parent directory: "));
      assert!(script.contains("Target blocked by existing file: "));
      assert!(script.contains("Symlink operation failed for "));
    }
  }

  #[test]
  fn write_script_skips_identical_content() {
    let temp = tempfile::TempDir::new().unwrap();

    assert!(write_script(temp.path(), "apply.symlink-config.sh", "#!/bin/sh\n").unwrap());
    assert!(!write_script(temp.path(), "apply.symlink-config.sh", "#!/bin/sh\n").unwrap());
    assert!(write_script(temp.path(), "apply.symlink-config.sh", "#!/bin/sh\necho\n").unwrap());
  }

  #[cfg(unix)]
  #[test]
  fn shell_scripts_are_executable() {
    use std::os::unix::fs::PermissionsExt;
    let temp = tempfile::TempDir::new().unwrap();

    write_script(temp.path(), "apply.symlink-config.sh", "#!/bin/sh\n").unwrap();

    let mode = std::fs::metadata(temp.path().join("apply.symlink-config.sh"))
      .unwrap()
      .permissions()
      .mode();
    assert_eq!(mode & 0o777, 0o755);
  }
}
