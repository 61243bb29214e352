//! Virtual path algebra.
//!
//! Every path that crosses a module boundary is a [`VirtualPath`]: a path
//! relative to the project root, written with forward slashes and prefixed
//! with `@`. The root itself is `@`, a file directly below it is `@file`, a
//! nested one `@dir/file`.
//!
//! Declaration files may also use bare paths, which are relative to the
//! directory that declares them. [`to_virtual`] folds those into `@`-form.
//! [`to_native`] renders a virtual path for a target OS, and [`relativize`]
//! computes the text of a relative link between two virtual paths.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::VIRTUAL_ROOT;
use crate::platform::TargetOs;

/// A root-relative, `@`-prefixed path with forward-slash separators.
///
/// Deserialized text is normalized the same way [`VirtualPath::parse`]
/// normalizes it; text without the `@` prefix is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VirtualPath(String);

impl VirtualPath {
  /// The project root, `@`.
  pub fn root() -> Self {
    Self(VIRTUAL_ROOT.to_string())
  }

  /// Builds a normalized virtual path from root-relative segments.
  ///
  /// `.` segments are dropped and `..` pops the previous segment. A `..` at
  /// the root is clamped: virtual paths never leave the project.
  pub fn from_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> Self {
    let mut out: Vec<&str> = Vec::new();
    for segment in segments {
      match segment {
        "" | "." => {}
        ".." => {
          out.pop();
        }
        other => out.push(other),
      }
    }
    Self(format!("{}{}", VIRTUAL_ROOT, out.join("/")))
  }

  /// Parses `@`-prefixed text, normalizing its segments.
  ///
  /// Returns `None` for text without the `@` prefix.
  pub fn parse(text: &str) -> Option<Self> {
    let rest = text.strip_prefix(VIRTUAL_ROOT)?;
    Some(Self::from_segments(rest.split(['/', '\\'])))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// The path without its `@` prefix, e.g. `pkg/x.txt`.
  pub fn relative(&self) -> &str {
    self.0.strip_prefix(VIRTUAL_ROOT).unwrap_or(&self.0)
  }

  pub fn is_root(&self) -> bool {
    self.relative().is_empty()
  }

  pub fn segments(&self) -> impl Iterator<Item = &str> {
    self.relative().split('/').filter(|s| !s.is_empty())
  }

  /// The containing directory; the root is its own parent.
  pub fn parent(&self) -> Self {
    let rel = self.relative();
    match rel.rfind('/') {
      Some(idx) => Self(format!("{}{}", VIRTUAL_ROOT, &rel[..idx])),
      None => Self::root(),
    }
  }

  pub fn file_name(&self) -> Option<&str> {
    self.segments().last()
  }

  /// Appends a bare relative path, normalizing the result.
  pub fn join(&self, rel: &str) -> Self {
    Self::from_segments(self.segments().chain(rel.split(['/', '\\'])))
  }

  /// Host filesystem location of this path below `root`.
  pub fn to_host_path(&self, root: &Path) -> PathBuf {
    let mut path = root.to_path_buf();
    for segment in self.segments() {
      path.push(segment);
    }
    path
  }
}

impl TryFrom<String> for VirtualPath {
  type Error = String;

  fn try_from(text: String) -> Result<Self, Self::Error> {
    Self::parse(&text).ok_or_else(|| format!("virtual path must start with `{VIRTUAL_ROOT}`: {text:?}"))
  }
}

impl From<VirtualPath> for String {
  fn from(path: VirtualPath) -> Self {
    path.0
  }
}

impl fmt::Display for VirtualPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// Converts a raw declaration path to `@`-form.
///
/// `@`-prefixed input is only normalized. Anything else is resolved
/// against `declaring_dir`, normalized, and prefixed with `@`. Either way
/// `..` is clamped at the root. Backslashes
/// are accepted as separators so declarations written on Windows resolve the
/// same way everywhere.
pub fn to_virtual(raw: &str, declaring_dir: &VirtualPath) -> VirtualPath {
  VirtualPath::parse(raw).unwrap_or_else(|| declaring_dir.join(raw))
}

/// Renders a virtual path below `root` using `os` separators.
///
/// `root` is taken as text so that a script variable such as `$ROOT` or
/// `%ROOT%` can stand in for the real directory.
pub fn to_native(path: &VirtualPath, root: &str, os: TargetOs) -> String {
  let root = root.trim_end_matches(['/', '\\']);
  let joined = if path.is_root() {
    root.to_string()
  } else if root.is_empty() && os == TargetOs::Unix {
    format!("/{}", path.relative())
  } else {
    format!("{}/{}", root, path.relative())
  };
  os.native_separators(&joined)
}

/// Relative path from the directory containing `from` to `to`.
///
/// Uses forward slashes; callers render it with
/// [`TargetOs::native_separators`]. When `from` and `to` share no ancestor
/// but the root, the result climbs all the way up first.
pub fn relativize(from: &VirtualPath, to: &VirtualPath) -> String {
  let from_dir = from.parent();
  let base: Vec<&str> = from_dir.segments().collect();
  let dest: Vec<&str> = to.segments().collect();

  let common = base.iter().zip(dest.iter()).take_while(|(a, b)| a == b).count();

  let mut parts: Vec<&str> = Vec::with_capacity(base.len() - common + dest.len() - common);
  parts.extend(std::iter::repeat_n("..", base.len() - common));
  parts.extend(&dest[common..]);

  if parts.is_empty() {
    ".".to_string()
  } else {
    parts.join("/")
  }
}

/// Maps a host path below `root` back to a virtual path.
///
/// Both paths should be absolute and use the same canonical form. Returns
/// `None` when `path` lies outside `root`.
pub fn from_native(path: &Path, root: &Path) -> Option<VirtualPath> {
  let rel = path.strip_prefix(root).ok()?;
  let mut segments: Vec<String> = Vec::new();
  for component in rel.components() {
    match component {
      Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
      Component::ParentDir => {
        segments.pop()?;
      }
      Component::CurDir => {}
      Component::RootDir | Component::Prefix(_) => return None,
    }
  }
  Some(VirtualPath::from_segments(segments.iter().map(String::as_str)))
}

/// Lexically resolves `.` and `..` in a host path without touching the disk.
pub fn normalize_host_path(path: &Path) -> PathBuf {
  let mut out = PathBuf::new();
  for component in path.components() {
    match component {
      Component::ParentDir => {
        if !out.pop() {
          out.push(component);
        }
      }
      Component::CurDir => {}
      other => out.push(other),
    }
  }
  out
}
