//! Document types for symconf.
//!
//! # Example Aggregated Document
//!
//! ```json
//! {
//!   "directories": [
//!     { "target": "@app/assets", "source": "@shared/assets", "configPath": "@app" }
//!   ],
//!   "files": [
//!     { "target": "@pkg/x.txt", "source": "@shared/x.txt", "configPath": "@pkg" }
//!   ]
//! }
//! ```
//!
//! The kind of a link is implied by the array it lives in.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::util::hash::Hashable;
use crate::vpath::VirtualPath;

/// Whether a link points at a directory or a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
  Dir,
  File,
}

impl LinkKind {
  pub fn is_dir(self) -> bool {
    matches!(self, Self::Dir)
  }
}

impl fmt::Display for LinkKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Dir => f.write_str("dir"),
      Self::File => f.write_str("file"),
    }
  }
}

/// One normalized link: a symlink at `target` pointing to `source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkEntry {
  pub target: VirtualPath,
  pub source: VirtualPath,
  /// Directory whose declaration produced this entry; `@` for observed links.
  pub config_path: VirtualPath,
}

/// An aggregated ("next") or observed ("current") link document.
///
/// Every path is in `@`-form. The document is a value: regenerating it
/// replaces it wholesale.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDocument {
  #[serde(default)]
  pub directories: Vec<LinkEntry>,
  #[serde(default)]
  pub files: Vec<LinkEntry>,
}

impl Hashable for LinkDocument {}

impl LinkDocument {
  /// Builds a document from entries in order, splitting them by kind.
  pub fn from_entries(entries: impl IntoIterator<Item = (LinkKind, LinkEntry)>) -> Self {
    let mut doc = Self::default();
    for (kind, entry) in entries {
      doc.push(kind, entry);
    }
    doc
  }

  pub fn push(&mut self, kind: LinkKind, entry: LinkEntry) {
    match kind {
      LinkKind::Dir => self.directories.push(entry),
      LinkKind::File => self.files.push(entry),
    }
  }

  /// All entries, directories first, each array in document order.
  pub fn entries(&self) -> impl Iterator<Item = (LinkKind, &LinkEntry)> {
    self
      .directories
      .iter()
      .map(|e| (LinkKind::Dir, e))
      .chain(self.files.iter().map(|e| (LinkKind::File, e)))
  }

  pub fn len(&self) -> usize {
    self.directories.len() + self.files.len()
  }

  pub fn is_empty(&self) -> bool {
    self.directories.is_empty() && self.files.is_empty()
  }
}

/// A link as written by the user in a declaration file.
///
/// Paths are either bare (relative to the declaring directory) or
/// `@`-prefixed (relative to the project root).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredLink {
  pub target: String,
  pub source: String,
}

/// The per-directory `symlink-config.json` file.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub directories: Vec<DeclaredLink>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub files: Vec<DeclaredLink>,
}

impl Declaration {
  /// All declared links tagged with their kind, directories first.
  pub fn links(&self) -> impl Iterator<Item = (LinkKind, &DeclaredLink)> {
    self
      .directories
      .iter()
      .map(|l| (LinkKind::Dir, l))
      .chain(self.files.iter().map(|l| (LinkKind::File, l)))
  }
}
