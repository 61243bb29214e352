//! Reading and writing link documents.
//!
//! Documents are pretty-printed JSON with a trailing newline, written
//! atomically so a watcher never observes a half-written file.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::util::fs::{read_optional, write_atomic};

use super::types::{Declaration, LinkDocument};

/// Errors that can occur when reading or writing documents.
#[derive(Debug, Error)]
pub enum DocumentError {
  #[error("failed to read {}: {source}", path.display())]
  Read { path: PathBuf, source: io::Error },

  #[error("failed to parse {}: {source}", path.display())]
  Parse { path: PathBuf, source: serde_json::Error },

  #[error("failed to serialize document: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("failed to write {}: {source}", path.display())]
  Write { path: PathBuf, source: io::Error },
}

/// Load an aggregated or snapshot document.
///
/// Returns `Ok(None)` if the file doesn't exist.
pub fn read_document(path: &Path) -> Result<Option<LinkDocument>, DocumentError> {
  let Some(content) = read_optional(path).map_err(|source| DocumentError::Read {
    path: path.to_path_buf(),
    source,
  })?
  else {
    return Ok(None);
  };

  let doc = serde_json::from_str(&content).map_err(|source| DocumentError::Parse {
    path: path.to_path_buf(),
    source,
  })?;
  Ok(Some(doc))
}

/// The exact text a document is persisted as.
pub fn render_document(doc: &LinkDocument) -> Result<String, DocumentError> {
  let mut content = serde_json::to_string_pretty(doc).map_err(DocumentError::Serialize)?;
  content.push('\n');
  Ok(content)
}

pub fn write_document(path: &Path, doc: &LinkDocument) -> Result<(), DocumentError> {
  let content = render_document(doc)?;
  write_atomic(path, content.as_bytes()).map_err(|source| DocumentError::Write {
    path: path.to_path_buf(),
    source,
  })
}

/// Load a per-directory declaration file.
pub fn read_declaration(path: &Path) -> Result<Declaration, DocumentError> {
  let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  serde_json::from_str(&content).map_err(|source| DocumentError::Parse {
    path: path.to_path_buf(),
    source,
  })
}

pub fn write_declaration(path: &Path, declaration: &Declaration) -> Result<(), DocumentError> {
  let mut content = serde_json::to_string_pretty(declaration).map_err(DocumentError::Serialize)?;
  content.push('\n');
  write_atomic(path, content.as_bytes()).map_err(|source| DocumentError::Write {
    path: path.to_path_buf(),
    source,
  })
}
