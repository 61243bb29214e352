//! Scaffolding of declaration files.
//!
//! The only write the system ever makes to a user-owned declaration: adding
//! one link, creating `symlink-config.json` on the first use in a directory.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::consts::DECLARATION_FILENAME;
use crate::util::fs::exists_no_follow;
use crate::vpath::VirtualPath;

use super::storage::{DocumentError, read_declaration, write_declaration};
use super::types::{DeclaredLink, Declaration, LinkKind};

/// Adds `target -> source` to the declaration of `dir`.
///
/// The file is re-read immediately before writing. An existing link with
/// the same `target` text is replaced, in either array.
pub fn add_link(
  root: &Path,
  dir: &VirtualPath,
  link: DeclaredLink,
  kind: LinkKind,
) -> Result<PathBuf, DocumentError> {
  let path = dir.to_host_path(root).join(DECLARATION_FILENAME);

  let mut declaration = if exists_no_follow(&path) {
    read_declaration(&path)?
  } else {
    Declaration::default()
  };

  declaration.directories.retain(|l| l.target != link.target);
  declaration.files.retain(|l| l.target != link.target);

  info!(
    declaration = %path.display(),
    target = %link.target,
    source = %link.source,
    kind = %kind,
    "adding link declaration"
  );

  match kind {
    LinkKind::Dir => declaration.directories.push(link),
    LinkKind::File => declaration.files.push(link),
  }

  write_declaration(&path, &declaration)?;
  Ok(path)
}
