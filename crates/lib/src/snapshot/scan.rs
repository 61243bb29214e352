//! Reconstruction of the "current" document from the live filesystem.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::manifest::{LinkDocument, LinkEntry, LinkKind};
use crate::vpath::{VirtualPath, from_native, normalize_host_path};
use crate::walk::{ScanFilter, walk_project};

/// Record every symlink below `root`.
///
/// Each link becomes `{ target, source, kind }` in `@`-form, with `@` as its
/// `configPath`. The walk never follows links, so directory links are
/// leaves. Broken links and links resolving outside the project root are
/// skipped.
pub fn snapshot(root: &Path, filter: &ScanFilter) -> LinkDocument {
  let mut doc = LinkDocument::default();

  for entry in walk_project(root, filter) {
    if entry.depth() == 0 || !entry.path_is_symlink() {
      continue;
    }
    let link = entry.path();

    let text = match fs::read_link(link) {
      Ok(text) => text,
      Err(e) => {
        debug!(link = %link.display(), error = %e, "skipping unreadable link");
        continue;
      }
    };

    let resolved = match link.parent() {
      Some(parent) if text.is_relative() => normalize_host_path(&parent.join(&text)),
      _ => normalize_host_path(&text),
    };

    let metadata = match fs::metadata(&resolved) {
      Ok(metadata) => metadata,
      Err(_) => {
        debug!(link = %link.display(), target = %resolved.display(), "skipping broken link");
        continue;
      }
    };

    let (Some(target), Some(source)) = (from_native(link, root), from_native(&resolved, root)) else {
      debug!(link = %link.display(), target = %resolved.display(), "skipping link outside project root");
      continue;
    };

    let kind = if metadata.is_dir() { LinkKind::Dir } else { LinkKind::File };
    doc.push(
      kind,
      LinkEntry {
        target,
        source,
        config_path: VirtualPath::root(),
      },
    );
  }

  info!(root = %root.display(), links = doc.len(), "snapshot of existing links");
  doc
}
