//! Aggregation of per-directory declarations into the "next" document.
//!
//! Every `symlink-config.json` below the project root contributes its links.
//! Paths are normalized to `@`-form and tagged with the declaring directory,
//! then appended in traversal order.
//!
//! When two declarations name the same target, the later one in traversal
//! order wins and a warning names both declaring directories.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::consts::DECLARATION_FILENAME;
use crate::manifest::{LinkDocument, LinkEntry, LinkKind, read_declaration};
use crate::vpath::{from_native, to_virtual};
use crate::walk::{ScanFilter, walk_project};

/// Merge every declaration below `root` into one document.
///
/// Unreadable or malformed declaration files are skipped; one bad file never
/// blocks the others.
pub fn aggregate(root: &Path, filter: &ScanFilter) -> LinkDocument {
  let mut entries: Vec<(LinkKind, LinkEntry)> = Vec::new();
  let mut declarations = 0usize;

  for entry in walk_project(root, filter) {
    if !entry.file_type().is_file() || entry.file_name() != DECLARATION_FILENAME {
      continue;
    }

    let Some(config_path) = entry.path().parent().and_then(|dir| from_native(dir, root)) else {
      continue;
    };

    let declaration = match read_declaration(entry.path()) {
      Ok(declaration) => declaration,
      Err(e) => {
        warn!(path = %entry.path().display(), error = %e, "skipping unreadable declaration");
        continue;
      }
    };
    declarations += 1;

    for (kind, link) in declaration.links() {
      let normalized = LinkEntry {
        target: to_virtual(&link.target, &config_path),
        source: to_virtual(&link.source, &config_path),
        config_path: config_path.clone(),
      };
      insert_last_wins(&mut entries, kind, normalized);
    }
  }

  info!(
    root = %root.display(),
    declarations,
    links = entries.len(),
    "aggregated declarations"
  );

  LinkDocument::from_entries(entries)
}

fn insert_last_wins(entries: &mut Vec<(LinkKind, LinkEntry)>, kind: LinkKind, entry: LinkEntry) {
  if let Some(idx) = entries.iter().position(|(_, e)| e.target == entry.target) {
    let (_, previous) = entries.remove(idx);
    warn!(
      target = %entry.target,
      previous = %previous.config_path,
      winner = %entry.config_path,
      "duplicate link target, later declaration wins"
    );
  }
  debug!(target = %entry.target, source = %entry.source, kind = %kind, "declared link");
  entries.push((kind, entry));
}
