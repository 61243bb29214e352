//! Diff computation between the desired and observed documents.
//!
//! Entries are identified by their `target`; `source` and kind are payload.
//! The resulting operation list always holds every delete before every
//! create, so a target whose source changed is removed before it is
//! recreated.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::manifest::{LinkDocument, LinkEntry, LinkKind};
use crate::vpath::VirtualPath;

/// How much of the current state a diff tears down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffMode {
  /// Only entries that are missing or differ.
  #[default]
  Incremental,
  /// Delete everything current, create everything next.
  Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
  Create,
  Delete,
}

/// One filesystem change computed by a reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
  pub kind: OperationKind,
  pub target: VirtualPath,
  pub source: Option<VirtualPath>,
  pub is_directory: bool,
}

impl Operation {
  fn delete(kind: LinkKind, entry: &LinkEntry) -> Self {
    Self {
      kind: OperationKind::Delete,
      target: entry.target.clone(),
      source: Some(entry.source.clone()),
      is_directory: kind.is_dir(),
    }
  }

  fn create(kind: LinkKind, entry: &LinkEntry) -> Self {
    Self {
      kind: OperationKind::Create,
      target: entry.target.clone(),
      source: Some(entry.source.clone()),
      is_directory: kind.is_dir(),
    }
  }

  pub fn is_create(&self) -> bool {
    self.kind == OperationKind::Create
  }

  pub fn is_delete(&self) -> bool {
    self.kind == OperationKind::Delete
  }
}

impl fmt::Display for Operation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let kind = if self.is_directory { "dir" } else { "file" };
    match (&self.kind, &self.source) {
      (OperationKind::Create, Some(source)) => write!(f, "create {} -> {} ({})", self.target, source, kind),
      (OperationKind::Create, None) => write!(f, "create {} ({})", self.target, kind),
      (OperationKind::Delete, _) => write!(f, "delete {} ({})", self.target, kind),
    }
  }
}

/// Compute the operations that turn `current` into `next`.
///
/// # Incremental mode
///
/// - in current, absent from next or with another source/kind → delete
/// - in next, absent from current or with another source/kind → create
///
/// # Complete mode
///
/// Every current entry is deleted and every next entry created.
///
/// Both modes return deletes first, then creates, each group in document
/// order.
pub fn compute_diff(next: &LinkDocument, current: &LinkDocument, mode: DiffMode) -> Vec<Operation> {
  let mut deletes = Vec::new();
  let mut creates = Vec::new();

  match mode {
    DiffMode::Complete => {
      deletes = teardown_operations(current);
      creates.extend(next.entries().map(|(kind, entry)| Operation::create(kind, entry)));
    }
    DiffMode::Incremental => {
      let next_index = index_by_target(next);
      let current_index = index_by_target(current);

      for (kind, entry) in current.entries() {
        if !same_link(next_index.get(&entry.target), kind, entry) {
          deletes.push(Operation::delete(kind, entry));
        }
      }
      for (kind, entry) in next.entries() {
        if !same_link(current_index.get(&entry.target), kind, entry) {
          creates.push(Operation::create(kind, entry));
        }
      }
    }
  }

  deletes.extend(creates);
  deletes
}

/// Operations that remove every managed link.
///
/// A link is managed when its target is declared in `next`; links the
/// project does not declare are left alone.
pub fn clean_operations(next: &LinkDocument, current: &LinkDocument) -> Vec<Operation> {
  let next_index = index_by_target(next);
  current
    .entries()
    .filter(|(_, entry)| next_index.contains_key(&entry.target))
    .map(|(kind, entry)| Operation::delete(kind, entry))
    .collect()
}

/// Deletes for every entry of `doc`, in document order.
pub fn teardown_operations(doc: &LinkDocument) -> Vec<Operation> {
  doc.entries().map(|(kind, entry)| Operation::delete(kind, entry)).collect()
}

fn index_by_target(doc: &LinkDocument) -> HashMap<&VirtualPath, (LinkKind, &LinkEntry)> {
  doc.entries().map(|(kind, entry)| (&entry.target, (kind, entry))).collect()
}

fn same_link(other: Option<&(LinkKind, &LinkEntry)>, kind: LinkKind, entry: &LinkEntry) -> bool {
  matches!(other, Some((other_kind, other_entry)) if *other_kind == kind && other_entry.source == entry.source)
}
