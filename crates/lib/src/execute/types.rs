//! Types for operation execution.
//!
//! Per-operation problems are data, not errors: they are collected in an
//! [`ExecutionReport`] and the batch keeps going. Only an inaccessible
//! project root aborts a whole batch.

use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Why a single operation could not be carried out.
#[derive(Debug, Error)]
pub enum OperationFailure {
  /// The link would point at nothing.
  #[error("Source not found: {0}")]
  SourceNotFound(String),

  /// Something that is not a symlink occupies the target.
  #[error("Target blocked by existing file: {0}")]
  TargetBlockedByRealFile(String),

  /// The directory that should hold the link could not be created.
  #[error("Cannot create parent directory {path}: {cause}")]
  TargetParentUncreatable {
    path: String,
    #[source]
    cause: io::Error,
  },

  /// The link syscall itself failed.
  #[error("Symlink operation failed for {path}: {cause}")]
  SymlinkSyscallFailure {
    path: String,
    #[source]
    cause: io::Error,
  },
}

/// Fatal errors that abort a whole batch.
#[derive(Debug, Error)]
pub enum ExecuteError {
  #[error("project root {} is not accessible: {source}", path.display())]
  RootInaccessible {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Outcome of one batch of operations.
///
/// Partial failure is a normal result: `failed` counts the operations that
/// could not be carried out and `errors` holds one message per failure.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
  pub success: usize,
  pub failed: usize,
  /// Operations that needed no change (link already correct, nothing to delete).
  pub skipped: usize,
  pub errors: Vec<String>,
}

impl ExecutionReport {
  pub(crate) fn record_failure(&mut self, failure: OperationFailure) {
    warn!(error = %failure, "operation failed");
    self.failed += 1;
    self.errors.push(failure.to_string());
  }

  /// True if no operation failed.
  pub fn is_success(&self) -> bool {
    self.failed == 0
  }
}
