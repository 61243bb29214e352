//! Observed state and the diff against desired state.
//!
//! [`snapshot`] rebuilds the "current" document from the symlinks that
//! actually exist; [`compute_diff`] turns the gap between "next" and
//! "current" into an ordered list of [`Operation`]s.

mod diff;
mod scan;

pub use diff::{DiffMode, Operation, OperationKind, clean_operations, compute_diff, teardown_operations};
pub use scan::snapshot;
