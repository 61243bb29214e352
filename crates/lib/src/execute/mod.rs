//! Carrying out operations.
//!
//! [`execute_operations`] applies a list of operations to the filesystem
//! directly. [`apply()`] and [`clean()`] orchestrate a whole run: refresh
//! the documents, diff, gate dangerous links, then either execute or emit
//! scripts, and finally re-observe the result.

pub mod apply;
mod direct;
mod types;

pub use apply::{ApplyError, ApplyMethod, ApplyResult, Plan, apply, clean};
pub use direct::{execute_operations, link_text};
pub use types::{ExecuteError, ExecutionReport, OperationFailure};
