//! Link documents.
//!
//! Three documents share one shape: the user-authored per-directory
//! declaration, the aggregated "next" document and the observed "current"
//! document. This module holds their types and their on-disk form.

pub mod declare;
pub mod storage;
mod types;

pub use storage::{DocumentError, read_declaration, read_document, render_document, write_document};
pub use types::*;
