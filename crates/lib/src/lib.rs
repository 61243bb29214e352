//! symconf-lib: symlink configuration engine
//!
//! Declarations (`symlink-config.json`) spread across a project say which
//! symlinks should exist. This crate keeps the links, and everything derived
//! from them, consistent with those declarations:
//!
//! - [`aggregate`]: merge every declaration into the "next" document
//! - [`snapshot`]: observe existing links as the "current" document, and
//!   diff the two into operations
//! - [`execute`]: carry operations out directly, or via [`script`]s
//! - [`reconcile`]: the convergence loop over all derived artifacts
//! - [`watch`]: drive the loop from filesystem events

pub mod aggregate;
pub mod consts;
pub mod context;
pub mod editor;
pub mod execute;
pub mod gitignore;
pub mod log;
pub mod manifest;
pub mod platform;
pub mod prompt;
pub mod reconcile;
pub mod script;
pub mod settings;
pub mod snapshot;
pub mod util;
pub mod vpath;
pub mod walk;
pub mod watch;
