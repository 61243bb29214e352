//! The dangerous-source gate.
//!
//! Linking editor configuration, VCS internals or workspace files is
//! usually a mistake. Operations whose source matches one of these globs
//! need an explicit answer before they are emitted.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::warn;

use crate::snapshot::Operation;
use crate::vpath::VirtualPath;

/// Compiled `dangerousSources` globs, matched against `@`-form sources.
#[derive(Debug, Clone)]
pub struct DangerousSources {
  set: GlobSet,
}

impl DangerousSources {
  /// `*` never crosses a `/`; use `**` for that. Invalid patterns are
  /// logged and ignored.
  pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
      match GlobBuilder::new(pattern.as_ref()).literal_separator(true).build() {
        Ok(glob) => {
          builder.add(glob);
        }
        Err(e) => warn!(pattern = pattern.as_ref(), error = %e, "ignoring invalid dangerous source pattern"),
      }
    }
    let set = builder.build().unwrap_or_else(|e| {
      warn!(error = %e, "failed to compile dangerous source patterns");
      GlobSet::empty()
    });
    Self { set }
  }

  pub fn matches(&self, source: &VirtualPath) -> bool {
    self.set.is_match(source.as_str())
  }

  /// True if `op` creates a link to a dangerous source. Deletes are never
  /// dangerous.
  pub fn is_dangerous(&self, op: &Operation) -> bool {
    op.is_create() && op.source.as_ref().is_some_and(|source| self.matches(source))
  }

  /// Keep safe operations and the dangerous ones `allow` accepts.
  pub fn filter(&self, ops: Vec<Operation>, mut allow: impl FnMut(&Operation) -> bool) -> Vec<Operation> {
    ops
      .into_iter()
      .filter(|op| !self.is_dangerous(op) || allow(op))
      .collect()
  }
}
