use std::fmt;

use serde::{Deserialize, Serialize};

/// Operating system family a path or script is rendered for.
///
/// Rendering never depends on the host: a Windows path can be produced on a
/// POSIX host and vice versa, so both script dialects can be generated from
/// either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetOs {
  Windows,
  Unix,
}

impl TargetOs {
  /// The OS family of the running host.
  pub fn current() -> Self {
    if cfg!(windows) { Self::Windows } else { Self::Unix }
  }

  /// Rewrites every separator in `path` to this OS family's separator.
  pub fn native_separators(self, path: &str) -> String {
    match self {
      Self::Windows => path.replace('/', "\\"),
      Self::Unix => path.replace('\\', "/"),
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Windows => "windows",
      Self::Unix => "unix",
    }
  }
}

impl fmt::Display for TargetOs {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
