//! `.gitignore` entry set.
//!
//! The file is parsed into an ordered list of patterns, each carrying the
//! verbatim text in front of it (blank lines, comments, indentation) and
//! whether it is active. A pattern written as `#pattern`, with nothing
//! between `#` and the pattern, is an inactive entry; `# text`, a bare `#`
//! and `##...` are comments and belong to the spacing of the next pattern.
//!
//! Assembling an unmodified set reproduces the input byte for byte,
//! including line endings and whatever follows the last pattern.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::consts::{GITIGNORE_FILENAME, SERVICE_FILES};
use crate::manifest::LinkDocument;
use crate::settings::Settings;
use crate::util::fs::{read_optional, write_atomic};

#[derive(Debug, Error)]
pub enum GitignoreError {
  #[error("failed to read {}: {source}", path.display())]
  Read { path: PathBuf, source: io::Error },

  #[error("failed to write {}: {source}", path.display())]
  Write { path: PathBuf, source: io::Error },
}

/// One pattern line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitignoreEntry {
  /// Text before the pattern: preceding blank and comment lines plus the
  /// pattern line's own indentation.
  pub spacing: String,
  pub pattern: String,
  /// `false` when the pattern is commented out.
  pub active: bool,
  /// Trailing whitespace and the line ending, empty on a final line without
  /// newline.
  line_end: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitignoreEntries {
  entries: Vec<GitignoreEntry>,
  /// Text after the last pattern.
  suffix: String,
}

impl GitignoreEntries {
  pub fn parse(text: &str) -> Self {
    let mut entries = Vec::new();
    let mut pending = String::new();

    for line in text.split_inclusive('\n') {
      let body = line.trim_end_matches(['\r', '\n']);
      let content = body.trim_end();
      let line_end = &line[content.len()..];
      let trimmed = content.trim_start();
      let indent = &content[..content.len() - trimmed.len()];

      let (pattern, active) = match trimmed.strip_prefix('#') {
        _ if trimmed.is_empty() => {
          pending.push_str(line);
          continue;
        }
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) || rest.starts_with('#') => {
          pending.push_str(line);
          continue;
        }
        Some(rest) => (rest, false),
        None => (trimmed, true),
      };

      let mut spacing = std::mem::take(&mut pending);
      spacing.push_str(indent);
      entries.push(GitignoreEntry {
        spacing,
        pattern: pattern.to_string(),
        active,
        line_end: line_end.to_string(),
      });
    }

    Self {
      entries,
      suffix: pending,
    }
  }

  /// Render the set back to file content.
  pub fn assemble(&self) -> String {
    let mut out = String::new();
    for entry in &self.entries {
      out.push_str(&entry.spacing);
      if !entry.active {
        out.push('#');
      }
      out.push_str(&entry.pattern);
      out.push_str(&entry.line_end);
    }
    out.push_str(&self.suffix);
    out
  }

  pub fn get(&self, pattern: &str) -> Option<&GitignoreEntry> {
    self.entries.iter().find(|e| e.pattern == pattern)
  }

  pub fn iter(&self) -> impl Iterator<Item = &GitignoreEntry> {
    self.entries.iter()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Make `pattern` present with the given state.
  ///
  /// Existing entries (every duplicate of the pattern) are toggled in
  /// place. A new pattern is appended after the last one, taking over any
  /// trailing text as its spacing. Returns whether anything changed.
  pub fn set_managed(&mut self, pattern: &str, active: bool) -> bool {
    let mut found = false;
    let mut changed = false;
    for entry in self.entries.iter_mut().filter(|e| e.pattern == pattern) {
      found = true;
      if entry.active != active {
        entry.active = active;
        changed = true;
      }
    }
    if found {
      return changed;
    }

    let eol = self.line_ending();
    let mut spacing = std::mem::take(&mut self.suffix);
    if spacing.is_empty() {
      if let Some(last) = self.entries.last_mut()
        && !last.line_end.ends_with('\n')
      {
        last.line_end.push_str(eol);
      }
    } else if !spacing.ends_with('\n') {
      spacing.push_str(eol);
    }

    self.entries.push(GitignoreEntry {
      spacing,
      pattern: pattern.to_string(),
      active,
      line_end: eol.to_string(),
    });
    true
  }

  /// `\r\n` if the file already uses it, `\n` otherwise.
  fn line_ending(&self) -> &'static str {
    let uses_crlf = self.suffix.contains("\r\n")
      || self
        .entries
        .iter()
        .any(|e| e.line_end.ends_with("\r\n") || e.spacing.contains("\r\n"));
    if uses_crlf { "\r\n" } else { "\n" }
  }
}

impl fmt::Display for GitignoreEntries {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.assemble())
  }
}

pub fn gitignore_path(root: &Path) -> PathBuf {
  root.join(GITIGNORE_FILENAME)
}

/// Read the root `.gitignore`; a missing file is an empty set.
pub fn read_gitignore(root: &Path) -> Result<GitignoreEntries, GitignoreError> {
  let path = gitignore_path(root);
  let content = read_optional(&path).map_err(|source| GitignoreError::Read { path, source })?;
  Ok(GitignoreEntries::parse(content.as_deref().unwrap_or_default()))
}

pub fn write_gitignore(root: &Path, entries: &GitignoreEntries) -> Result<(), GitignoreError> {
  let path = gitignore_path(root);
  write_atomic(&path, entries.assemble().as_bytes()).map_err(|source| GitignoreError::Write {
    path: path.clone(),
    source,
  })?;
  debug!(path = %path.display(), entries = entries.len(), "wrote gitignore");
  Ok(())
}

/// Patterns the system manages and whether each should be active.
///
/// Service files follow `gitignoreServiceFiles`; the target of every
/// existing link, anchored at the root with a leading `/`, follows
/// `gitignoreSymlinks`.
pub fn managed_patterns(settings: &Settings, current: &LinkDocument) -> Vec<(String, bool)> {
  let mut patterns: Vec<(String, bool)> = SERVICE_FILES
    .iter()
    .map(|name| (name.to_string(), settings.gitignore_service_files))
    .collect();
  for (_, entry) in current.entries() {
    let pattern = format!("/{}", entry.target.relative());
    if !patterns.iter().any(|(p, _)| *p == pattern) {
      patterns.push((pattern, settings.gitignore_symlinks));
    }
  }
  patterns
}

/// Apply `patterns` to `entries`. Returns whether anything changed.
pub fn apply_managed(entries: &mut GitignoreEntries, patterns: &[(String, bool)]) -> bool {
  let mut changed = false;
  for (pattern, active) in patterns {
    changed |= entries.set_managed(pattern, *active);
  }
  changed
}
