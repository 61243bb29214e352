//! Editor file-visibility rules.
//!
//! Declarations and generated service files can be hidden from the editor
//! through the `files.exclude` map of `.vscode/settings.json`. Managed keys
//! are set to `true` or `false` rather than removed, and every other key in
//! the file is preserved in its original order.
//!
//! The editor reads the file as JSON with comments and trailing commas, so
//! it is parsed the same way. Comments do not survive a rewrite.

use std::io;
use std::path::{Path, PathBuf};

use jsonc_parser::ParseOptions;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::consts::{DECLARATION_FILENAME, EDITOR_SETTINGS_DIR, EDITOR_SETTINGS_FILENAME, SERVICE_FILES};
use crate::settings::Settings;
use crate::util::fs::{read_optional, write_atomic};

const FILES_EXCLUDE: &str = "files.exclude";

#[derive(Debug, Error)]
pub enum EditorSettingsError {
  #[error("failed to read {}: {source}", path.display())]
  Read { path: PathBuf, source: io::Error },

  #[error("failed to parse {}: {message}", path.display())]
  Parse { path: PathBuf, message: String },

  #[error("{} is not a JSON object at `{key}`", path.display())]
  NotAnObject { path: PathBuf, key: String },

  #[error("failed to serialize editor settings: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("failed to write {}: {source}", path.display())]
  Write { path: PathBuf, source: io::Error },
}

pub fn editor_settings_path(root: &Path) -> PathBuf {
  root.join(EDITOR_SETTINGS_DIR).join(EDITOR_SETTINGS_FILENAME)
}

/// Read the editor settings file, `None` when absent.
pub fn read_editor_settings(root: &Path) -> Result<Option<Value>, EditorSettingsError> {
  let path = editor_settings_path(root);
  let Some(content) = read_optional(&path).map_err(|source| EditorSettingsError::Read {
    path: path.clone(),
    source,
  })?
  else {
    return Ok(None);
  };
  let doc = jsonc_parser::parse_to_serde_value(&content, &ParseOptions::default()).map_err(|e| {
    EditorSettingsError::Parse {
      path,
      message: e.to_string(),
    }
  })?;
  // an empty file reads as an empty object
  Ok(Some(doc.unwrap_or_else(|| Value::Object(Map::new()))))
}

pub fn write_editor_settings(root: &Path, doc: &Value) -> Result<(), EditorSettingsError> {
  let path = editor_settings_path(root);
  let mut content = serde_json::to_string_pretty(doc).map_err(EditorSettingsError::Serialize)?;
  content.push('\n');
  write_atomic(&path, content.as_bytes()).map_err(|source| EditorSettingsError::Write {
    path: path.clone(),
    source,
  })?;
  debug!(path = %path.display(), "wrote editor settings");
  Ok(())
}

/// `files.exclude` keys the system manages and their desired values.
pub fn exclusion_patterns(settings: &Settings) -> Vec<(String, bool)> {
  let mut patterns = vec![(format!("**/{DECLARATION_FILENAME}"), settings.hide_declarations)];
  patterns.extend(
    SERVICE_FILES
      .iter()
      .map(|name| (name.to_string(), settings.hide_service_files)),
  );
  patterns
}

/// Merge `patterns` into an editor settings document.
///
/// Existing keys are toggled in place; missing keys are only added when
/// they should hide something. Returns `None` when there is no file and
/// nothing needs hiding, so no file gets created just to say `false`.
pub fn merge_exclusions(
  root: &Path,
  doc: Option<Value>,
  patterns: &[(String, bool)],
) -> Result<Option<Value>, EditorSettingsError> {
  let wants_any = patterns.iter().any(|(_, hide)| *hide);
  let mut doc = match doc {
    Some(doc) => doc,
    None if !wants_any => return Ok(None),
    None => Value::Object(Map::new()),
  };

  let not_an_object = |key: &str| EditorSettingsError::NotAnObject {
    path: editor_settings_path(root),
    key: key.to_string(),
  };

  let top = doc.as_object_mut().ok_or_else(|| not_an_object("."))?;
  if !top.contains_key(FILES_EXCLUDE) {
    if !wants_any {
      return Ok(Some(doc));
    }
    top.insert(FILES_EXCLUDE.to_string(), Value::Object(Map::new()));
  }
  let exclude = top
    .get_mut(FILES_EXCLUDE)
    .and_then(Value::as_object_mut)
    .ok_or_else(|| not_an_object(FILES_EXCLUDE))?;

  for (pattern, hide) in patterns {
    match exclude.get_mut(pattern) {
      Some(value) => *value = Value::Bool(*hide),
      None if *hide => {
        exclude.insert(pattern.clone(), Value::Bool(true));
      }
      None => {}
    }
  }
  Ok(Some(doc))
}
