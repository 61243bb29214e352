//! Project settings and project root discovery.
//!
//! Settings live in `symconf.settings.json` at the project root. Every key is
//! optional; a missing file means defaults everywhere.
//!
//! ```json
//! {
//!   "scriptGeneration": "both",
//!   "linkMode": "absolute",
//!   "gitignoreSymlinks": false,
//!   "exclude": ["node_modules", "vendor/**"]
//! }
//! ```

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{NEXT_FILENAME, ROOT_ENV_VAR, SETTINGS_FILENAME};
use crate::platform::TargetOs;
use crate::snapshot::DiffMode;
use crate::util::fs::{read_optional, write_atomic};

/// Which script dialects to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScriptGeneration {
  /// Only the host's dialect.
  #[default]
  Auto,
  WindowsOnly,
  UnixOnly,
  Both,
}

impl ScriptGeneration {
  /// Target OS families to render scripts for, given the host.
  pub fn targets(self, host: TargetOs) -> Vec<TargetOs> {
    match self {
      Self::Auto => vec![host],
      Self::WindowsOnly => vec![TargetOs::Windows],
      Self::UnixOnly => vec![TargetOs::Unix],
      Self::Both => vec![TargetOs::Windows, TargetOs::Unix],
    }
  }
}

/// How the text of a created link is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
  Absolute,
  /// Relative to the directory containing the link.
  #[default]
  Relative,
}

/// Answer used for a dangerous link when nobody can be asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DangerousDefault {
  Include,
  #[default]
  Exclude,
}

impl DangerousDefault {
  pub fn include(self) -> bool {
    matches!(self, Self::Include)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
  /// React to filesystem changes in `watch`.
  pub watch_workspace: bool,
  /// Keep generated service files listed (active) in `.gitignore`.
  pub gitignore_service_files: bool,
  /// Keep created symlinks listed (active) in `.gitignore`.
  pub gitignore_symlinks: bool,
  /// Hide generated service files in the editor.
  pub hide_service_files: bool,
  /// Hide declaration files in the editor.
  pub hide_declarations: bool,
  pub script_generation: ScriptGeneration,
  pub link_mode: LinkMode,
  pub diff_mode: DiffMode,
  /// Apply the diff directly whenever the desired state changes.
  pub continuous_mode: bool,
  /// Never prompt; every question takes its default answer.
  pub silent: bool,
  pub silent_default: DangerousDefault,
  /// Project root override, relative to the settings file's directory.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub project_root: Option<PathBuf>,
  pub max_log_entries: usize,
  /// Directory globs never scanned for declarations or links.
  pub exclude: Vec<String>,
  /// Source globs (in `@`-form) that need confirmation before linking.
  pub dangerous_sources: Vec<String>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      watch_workspace: true,
      gitignore_service_files: true,
      gitignore_symlinks: true,
      hide_service_files: false,
      hide_declarations: false,
      script_generation: ScriptGeneration::default(),
      link_mode: LinkMode::default(),
      diff_mode: DiffMode::default(),
      continuous_mode: false,
      silent: false,
      silent_default: DangerousDefault::default(),
      project_root: None,
      max_log_entries: 1000,
      exclude: ["node_modules", "target", "dist", "build", "out"]
        .into_iter()
        .map(String::from)
        .collect(),
      dangerous_sources: ["@.vscode/**", "@*.code-workspace", "@.git/**", "@.idea/**"]
        .into_iter()
        .map(String::from)
        .collect(),
    }
  }
}

/// Errors that can occur when loading settings or resolving the root.
#[derive(Debug, Error)]
pub enum SettingsError {
  #[error("failed to read settings {}: {source}", path.display())]
  Read { path: PathBuf, source: io::Error },

  #[error("failed to parse settings {}: {source}", path.display())]
  Parse { path: PathBuf, source: serde_json::Error },

  #[error("failed to serialize settings: {0}")]
  Serialize(#[source] serde_json::Error),

  #[error("failed to write settings {}: {source}", path.display())]
  Write { path: PathBuf, source: io::Error },

  #[error("no project root could be resolved: {} is not a directory", .0.display())]
  NoProjectRoot(PathBuf),
}

impl Settings {
  /// Path of the settings file for a project root.
  pub fn path(root: &Path) -> PathBuf {
    root.join(SETTINGS_FILENAME)
  }

  /// Load settings for `root`, falling back to defaults when absent.
  pub fn load(root: &Path) -> Result<Self, SettingsError> {
    let path = Self::path(root);
    let content = read_optional(&path).map_err(|source| SettingsError::Read {
      path: path.clone(),
      source,
    })?;

    match content {
      Some(content) => serde_json::from_str(&content).map_err(|source| SettingsError::Parse { path, source }),
      None => {
        debug!(path = %path.display(), "no settings file, using defaults");
        Ok(Self::default())
      }
    }
  }

  pub fn save(&self, root: &Path) -> Result<PathBuf, SettingsError> {
    let path = Self::path(root);
    let mut content = serde_json::to_string_pretty(self).map_err(SettingsError::Serialize)?;
    content.push('\n');
    write_atomic(&path, content.as_bytes()).map_err(|source| SettingsError::Write {
      path: path.clone(),
      source,
    })?;
    Ok(path)
  }

  /// Overwrite the settings file in `dir` with defaults.
  ///
  /// A `projectRoot` pin survives the reset.
  pub fn reset(dir: &Path) -> Result<PathBuf, SettingsError> {
    let project_root = Self::load(dir).ok().and_then(|s| s.project_root);
    Self {
      project_root,
      ..Self::default()
    }
    .save(dir)
  }

  /// Script dialects for this host.
  pub fn script_targets(&self) -> Vec<TargetOs> {
    self.script_generation.targets(TargetOs::current())
  }
}

/// Where a project lives and which settings file configures it.
///
/// The two directories differ when a settings file pins `projectRoot`
/// somewhere else: that file keeps applying to the pinned root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLocation {
  pub root: PathBuf,
  /// Directory holding the settings file that applies to `root`.
  pub settings_dir: PathBuf,
}

impl ProjectLocation {
  /// A project configured by the settings file in its own root.
  pub fn at(root: PathBuf) -> Self {
    Self {
      settings_dir: root.clone(),
      root,
    }
  }

  pub fn settings_path(&self) -> PathBuf {
    Settings::path(&self.settings_dir)
  }

  pub fn load_settings(&self) -> Result<Settings, SettingsError> {
    Settings::load(&self.settings_dir)
  }
}

/// Resolve the project root and its settings file.
///
/// Precedence: explicit `flag`, then the `SYMCONF_ROOT` environment
/// variable, then the nearest ancestor of `cwd` holding a settings file, a
/// `next.symlink-config.json` or a `.git` directory, and finally `cwd`
/// itself. A discovered settings file may redirect the root with
/// `projectRoot` and still configures it.
///
/// Both directories are canonicalized.
pub fn resolve_project(flag: Option<&Path>, cwd: &Path) -> Result<ProjectLocation, SettingsError> {
  let candidate = if let Some(flag) = flag {
    ProjectLocation::at(cwd.join(flag))
  } else if let Some(env_root) = std::env::var_os(ROOT_ENV_VAR).filter(|v| !v.is_empty()) {
    ProjectLocation::at(cwd.join(env_root))
  } else {
    discover_project(cwd)?
  };

  if !candidate.root.is_dir() {
    return Err(SettingsError::NoProjectRoot(candidate.root));
  }
  let canonical = |path: PathBuf| dunce::canonicalize(&path).unwrap_or(path);
  Ok(ProjectLocation {
    root: canonical(candidate.root),
    settings_dir: canonical(candidate.settings_dir),
  })
}

fn discover_project(cwd: &Path) -> Result<ProjectLocation, SettingsError> {
  for dir in cwd.ancestors() {
    if dir.join(SETTINGS_FILENAME).is_file() {
      let settings = Settings::load(dir)?;
      return Ok(match settings.project_root {
        Some(root) => ProjectLocation {
          root: dir.join(root),
          settings_dir: dir.to_path_buf(),
        },
        None => ProjectLocation::at(dir.to_path_buf()),
      });
    }
    if dir.join(NEXT_FILENAME).is_file() || dir.join(".git").exists() {
      return Ok(ProjectLocation::at(dir.to_path_buf()));
    }
  }
  Ok(ProjectLocation::at(cwd.to_path_buf()))
}
