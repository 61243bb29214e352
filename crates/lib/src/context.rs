//! Application context.
//!
//! Everything a reconciliation pass needs (project root, settings, a way
//! to ask the user, the outcome log) travels in one [`AppContext`] built at
//! startup and passed by reference.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, error, info, warn};

use crate::log::{LogBuffer, LogLevel, LogRecord};
use crate::prompt::Prompter;
use crate::script::DangerousSources;
use crate::settings::{ProjectLocation, Settings, SettingsError};
use crate::snapshot::Operation;
use crate::vpath::VirtualPath;
use crate::walk::ScanFilter;

pub struct AppContext {
  location: ProjectLocation,
  settings: Settings,
  /// Forces silent mode regardless of settings (`--silent`).
  force_silent: bool,
  prompter: Box<dyn Prompter>,
  log: Mutex<LogBuffer>,
  /// Answers given for dangerous links, by target, for the life of the process.
  decisions: Mutex<HashMap<VirtualPath, bool>>,
}

impl std::fmt::Debug for AppContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppContext")
      .field("location", &self.location)
      .field("settings", &self.settings)
      .field("force_silent", &self.force_silent)
      .finish_non_exhaustive()
  }
}

impl AppContext {
  pub fn new(location: ProjectLocation, settings: Settings, prompter: Box<dyn Prompter>, log: LogBuffer) -> Self {
    Self {
      location,
      settings,
      force_silent: false,
      prompter,
      log: Mutex::new(log),
      decisions: Mutex::new(HashMap::new()),
    }
  }

  /// Load the settings that apply to `location` and attach the project's
  /// persisted log.
  pub fn load(location: ProjectLocation, prompter: Box<dyn Prompter>) -> Result<Self, SettingsError> {
    let settings = location.load_settings()?;
    let log = LogBuffer::for_project(&location.root, settings.max_log_entries);
    info!(root = %location.root.display(), settings = %location.settings_path().display(), "loaded project");
    Ok(Self::new(location, settings, prompter, log))
  }

  pub fn with_force_silent(mut self, silent: bool) -> Self {
    self.force_silent = silent;
    self
  }

  pub fn root(&self) -> &Path {
    &self.location.root
  }

  /// The settings file this context reads, which need not live in the root.
  pub fn settings_path(&self) -> PathBuf {
    self.location.settings_path()
  }

  pub fn settings(&self) -> &Settings {
    &self.settings
  }

  /// Re-read the settings file. Returns whether anything changed.
  pub fn reload_settings(&mut self) -> Result<bool, SettingsError> {
    let settings = self.location.load_settings()?;
    if settings == self.settings {
      return Ok(false);
    }
    debug!("settings changed");
    self.lock_log().set_capacity(settings.max_log_entries);
    self.settings = settings;
    Ok(true)
  }

  pub fn silent(&self) -> bool {
    self.force_silent || self.settings.silent
  }

  pub fn scan_filter(&self) -> ScanFilter {
    ScanFilter::new(&self.settings.exclude)
  }

  pub fn dangerous_sources(&self) -> DangerousSources {
    DangerousSources::new(&self.settings.dangerous_sources)
  }

  /// Ask whether a dangerous link may be created.
  ///
  /// Silent mode answers with `silentDefault`. Answers are remembered per
  /// target; a dismissed prompt excludes the link and is not remembered.
  pub fn allow_dangerous(&self, op: &Operation) -> bool {
    if self.silent() {
      return self.settings.silent_default.include();
    }
    if let Some(&answer) = self.lock_decisions().get(&op.target) {
      return answer;
    }

    let source = op.source.as_ref().map(ToString::to_string).unwrap_or_default();
    let question = format!(
      "{} links to {}, which looks like editor or repository internals. Include it?",
      op.target, source
    );
    match self.prompter.confirm(&question) {
      Some(answer) => {
        self.lock_decisions().insert(op.target.clone(), answer);
        answer
      }
      None => false,
    }
  }

  /// Yes/no question; silent mode answers `default`, dismissal answers `None`.
  pub fn confirm(&self, question: &str, default: bool) -> Option<bool> {
    if self.silent() {
      return Some(default);
    }
    self.prompter.confirm(question)
  }

  /// Multiple choice; silent mode picks `default`, dismissal answers `None`.
  pub fn choose(&self, question: &str, options: &[&str], default: usize) -> Option<usize> {
    if self.silent() {
      return Some(default);
    }
    self.prompter.choose(question, options)
  }

  /// Record an outcome in the log buffer and in `tracing`.
  pub fn record(&self, level: LogLevel, message: impl Into<String>) {
    let message = message.into();
    match level {
      LogLevel::Info => info!("{message}"),
      LogLevel::Warn => warn!("{message}"),
      LogLevel::Error => error!("{message}"),
    }
    self.lock_log().push(level, message);
  }

  pub fn log_records(&self) -> Vec<LogRecord> {
    self.lock_log().records().cloned().collect()
  }

  /// Persist the log buffer; failures are logged, never fatal.
  pub fn save_log(&self) {
    if let Err(e) = self.lock_log().save() {
      warn!(error = %e, "failed to save log");
    }
  }

  fn lock_log(&self) -> std::sync::MutexGuard<'_, LogBuffer> {
    self.log.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn lock_decisions(&self) -> std::sync::MutexGuard<'_, HashMap<VirtualPath, bool>> {
    self.decisions.lock().unwrap_or_else(PoisonError::into_inner)
  }
}
