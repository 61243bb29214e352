//! Bounded, persisted log of reconciliation outcomes.
//!
//! `tracing` output goes to the terminal and is gone; the buffer keeps the
//! last `maxLogEntries` outcomes per project so `status` can show what the
//! watcher did while nobody was looking. Each project gets one file under
//! the data directory, named after a hash of its root path.

use std::collections::VecDeque;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::platform::paths::logs_dir;
use crate::util::fs::{read_optional, write_atomic};
use crate::util::hash::hash_bytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
  Info,
  Warn,
  Error,
}

impl fmt::Display for LogLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Info => f.write_str("info"),
      Self::Warn => f.write_str("warn"),
      Self::Error => f.write_str("error"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
  /// Seconds since the Unix epoch.
  pub time: u64,
  pub level: LogLevel,
  pub message: String,
}

#[derive(Debug, Clone)]
pub struct LogBuffer {
  records: VecDeque<LogRecord>,
  capacity: usize,
  path: Option<PathBuf>,
}

impl LogBuffer {
  /// In-memory buffer that is never persisted.
  pub fn in_memory(capacity: usize) -> Self {
    Self {
      records: VecDeque::new(),
      capacity,
      path: None,
    }
  }

  /// Buffer for the project at `root`, preloaded from its log file.
  ///
  /// An unreadable log file is logged and replaced.
  pub fn for_project(root: &Path, capacity: usize) -> Self {
    let path = log_path(root);
    let mut buffer = Self {
      records: VecDeque::new(),
      capacity,
      path: Some(path.clone()),
    };

    match read_optional(&path) {
      Ok(Some(content)) => match serde_json::from_str::<Vec<LogRecord>>(&content) {
        Ok(records) => {
          for record in records {
            buffer.push_record(record);
          }
        }
        Err(e) => warn!(path = %path.display(), error = %e, "discarding malformed log file"),
      },
      Ok(None) => {}
      Err(e) => warn!(path = %path.display(), error = %e, "failed to read log file"),
    }
    buffer
  }

  pub fn push(&mut self, level: LogLevel, message: impl Into<String>) {
    let time = SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .map(|d| d.as_secs())
      .unwrap_or_default();
    self.push_record(LogRecord {
      time,
      level,
      message: message.into(),
    });
  }

  fn push_record(&mut self, record: LogRecord) {
    if self.capacity == 0 {
      return;
    }
    while self.records.len() >= self.capacity {
      self.records.pop_front();
    }
    self.records.push_back(record);
  }

  /// Oldest first.
  pub fn records(&self) -> impl Iterator<Item = &LogRecord> {
    self.records.iter()
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  /// Change the capacity, dropping the oldest records if needed.
  pub fn set_capacity(&mut self, capacity: usize) {
    self.capacity = capacity;
    while self.records.len() > capacity {
      self.records.pop_front();
    }
  }

  /// Write the buffer to its log file; a no-op for in-memory buffers.
  pub fn save(&self) -> io::Result<()> {
    let Some(path) = &self.path else {
      return Ok(());
    };
    let records: Vec<&LogRecord> = self.records.iter().collect();
    let content = serde_json::to_string_pretty(&records).map_err(io::Error::other)?;
    write_atomic(path, content.as_bytes())
  }
}

/// Log file for the project at `root`.
pub fn log_path(root: &Path) -> PathBuf {
  let hash = hash_bytes(root.to_string_lossy().as_bytes());
  logs_dir().join(format!("{}.json", hash.short()))
}
