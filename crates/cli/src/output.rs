//! CLI output formatting utilities.
//!
//! Colored status lines, operation listings and timestamps, all degrading
//! to plain text when the stream is not a terminal.

use std::time::{Duration, UNIX_EPOCH};

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

use symconf_lib::log::{LogLevel, LogRecord};
use symconf_lib::snapshot::Operation;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
  pub const ADD: &str = "+";
  pub const REMOVE: &str = "-";
}

/// RFC 3339 rendering of a Unix timestamp in seconds.
pub fn format_timestamp(secs: u64) -> String {
  humantime::format_rfc3339_seconds(UNIX_EPOCH + Duration::from_secs(secs)).to_string()
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_warning(message: &str) {
  eprintln!(
    "{} {}",
    symbols::WARNING.if_supports_color(Stream::Stderr, |s| s.yellow()),
    message.if_supports_color(Stream::Stderr, |s| s.yellow())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

/// One operation as `+ target → source` or `- target`.
pub fn print_operation(op: &Operation, dangerous: bool) {
  let kind = if op.is_directory { "dir" } else { "file" };
  let line = match &op.source {
    Some(source) if op.is_create() => format!("{} {} {} ({})", op.target, symbols::ARROW, source, kind),
    _ => format!("{} ({})", op.target, kind),
  };
  let marker = if op.is_create() {
    symbols::ADD.if_supports_color(Stream::Stdout, |s| s.green()).to_string()
  } else {
    symbols::REMOVE.if_supports_color(Stream::Stdout, |s| s.red()).to_string()
  };
  if dangerous {
    println!(
      "  {} {} {}",
      marker,
      line,
      "[dangerous]".if_supports_color(Stream::Stdout, |s| s.yellow())
    );
  } else {
    println!("  {} {}", marker, line);
  }
}

pub fn print_log_record(record: &LogRecord) {
  let level = match record.level {
    LogLevel::Info => symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()).to_string(),
    LogLevel::Warn => symbols::WARNING.if_supports_color(Stream::Stdout, |s| s.yellow()).to_string(),
    LogLevel::Error => symbols::ERROR.if_supports_color(Stream::Stdout, |s| s.red()).to_string(),
  };
  println!(
    "  {} {} {}",
    format_timestamp(record.time).if_supports_color(Stream::Stdout, |s| s.dimmed()),
    level,
    record.message
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_format_timestamp() {
    assert_eq!(format_timestamp(0), "1970-01-01T00:00:00Z");
    assert_eq!(format_timestamp(86_400 + 61), "1970-01-02T00:01:01Z");
  }

  #[test]
  fn test_output_format() {
    assert!(OutputFormat::Json.is_json());
    assert!(!OutputFormat::default().is_json());
  }
}
