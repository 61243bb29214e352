//! Status command implementation.
//!
//! Shows the project root, the settings that matter, link counts, pending
//! operations and the recent outcome log.

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use symconf_lib::consts::{CURRENT_FILENAME, NEXT_FILENAME};
use symconf_lib::execute::Plan;
use symconf_lib::log::LogRecord;
use symconf_lib::manifest::read_document;
use symconf_lib::settings::Settings;

use super::GlobalArgs;
use crate::output::{OutputFormat, print_info, print_json, print_log_record, print_stat, print_success};

/// Log records shown without `--verbose`.
const RECENT_RECORDS: usize = 10;

#[derive(Serialize)]
struct StatusOutput<'a> {
  root: PathBuf,
  settings: &'a Settings,
  /// Entries of the persisted next document, `None` before the first refresh.
  declared: Option<usize>,
  existing: Option<usize>,
  pending: usize,
  log: Vec<LogRecord>,
}

pub fn cmd_status(global: &GlobalArgs, output: OutputFormat) -> Result<()> {
  let ctx = global.load_context()?;
  let root = ctx.root();

  let declared = read_document(&root.join(NEXT_FILENAME))?.map(|d| d.len());
  let existing = read_document(&root.join(CURRENT_FILENAME))?.map(|d| d.len());
  let pending = Plan::compute(&ctx).operations.len();

  let mut log = ctx.log_records();
  if !global.verbose && log.len() > RECENT_RECORDS {
    log.drain(..log.len() - RECENT_RECORDS);
  }

  if output.is_json() {
    return print_json(&StatusOutput {
      root: root.to_path_buf(),
      settings: ctx.settings(),
      declared,
      existing,
      pending,
      log,
    });
  }

  let settings = ctx.settings();
  let count = |n: Option<usize>| n.map_or_else(|| "not generated".to_string(), |n| n.to_string());

  print_success(&format!("Project root: {}", root.display()));
  print_stat("Declared links", &count(declared));
  print_stat("Existing links", &count(existing));
  print_stat("Pending operations", &pending.to_string());
  println!();
  print_stat("Link mode", &setting_text(&settings.link_mode));
  print_stat("Diff mode", &setting_text(&settings.diff_mode));
  print_stat("Scripts", &setting_text(&settings.script_generation));
  print_stat("Continuous mode", &settings.continuous_mode.to_string());
  print_stat("Silent", &ctx.silent().to_string());

  println!();
  if log.is_empty() {
    print_info("No recorded activity");
  } else {
    println!("Recent activity:");
    for record in &log {
      print_log_record(record);
    }
  }
  Ok(())
}

/// A settings enum as it is spelled in the settings file.
fn setting_text<T: Serialize>(value: &T) -> String {
  match serde_json::to_value(value) {
    Ok(serde_json::Value::String(text)) => text,
    Ok(other) => other.to_string(),
    Err(_) => "?".to_string(),
  }
}
