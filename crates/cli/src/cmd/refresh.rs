//! Implementation of the `symconf refresh` command.

use anyhow::{Result, bail};

use symconf_lib::reconcile::Convergence;

use super::GlobalArgs;
use crate::output::{OutputFormat, print_json, print_stat, print_success, print_warning};

/// Recompute every artifact once, writing only what changed.
pub fn cmd_refresh(global: &GlobalArgs, output: OutputFormat) -> Result<()> {
  let ctx = global.load_context()?;
  let mut convergence = Convergence::new()?;
  let report = convergence.refresh_all(&ctx)?;

  if output.is_json() {
    print_json(&report)?;
  } else {
    let changed = report.outcomes.iter().filter(|(_, o)| o.changed()).count();
    print_success(&format!("Refreshed, {changed} file(s) updated"));
    for (artifact, outcome) in &report.outcomes {
      print_stat(&artifact.to_string(), &outcome.to_string());
    }
    for (artifact, error) in &report.errors {
      print_warning(&format!("Failed to update {artifact}: {error}"));
    }
  }

  if !report.is_success() {
    bail!("{} artifact(s) could not be updated", report.errors.len());
  }
  Ok(())
}
