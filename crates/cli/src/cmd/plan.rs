//! Implementation of the `symconf plan` command.
//!
//! Aggregates, snapshots and diffs without writing anything.

use anyhow::Result;
use serde::Serialize;

use symconf_lib::execute::Plan;
use symconf_lib::snapshot::Operation;

use super::GlobalArgs;
use crate::output::{OutputFormat, print_info, print_json, print_operation, print_stat};

pub fn cmd_plan(global: &GlobalArgs, output: OutputFormat) -> Result<()> {
  let ctx = global.load_context()?;
  let plan = Plan::compute(&ctx);
  let dangerous = plan.dangerous(&ctx);

  if output.is_json() {
    #[derive(Serialize)]
    struct PlanOutput<'a> {
      declared: usize,
      existing: usize,
      operations: &'a [Operation],
      dangerous: Vec<&'a Operation>,
    }

    print_json(&PlanOutput {
      declared: plan.next.len(),
      existing: plan.current.len(),
      operations: &plan.operations,
      dangerous,
    })?;
    return Ok(());
  }

  print_stat("Declared links", &plan.next.len().to_string());
  print_stat("Existing links", &plan.current.len().to_string());
  println!();

  if plan.is_empty() {
    print_info("No changes would be made");
    return Ok(());
  }

  for op in &plan.operations {
    print_operation(op, dangerous.contains(&op));
  }
  println!();
  print_info(&format!("Would apply {} operation(s)", plan.operations.len()));
  Ok(())
}
