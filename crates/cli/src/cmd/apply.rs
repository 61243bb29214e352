//! Implementation of the `symconf apply` and `symconf clean` commands.

use anyhow::{Context, Result, bail};
use clap::ValueEnum;

use symconf_lib::context::AppContext;
use symconf_lib::execute::{ApplyMethod, ApplyResult, apply, clean};
use symconf_lib::reconcile::Convergence;

use super::GlobalArgs;
use crate::output::{OutputFormat, print_info, print_json, print_operation, print_stat, print_success, print_warning};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MethodArg {
  /// Change links in-process
  Direct,
  /// Only generate the apply/clean scripts
  Scripts,
}

impl From<MethodArg> for ApplyMethod {
  fn from(arg: MethodArg) -> Self {
    match arg {
      MethodArg::Direct => ApplyMethod::Direct,
      MethodArg::Scripts => ApplyMethod::Scripts,
    }
  }
}

/// Execute the apply command.
pub fn cmd_apply(global: &GlobalArgs, method: Option<MethodArg>, output: OutputFormat) -> Result<()> {
  let ctx = global.load_context()?;
  let Some(method) = pick_method(&ctx, method, "apply") else {
    print_info("No method chosen, nothing done.");
    return Ok(());
  };

  let mut convergence = Convergence::new()?;
  let result = apply(&ctx, &mut convergence, method).context("Apply failed")?;
  report(&result, output, "Apply")
}

/// Execute the clean command.
pub fn cmd_clean(global: &GlobalArgs, method: Option<MethodArg>, output: OutputFormat) -> Result<()> {
  let ctx = global.load_context()?;
  let Some(method) = pick_method(&ctx, method, "clean") else {
    print_info("No method chosen, nothing done.");
    return Ok(());
  };

  let mut convergence = Convergence::new()?;
  let result = clean(&ctx, &mut convergence, method).context("Clean failed")?;
  report(&result, output, "Clean")
}

/// The method from the flag, or asked for. Silent mode defaults to direct.
fn pick_method(ctx: &AppContext, method: Option<MethodArg>, verb: &str) -> Option<ApplyMethod> {
  if let Some(method) = method {
    return Some(method.into());
  }
  let question = format!("How should symconf {verb} the links?");
  match ctx.choose(&question, &["Directly", "Generate scripts only"], 0)? {
    0 => Some(ApplyMethod::Direct),
    _ => Some(ApplyMethod::Scripts),
  }
}

fn report(result: &ApplyResult, output: OutputFormat, verb: &str) -> Result<()> {
  if output.is_json() {
    print_json(result)?;
  } else {
    for op in &result.operations {
      print_operation(op, false);
    }
    for op in &result.excluded {
      print_warning(&format!("Excluded dangerous link {}", op.target));
    }

    match &result.execution {
      Some(execution) => {
        if result.operations.is_empty() {
          print_success("Nothing to do, links are up to date.");
        } else {
          print_success(&format!("{verb} complete!"));
        }
        print_stat("Succeeded", &execution.success.to_string());
        print_stat("Skipped", &execution.skipped.to_string());
        print_stat("Failed", &execution.failed.to_string());
        for error in &execution.errors {
          print_warning(error);
        }
      }
      None => {
        print_success(&format!("{} operation(s) written to scripts", result.operations.len()));
        for script in &result.scripts {
          print_stat("Script", script);
        }
      }
    }

    for (artifact, error) in &result.refresh.errors {
      print_warning(&format!("Failed to update {artifact}: {error}"));
    }
  }

  if !result.is_success() {
    let failed = result.execution.as_ref().map_or(0, |e| e.failed);
    bail!("{verb} finished with {failed} failed operation(s)");
  }
  Ok(())
}
