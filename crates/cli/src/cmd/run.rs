//! Implementation of the `symconf run` command.
//!
//! Regenerates the scripts, runs the host's dialect from the project root,
//! then re-observes the links it changed. An elevated run on Windows is
//! relaunched in its own window and not waited for, so the links are left
//! for `symconf refresh` to pick up.

use std::process::Command;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use tracing::debug;

use symconf_lib::consts::ADMIN_SCRIPT_FILENAME;
use symconf_lib::platform::TargetOs;
use symconf_lib::reconcile::{ArtifactId, Convergence};
use symconf_lib::script::{ScriptDialect, ScriptKind, script_file_name};

use super::GlobalArgs;
use crate::output::{print_info, print_success, print_warning};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ScriptArg {
  Apply,
  Clean,
}

impl From<ScriptArg> for ScriptKind {
  fn from(arg: ScriptArg) -> Self {
    match arg {
      ScriptArg::Apply => ScriptKind::Apply,
      ScriptArg::Clean => ScriptKind::Clean,
    }
  }
}

/// Whether the spawned process finishes only after the script does.
///
/// The admin relauncher hands the script to an elevated window and exits.
fn waits_for_script(dialect: ScriptDialect, elevated: bool) -> bool {
  !(elevated && dialect == ScriptDialect::Batch)
}

pub fn cmd_run(global: &GlobalArgs, script: ScriptArg, elevated: bool) -> Result<()> {
  let ctx = global.load_context()?;
  let root = ctx.root();
  let mut convergence = Convergence::new()?;
  convergence.run(&ctx, [ArtifactId::Next, ArtifactId::Current, ArtifactId::Scripts])?;

  let dialect = ScriptDialect::for_os(TargetOs::current());
  let name = script_file_name(script.into(), dialect);
  let path = root.join(&name);
  if !path.is_file() {
    bail!("{name} was not generated; check the scriptGeneration setting");
  }

  let mut command = match dialect {
    ScriptDialect::Shell => {
      if elevated {
        print_warning("--elevated only applies on Windows, running normally");
      }
      let mut command = Command::new("sh");
      command.arg(&path);
      command
    }
    ScriptDialect::Batch if elevated => {
      let mut command = Command::new("cmd");
      command.arg("/C").arg(root.join(ADMIN_SCRIPT_FILENAME)).arg(&name);
      command
    }
    ScriptDialect::Batch => {
      let mut command = Command::new("cmd");
      command.arg("/C").arg(&path);
      command
    }
  };

  debug!(?command, "running script");
  let status = command
    .current_dir(root)
    .status()
    .with_context(|| format!("Failed to run {name}"))?;

  if !status.success() {
    bail!("{name} exited with {status}");
  }

  if waits_for_script(dialect, elevated) {
    convergence.run(&ctx, [ArtifactId::Current])?;
    print_success(&format!("Ran {name}"));
  } else {
    print_success(&format!("Launched {name} elevated"));
    print_info("It runs in its own window; run `symconf refresh` once it finishes");
  }
  Ok(())
}
