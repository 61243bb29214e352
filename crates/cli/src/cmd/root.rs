//! Implementation of the `symconf root` and `symconf reset-settings` commands.

use std::path::Path;

use anyhow::{Context, Result, bail};

use symconf_lib::settings::Settings;

use super::GlobalArgs;
use crate::output::{print_info, print_success};
use crate::prompts::confirm;

/// Print the resolved project root, or pin `path` as the project root in
/// the settings file of the current directory.
pub fn cmd_root(global: &GlobalArgs, path: Option<&Path>) -> Result<()> {
  let Some(path) = path else {
    let location = global.resolve_project()?;
    println!("{}", location.root.display());
    return Ok(());
  };

  let cwd = std::env::current_dir().context("Failed to read current directory")?;
  let resolved = cwd.join(path);
  if !resolved.is_dir() {
    bail!("{} is not a directory", resolved.display());
  }

  let mut settings = Settings::load(&cwd)?;
  settings.project_root = Some(path.to_path_buf());
  let saved = settings.save(&cwd)?;

  let root = dunce::canonicalize(&resolved).unwrap_or(resolved);
  print_success(&format!("Project root set to {}", root.display()));
  print_info(&format!("Saved in {}", saved.display()));
  Ok(())
}

pub fn cmd_reset_settings(global: &GlobalArgs, force: bool) -> Result<()> {
  let location = global.resolve_project()?;
  let path = location.settings_path();

  if !confirm(&format!("Overwrite {} with defaults?", path.display()), force)? {
    print_info("Aborted");
    return Ok(());
  }

  Settings::reset(&location.settings_dir).context("Failed to reset settings")?;
  print_success(&format!("Settings reset: {}", path.display()));
  Ok(())
}
