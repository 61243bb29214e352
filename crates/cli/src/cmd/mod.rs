mod apply;
mod link;
mod plan;
mod refresh;
mod root;
mod run;
mod status;
mod watch;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use symconf_lib::context::AppContext;
use symconf_lib::settings::{ProjectLocation, resolve_project};

use crate::prompts::TerminalPrompter;

pub use apply::{MethodArg, cmd_apply, cmd_clean};
pub use link::cmd_link;
pub use plan::cmd_plan;
pub use refresh::cmd_refresh;
pub use root::{cmd_reset_settings, cmd_root};
pub use run::{ScriptArg, cmd_run};
pub use status::cmd_status;
pub use watch::cmd_watch;

/// Options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
  pub root: Option<PathBuf>,
  pub silent: bool,
  pub verbose: bool,
}

impl GlobalArgs {
  /// The project root and the settings file that applies to it.
  pub fn resolve_project(&self) -> Result<ProjectLocation> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(resolve_project(self.root.as_deref(), &cwd)?)
  }

  /// Resolve the project and load its settings and log.
  pub fn load_context(&self) -> Result<AppContext> {
    let location = self.resolve_project()?;
    load_context_at(location, self.silent)
  }
}

fn load_context_at(location: ProjectLocation, silent: bool) -> Result<AppContext> {
  let ctx = AppContext::load(location, Box::new(TerminalPrompter))
    .context("Failed to load project settings")?
    .with_force_silent(silent);
  Ok(ctx)
}

/// `path` relative to `root` for display, or as is when outside.
pub fn display_relative(path: &Path, root: &Path) -> String {
  path.strip_prefix(root).unwrap_or(path).display().to_string()
}
