//! Implementation of the `symconf watch` command.

use anyhow::{Context, Result};
use tracing::warn;

use symconf_lib::watch::watch;

use super::GlobalArgs;
use crate::output::{print_info, print_success};

/// Watch until Ctrl-C.
pub fn cmd_watch(global: &GlobalArgs) -> Result<()> {
  let ctx = global.load_context()?;
  print_info(&format!("Watching {} (Ctrl-C to stop)", ctx.root().display()));

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  rt.block_on(watch(ctx, async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      warn!(error = %e, "cannot listen for Ctrl-C");
      std::future::pending::<()>().await;
    }
  }))
  .context("Watch failed")?;

  print_success("Stopped watching");
  Ok(())
}
