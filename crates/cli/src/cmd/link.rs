//! Implementation of the `symconf link` command.

use std::path::Path;

use anyhow::{Context, Result, bail};

use symconf_lib::manifest::declare::add_link;
use symconf_lib::manifest::{DeclaredLink, LinkKind};
use symconf_lib::reconcile::{ArtifactId, Convergence};
use symconf_lib::vpath::{from_native, to_virtual};

use super::{GlobalArgs, display_relative};
use crate::output::{print_success, print_warning};

/// Add a link to the declaration of `dir` (default: current directory)
/// and refresh the next document.
///
/// The link kind follows the source: a directory source declares a
/// directory link.
pub fn cmd_link(global: &GlobalArgs, target: String, source: String, dir: Option<&Path>) -> Result<()> {
  let ctx = global.load_context()?;
  let root = ctx.root();

  let cwd = std::env::current_dir().context("Failed to read current directory")?;
  let dir = cwd.join(dir.unwrap_or(Path::new(".")));
  let dir = dunce::canonicalize(&dir).with_context(|| format!("Directory not found: {}", dir.display()))?;
  let Some(declaring) = from_native(&dir, root) else {
    bail!("{} is outside the project root {}", dir.display(), root.display());
  };

  let source_path = to_virtual(&source, &declaring).to_host_path(root);
  let kind = if source_path.is_dir() { LinkKind::Dir } else { LinkKind::File };
  if !source_path.exists() {
    print_warning(&format!(
      "Source {} does not exist yet, declaring a file link",
      source_path.display()
    ));
  }

  let link_target = to_virtual(&target, &declaring);
  let path = add_link(root, &declaring, DeclaredLink { target, source }, kind).context("Failed to update declaration")?;

  let mut convergence = Convergence::new()?;
  convergence.run(&ctx, [ArtifactId::Next])?;

  print_success(&format!(
    "Declared {kind} link {link_target} in {}",
    display_relative(&path, root)
  ));
  Ok(())
}
