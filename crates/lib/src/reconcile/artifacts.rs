//! The five artifacts and how each is read, derived and written.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::aggregate::aggregate;
use crate::consts::{CURRENT_FILENAME, NEXT_FILENAME};
use crate::context::AppContext;
use crate::editor::{exclusion_patterns, merge_exclusions, read_editor_settings, write_editor_settings};
use crate::gitignore::{
  GitignoreEntries, GitignoreError, apply_managed, gitignore_path, managed_patterns, read_gitignore, write_gitignore,
};
use crate::manifest::{LinkDocument, read_document, write_document};
use crate::script::{read_script, render_all, script_file_names, write_script};
use crate::snapshot::{compute_diff, snapshot, teardown_operations};
use crate::util::fs::read_optional;

use super::{Artifact, ArtifactId, ReconcileError};

/// Persisted next document, or an empty one.
pub(crate) fn persisted_next(ctx: &AppContext) -> Result<LinkDocument, ReconcileError> {
  Ok(read_document(&ctx.root().join(NEXT_FILENAME))?.unwrap_or_default())
}

/// Persisted current document, or an empty one.
pub(crate) fn persisted_current(ctx: &AppContext) -> Result<LinkDocument, ReconcileError> {
  Ok(read_document(&ctx.root().join(CURRENT_FILENAME))?.unwrap_or_default())
}

/// `next.symlink-config.json`, aggregated from every declaration.
pub struct NextArtifact;

impl Artifact for NextArtifact {
  type Content = LinkDocument;

  fn id(&self) -> ArtifactId {
    ArtifactId::Next
  }

  fn read(&self, ctx: &AppContext) -> Result<Option<LinkDocument>, ReconcileError> {
    Ok(read_document(&ctx.root().join(NEXT_FILENAME))?)
  }

  fn compute_desired(&self, ctx: &AppContext) -> Result<Option<LinkDocument>, ReconcileError> {
    Ok(Some(aggregate(ctx.root(), &ctx.scan_filter())))
  }

  fn write(&self, ctx: &AppContext, content: &LinkDocument) -> Result<(), ReconcileError> {
    Ok(write_document(&ctx.root().join(NEXT_FILENAME), content)?)
  }
}

/// `current.symlink-config.json`, a snapshot of the links that exist.
pub struct CurrentArtifact;

impl Artifact for CurrentArtifact {
  type Content = LinkDocument;

  fn id(&self) -> ArtifactId {
    ArtifactId::Current
  }

  fn read(&self, ctx: &AppContext) -> Result<Option<LinkDocument>, ReconcileError> {
    Ok(read_document(&ctx.root().join(CURRENT_FILENAME))?)
  }

  fn compute_desired(&self, ctx: &AppContext) -> Result<Option<LinkDocument>, ReconcileError> {
    Ok(Some(snapshot(ctx.root(), &ctx.scan_filter())))
  }

  fn write(&self, ctx: &AppContext, content: &LinkDocument) -> Result<(), ReconcileError> {
    Ok(write_document(&ctx.root().join(CURRENT_FILENAME), content)?)
  }
}

/// Managed entries of the root `.gitignore`.
///
/// Content is the whole file; only managed patterns are ever toggled or
/// appended, everything else passes through unchanged.
pub struct GitignoreArtifact;

impl Artifact for GitignoreArtifact {
  type Content = String;

  fn id(&self) -> ArtifactId {
    ArtifactId::Gitignore
  }

  fn read(&self, ctx: &AppContext) -> Result<Option<String>, ReconcileError> {
    let path = gitignore_path(ctx.root());
    Ok(read_optional(&path).map_err(|source| GitignoreError::Read { path, source })?)
  }

  fn compute_desired(&self, ctx: &AppContext) -> Result<Option<String>, ReconcileError> {
    let mut entries = read_gitignore(ctx.root())?;
    let current = persisted_current(ctx)?;
    apply_managed(&mut entries, &managed_patterns(ctx.settings(), &current));
    Ok(Some(entries.assemble()))
  }

  fn write(&self, ctx: &AppContext, content: &String) -> Result<(), ReconcileError> {
    Ok(write_gitignore(ctx.root(), &GitignoreEntries::parse(content))?)
  }
}

/// Managed `files.exclude` keys in the editor settings.
pub struct EditorExclusionsArtifact;

impl Artifact for EditorExclusionsArtifact {
  type Content = Value;

  fn id(&self) -> ArtifactId {
    ArtifactId::EditorExclusions
  }

  fn read(&self, ctx: &AppContext) -> Result<Option<Value>, ReconcileError> {
    Ok(read_editor_settings(ctx.root())?)
  }

  fn compute_desired(&self, ctx: &AppContext) -> Result<Option<Value>, ReconcileError> {
    let doc = read_editor_settings(ctx.root())?;
    Ok(merge_exclusions(ctx.root(), doc, &exclusion_patterns(ctx.settings()))?)
  }

  fn write(&self, ctx: &AppContext, content: &Value) -> Result<(), ReconcileError> {
    Ok(write_editor_settings(ctx.root(), content)?)
  }
}

/// Apply and clean scripts for every configured dialect, keyed by file name.
///
/// The apply script carries the diff between the persisted next and current
/// documents, less dangerous links nobody approved. The clean script removes
/// every declared link.
pub struct ScriptsArtifact;

impl Artifact for ScriptsArtifact {
  type Content = BTreeMap<String, String>;

  fn id(&self) -> ArtifactId {
    ArtifactId::Scripts
  }

  fn read(&self, ctx: &AppContext) -> Result<Option<Self::Content>, ReconcileError> {
    let mut scripts = BTreeMap::new();
    for name in script_file_names(&ctx.settings().script_targets()) {
      if let Some(content) = read_script(ctx.root(), &name)? {
        scripts.insert(name, content);
      }
    }
    Ok((!scripts.is_empty()).then_some(scripts))
  }

  fn compute_desired(&self, ctx: &AppContext) -> Result<Option<Self::Content>, ReconcileError> {
    let settings = ctx.settings();
    let next = persisted_next(ctx)?;
    let current = persisted_current(ctx)?;

    let apply_ops = ctx
      .dangerous_sources()
      .filter(compute_diff(&next, &current, settings.diff_mode), |op| ctx.allow_dangerous(op));
    let clean_ops = teardown_operations(&next);

    Ok(Some(render_all(
      &apply_ops,
      &clean_ops,
      &settings.script_targets(),
      settings.link_mode,
    )))
  }

  fn write(&self, ctx: &AppContext, content: &Self::Content) -> Result<(), ReconcileError> {
    for (name, script) in content {
      write_script(ctx.root(), name, script)?;
    }
    Ok(())
  }
}
