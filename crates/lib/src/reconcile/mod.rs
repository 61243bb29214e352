//! The convergence loop.
//!
//! Each derived artifact is either consistent with its inputs or stale.
//! Reconciling an artifact recomputes its desired content from scratch and
//! compares it with what is persisted; only a difference causes a write.
//! That comparison is what stops the loop from chasing its own tail when
//! the watcher reports a file the loop just wrote.
//!
//! When an artifact changes, the artifacts computed from it (see
//! [`ArtifactGraph`]) are reconciled too, in topological order.

mod artifacts;
mod graph;

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::context::AppContext;
use crate::editor::EditorSettingsError;
use crate::gitignore::GitignoreError;
use crate::log::LogLevel;
use crate::manifest::DocumentError;
use crate::script::ScriptError;
use crate::util::hash::{ContentHash, HashError, Hashable};

pub use artifacts::{CurrentArtifact, EditorExclusionsArtifact, GitignoreArtifact, NextArtifact, ScriptsArtifact};
pub use graph::{ArtifactGraph, ArtifactId};

#[derive(Debug, Error)]
pub enum ReconcileError {
  #[error(transparent)]
  Document(#[from] DocumentError),

  #[error(transparent)]
  Gitignore(#[from] GitignoreError),

  #[error(transparent)]
  EditorSettings(#[from] EditorSettingsError),

  #[error(transparent)]
  Script(#[from] ScriptError),

  #[error("failed to hash artifact content: {0}")]
  Hash(#[source] HashError),

  #[error("artifact dependency cycle detected")]
  CycleDetected,
}

/// Something the convergence loop keeps consistent with its inputs.
pub trait Artifact {
  type Content: PartialEq + Hashable;

  fn id(&self) -> ArtifactId;

  /// What is persisted right now, `None` if nothing is.
  fn read(&self, ctx: &AppContext) -> Result<Option<Self::Content>, ReconcileError>;

  /// What should be persisted, recomputed from fresh inputs. `None` means
  /// nothing needs to exist.
  fn compute_desired(&self, ctx: &AppContext) -> Result<Option<Self::Content>, ReconcileError>;

  fn write(&self, ctx: &AppContext, content: &Self::Content) -> Result<(), ReconcileError>;

  fn is_stale(&self, persisted: &Self::Content, desired: &Self::Content) -> bool {
    persisted != desired
  }
}

/// Result of reconciling one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
  /// Persisted content already matched.
  Unchanged,
  /// Nothing was persisted before.
  Created,
  /// Inputs changed and the artifact followed.
  Updated,
  /// A machine-owned artifact had been edited by hand and was overwritten.
  DriftCorrected,
}

impl Outcome {
  pub fn changed(self) -> bool {
    !matches!(self, Self::Unchanged)
  }
}

impl fmt::Display for Outcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = match self {
      Self::Unchanged => "unchanged",
      Self::Created => "created",
      Self::Updated => "updated",
      Self::DriftCorrected => "drift corrected",
    };
    f.write_str(text)
  }
}

/// Hashes of the content the loop last wrote or confirmed, per artifact.
pub type WriteMemory = HashMap<ArtifactId, ContentHash>;

/// Bring one artifact in line with its inputs.
///
/// A machine-owned artifact whose persisted content matches neither what
/// the loop last wrote nor what it should be was edited by someone else; it
/// is overwritten and reported as [`Outcome::DriftCorrected`]. An unreadable
/// machine-owned document counts as drift too.
pub fn reconcile<A: Artifact>(artifact: &A, ctx: &AppContext, memory: &mut WriteMemory) -> Result<Outcome, ReconcileError> {
  let id = artifact.id();

  let (persisted, unreadable) = match artifact.read(ctx) {
    Ok(persisted) => (persisted, false),
    Err(e) if id.machine_owned() => {
      warn!(artifact = %id, error = %e, "persisted artifact unreadable");
      (None, true)
    }
    Err(e) => return Err(e),
  };

  let Some(desired) = artifact.compute_desired(ctx)? else {
    debug!(artifact = %id, "nothing to persist");
    return Ok(Outcome::Unchanged);
  };
  let desired_hash = desired.compute_hash().map_err(ReconcileError::Hash)?;

  if let Some(persisted) = &persisted
    && !artifact.is_stale(persisted, &desired)
  {
    debug!(artifact = %id, hash = desired_hash.short(), "artifact consistent");
    memory.insert(id, desired_hash);
    return Ok(Outcome::Unchanged);
  }

  let drifted = unreadable
    || match (&persisted, memory.get(&id)) {
      (Some(persisted), Some(remembered)) if id.machine_owned() => {
        persisted.compute_hash().map_err(ReconcileError::Hash)? != *remembered
      }
      _ => false,
    };

  artifact.write(ctx, &desired)?;
  memory.insert(id, desired_hash);

  let outcome = if drifted {
    Outcome::DriftCorrected
  } else if persisted.is_none() {
    Outcome::Created
  } else {
    Outcome::Updated
  };

  match outcome {
    Outcome::DriftCorrected => ctx.record(
      LogLevel::Warn,
      format!("{id} was modified outside {} and has been regenerated", crate::consts::APP_NAME),
    ),
    _ => ctx.record(LogLevel::Info, format!("{id} {outcome}")),
  }
  Ok(outcome)
}

/// Per-artifact results of one pass.
#[derive(Debug, Default, Serialize)]
pub struct PassReport {
  pub outcomes: Vec<(ArtifactId, Outcome)>,
  pub errors: Vec<(ArtifactId, String)>,
}

impl PassReport {
  pub fn outcome(&self, id: ArtifactId) -> Option<Outcome> {
    self.outcomes.iter().find(|(x, _)| *x == id).map(|(_, o)| *o)
  }

  pub fn changed(&self, id: ArtifactId) -> bool {
    self.outcome(id).is_some_and(Outcome::changed)
  }

  pub fn is_success(&self) -> bool {
    self.errors.is_empty()
  }
}

/// Drives reconciliation passes over the artifact graph.
///
/// Holds the write memory across passes so drift can be told apart from
/// input changes.
pub struct Convergence {
  graph: ArtifactGraph,
  memory: WriteMemory,
}

impl Convergence {
  pub fn new() -> Result<Self, ReconcileError> {
    Ok(Self {
      graph: ArtifactGraph::new()?,
      memory: WriteMemory::new(),
    })
  }

  pub fn graph(&self) -> &ArtifactGraph {
    &self.graph
  }

  /// Reconcile everything.
  pub fn refresh_all(&mut self, ctx: &AppContext) -> Result<PassReport, ReconcileError> {
    self.run(ctx, ArtifactId::ALL)
  }

  /// Reconcile the `stale` artifacts and, transitively, whatever depends on
  /// an artifact that changed.
  ///
  /// A failing artifact is recorded and does not stop the others; its
  /// dependents are still reconciled against whatever is persisted.
  pub fn run(
    &mut self,
    ctx: &AppContext,
    stale: impl IntoIterator<Item = ArtifactId>,
  ) -> Result<PassReport, ReconcileError> {
    let mut stale: BTreeSet<ArtifactId> = stale.into_iter().collect();
    let mut report = PassReport::default();

    for id in self.graph.topological_order()? {
      if !stale.remove(&id) {
        continue;
      }
      match self.reconcile_one(ctx, id) {
        Ok(outcome) => {
          if outcome.changed() {
            stale.extend(self.graph.dependents(id));
          }
          report.outcomes.push((id, outcome));
        }
        Err(e) => {
          ctx.record(LogLevel::Error, format!("failed to update {id}: {e}"));
          report.errors.push((id, e.to_string()));
        }
      }
    }

    ctx.save_log();
    Ok(report)
  }

  fn reconcile_one(&mut self, ctx: &AppContext, id: ArtifactId) -> Result<Outcome, ReconcileError> {
    match id {
      ArtifactId::Next => reconcile(&NextArtifact, ctx, &mut self.memory),
      ArtifactId::Current => reconcile(&CurrentArtifact, ctx, &mut self.memory),
      ArtifactId::Gitignore => reconcile(&GitignoreArtifact, ctx, &mut self.memory),
      ArtifactId::EditorExclusions => reconcile(&EditorExclusionsArtifact, ctx, &mut self.memory),
      ArtifactId::Scripts => reconcile(&ScriptsArtifact, ctx, &mut self.memory),
    }
  }
}
