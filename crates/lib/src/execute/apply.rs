//! Apply and clean orchestration.
//!
//! An apply run:
//!
//! 1. Refresh the next and current documents
//! 2. Diff them in the configured mode
//! 3. Drop dangerous links nobody approved
//! 4. Execute directly, or leave it to the generated scripts
//! 5. Re-snapshot, which cascades into gitignore and scripts
//!
//! Clean is the same run with the clean operation set: every existing link
//! that the project declares is deleted, links it does not declare stay.

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::aggregate::aggregate;
use crate::context::AppContext;
use crate::log::LogLevel;
use crate::manifest::LinkDocument;
use crate::reconcile::{ArtifactId, Convergence, PassReport, ReconcileError};
use crate::script::script_file_names;
use crate::snapshot::{Operation, clean_operations, compute_diff, snapshot};

use super::direct::execute_operations;
use super::types::{ExecuteError, ExecutionReport};

/// How operations reach the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyMethod {
  /// Create and remove links in-process.
  #[default]
  Direct,
  /// Only (re)generate the scripts; running them is up to the user.
  Scripts,
}

#[derive(Debug, Error)]
pub enum ApplyError {
  #[error(transparent)]
  Reconcile(#[from] ReconcileError),

  #[error(transparent)]
  Execute(#[from] ExecuteError),

  /// A document the run depends on could not be refreshed.
  #[error("failed to refresh {artifact}: {message}")]
  Refresh { artifact: ArtifactId, message: String },
}

/// Desired and observed state plus the operations between them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Plan {
  #[serde(skip)]
  pub next: LinkDocument,
  #[serde(skip)]
  pub current: LinkDocument,
  pub operations: Vec<Operation>,
}

impl Plan {
  /// Aggregate and snapshot fresh from disk and diff them. Nothing is
  /// written.
  pub fn compute(ctx: &AppContext) -> Self {
    let filter = ctx.scan_filter();
    let next = aggregate(ctx.root(), &filter);
    let current = snapshot(ctx.root(), &filter);
    let operations = compute_diff(&next, &current, ctx.settings().diff_mode);
    Self {
      next,
      current,
      operations,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.operations.is_empty()
  }

  /// Operations whose source matches a dangerous pattern.
  pub fn dangerous(&self, ctx: &AppContext) -> Vec<&Operation> {
    let gate = ctx.dangerous_sources();
    self.operations.iter().filter(|op| gate.is_dangerous(op)).collect()
  }
}

/// What an apply or clean run did.
#[derive(Debug, Default, Serialize)]
pub struct ApplyResult {
  pub method: ApplyMethod,
  /// Operations that were executed or written to scripts.
  pub operations: Vec<Operation>,
  /// Dangerous creates that were left out.
  pub excluded: Vec<Operation>,
  /// Direct runs only.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub execution: Option<ExecutionReport>,
  /// Script runs only: the files the user should run.
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub scripts: Vec<String>,
  /// Artifacts refreshed after the run.
  pub refresh: PassReport,
}

impl ApplyResult {
  pub fn is_success(&self) -> bool {
    self.execution.as_ref().is_none_or(ExecutionReport::is_success) && self.refresh.is_success()
  }
}

/// Bring the links in line with the declarations.
pub fn apply(ctx: &AppContext, convergence: &mut Convergence, method: ApplyMethod) -> Result<ApplyResult, ApplyError> {
  info!(root = %ctx.root().display(), ?method, "starting apply");
  let plan = refreshed_plan(ctx, convergence)?;

  let gate = ctx.dangerous_sources();
  let (operations, excluded): (Vec<_>, Vec<_>) = plan
    .operations
    .into_iter()
    .partition(|op| !gate.is_dangerous(op) || ctx.allow_dangerous(op));
  for op in &excluded {
    ctx.record(LogLevel::Warn, format!("excluded dangerous link {op}"));
  }

  finish(ctx, convergence, method, operations, excluded)
}

/// Remove every existing link the project declares.
pub fn clean(ctx: &AppContext, convergence: &mut Convergence, method: ApplyMethod) -> Result<ApplyResult, ApplyError> {
  info!(root = %ctx.root().display(), ?method, "starting clean");
  let plan = refreshed_plan(ctx, convergence)?;
  let operations = clean_operations(&plan.next, &plan.current);
  finish(ctx, convergence, method, operations, Vec::new())
}

/// Persist fresh next and current documents and diff them.
fn refreshed_plan(ctx: &AppContext, convergence: &mut Convergence) -> Result<Plan, ApplyError> {
  let report = convergence.run(ctx, [ArtifactId::Next, ArtifactId::Current])?;
  if let Some((artifact, message)) = report
    .errors
    .into_iter()
    .find(|(id, _)| matches!(id, ArtifactId::Next | ArtifactId::Current))
  {
    return Err(ApplyError::Refresh { artifact, message });
  }
  Ok(Plan::compute(ctx))
}

fn finish(
  ctx: &AppContext,
  convergence: &mut Convergence,
  method: ApplyMethod,
  operations: Vec<Operation>,
  excluded: Vec<Operation>,
) -> Result<ApplyResult, ApplyError> {
  let mut result = ApplyResult {
    method,
    excluded,
    ..Default::default()
  };

  match method {
    ApplyMethod::Direct => {
      let report = execute_operations(&operations, ctx.root(), ctx.settings().link_mode)?;
      if !report.is_success() {
        for error in &report.errors {
          ctx.record(LogLevel::Error, error.clone());
        }
      }
      result.execution = Some(report);
      result.refresh = convergence.run(ctx, [ArtifactId::Current])?;
    }
    ApplyMethod::Scripts => {
      result.refresh = convergence.run(ctx, [ArtifactId::Scripts, ArtifactId::Gitignore])?;
      result.scripts = script_file_names(&ctx.settings().script_targets());
    }
  }

  result.operations = operations;
  Ok(result)
}
