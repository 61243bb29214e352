//! Static dependency graph between derived artifacts.
//!
//! An edge points from an input artifact to an artifact computed from it:
//!
//! ```text
//! Next ──────┐
//!            ├──> Scripts
//! Current ───┤
//!            └──> Gitignore
//!
//! EditorExclusions (settings only)
//! ```

use std::collections::HashMap;
use std::fmt;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use super::ReconcileError;

/// A derived artifact the convergence loop keeps consistent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactId {
  /// `next.symlink-config.json`
  Next,
  /// `current.symlink-config.json`
  Current,
  /// managed `.gitignore` entries
  Gitignore,
  /// managed `files.exclude` keys
  EditorExclusions,
  /// generated apply/clean scripts
  Scripts,
}

impl ArtifactId {
  pub const ALL: [ArtifactId; 5] = [
    Self::Next,
    Self::Current,
    Self::Gitignore,
    Self::EditorExclusions,
    Self::Scripts,
  ];

  /// Documents the system owns outright. Any other content found in them
  /// is drift.
  pub fn machine_owned(self) -> bool {
    matches!(self, Self::Next | Self::Current | Self::Scripts)
  }
}

impl fmt::Display for ArtifactId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Next => "next document",
      Self::Current => "current document",
      Self::Gitignore => "gitignore",
      Self::EditorExclusions => "editor exclusions",
      Self::Scripts => "scripts",
    };
    f.write_str(name)
  }
}

pub struct ArtifactGraph {
  graph: DiGraph<ArtifactId, ()>,
  nodes: HashMap<ArtifactId, NodeIndex>,
}

impl ArtifactGraph {
  pub fn new() -> Result<Self, ReconcileError> {
    let mut graph = DiGraph::new();
    let nodes: HashMap<_, _> = ArtifactId::ALL.iter().map(|&id| (id, graph.add_node(id))).collect();

    for (from, to) in [
      (ArtifactId::Next, ArtifactId::Scripts),
      (ArtifactId::Current, ArtifactId::Scripts),
      (ArtifactId::Current, ArtifactId::Gitignore),
    ] {
      graph.add_edge(nodes[&from], nodes[&to], ());
    }

    let dag = Self { graph, nodes };
    dag.topological_order()?;
    Ok(dag)
  }

  /// Every artifact, inputs before the artifacts computed from them.
  pub fn topological_order(&self) -> Result<Vec<ArtifactId>, ReconcileError> {
    let sorted = toposort(&self.graph, None).map_err(|_| ReconcileError::CycleDetected)?;
    Ok(sorted.into_iter().map(|idx| self.graph[idx]).collect())
  }

  /// Artifacts computed directly from `id`.
  pub fn dependents(&self, id: ArtifactId) -> Vec<ArtifactId> {
    self
      .graph
      .neighbors_directed(self.nodes[&id], Direction::Outgoing)
      .map(|idx| self.graph[idx])
      .collect()
  }
}
