//! Watch mode.
//!
//! The notify callback only forwards events into a channel. One consumer
//! task drains it, classifies the changed paths into stale artifacts and
//! runs a convergence pass per batch, so passes never overlap. The loop's
//! own writes come back as events too; they reconcile to `Unchanged` and
//! the cycle ends there.

use std::collections::BTreeSet;
use std::future::Future;
use std::path::{Component, Path};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::consts::{CURRENT_FILENAME, DECLARATION_FILENAME, NEXT_FILENAME};
use crate::context::AppContext;
use crate::editor::editor_settings_path;
use crate::execute::{ApplyMethod, apply};
use crate::gitignore::gitignore_path;
use crate::log::LogLevel;
use crate::platform::TargetOs;
use crate::reconcile::{ArtifactId, Convergence, PassReport, ReconcileError};
use crate::script::script_file_names;
use crate::util::fs::{exists_no_follow, is_symlink};

/// How long to keep collecting events after the first one of a batch.
const SETTLE_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum WatchError {
  #[error("failed to watch project: {0}")]
  Notify(#[from] notify::Error),

  #[error(transparent)]
  Reconcile(#[from] ReconcileError),
}

/// Artifacts made stale by one batch of filesystem events.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PendingChanges {
  pub stale: BTreeSet<ArtifactId>,
  /// The settings file changed; everything is recomputed after a reload.
  pub settings: bool,
}

impl PendingChanges {
  pub fn is_empty(&self) -> bool {
    self.stale.is_empty() && !self.settings
  }

  /// Fold one notify event into the batch.
  pub fn record(&mut self, ctx: &AppContext, event: &Event) {
    if matches!(event.kind, EventKind::Access(_)) {
      return;
    }
    let settings_file = ctx.settings_path();
    for path in &event.paths {
      match classify(ctx.root(), &settings_file, path) {
        Some(Trigger::Settings) => self.settings = true,
        Some(Trigger::Artifact(id)) => {
          self.stale.insert(id);
        }
        None => {}
      }
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
  Settings,
  Artifact(ArtifactId),
}

/// What a change at `path` makes stale, if anything.
///
/// Generated files map to themselves so a hand edit is caught as drift.
/// Anything else that is, or may have been, a symlink stales the current
/// document. Paths inside dot-directories are ignored apart from the
/// editor settings file. `settings_file` may sit outside `root` when it
/// pins the root elsewhere.
fn classify(root: &Path, settings_file: &Path, path: &Path) -> Option<Trigger> {
  if path == settings_file {
    return Some(Trigger::Settings);
  }
  let rel = path.strip_prefix(root).ok()?;
  let name = rel.file_name()?.to_str()?;

  if path == gitignore_path(root) {
    return Some(Trigger::Artifact(ArtifactId::Gitignore));
  }
  if path == editor_settings_path(root) {
    return Some(Trigger::Artifact(ArtifactId::EditorExclusions));
  }
  if rel == Path::new(NEXT_FILENAME) {
    return Some(Trigger::Artifact(ArtifactId::Next));
  }
  if rel == Path::new(CURRENT_FILENAME) {
    return Some(Trigger::Artifact(ArtifactId::Current));
  }
  if rel.components().count() == 1 && is_script_name(name) {
    return Some(Trigger::Artifact(ArtifactId::Scripts));
  }

  let hidden = rel.components().any(|c| match c {
    Component::Normal(part) => part.to_string_lossy().starts_with('.'),
    _ => false,
  });
  if hidden {
    return None;
  }
  if name == DECLARATION_FILENAME {
    return Some(Trigger::Artifact(ArtifactId::Next));
  }
  if is_symlink(path) || !exists_no_follow(path) {
    return Some(Trigger::Artifact(ArtifactId::Current));
  }
  None
}

fn is_script_name(name: &str) -> bool {
  script_file_names(&[TargetOs::Windows, TargetOs::Unix])
    .iter()
    .any(|n| n == name)
}

/// Reconcile one batch.
///
/// Settings are reloaded first; a settings change stales everything. With
/// `watchWorkspace` off only settings changes are acted on. In continuous
/// mode a changed next document is applied directly.
pub fn process_changes(ctx: &mut AppContext, convergence: &mut Convergence, changes: PendingChanges) -> PassReport {
  let mut stale = changes.stale;

  if changes.settings {
    match ctx.reload_settings() {
      Ok(true) => {
        ctx.record(LogLevel::Info, "settings changed, refreshing everything");
        stale.extend(ArtifactId::ALL);
      }
      Ok(false) => {}
      Err(e) => ctx.record(LogLevel::Error, format!("failed to reload settings: {e}")),
    }
  } else if !ctx.settings().watch_workspace {
    debug!("workspace watching disabled, ignoring changes");
    return PassReport::default();
  }

  if stale.is_empty() {
    return PassReport::default();
  }
  debug!(?stale, "reconciling batch");

  let report = match convergence.run(ctx, stale) {
    Ok(report) => report,
    Err(e) => {
      ctx.record(LogLevel::Error, format!("reconciliation failed: {e}"));
      return PassReport::default();
    }
  };

  if ctx.settings().continuous_mode && report.changed(ArtifactId::Next) {
    match apply(ctx, convergence, ApplyMethod::Direct) {
      Ok(result) => info!(operations = result.operations.len(), "continuous mode applied changes"),
      Err(e) => ctx.record(LogLevel::Error, format!("continuous apply failed: {e}")),
    }
  }
  report
}

/// Watch the project until `shutdown` resolves.
///
/// Runs one full pass up front, then one pass per settled batch of events.
pub async fn watch(mut ctx: AppContext, shutdown: impl Future<Output = ()>) -> Result<(), WatchError> {
  let root = ctx.root().to_path_buf();
  let (events_tx, mut events_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();

  let mut watcher = RecommendedWatcher::new(
    move |result| {
      if events_tx.send(result).is_err() {
        error!("watch event channel closed");
      }
    },
    Config::default(),
  )?;
  watcher.watch(&root, RecursiveMode::Recursive)?;
  let settings_file = ctx.settings_path();
  if let Some(settings_dir) = settings_file.parent().filter(|dir| !dir.starts_with(&root)) {
    watcher.watch(settings_dir, RecursiveMode::NonRecursive)?;
  }
  info!(root = %root.display(), settings = %settings_file.display(), "watching project");

  let mut convergence = Convergence::new()?;
  let initial = convergence.refresh_all(&ctx)?;
  debug!(errors = initial.errors.len(), "initial pass done");

  tokio::pin!(shutdown);
  loop {
    let first = tokio::select! {
      _ = &mut shutdown => break,
      event = events_rx.recv() => match event {
        Some(event) => event,
        None => break,
      },
    };

    let mut changes = PendingChanges::default();
    collect(&ctx, &mut changes, first);
    tokio::time::sleep(SETTLE_DELAY).await;
    while let Ok(event) = events_rx.try_recv() {
      collect(&ctx, &mut changes, event);
    }

    if !changes.is_empty() {
      process_changes(&mut ctx, &mut convergence, changes);
    }
  }

  info!("watch stopped");
  ctx.save_log();
  Ok(())
}

fn collect(ctx: &AppContext, changes: &mut PendingChanges, event: notify::Result<Event>) {
  match event {
    Ok(event) => changes.record(ctx, &event),
    Err(e) => warn!(error = %e, "watch error"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::consts::SETTINGS_FILENAME;
  use crate::context::test_support::{context, context_with};
  use crate::log::LogBuffer;
  use crate::prompt::SilentPrompter;
  use crate::reconcile::Outcome;
  use crate::settings::{ProjectLocation, Settings};
  use crate::util::testutil::{canonical, write_file};
  use notify::event::{AccessKind, CreateKind, ModifyKind};
  use std::fs;
  use tempfile::TempDir;

  fn event(kind: EventKind, path: &Path) -> Event {
    Event::new(kind).add_path(path.to_path_buf())
  }

  mod classify {
    use super::*;

    #[test]
    fn declarations_and_generated_files() {
      let temp = TempDir::new().unwrap();
      let root = canonical(temp.path());
      write_file(&root, "pkg/symlink-config.json", "{}");

      let artifact = |rel: &str| classify(&root, &root.join(SETTINGS_FILENAME), &root.join(rel));

      assert_eq!(artifact("pkg/symlink-config.json"), Some(Trigger::Artifact(ArtifactId::Next)));
      assert_eq!(artifact(NEXT_FILENAME), Some(Trigger::Artifact(ArtifactId::Next)));
      assert_eq!(artifact(CURRENT_FILENAME), Some(Trigger::Artifact(ArtifactId::Current)));
      assert_eq!(artifact("apply.symlink-config.sh"), Some(Trigger::Artifact(ArtifactId::Scripts)));
      assert_eq!(artifact(".gitignore"), Some(Trigger::Artifact(ArtifactId::Gitignore)));
      assert_eq!(
        artifact(".vscode/settings.json"),
        Some(Trigger::Artifact(ArtifactId::EditorExclusions))
      );
      assert_eq!(artifact(SETTINGS_FILENAME), Some(Trigger::Settings));
    }

    #[test]
    fn ordinary_files_and_dot_directories_are_ignored() {
      let temp = TempDir::new().unwrap();
      let root = canonical(temp.path());
      write_file(&root, "src/main.rs", "");
      write_file(&root, ".git/index", "");

      let settings_file = root.join(SETTINGS_FILENAME);

      assert_eq!(classify(&root, &settings_file, &root.join("src/main.rs")), None);
      assert_eq!(classify(&root, &settings_file, &root.join(".git/index")), None);
      assert_eq!(classify(&root, &settings_file, Path::new("/elsewhere/x")), None);
    }

    #[test]
    fn removed_path_may_have_been_a_link() {
      let temp = TempDir::new().unwrap();
      let root = canonical(temp.path());

      assert_eq!(
        classify(&root, &root.join(SETTINGS_FILENAME), &root.join("pkg/gone.txt")),
        Some(Trigger::Artifact(ArtifactId::Current))
      );
    }

    #[cfg(unix)]
    #[test]
    fn symlink_change_stales_current() {
      let temp = TempDir::new().unwrap();
      let root = canonical(temp.path());
      write_file(&root, "shared/x.txt", "x");
      crate::util::testutil::symlink("shared/x.txt", root.join("link.txt"));

      assert_eq!(
        classify(&root, &root.join(SETTINGS_FILENAME), &root.join("link.txt")),
        Some(Trigger::Artifact(ArtifactId::Current))
      );
    }

    #[test]
    fn pinning_settings_file_outside_the_root() {
      let temp = TempDir::new().unwrap();
      let outer = canonical(temp.path());
      let root = outer.join("sub");
      fs::create_dir_all(&root).unwrap();
      let settings_file = outer.join(SETTINGS_FILENAME);

      assert_eq!(classify(&root, &settings_file, &settings_file), Some(Trigger::Settings));
      assert_eq!(classify(&root, &settings_file, &root.join(SETTINGS_FILENAME)), None);
    }
  }

  #[test]
  fn access_events_are_ignored() {
    let temp = TempDir::new().unwrap();
    let root = canonical(temp.path());
    let ctx = context(&root);
    let mut changes = PendingChanges::default();

    changes.record(&ctx, &event(EventKind::Access(AccessKind::Any), &root.join(NEXT_FILENAME)));
    assert!(changes.is_empty());

    changes.record(&ctx, &event(EventKind::Modify(ModifyKind::Any), &root.join(NEXT_FILENAME)));
    assert_eq!(changes.stale, BTreeSet::from([ArtifactId::Next]));
  }

  #[test]
  fn batch_reconciles_and_own_writes_settle() {
    let temp = TempDir::new().unwrap();
    let root = canonical(temp.path());
    write_file(&root, "shared/x.txt", "x");
    let decl = write_file(
      &root,
      "pkg/symlink-config.json",
      r#"{ "files": [{ "target": "x.txt", "source": "@shared/x.txt" }] }"#,
    );
    let mut ctx = context(&root);
    let mut convergence = Convergence::new().unwrap();

    let mut changes = PendingChanges::default();
    changes.record(&ctx, &event(EventKind::Create(CreateKind::File), &decl));
    let report = process_changes(&mut ctx, &mut convergence, changes);
    assert!(report.changed(ArtifactId::Next));

    // the write of next comes back as an event
    let mut echo = PendingChanges::default();
    echo.record(&ctx, &event(EventKind::Modify(ModifyKind::Any), &root.join(NEXT_FILENAME)));
    let report = process_changes(&mut ctx, &mut convergence, echo);
    assert_eq!(report.outcomes, vec![(ArtifactId::Next, Outcome::Unchanged)]);
  }

  #[test]
  fn disabled_watching_ignores_everything_but_settings() {
    let temp = TempDir::new().unwrap();
    let root = canonical(temp.path());
    let decl = write_file(&root, "symlink-config.json", "{}");
    let settings = Settings {
      watch_workspace: false,
      ..Default::default()
    };
    let mut ctx = context_with(&root, settings, Box::new(SilentPrompter));
    let mut convergence = Convergence::new().unwrap();

    let mut changes = PendingChanges::default();
    changes.record(&ctx, &event(EventKind::Create(CreateKind::File), &decl));
    let report = process_changes(&mut ctx, &mut convergence, changes);

    assert!(report.outcomes.is_empty());
    assert!(!root.join(NEXT_FILENAME).exists());
  }

  #[test]
  fn settings_change_reloads_and_refreshes_all() {
    let temp = TempDir::new().unwrap();
    let root = canonical(temp.path());
    let mut ctx = context(&root);
    let mut convergence = Convergence::new().unwrap();
    fs::write(root.join(SETTINGS_FILENAME), r#"{ "hideServiceFiles": true }"#).unwrap();

    let mut changes = PendingChanges::default();
    changes.record(&ctx, &event(EventKind::Modify(ModifyKind::Any), &root.join(SETTINGS_FILENAME)));
    let report = process_changes(&mut ctx, &mut convergence, changes);

    assert!(ctx.settings().hide_service_files);
    assert_eq!(report.outcomes.len(), ArtifactId::ALL.len());
    assert!(editor_settings_path(&root).is_file());
  }

  #[test]
  fn edit_to_pinning_settings_file_is_reloaded() {
    let temp = TempDir::new().unwrap();
    let outer = canonical(temp.path());
    let root = outer.join("sub");
    fs::create_dir_all(&root).unwrap();
    let location = ProjectLocation {
      root: root.clone(),
      settings_dir: outer.clone(),
    };
    let mut ctx = AppContext::new(location, Settings::default(), Box::new(SilentPrompter), LogBuffer::in_memory(10));
    let mut convergence = Convergence::new().unwrap();
    fs::write(
      outer.join(SETTINGS_FILENAME),
      r#"{ "projectRoot": "sub", "hideServiceFiles": true }"#,
    )
    .unwrap();

    let mut changes = PendingChanges::default();
    changes.record(&ctx, &event(EventKind::Modify(ModifyKind::Any), &outer.join(SETTINGS_FILENAME)));
    assert!(changes.settings);
    process_changes(&mut ctx, &mut convergence, changes);

    assert!(ctx.settings().hide_service_files);
    assert!(editor_settings_path(&root).is_file());
  }

  #[cfg(unix)]
  #[test]
  fn continuous_mode_applies_after_next_changes() {
    let temp = TempDir::new().unwrap();
    let root = canonical(temp.path());
    write_file(&root, "shared/x.txt", "x");
    let decl = write_file(
      &root,
      "symlink-config.json",
      r#"{ "files": [{ "target": "x.txt", "source": "@shared/x.txt" }] }"#,
    );
    let settings = Settings {
      continuous_mode: true,
      ..Default::default()
    };
    let mut ctx = context_with(&root, settings, Box::new(SilentPrompter));
    let mut convergence = Convergence::new().unwrap();

    let mut changes = PendingChanges::default();
    changes.record(&ctx, &event(EventKind::Create(CreateKind::File), &decl));
    process_changes(&mut ctx, &mut convergence, changes);

    assert_eq!(fs::read_to_string(root.join("x.txt")).unwrap(), "x");
  }
}
