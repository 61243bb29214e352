//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// A declaration linking `pkg/config.txt` to `@shared/config.txt`.
pub const FILE_DECLARATION: &str = r#"{ "files": [{ "target": "config.txt", "source": "@shared/config.txt" }] }"#;

/// Isolated test environment.
///
/// Each test gets a temporary directory holding a `project` root and a
/// `data` directory for the persisted log.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// A project with one shared file and a declaration linking to it.
  pub fn with_file_link() -> Self {
    let env = Self::new();
    env.write_file("shared/config.txt", "shared content");
    env.write_file("pkg/symlink-config.json", FILE_DECLARATION);
    env
  }

  /// Write a file relative to the project root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.root_path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn read_file(&self, relative_path: &str) -> String {
    std::fs::read_to_string(self.path(relative_path))
      .unwrap_or_else(|e| panic!("Failed to read {}: {}", relative_path, e))
  }

  pub fn path(&self, relative_path: &str) -> PathBuf {
    self.root_path().join(relative_path)
  }

  /// Project root (isolated per test).
  pub fn root_path(&self) -> PathBuf {
    let p = self.temp.path().join("project");
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  /// Data path for the persisted log.
  pub fn data_path(&self) -> PathBuf {
    let p = self.temp.path().join("data");
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  /// Get a pre-configured Command for the symconf binary.
  ///
  /// Sets environment variables for isolated testing:
  /// - `SYMCONF_ROOT`: the project root
  /// - `XDG_DATA_HOME`: isolated data path (for the log)
  /// - `APPDATA`: isolated data path (for Windows)
  ///
  /// The working directory is the project root.
  pub fn cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("symconf");
    cmd.env("SYMCONF_ROOT", self.root_path());
    cmd.env("XDG_DATA_HOME", self.data_path());
    cmd.env("APPDATA", self.data_path());
    cmd.env_remove("RUST_LOG");
    cmd.current_dir(self.root_path());
    cmd
  }
}
