//! Refresh command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn refresh_writes_generated_files() {
  let env = TestEnv::with_file_link();

  env
    .cmd()
    .arg("refresh")
    .assert()
    .success()
    .stdout(predicate::str::contains("Refreshed"))
    .stdout(predicate::str::contains("next document: created"));

  assert!(env.read_file("next.symlink-config.json").contains("@pkg/config.txt"));
  assert!(env.path("current.symlink-config.json").exists());
  assert!(env.read_file(".gitignore").contains("next.symlink-config.json"));
}

#[test]
fn second_refresh_changes_nothing() {
  let env = TestEnv::with_file_link();

  env.cmd().arg("refresh").assert().success();

  env
    .cmd()
    .arg("refresh")
    .assert()
    .success()
    .stdout(predicate::str::contains("Refreshed, 0 file(s) updated"));
}

#[test]
fn hand_edited_next_document_is_regenerated() {
  let env = TestEnv::with_file_link();
  env.cmd().arg("refresh").assert().success();

  env.write_file("next.symlink-config.json", "{ not json");

  env
    .cmd()
    .arg("refresh")
    .assert()
    .success()
    .stdout(predicate::str::contains("next document: drift corrected"));
  assert!(env.read_file("next.symlink-config.json").contains("@pkg/config.txt"));
}

#[test]
fn user_gitignore_lines_survive() {
  let env = TestEnv::with_file_link();
  env.write_file(".gitignore", "target/\n*.log\n");

  env.cmd().arg("refresh").assert().success();

  let gitignore = env.read_file(".gitignore");
  assert!(gitignore.starts_with("target/\n*.log\n"));
  assert!(gitignore.contains("current.symlink-config.json"));
}

#[test]
fn invalid_editor_settings_fail_only_that_file() {
  let env = TestEnv::with_file_link();
  env.write_file("symconf.settings.json", r#"{ "hideServiceFiles": true }"#);
  env.write_file(".vscode/settings.json", "{ broken");

  env
    .cmd()
    .arg("refresh")
    .assert()
    .failure()
    .stderr(predicate::str::contains("editor exclusions"));

  assert!(env.path("next.symlink-config.json").exists());
  assert_eq!(env.read_file(".vscode/settings.json"), "{ broken");
}
