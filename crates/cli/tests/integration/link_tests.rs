//! Link command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn link_creates_declaration_and_refreshes_next() {
  let env = TestEnv::new();
  env.write_file("shared/a.txt", "a");
  std::fs::create_dir_all(env.path("pkg")).unwrap();

  env
    .cmd()
    .args(["link", "a.txt", "@shared/a.txt", "--dir", "pkg"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Declared file link @pkg/a.txt"));

  let declaration: serde_json::Value = serde_json::from_str(&env.read_file("pkg/symlink-config.json")).unwrap();
  assert_eq!(declaration["files"][0]["target"], "a.txt");
  assert_eq!(declaration["files"][0]["source"], "@shared/a.txt");

  assert!(env.read_file("next.symlink-config.json").contains("@pkg/a.txt"));
}

#[test]
fn directory_source_declares_directory_link() {
  let env = TestEnv::new();
  env.write_file("shared/assets/logo.svg", "<svg/>");

  env
    .cmd()
    .args(["link", "app/assets", "shared/assets"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Declared dir link @app/assets"));

  let declaration: serde_json::Value = serde_json::from_str(&env.read_file("symlink-config.json")).unwrap();
  assert_eq!(declaration["directories"][0]["target"], "app/assets");
  assert!(declaration.get("files").is_none());
}

#[test]
fn relinking_a_target_replaces_it() {
  let env = TestEnv::new();
  env.write_file("one.txt", "1");
  env.write_file("two.txt", "2");

  env.cmd().args(["link", "x.txt", "one.txt"]).assert().success();
  env.cmd().args(["link", "x.txt", "two.txt"]).assert().success();

  let declaration: serde_json::Value = serde_json::from_str(&env.read_file("symlink-config.json")).unwrap();
  let files = declaration["files"].as_array().unwrap();
  assert_eq!(files.len(), 1);
  assert_eq!(files[0]["source"], "two.txt");
}

#[test]
fn missing_source_is_declared_with_a_warning() {
  let env = TestEnv::new();

  env
    .cmd()
    .args(["link", "x.txt", "@later/x.txt"])
    .assert()
    .success()
    .stderr(predicate::str::contains("does not exist yet"));

  assert!(env.path("symlink-config.json").exists());
}

#[test]
fn directory_outside_the_root_is_rejected() {
  let env = TestEnv::new();
  let outside = env.temp.path().join("elsewhere");
  std::fs::create_dir_all(&outside).unwrap();

  env
    .cmd()
    .arg("link")
    .arg("x")
    .arg("y")
    .arg("--dir")
    .arg(&outside)
    .assert()
    .failure()
    .stderr(predicate::str::contains("outside the project root"));
}
