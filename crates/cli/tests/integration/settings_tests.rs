//! Root and settings command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn root_prints_the_resolved_root() {
  let env = TestEnv::new();

  env
    .cmd()
    .arg("root")
    .assert()
    .success()
    .stdout(predicate::str::contains(env.root_path().display().to_string()));
}

#[test]
fn root_with_path_pins_the_project_root() {
  let env = TestEnv::new();
  let root = env.root_path();

  env
    .cmd()
    .env_remove("SYMCONF_ROOT")
    .current_dir(env.temp.path())
    .args(["root", "project"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Project root set to"));

  let settings: serde_json::Value =
    serde_json::from_str(&std::fs::read_to_string(env.temp.path().join("symconf.settings.json")).unwrap()).unwrap();
  assert_eq!(settings["projectRoot"], "project");

  env
    .cmd()
    .env_remove("SYMCONF_ROOT")
    .current_dir(env.temp.path())
    .arg("root")
    .assert()
    .success()
    .stdout(predicate::str::contains(root.display().to_string()));
}

#[test]
fn pinned_root_uses_the_pinning_settings_file() {
  let env = TestEnv::new();

  env
    .cmd()
    .env_remove("SYMCONF_ROOT")
    .current_dir(env.temp.path())
    .args(["root", "project"])
    .assert()
    .success();

  let settings_path = env.temp.path().join("symconf.settings.json");
  std::fs::write(&settings_path, r#"{ "projectRoot": "project", "linkMode": "absolute" }"#).unwrap();

  let output = env
    .cmd()
    .env_remove("SYMCONF_ROOT")
    .current_dir(env.temp.path())
    .args(["status", "-o", "json"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["settings"]["linkMode"], "absolute");
  assert!(!env.path("symconf.settings.json").exists());
}

#[test]
fn root_with_missing_directory_fails() {
  let env = TestEnv::new();

  env
    .cmd()
    .args(["root", "does-not-exist"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("is not a directory"));
}

#[test]
fn missing_root_flag_directory_is_fatal() {
  let env = TestEnv::new();

  env
    .cmd()
    .args(["--root", "does-not-exist", "plan"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("no project root"));
}

#[test]
fn reset_settings_restores_defaults() {
  let env = TestEnv::new();
  env.write_file("symconf.settings.json", r#"{ "silent": true, "linkMode": "absolute" }"#);

  env
    .cmd()
    .args(["reset-settings", "--force"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Settings reset"));

  let settings: serde_json::Value = serde_json::from_str(&env.read_file("symconf.settings.json")).unwrap();
  assert_eq!(settings["silent"], false);
  assert_eq!(settings["linkMode"], "relative");
}

#[test]
fn malformed_settings_are_reported() {
  let env = TestEnv::new();
  env.write_file("symconf.settings.json", "{ nope");

  env
    .cmd()
    .arg("plan")
    .assert()
    .failure()
    .stderr(predicate::str::contains("failed to parse settings"));
}
