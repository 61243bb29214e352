//! Status command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn status_before_first_refresh() {
  let env = TestEnv::with_file_link();

  env
    .cmd()
    .arg("status")
    .assert()
    .success()
    .stdout(predicate::str::contains("Project root:"))
    .stdout(predicate::str::contains("Declared links: not generated"))
    .stdout(predicate::str::contains("Pending operations: 1"))
    .stdout(predicate::str::contains("No recorded activity"));
}

#[cfg(unix)]
#[test]
fn status_after_apply_shows_activity() {
  let env = TestEnv::with_file_link();
  env.cmd().args(["--silent", "apply", "-m", "direct"]).assert().success();

  env
    .cmd()
    .args(["--verbose", "status"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Declared links: 1"))
    .stdout(predicate::str::contains("Existing links: 1"))
    .stdout(predicate::str::contains("Pending operations: 0"))
    .stdout(predicate::str::contains("Recent activity:"))
    .stdout(predicate::str::contains("next document created"));
}

#[test]
fn status_json_output() {
  let env = TestEnv::with_file_link();
  env.write_file("symconf.settings.json", r#"{ "diffMode": "complete" }"#);

  let output = env.cmd().args(["status", "-o", "json"]).output().unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["pending"], 1);
  assert!(json["declared"].is_null());
  assert_eq!(json["settings"]["diffMode"], "complete");
  assert!(json["log"].as_array().unwrap().is_empty());
}
