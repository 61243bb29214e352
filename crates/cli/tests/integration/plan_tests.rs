//! Plan command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn empty_project_needs_nothing() {
  let env = TestEnv::new();

  env
    .cmd()
    .arg("plan")
    .assert()
    .success()
    .stdout(predicate::str::contains("Declared links: 0"))
    .stdout(predicate::str::contains("No changes would be made"));
}

#[test]
fn plan_lists_pending_creates() {
  let env = TestEnv::with_file_link();

  env
    .cmd()
    .arg("plan")
    .assert()
    .success()
    .stdout(predicate::str::contains("+ @pkg/config.txt"))
    .stdout(predicate::str::contains("@shared/config.txt"))
    .stdout(predicate::str::contains("Would apply 1 operation(s)"));
}

#[test]
fn plan_writes_nothing() {
  let env = TestEnv::with_file_link();

  env.cmd().arg("plan").assert().success();

  assert!(!env.path("next.symlink-config.json").exists());
  assert!(!env.path("current.symlink-config.json").exists());
  assert!(!env.path(".gitignore").exists());
}

#[test]
fn plan_marks_dangerous_links() {
  let env = TestEnv::new();
  env.write_file(".idea/workspace.xml", "<project/>");
  env.write_file(
    "symlink-config.json",
    r#"{ "files": [{ "target": "workspace.xml", "source": "@.idea/workspace.xml" }] }"#,
  );

  env
    .cmd()
    .arg("plan")
    .assert()
    .success()
    .stdout(predicate::str::contains("[dangerous]"));
}

#[test]
fn plan_json_output() {
  let env = TestEnv::with_file_link();

  let output = env.cmd().args(["plan", "-o", "json"]).output().unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["declared"], 1);
  assert_eq!(json["existing"], 0);
  assert_eq!(json["operations"][0]["kind"], "create");
  assert_eq!(json["operations"][0]["target"], "@pkg/config.txt");
  assert!(json["dangerous"].as_array().unwrap().is_empty());
}
