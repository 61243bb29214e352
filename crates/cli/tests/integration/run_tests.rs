//! Run command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[cfg(unix)]
#[test]
fn running_apply_script_creates_links() {
  let env = TestEnv::with_file_link();

  env
    .cmd()
    .args(["--silent", "run", "apply"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Ran apply.symlink-config.sh"));

  assert!(env.path("pkg/config.txt").symlink_metadata().unwrap().file_type().is_symlink());
  assert!(env.read_file("current.symlink-config.json").contains("@pkg/config.txt"));
}

#[cfg(unix)]
#[test]
fn running_clean_script_removes_links() {
  let env = TestEnv::with_file_link();
  env.cmd().args(["--silent", "apply", "-m", "direct"]).assert().success();

  env.cmd().args(["--silent", "run", "clean"]).assert().success();

  assert!(std::fs::symlink_metadata(env.path("pkg/config.txt")).is_err());
  assert_eq!(env.read_file("shared/config.txt"), "shared content");
}

#[cfg(unix)]
#[test]
fn script_for_other_os_only_is_not_run() {
  let env = TestEnv::with_file_link();
  env.write_file("symconf.settings.json", r#"{ "scriptGeneration": "windows-only" }"#);

  env
    .cmd()
    .args(["--silent", "run"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("was not generated"));
}
