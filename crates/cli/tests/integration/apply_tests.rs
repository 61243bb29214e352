//! Apply and clean command integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[cfg(unix)]
#[test]
fn apply_direct_creates_declared_link() {
  let env = TestEnv::with_file_link();

  env
    .cmd()
    .args(["--silent", "apply", "-m", "direct"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Apply complete!"))
    .stdout(predicate::str::contains("@pkg/config.txt"));

  let link = env.path("pkg/config.txt");
  assert!(link.symlink_metadata().unwrap().file_type().is_symlink());
  assert_eq!(
    std::fs::read_link(&link).unwrap(),
    std::path::PathBuf::from("../shared/config.txt")
  );
  assert_eq!(std::fs::read_to_string(&link).unwrap(), "shared content");

  assert!(env.read_file("next.symlink-config.json").contains("@pkg/config.txt"));
  assert!(env.read_file("current.symlink-config.json").contains("@pkg/config.txt"));
}

#[cfg(unix)]
#[test]
fn apply_is_idempotent() {
  let env = TestEnv::with_file_link();

  env.cmd().args(["--silent", "apply", "-m", "direct"]).assert().success();

  env
    .cmd()
    .args(["--silent", "apply", "-m", "direct"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Nothing to do"));
}

#[cfg(unix)]
#[test]
fn absolute_link_mode_writes_absolute_text() {
  let env = TestEnv::with_file_link();
  env.write_file("symconf.settings.json", r#"{ "linkMode": "absolute" }"#);

  env.cmd().args(["--silent", "apply", "-m", "direct"]).assert().success();

  assert_eq!(
    std::fs::read_link(env.path("pkg/config.txt")).unwrap(),
    env.path("shared/config.txt")
  );
}

#[cfg(unix)]
#[test]
fn missing_source_fails_the_apply() {
  let env = TestEnv::new();
  env.write_file(
    "pkg/symlink-config.json",
    r#"{ "files": [{ "target": "x", "source": "@nowhere/x" }] }"#,
  );

  env
    .cmd()
    .args(["--silent", "apply", "-m", "direct"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Source not found"));

  assert!(!env.path("pkg/x").exists());
}

#[cfg(unix)]
#[test]
fn dangerous_source_is_excluded_in_silent_mode() {
  let env = TestEnv::new();
  env.write_file(".vscode/settings.json", "{}");
  env.write_file(
    "pkg/symlink-config.json",
    r#"{ "files": [{ "target": "editor.json", "source": "@.vscode/settings.json" }] }"#,
  );

  env
    .cmd()
    .args(["--silent", "apply", "-m", "direct"])
    .assert()
    .success()
    .stderr(predicate::str::contains("Excluded dangerous link @pkg/editor.json"));

  assert!(std::fs::symlink_metadata(env.path("pkg/editor.json")).is_err());
}

#[cfg(unix)]
#[test]
fn dangerous_source_is_included_when_configured() {
  let env = TestEnv::new();
  env.write_file("symconf.settings.json", r#"{ "silentDefault": "include" }"#);
  env.write_file(".vscode/settings.json", "{}");
  env.write_file(
    "pkg/symlink-config.json",
    r#"{ "files": [{ "target": "editor.json", "source": "@.vscode/settings.json" }] }"#,
  );

  env.cmd().args(["--silent", "apply", "-m", "direct"]).assert().success();

  assert!(
    env
      .path("pkg/editor.json")
      .symlink_metadata()
      .unwrap()
      .file_type()
      .is_symlink()
  );
}

#[test]
fn scripts_method_only_writes_scripts() {
  let env = TestEnv::with_file_link();

  env
    .cmd()
    .args(["--silent", "apply", "-m", "scripts"])
    .assert()
    .success()
    .stdout(predicate::str::contains("written to scripts"));

  assert!(std::fs::symlink_metadata(env.path("pkg/config.txt")).is_err());
  #[cfg(unix)]
  assert!(env.read_file("apply.symlink-config.sh").contains("pkg/config.txt"));
  #[cfg(windows)]
  assert!(env.read_file("apply.symlink-config.bat").contains("pkg\\config.txt"));
}

#[test]
fn without_a_terminal_no_method_is_chosen() {
  let env = TestEnv::with_file_link();

  env
    .cmd()
    .arg("apply")
    .assert()
    .success()
    .stdout(predicate::str::contains("No method chosen"));

  assert!(std::fs::symlink_metadata(env.path("pkg/config.txt")).is_err());
}

#[cfg(unix)]
#[test]
fn apply_json_output() {
  let env = TestEnv::with_file_link();

  let output = env
    .cmd()
    .args(["--silent", "apply", "-m", "direct", "-o", "json"])
    .output()
    .unwrap();
  assert!(output.status.success());

  let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(json["method"], "direct");
  assert_eq!(json["operations"].as_array().unwrap().len(), 1);
  assert_eq!(json["execution"]["success"], 1);
}

#[cfg(unix)]
#[test]
fn clean_removes_managed_links_only() {
  let env = TestEnv::with_file_link();
  env.cmd().args(["--silent", "apply", "-m", "direct"]).assert().success();
  std::os::unix::fs::symlink("shared/config.txt", env.path("foreign")).unwrap();

  env
    .cmd()
    .args(["--silent", "clean", "-m", "direct"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Clean complete!"));

  assert!(std::fs::symlink_metadata(env.path("pkg/config.txt")).is_err());
  assert!(env.path("foreign").symlink_metadata().unwrap().file_type().is_symlink());
  assert_eq!(env.read_file("shared/config.txt"), "shared content");
}
