//! Smoke tests running the demo build description end to end.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn demo() -> Command {
  let mut cmd = Command::cargo_bin("girder-demo").unwrap();
  cmd
    .current_dir(env!("CARGO_MANIFEST_DIR"))
    .env_remove("BUILD_DIR")
    .env_remove("BUILD_FILE")
    .env_remove("BUILD_ARGS");
  cmd
}

#[test]
fn generates_ninja_files_for_every_config() {
  let temp = TempDir::new().unwrap();
  let out = temp.path().join("nb");

  demo()
    .arg(format!("--ninja={}", out.display()))
    .assert()
    .success();

  for config in ["debug", "release"] {
    let dir = out.join(config);
    let top = std::fs::read_to_string(dir.join("build.ninja")).unwrap();
    assert!(top.contains("subninja util.ninja"));
    assert!(top.contains("subninja hello.ninja"));
    assert!(top.contains("subninja _generator.ninja"));

    let hello = std::fs::read_to_string(dir.join("hello.ninja")).unwrap();
    assert!(hello.contains("rule command"));
    assert!(hello.contains("cpp/hello.cpp"));
    // The public include path of util reached the consumer.
    assert!(hello.contains("-I\"cpp/include\""));
    // The static library feeds the link line.
    assert!(hello.contains("libutil.a"));
  }

  let debug_util = std::fs::read_to_string(out.join("debug/util.ninja")).unwrap();
  assert!(debug_util.contains(" -g"));
  let release_util = std::fs::read_to_string(out.join("release/util.ninja")).unwrap();
  assert!(release_util.contains(" -O3"));
}

#[test]
fn config_flag_restricts_to_one_configuration() {
  let temp = TempDir::new().unwrap();
  let out = temp.path().join("nb");

  demo()
    .arg(format!("--ninja={}", out.display()))
    .args(["--config", "release"])
    .assert()
    .success();

  assert!(out.join("release/build.ninja").exists());
  assert!(!out.join("debug").exists());
}

#[test]
fn unknown_config_fails() {
  let temp = TempDir::new().unwrap();
  let out = temp.path().join("nb");

  demo()
    .arg(format!("--ninja={}", out.display()))
    .args(["--config", "prod"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("unknown configuration"));
}

#[test]
fn no_emitter_prints_usage_and_fails() {
  demo()
    .assert()
    .failure()
    .stderr(predicate::str::contains("Available emitters"));
}

#[test]
fn msvc_emitter_writes_vcxproj() {
  let temp = TempDir::new().unwrap();
  let out = temp.path().join("msvc");

  demo()
    .arg(format!("--msvc={}", out.display()))
    .assert()
    .success();

  let text = std::fs::read_to_string(out.join("hello.vcxproj")).unwrap();
  assert!(text.contains("ProjectConfigurations"));
  assert!(text.contains("cpp/hello.cpp"));
  assert!(out.join("util.vcxproj").exists());
}
