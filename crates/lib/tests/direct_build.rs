//! Direct-builder scenarios: full build, incremental rebuild, failure.
//!
//! Driven by Command-type projects running plain shell commands so the suite
//! does not require a C++ toolchain.

use std::path::Path;
use std::time::{Duration, SystemTime};

use girder_lib::commands::CommandEntry;
use girder_lib::execute::{self, BuildOpts};
use girder_lib::option::standard::COMMANDS;
use girder_lib::platform::Os;
use girder_lib::project::{ProjectRef, ProjectSet, ProjectType};
use girder_lib::stringid::StringId;
use girder_lib::util::testutil;
use tempfile::TempDir;

fn copy_entry(from: &Path, to: &Path) -> CommandEntry {
  CommandEntry {
    command: testutil::copy_cmd(&from.display().to_string(), &to.display().to_string()),
    inputs: vec![from.to_path_buf()],
    outputs: vec![to.to_path_buf()],
    description: format!("copy {}", to.display()),
    ..Default::default()
  }
}

fn host_os() -> Os {
  Os::current().expect("test host OS is supported")
}

fn build(set: &mut ProjectSet, roots: &[ProjectRef], target: &Path) -> execute::BuildReport {
  execute::build(
    set,
    roots,
    target,
    StringId::EMPTY,
    host_os(),
    &BuildOpts { parallelism: 4 },
  )
  .unwrap()
}

fn bump_mtime(path: &Path) {
  let file = std::fs::File::options().write(true).open(path).unwrap();
  file
    .set_modified(SystemTime::now() + Duration::from_secs(10))
    .unwrap();
}

#[test]
fn full_then_incremental_rebuild() {
  let temp = TempDir::new().unwrap();
  let input = temp.path().join("in.txt");
  std::fs::write(&input, "v1").unwrap();
  let mid = temp.path().join("mid.txt");
  let out = temp.path().join("out.txt");

  let mut set = ProjectSet::new();
  let stage = set.create("stage", ProjectType::Command);
  set
    .get_mut(stage)
    .base
    .options
    .push(COMMANDS, copy_entry(&input, &mid));
  let publish = set.create("publish", ProjectType::Command);
  set
    .get_mut(publish)
    .base
    .options
    .push(COMMANDS, copy_entry(&mid, &out));
  set.get_mut(publish).link(stage);

  // Clean build: both commands run.
  let report = build(&mut set, &[publish], &temp.path().join("data"));
  assert_eq!(report.total, 2);
  assert_eq!(report.rebuilt, 2);
  assert_eq!(std::fs::read_to_string(&out).unwrap(), "v1");

  // Nothing changed: zero dirty commands.
  let report = build(&mut set, &[publish], &temp.path().join("data"));
  assert_eq!(report.rebuilt, 0);

  // Touching the first input reruns exactly the chain: the copy into mid
  // and its downstream copy into out.
  bump_mtime(&input);
  let report = build(&mut set, &[publish], &temp.path().join("data"));
  assert_eq!(report.rebuilt, 2);
}

#[test]
fn diamond_builds_every_node() {
  let temp = TempDir::new().unwrap();
  let source = temp.path().join("src.txt");
  std::fs::write(&source, "seed").unwrap();
  let a = temp.path().join("a.txt");
  let b = temp.path().join("b.txt");
  let c = temp.path().join("c.txt");
  let d = temp.path().join("d.txt");

  let mut set = ProjectSet::new();
  let graph = set.create("graph", ProjectType::Command);
  {
    let options = &mut set.get_mut(graph).base.options;
    options.push(COMMANDS, copy_entry(&source, &a));
    options.push(COMMANDS, copy_entry(&a, &b));
    options.push(COMMANDS, copy_entry(&a, &c));
    // d consumes both branches.
    options.push(
      COMMANDS,
      CommandEntry {
        command: testutil::copy_cmd(&b.display().to_string(), &d.display().to_string()),
        inputs: vec![b.clone(), c.clone()],
        outputs: vec![d.clone()],
        description: "join".to_string(),
        ..Default::default()
      },
    );
  }

  let report = build(&mut set, &[graph], &temp.path().join("data"));
  assert_eq!(report.rebuilt, 4);
  for file in [&a, &b, &c, &d] {
    assert!(file.exists());
  }
}

#[test]
fn failing_command_aborts_and_keeps_finished_outputs() {
  let temp = TempDir::new().unwrap();
  let input = temp.path().join("in.txt");
  std::fs::write(&input, "v1").unwrap();
  let staged = temp.path().join("staged.txt");
  let broken = temp.path().join("broken.txt");
  let never = temp.path().join("never.txt");

  let mut set = ProjectSet::new();
  let tasks = set.create("tasks", ProjectType::Command);
  {
    let options = &mut set.get_mut(tasks).base.options;
    options.push(COMMANDS, copy_entry(&input, &staged));
    options.push(
      COMMANDS,
      CommandEntry {
        command: testutil::fail_cmd(),
        inputs: vec![staged.clone()],
        outputs: vec![broken.clone()],
        description: "breaks".to_string(),
        ..Default::default()
      },
    );
    options.push(COMMANDS, copy_entry(&broken, &never));
  }

  let result = execute::build(
    &mut set,
    &[tasks],
    &temp.path().join("data"),
    StringId::EMPTY,
    host_os(),
    &BuildOpts { parallelism: 4 },
  );

  assert!(result.is_err());
  // Commands already completed remain on disk; downstream never ran.
  assert!(staged.exists());
  assert!(!never.exists());
}
