//! Command records: the uniform representation of an invocable build step.
//!
//! Every emitter consumes a stream of [`CommandEntry`] values, whether it
//! serializes them (Ninja, MSVC) or executes them directly.

use std::path::{Path, PathBuf};

/// A single invocable build step.
///
/// The command line is a shell command; `inputs` and `outputs` drive
/// dependency ordering and staleness, `dep_file` points at a Make-format
/// dependency file the command writes as a side effect. An empty working
/// directory means the generation root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CommandEntry {
  pub command: String,
  pub inputs: Vec<PathBuf>,
  pub outputs: Vec<PathBuf>,
  pub working_directory: PathBuf,
  pub dep_file: Option<PathBuf>,
  pub description: String,
}

/// One item of an app bundle: copy `source` to `target` inside the bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BundleEntry {
  pub source: PathBuf,
  pub target: PathBuf,
}

/// A command copying `from` to `to`, creating the target directory first.
pub fn copy(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> CommandEntry {
  let from = from.into();
  let to = to.into();
  let parent = to.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
  CommandEntry {
    command: format!(
      "mkdir -p \"{}\" && cp \"{}\" \"{}\"",
      parent.display(),
      from.display(),
      to.display()
    ),
    description: format!("Copying '{}' -> '{}'", from.display(), to.display()),
    inputs: vec![from],
    outputs: vec![to],
    ..Default::default()
  }
}

/// A command creating `dir` (and its parents).
pub fn mkdir(dir: impl Into<PathBuf>) -> CommandEntry {
  let dir = dir.into();
  CommandEntry {
    command: format!("mkdir -p \"{}\"", dir.display()),
    description: format!("Creating directory '{}'", dir.display()),
    outputs: vec![dir],
    ..Default::default()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn command_equality_is_structural() {
    let a = copy("a.txt", "dir/b.txt");
    let b = copy("a.txt", "dir/b.txt");
    let c = copy("a.txt", "dir/c.txt");

    assert_eq!(a, b);
    assert_ne!(a, c);
  }

  #[test]
  fn copy_declares_inputs_and_outputs() {
    let cmd = copy("src/in.txt", "out/dir/result.txt");
    assert_eq!(cmd.inputs, vec![PathBuf::from("src/in.txt")]);
    assert_eq!(cmd.outputs, vec![PathBuf::from("out/dir/result.txt")]);
    assert!(cmd.command.contains("mkdir -p \"out/dir\""));
    assert!(cmd.command.contains("cp \"src/in.txt\" \"out/dir/result.txt\""));
  }

  #[test]
  fn mkdir_declares_output() {
    let cmd = mkdir("some/dir");
    assert!(cmd.inputs.is_empty());
    assert_eq!(cmd.outputs, vec![PathBuf::from("some/dir")]);
  }

  #[test]
  fn bundle_entry_orders_by_source_then_target() {
    let a = BundleEntry {
      source: "a".into(),
      target: "z".into(),
    };
    let b = BundleEntry {
      source: "b".into(),
      target: "a".into(),
    };
    let c = BundleEntry {
      source: "a".into(),
      target: "a".into(),
    };
    assert!(a < b);
    assert!(c < a);
  }
}
