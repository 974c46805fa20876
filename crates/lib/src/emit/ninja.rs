//! Ninja emitter.
//!
//! Serializes the command stream as Ninja files: one generic `command` rule
//! whose `$cmd`/`$cwd`/`$depfile`/`$desc` variables are expanded per build
//! statement, one sub-ninja file per project included from the top-level
//! `build.ninja`, and a synthetic `_generator` project that re-runs the
//! generator when the build description's inputs change.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use super::{generator_dependencies, materialize, GenerateError, ProjectArtifacts};
use crate::commands::CommandEntry;
use crate::env::BuildEnv;
use crate::platform::Os;
use crate::project::{ProjectRef, ProjectSet};
use crate::stringid::StringId;
use crate::util;

/// Emit Ninja build files for `config` into `target`.
pub fn emit(
  set: &mut ProjectSet,
  roots: &[ProjectRef],
  target: &Path,
  config: StringId,
  target_os: Os,
  env: &BuildEnv,
) -> Result<(), GenerateError> {
  std::fs::create_dir_all(target)?;
  let build_file_path = target.join("build.ninja");

  info!(target = %target.display(), config = %config, "emitting ninja files");

  let ordered = set.discover(roots);
  let mut top = NinjaWriter::create(&build_file_path)?;

  for &project in &ordered {
    if let Some(artifacts) = materialize(set, project, config, target_os, target)? {
      let file_name = format!("{}.ninja", artifacts.name);
      write_project_file(target, &file_name, &artifacts, false)?;
      top.subninja(&file_name)?;
    }
  }

  let generator = generator_artifacts(set, &ordered, &build_file_path, env);
  write_project_file(target, "_generator.ninja", &generator, true)?;
  top.subninja("_generator.ninja")?;
  top.finish()?;

  Ok(())
}

/// The synthetic project that re-runs the generator when the description's
/// inputs change. Every other build statement order-depends on it, so Ninja
/// refreshes the build files before using them.
fn generator_artifacts(
  set: &ProjectSet,
  ordered: &[ProjectRef],
  build_file_path: &Path,
  env: &BuildEnv,
) -> ProjectArtifacts {
  let mut inputs = generator_dependencies(set, ordered);
  if !env.build_file.as_os_str().is_empty() {
    inputs.push(env.build_file.clone());
  }

  let exe = std::env::current_exe().unwrap_or_else(|_| env.build_file.clone());
  let command = CommandEntry {
    command: format!("\"{}\" {}", exe.display(), env.build_args.join(" ")),
    inputs,
    outputs: vec![build_file_path.to_path_buf()],
    description: "Running build generator.".to_string(),
    ..Default::default()
  };

  ProjectArtifacts {
    name: "_generator".to_string(),
    commands: vec![command],
    outputs: Vec::new(),
  }
}

fn write_project_file(
  root: &Path,
  file_name: &str,
  artifacts: &ProjectArtifacts,
  generator: bool,
) -> Result<(), GenerateError> {
  let mut ninja = NinjaWriter::create(&root.join(file_name))?;
  let offset = util::path_offset(root);

  let prologue = if cfg!(windows) {
    "cmd /c cd \"$cwd\" && $cmd"
  } else {
    "cd \"$cwd\" && $cmd"
  };
  ninja.rule("command", prologue, "$depfile", "", "$desc")?;

  let generator_dep = vec!["_generator".to_string()];
  let order_only: &[String] = if generator { &[] } else { &generator_dep };

  let mut project_outputs: Vec<String> = Vec::new();

  for command in &artifacts.commands {
    let cwd = if command.working_directory.as_os_str().is_empty() {
      offset.clone()
    } else {
      util::rebase(&offset, &command.working_directory)
    };

    let inputs: Vec<String> = command
      .inputs
      .iter()
      .map(|p| escape(&util::rebase(&offset, p).display().to_string()))
      .collect();
    let outputs: Vec<String> = command
      .outputs
      .iter()
      .map(|p| escape(&util::rebase(&offset, p).display().to_string()))
      .collect();

    for output in &outputs {
      if !project_outputs.contains(output) {
        project_outputs.push(output.clone());
      }
    }

    let depfile = command
      .dep_file
      .as_ref()
      .map(|p| util::rebase(&offset, p).display().to_string())
      .unwrap_or_default();

    let mut variables: Vec<(&str, String)> = vec![
      ("cmd", command.command.clone()),
      ("cwd", cwd.display().to_string()),
      ("depfile", depfile),
    ];
    if !command.description.is_empty() {
      variables.push(("desc", command.description.clone()));
    }

    ninja.build(&outputs, "command", &inputs, &[], order_only, &variables)?;
  }

  if !project_outputs.is_empty() {
    let alias = vec![escape(&artifacts.name)];
    ninja.build(&alias, "phony", &project_outputs, &[], &[], &[])?;
  }
  ninja.finish()?;

  Ok(())
}

/// Escape a path for use in a Ninja build statement.
fn escape(path: &str) -> String {
  path
    .replace('$', "$$")
    .replace(' ', "$ ")
    .replace(':', "$:")
}

/// Minimal writer for the Ninja file syntax.
struct NinjaWriter {
  out: BufWriter<File>,
}

impl NinjaWriter {
  fn create(path: &Path) -> io::Result<Self> {
    Ok(NinjaWriter {
      out: BufWriter::new(File::create(path)?),
    })
  }

  fn finish(mut self) -> io::Result<()> {
    self.out.flush()
  }

  fn subninja(&mut self, name: &str) -> io::Result<()> {
    writeln!(self.out, "subninja {}", name)
  }

  fn rule(
    &mut self,
    name: &str,
    command: &str,
    depfile: &str,
    deps: &str,
    description: &str,
  ) -> io::Result<()> {
    writeln!(self.out, "rule {}", name)?;
    writeln!(self.out, "  command = {}", command)?;
    if !depfile.is_empty() {
      writeln!(self.out, "  depfile = {}", depfile)?;
    }
    if !deps.is_empty() {
      writeln!(self.out, "  deps = {}", deps)?;
    }
    if !description.is_empty() {
      writeln!(self.out, "  description = {}", description)?;
    }
    writeln!(self.out)
  }

  fn build(
    &mut self,
    outputs: &[String],
    rule: &str,
    inputs: &[String],
    implicit: &[String],
    order_only: &[String],
    variables: &[(&str, String)],
  ) -> io::Result<()> {
    write!(self.out, "build")?;
    for output in outputs {
      write!(self.out, " {}", output)?;
    }
    write!(self.out, ": {}", rule)?;
    for input in inputs {
      write!(self.out, " {}", input)?;
    }
    if !implicit.is_empty() {
      write!(self.out, " |")?;
      for path in implicit {
        write!(self.out, " {}", path)?;
      }
    }
    if !order_only.is_empty() {
      write!(self.out, " ||")?;
      for path in order_only {
        write!(self.out, " {}", path)?;
      }
    }
    writeln!(self.out)?;
    for (name, value) in variables {
      writeln!(self.out, "  {} = {}", name, value)?;
    }
    writeln!(self.out)
  }
}
