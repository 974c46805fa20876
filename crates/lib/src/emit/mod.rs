//! The generation pipeline shared by every emitter.
//!
//! For one project and configuration: resolve options, run post-processors,
//! let the toolchain materialize commands, and hand the command stream to
//! whichever emitter asked: a serializer (Ninja, MSVC) or the direct
//! builder.

pub mod msvc;
pub mod ninja;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::commands::CommandEntry;
use crate::execute::ExecuteError;
use crate::option::standard;
use crate::platform::Os;
use crate::postprocess::PostProcessError;
use crate::project::{ProjectRef, ProjectSet, ProjectType, ResolveError};
use crate::sources::SourceError;
use crate::stringid::StringId;
use crate::toolchain::{default_toolchain, ToolchainError};

/// Errors raised during generation.
#[derive(Debug, Error)]
pub enum GenerateError {
  #[error("trying to emit project with no name")]
  MissingProjectName,

  #[error("command project '{0}' has no commands")]
  CommandProjectWithoutCommands(String),

  #[error("no configurations available")]
  NoConfigurations,

  #[error("unknown configuration '{0}'")]
  UnknownConfiguration(String),

  #[error("no emitters specified")]
  NoEmitters,

  #[error("unsupported host operating system")]
  UnsupportedHost,

  #[error(transparent)]
  Resolve(#[from] ResolveError),

  #[error(transparent)]
  Toolchain(#[from] ToolchainError),

  #[error(transparent)]
  PostProcess(#[from] PostProcessError),

  #[error(transparent)]
  Source(#[from] SourceError),

  #[error(transparent)]
  Execute(#[from] ExecuteError),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// One project's materialized command stream.
#[derive(Debug, Default)]
pub struct ProjectArtifacts {
  pub name: String,
  pub commands: Vec<CommandEntry>,
  /// Final artifact paths produced by the toolchain (not every command
  /// output; objects and scratch files are not listed here).
  pub outputs: Vec<PathBuf>,
}

/// Run the per-project pipeline: resolve, post-process, materialize.
///
/// Returns `None` for type-less projects; they participate in link
/// traversal but emit nothing themselves.
///
/// Commands are materialized relative to the generation root; `data_dir` is
/// where intermediate build data (objects, PCHs) goes.
pub fn materialize(
  set: &mut ProjectSet,
  project: ProjectRef,
  config: StringId,
  target_os: Os,
  data_dir: &Path,
) -> Result<Option<ProjectArtifacts>, GenerateError> {
  let project_type = set.get(project).project_type;
  let resolved = set.resolve(project, project_type, config, target_os)?;
  let mut options = resolved.options;
  options.set(standard::DATA_DIR, data_dir.to_path_buf());

  let project = set.get_mut(project);

  // Hooks may append further hooks; index into the freshly-read list each
  // step instead of iterating a snapshot.
  let mut index = 0;
  loop {
    let processor = match options
      .get_ref(standard::POST_PROCESS)
      .and_then(|list| list.get(index))
    {
      Some(processor) => processor.clone(),
      None => break,
    };
    processor.run(project, &mut options)?;
    index += 1;
  }

  if project.project_type.is_none() {
    return Ok(None);
  }
  if project.name.is_empty() {
    return Err(GenerateError::MissingProjectName);
  }

  info!(project = %project.name, config = %config, "emitting project");

  let toolchain = options
    .get_ref(standard::TOOLCHAIN)
    .cloned()
    .unwrap_or_else(default_toolchain);
  let outputs = toolchain.process(project, &mut options, config, Path::new("."))?;

  let commands = options.get(standard::COMMANDS);
  if project.project_type == Some(ProjectType::Command) && commands.is_empty() {
    return Err(GenerateError::CommandProjectWithoutCommands(
      project.name.clone(),
    ));
  }

  Ok(Some(ProjectArtifacts {
    name: project.name.clone(),
    commands,
    outputs,
  }))
}

/// Gather every project's `GeneratorDependencies`, base bucket and selector
/// buckets alike.
pub(crate) fn generator_dependencies(set: &ProjectSet, projects: &[ProjectRef]) -> Vec<PathBuf> {
  let mut dependencies = Vec::new();
  for &r in projects {
    let project = set.get(r);
    dependencies.extend(project.base.options.get(standard::GENERATOR_DEPENDENCIES));
    for bucket in project.buckets.values() {
      dependencies.extend(bucket.options.get(standard::GENERATOR_DEPENDENCIES));
    }
  }
  dependencies
}
