//! Toolchains translate resolved options into command records.

mod gcc;

pub use gcc::GccLikeToolchain;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;

use crate::option::{OptionCollection, ToolchainHandle};
use crate::project::Project;
use crate::stringid::StringId;

/// Errors raised while materializing commands.
#[derive(Debug, Error)]
pub enum ToolchainError {
  /// The toolchain cannot produce commands for this project's type.
  #[error("project type in '{project}' not supported by toolchain")]
  UnsupportedProjectType { project: String },
}

/// Translates resolved options into compile/link/archive command records for
/// one family of tools.
///
/// `path_offset` is the relative path from the command's working directory
/// back to the generation root; implementations prefix it to root-relative
/// paths they embed in command lines.
pub trait ToolchainProvider: Send + Sync {
  fn name(&self) -> &str;

  fn compiler(&self, project: &Project, resolved: &OptionCollection, path_offset: &Path)
    -> String;

  fn common_compiler_flags(
    &self,
    project: &Project,
    resolved: &OptionCollection,
    path_offset: &Path,
  ) -> String;

  fn compiler_flags(
    &self,
    project: &Project,
    resolved: &OptionCollection,
    path_offset: &Path,
    input: &str,
    output: &str,
  ) -> String;

  fn linker(&self, project: &Project, resolved: &OptionCollection, path_offset: &Path) -> String;

  fn common_linker_flags(
    &self,
    project: &Project,
    resolved: &OptionCollection,
    path_offset: &Path,
  ) -> Result<String, ToolchainError>;

  fn linker_flags(
    &self,
    project: &Project,
    resolved: &OptionCollection,
    path_offset: &Path,
    inputs: &[String],
    output: &str,
  ) -> Result<String, ToolchainError>;

  /// Append this project's command records to `resolved[Commands]` and
  /// return the final output paths.
  ///
  /// Static libraries also publish their linked outputs into the project's
  /// public per-config bucket so downstream linkers pick them up.
  /// Project types other than executables and libraries produce nothing.
  fn process(
    &self,
    project: &mut Project,
    resolved: &mut OptionCollection,
    config: StringId,
    working_dir: &Path,
  ) -> Result<Vec<PathBuf>, ToolchainError>;
}

/// The toolchain used when a project does not select one.
pub fn default_toolchain() -> ToolchainHandle {
  static DEFAULT: OnceLock<ToolchainHandle> = OnceLock::new();
  DEFAULT
    .get_or_init(|| std::sync::Arc::new(GccLikeToolchain::new("g++", "g++", "ar")))
    .clone()
}
