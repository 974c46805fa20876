//! The known option keys and their value shapes.

use std::path::PathBuf;

use super::{Opt, ToolchainHandle};
use crate::commands::{BundleEntry, CommandEntry};
use crate::postprocess::PostProcessor;

/// Target CPU tag (e.g. `x64`). Overwrite on combine.
pub const PLATFORM: Opt<String> = Opt::new("Platform");

/// Header search paths, relative to the generation root.
pub const INCLUDE_PATHS: Opt<Vec<PathBuf>> = Opt::new("IncludePaths");

/// Source files fed to the toolchain.
pub const FILES: Opt<Vec<PathBuf>> = Opt::new("Files");

/// Libraries appended to the link line.
pub const LIBS: Opt<Vec<PathBuf>> = Opt::new("Libs");

/// Paths whose changes require re-running the generator.
pub const GENERATOR_DEPENDENCIES: Opt<Vec<PathBuf>> = Opt::new("GeneratorDependencies");

/// Preprocessor definitions.
pub const DEFINES: Opt<Vec<String>> = Opt::new("Defines");

/// Abstract compiler knobs translated per toolchain (e.g. `c++17`,
/// `optimize`, `debuginfo`). Unknown features are ignored.
pub const FEATURES: Opt<Vec<String>> = Opt::new("Features");

/// macOS frameworks to link against.
pub const FRAMEWORKS: Opt<Vec<String>> = Opt::new("Frameworks");

/// Extra contents of an app bundle.
pub const BUNDLE_CONTENTS: Opt<Vec<BundleEntry>> = Opt::new("BundleContents");

/// Directory the final artifact is placed in.
pub const OUTPUT_DIR: Opt<PathBuf> = Opt::new("OutputDir");

/// Artifact file stem; defaults to the project name.
pub const OUTPUT_STEM: Opt<String> = Opt::new("OutputStem");

/// Artifact file extension, including the dot.
pub const OUTPUT_EXTENSION: Opt<String> = Opt::new("OutputExtension");

/// Prefix prepended to the artifact file name (e.g. `lib`).
pub const OUTPUT_PREFIX: Opt<String> = Opt::new("OutputPrefix");

/// Suffix appended after the stem, before the extension.
pub const OUTPUT_SUFFIX: Opt<String> = Opt::new("OutputSuffix");

/// Full artifact path; overrides the composed output name entirely.
pub const OUTPUT_PATH: Opt<PathBuf> = Opt::new("OutputPath");

/// Header to compile into a precompiled header.
pub const BUILD_PCH: Opt<PathBuf> = Opt::new("BuildPch");

/// Precompiled header to import into every compile.
pub const IMPORT_PCH: Opt<PathBuf> = Opt::new("ImportPch");

/// Hooks run after resolution, before toolchain materialization.
pub const POST_PROCESS: Opt<Vec<PostProcessor>> = Opt::new("PostProcess");

/// Raw command records, appended to the emitted stream as-is.
pub const COMMANDS: Opt<Vec<CommandEntry>> = Opt::new("Commands");

/// The toolchain translating this project's options into commands.
pub const TOOLCHAIN: Opt<ToolchainHandle> = Opt::new("Toolchain");

/// Root directory for intermediate build data (objects, PCHs).
pub const DATA_DIR: Opt<PathBuf> = Opt::new("DataDir");

/// Linked artifacts a project contributes to its consumers' link lines.
/// Written by toolchains into a public per-config bucket.
pub const LINKED_OUTPUTS: Opt<Vec<PathBuf>> = Opt::new("_LinkedOutputs");
