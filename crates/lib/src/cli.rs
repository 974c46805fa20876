//! Command-line surface of a generated build description.
//!
//! Every build description compiles to its own binary; this module gives
//! those binaries a shared argument set (`--ninja[=DIR]`, `--msvc[=DIR]`,
//! `--direct[=DIR]`, `--config NAME`) and the dispatch into the selected
//! emitters.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use crate::emit::{msvc, ninja, GenerateError};
use crate::env::BuildEnv;
use crate::execute::{self, BuildOpts};
use crate::platform::Os;
use crate::project::{ProjectRef, ProjectSet};
use crate::stringid::StringId;

const EMITTERS: [(&str, &str); 3] = [
  ("ninja", "Generate Ninja build files."),
  ("msvc", "Generate MSVC project files."),
  ("direct", "Build directly without an external executor."),
];

/// Options recognized by every generated build description.
#[derive(Debug, Parser)]
#[command(about = "Meta-build generator", disable_version_flag = true)]
pub struct Cli {
  /// Emit Ninja build files, optionally into DIR.
  #[arg(
    long,
    value_name = "DIR",
    num_args = 0..=1,
    require_equals = true,
    default_missing_value = "ninjabuild"
  )]
  pub ninja: Option<PathBuf>,

  /// Emit MSVC project files, optionally into DIR.
  #[arg(
    long,
    value_name = "DIR",
    num_args = 0..=1,
    require_equals = true,
    default_missing_value = "msvcbuild"
  )]
  pub msvc: Option<PathBuf>,

  /// Build directly, placing build data into DIR.
  #[arg(
    long,
    value_name = "DIR",
    num_args = 0..=1,
    require_equals = true,
    default_missing_value = "directbuild"
  )]
  pub direct: Option<PathBuf>,

  /// Restrict the run to one configuration.
  #[arg(long, value_name = "NAME")]
  pub config: Option<String>,

  /// Maximum number of concurrently running build commands.
  #[arg(long, short = 'j', value_name = "N")]
  pub jobs: Option<usize>,

  /// Enable verbose logging.
  #[arg(long, short)]
  pub verbose: bool,
}

/// Parse the process arguments and run the selected emitters.
pub fn generate(
  set: &mut ProjectSet,
  roots: &[ProjectRef],
  configs: &[StringId],
) -> Result<(), GenerateError> {
  generate_with(set, roots, configs, Cli::parse())
}

/// Run the selected emitters with already-parsed options.
pub fn generate_with(
  set: &mut ProjectSet,
  roots: &[ProjectRef],
  configs: &[StringId],
  cli: Cli,
) -> Result<(), GenerateError> {
  if configs.is_empty() {
    return Err(GenerateError::NoConfigurations);
  }

  let env = BuildEnv::from_env();
  let cwd = std::env::current_dir()?;
  if env.build_dir != cwd && env.build_dir.is_dir() {
    info!(dir = %env.build_dir.display(), "entering build directory");
    std::env::set_current_dir(&env.build_dir)?;
  }

  let target_os = Os::current().ok_or(GenerateError::UnsupportedHost)?;

  let selected: Vec<StringId> = match &cli.config {
    Some(name) => {
      let id = StringId::intern(name);
      if !configs.contains(&id) {
        return Err(GenerateError::UnknownConfiguration(name.clone()));
      }
      vec![id]
    }
    None => configs.to_vec(),
  };

  let mut any_emitter = false;

  if let Some(dir) = &cli.ninja {
    any_emitter = true;
    for &config in &selected {
      ninja::emit(set, roots, &dir.join(config.as_str()), config, target_os, &env)?;
    }
  }

  if let Some(dir) = &cli.msvc {
    any_emitter = true;
    msvc::emit(set, roots, dir, &selected, target_os)?;
  }

  if let Some(dir) = &cli.direct {
    any_emitter = true;
    let mut opts = BuildOpts::default();
    if let Some(jobs) = cli.jobs {
      opts.parallelism = jobs;
    }
    for &config in &selected {
      execute::build(set, roots, &dir.join(config.as_str()), config, target_os, &opts)?;
    }
  }

  if !any_emitter {
    print_usage();
    return Err(GenerateError::NoEmitters);
  }

  Ok(())
}

fn print_usage() {
  eprintln!("Usage: <description> --emitter[=targetDir]");
  eprintln!("Example: <description> --ninja=ninjabuild");
  eprintln!();
  eprintln!("Available emitters:");
  for (name, help) in EMITTERS {
    eprintln!("  --{:<8} {}", name, help);
  }
  eprintln!();
}
