//! Environment bindings provided by the build harness.
//!
//! A generated build description binary is launched with a handful of
//! environment variables describing where it lives and how it was invoked.
//! All of them have working defaults so a description can also be run
//! directly (e.g. via `cargo run`).

use std::path::PathBuf;

/// The harness-provided environment of one generator run.
#[derive(Debug, Clone)]
pub struct BuildEnv {
  /// Path to the user's build description source (`BUILD_FILE`).
  pub build_file: PathBuf,
  /// Workspace root the generator runs from (`BUILD_DIR`).
  pub build_dir: PathBuf,
  /// Header/include root of the bootstrap (`BUILD_H_DIR`).
  pub include_dir: PathBuf,
  /// The caller's working directory at invocation (`START_DIR`).
  pub start_dir: PathBuf,
  /// Arguments to pass when the generator re-invokes itself (`BUILD_ARGS`).
  pub build_args: Vec<String>,
}

impl BuildEnv {
  /// Read the bindings from the process environment.
  ///
  /// `BUILD_DIR` and `START_DIR` default to the current directory;
  /// `BUILD_ARGS` defaults to this process's own arguments.
  pub fn from_env() -> BuildEnv {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let path_var = |key: &str| std::env::var_os(key).map(PathBuf::from);

    BuildEnv {
      build_file: path_var("BUILD_FILE").unwrap_or_default(),
      build_dir: path_var("BUILD_DIR").unwrap_or_else(|| cwd.clone()),
      include_dir: path_var("BUILD_H_DIR").unwrap_or_default(),
      start_dir: path_var("START_DIR").unwrap_or(cwd),
      build_args: match std::env::var("BUILD_ARGS") {
        Ok(args) => args.split_whitespace().map(str::to_string).collect(),
        Err(_) => std::env::args().skip(1).collect(),
      },
    }
  }
}
