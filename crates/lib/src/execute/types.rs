//! Types for direct command execution.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building directly.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// The command graph has a cycle.
  #[error("command dependency cycle detected")]
  CycleDetected,

  /// An output's parent directory could not be created.
  #[error("failed to create output directory '{path}': {source}")]
  CreateOutputDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// A command exited nonzero; `output` is its merged stdout and stderr.
  #[error("command failed with exit code {code:?}: {description}\n{output}")]
  CommandFailed {
    description: String,
    code: Option<i32>,
    output: String,
  },

  /// I/O error during execution.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// Configuration for the direct builder.
#[derive(Debug, Clone)]
pub struct BuildOpts {
  /// Maximum number of commands run concurrently.
  pub parallelism: usize,
}

impl Default for BuildOpts {
  fn default() -> Self {
    BuildOpts {
      parallelism: num_cpus(),
    }
  }
}

/// Summary of one direct-builder run.
#[derive(Debug, Default)]
pub struct BuildReport {
  /// Commands materialized for the configuration.
  pub total: usize,
  /// Commands that were stale and re-run.
  pub rebuilt: usize,
}

/// Detected CPU count for default parallelism.
pub(crate) fn num_cpus() -> usize {
  std::thread::available_parallelism()
    .map(|p| p.get())
    .unwrap_or(4)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_parallelism_is_positive() {
    assert!(BuildOpts::default().parallelism >= 1);
  }
}
