//! The direct builder.
//!
//! Materializes every project's commands, wires them into a DAG, evaluates
//! staleness, and runs the dirty commands itself with bounded concurrency.
//! Commands of equal depth are independent by construction, so each depth
//! level forms a wave executed in parallel under a semaphore; waves run in
//! descending depth order so dependencies always finish first.

pub mod dag;
pub mod depfile;
pub mod stale;
mod types;

pub use dag::{CommandDag, PendingCommand};
pub use types::{BuildOpts, BuildReport, ExecuteError};

use std::io::{IsTerminal, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use owo_colors::{OwoColorize, Stream};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::commands::CommandEntry;
use crate::emit::{materialize, GenerateError};
use crate::platform::Os;
use crate::project::{ProjectRef, ProjectSet};
use crate::stringid::StringId;

/// Build every project reachable from `roots` for `config`, placing
/// intermediate data under `target`.
///
/// Equivalent to emitting and immediately executing: commands are
/// materialized, ordered, checked for staleness, and the stale ones run.
pub fn build(
  set: &mut ProjectSet,
  roots: &[ProjectRef],
  target: &Path,
  config: StringId,
  target_os: Os,
  opts: &BuildOpts,
) -> Result<BuildReport, GenerateError> {
  std::fs::create_dir_all(target)?;

  let mut entries = Vec::new();
  for project in set.discover(roots) {
    if let Some(artifacts) = materialize(set, project, config, target_os, target)? {
      entries.extend(artifacts.commands);
    }
  }

  let mut dag = CommandDag::build(entries).map_err(GenerateError::Execute)?;
  stale::mark_dirty(&mut dag);

  let runtime = tokio::runtime::Runtime::new().map_err(ExecuteError::Io)?;
  let report = runtime
    .block_on(run_dirty(&dag, opts))
    .map_err(GenerateError::Execute)?;
  Ok(report)
}

/// Run the dirty commands of an already-evaluated DAG.
pub async fn run_dirty(dag: &CommandDag, opts: &BuildOpts) -> Result<BuildReport, ExecuteError> {
  let dirty = dag.dirty_order();
  let total = dirty.len();

  info!(
    total = dag.commands.len(),
    dirty = total,
    "direct build starting"
  );

  if total == 0 {
    println!("{}", summary_line(0));
    return Ok(BuildReport {
      total: dag.commands.len(),
      rebuilt: 0,
    });
  }

  let semaphore = Arc::new(Semaphore::new(opts.parallelism.max(1)));
  let abort = Arc::new(AtomicBool::new(false));
  let completed = Arc::new(AtomicUsize::new(0));
  let progress = Arc::new(Progress::new(total));

  let mut failure: Option<ExecuteError> = None;

  for wave in depth_waves(dag, &dirty) {
    let mut join_set = JoinSet::new();

    for index in wave {
      let entry = dag.commands[index].entry.clone();
      let semaphore = semaphore.clone();
      let abort = abort.clone();
      let completed = completed.clone();
      let progress = progress.clone();

      join_set.spawn(async move {
        let _permit = semaphore.acquire().await.unwrap();
        // A failure elsewhere stops new commands; in-flight ones finish.
        if abort.load(Ordering::SeqCst) {
          return Ok(());
        }

        progress.step(&entry.description);
        match run_command(&entry).await {
          Ok(()) => {
            completed.fetch_add(1, Ordering::SeqCst);
            Ok(())
          }
          Err(err) => {
            abort.store(true, Ordering::SeqCst);
            Err(err)
          }
        }
      });
    }

    while let Some(join_result) = join_set.join_next().await {
      match join_result {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
          error!(error = %err, "command failed");
          if failure.is_none() {
            failure = Some(err);
          }
        }
        Err(err) => {
          error!(error = %err, "build task panicked");
        }
      }
    }

    if failure.is_some() {
      break;
    }
  }

  progress.finish();

  if let Some(err) = failure {
    return Err(err);
  }

  let rebuilt = completed.load(Ordering::SeqCst);
  println!("{}", summary_line(rebuilt));

  Ok(BuildReport {
    total: dag.commands.len(),
    rebuilt,
  })
}

/// Group dirty command indices (already depth-descending) into waves of
/// equal depth.
fn depth_waves(dag: &CommandDag, dirty: &[usize]) -> Vec<Vec<usize>> {
  let mut waves: Vec<Vec<usize>> = Vec::new();
  let mut current_depth = None;
  for &index in dirty {
    let depth = dag.commands[index].depth;
    if current_depth != Some(depth) {
      waves.push(Vec::new());
      current_depth = Some(depth);
    }
    if let Some(wave) = waves.last_mut() {
      wave.push(index);
    }
  }
  waves
}

async fn run_command(entry: &CommandEntry) -> Result<(), ExecuteError> {
  // Parent directories of declared outputs must exist before the command
  // runs.
  for output in &entry.outputs {
    if let Some(parent) = output.parent() {
      if !parent.as_os_str().is_empty() {
        tokio::fs::create_dir_all(parent)
          .await
          .map_err(|source| ExecuteError::CreateOutputDir {
            path: parent.to_path_buf(),
            source,
          })?;
      }
    }
  }

  let (shell, flag) = shell();
  let mut command = tokio::process::Command::new(shell);
  command.arg(flag).arg(&entry.command);
  if !entry.working_directory.as_os_str().is_empty() {
    command.current_dir(&entry.working_directory);
  }

  debug!(cmd = %entry.command, "spawning");
  let output = command.output().await?;

  if !output.status.success() {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    let description = if entry.description.is_empty() {
      entry.command.clone()
    } else {
      entry.description.clone()
    };
    return Err(ExecuteError::CommandFailed {
      description,
      code: output.status.code(),
      output: text,
    });
  }

  Ok(())
}

fn shell() -> (&'static str, &'static str) {
  #[cfg(unix)]
  {
    ("/bin/sh", "-c")
  }
  #[cfg(windows)]
  {
    ("cmd.exe", "/C")
  }
}

/// The final status line of a run.
fn summary_line(rebuilt: usize) -> String {
  if rebuilt == 0 {
    "0 targets rebuilt. (Everything up to date.)".to_string()
  } else {
    format!("{} targets rebuilt.", rebuilt)
  }
}

/// `[i/N] description` progress, carriage-return updated on a terminal.
struct Progress {
  total: usize,
  started: AtomicUsize,
  terminal: bool,
}

impl Progress {
  fn new(total: usize) -> Self {
    Progress {
      total,
      started: AtomicUsize::new(0),
      terminal: std::io::stdout().is_terminal(),
    }
  }

  fn step(&self, description: &str) {
    let current = self.started.fetch_add(1, Ordering::SeqCst) + 1;
    let prefix = format!("[{}/{}]", current, self.total);
    if self.terminal {
      let mut out = std::io::stdout().lock();
      let _ = write!(
        out,
        "\r\x1b[K{} {}",
        prefix.if_supports_color(Stream::Stdout, |p| p.dimmed()),
        description
      );
      let _ = out.flush();
    } else {
      println!("{} {}", prefix, description);
    }
  }

  fn finish(&self) {
    if self.terminal && self.started.load(Ordering::SeqCst) > 0 {
      println!();
    }
  }
}
