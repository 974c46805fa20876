//! Staleness evaluation.
//!
//! Walks the command DAG in descending depth order (producers first) and
//! marks each command dirty when:
//!
//! 1. any upstream command is dirty, or
//! 2. any declared output is missing, or
//! 3. any input is newer than the oldest output (or cannot be stat'ed), or
//! 4. the declared depfile lists a dependency newer than the oldest output
//!    (an unreadable or empty depfile also counts as missing information).

use std::path::Path;
use std::time::SystemTime;

use tracing::{debug, trace};

use super::dag::{CommandDag, PendingCommand};
use super::depfile;

/// Mark every stale command in `dag` dirty.
pub fn mark_dirty(dag: &mut CommandDag) {
  let order = dag.order().to_vec();
  for index in order {
    let dirty = evaluate(&dag.commands, index);
    if dirty {
      trace!(
        command = %dag.commands[index].entry.description,
        "command is stale"
      );
    }
    dag.commands[index].dirty = dirty;
  }
}

fn evaluate(commands: &[PendingCommand], index: usize) -> bool {
  let command = &commands[index];

  if command.upstream.iter().any(|&dep| commands[dep].dirty) {
    return true;
  }

  let mut oldest_output: Option<SystemTime> = None;
  for output in &command.entry.outputs {
    match modified(output) {
      Some(time) => {
        oldest_output = Some(match oldest_output {
          Some(oldest) => oldest.min(time),
          None => time,
        });
      }
      None => {
        debug!(output = %output.display(), "output missing");
        return true;
      }
    }
  }
  // Commands without outputs have nothing to compare against; always run.
  let Some(oldest_output) = oldest_output else {
    return true;
  };

  for input in &command.entry.inputs {
    match modified(input) {
      Some(time) if time > oldest_output => return true,
      Some(_) => {}
      None => return true,
    }
  }

  if let Some(dep_file) = &command.entry.dep_file {
    let deps = match depfile::parse_file(dep_file) {
      Ok(deps) => deps,
      Err(err) => {
        debug!(depfile = %dep_file.display(), error = %err, "unreadable depfile");
        return true;
      }
    };
    for dep in deps {
      match modified(&dep) {
        Some(time) if time > oldest_output => return true,
        Some(_) => {}
        None => return true,
      }
    }
  }

  false
}

fn modified(path: &Path) -> Option<SystemTime> {
  std::fs::metadata(path).and_then(|meta| meta.modified()).ok()
}
