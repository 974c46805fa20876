//! Command DAG construction and depth assignment.
//!
//! Commands are wired into a DAG by matching inputs against other commands'
//! outputs. Each command gets a depth: the longest path from it to any
//! final consumer, so producers always carry strictly greater depth than
//! their consumers and executing in descending depth order runs
//! dependencies first. Commands of equal depth can never depend on each
//! other, which makes depth groups natural parallel waves.

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use tracing::warn;

use super::types::ExecuteError;
use crate::commands::CommandEntry;

/// A command queued for direct execution.
#[derive(Debug)]
pub struct PendingCommand {
  pub entry: CommandEntry,
  /// Longest path to any final consumer; producers sit deeper than users.
  pub depth: u32,
  /// Whether the command needs to run (set by the staleness pass).
  pub dirty: bool,
  /// Indices of the commands producing this command's inputs.
  pub upstream: Vec<usize>,
}

/// The full command DAG for one configuration.
#[derive(Debug)]
pub struct CommandDag {
  pub commands: Vec<PendingCommand>,
  /// Command indices in descending depth order (stable within a depth).
  order: Vec<usize>,
}

impl CommandDag {
  /// Wire `entries` into a DAG and assign depths.
  ///
  /// An output produced by two commands keeps the later producer and warns.
  ///
  /// # Errors
  ///
  /// Returns [`ExecuteError::CycleDetected`] when the commands' inputs and
  /// outputs form a cycle.
  pub fn build(entries: Vec<CommandEntry>) -> Result<Self, ExecuteError> {
    let count = entries.len();

    // Map every output path to the command producing it.
    let mut producers: HashMap<&std::path::Path, usize> = HashMap::new();
    for (index, entry) in entries.iter().enumerate() {
      for output in &entry.outputs {
        if let Some(previous) = producers.insert(output.as_path(), index) {
          warn!(
            output = %output.display(),
            first = previous,
            second = index,
            "output is produced by more than one command"
          );
        }
      }
    }

    // Upstream edges: producers of this command's inputs. Inputs nobody
    // produces are external leaves (source files).
    let mut upstream: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (index, entry) in entries.iter().enumerate() {
      let mut seen = HashSet::new();
      for input in &entry.inputs {
        if let Some(&producer) = producers.get(input.as_path()) {
          if producer != index && seen.insert(producer) {
            upstream[index].push(producer);
          }
        }
      }
    }

    verify_acyclic(count, &upstream)?;

    // Propagate maximum depth from consumers to producers. A node is
    // re-pushed only when its depth strictly increases, and depths are
    // bounded by the longest path, so the walk is O(E) amortized.
    let mut consumed = vec![false; count];
    for deps in &upstream {
      for &dep in deps {
        consumed[dep] = true;
      }
    }
    let mut depth = vec![0u32; count];
    let mut stack: Vec<usize> = (0..count).filter(|&i| !consumed[i]).collect();
    while let Some(index) = stack.pop() {
      let next = depth[index] + 1;
      for &dep in &upstream[index] {
        if depth[dep] < next {
          depth[dep] = next;
          stack.push(dep);
        }
      }
    }

    let mut order: Vec<usize> = (0..count).collect();
    order.sort_by(|&a, &b| depth[b].cmp(&depth[a]));

    let commands = entries
      .into_iter()
      .zip(upstream)
      .zip(depth)
      .map(|((entry, upstream), depth)| PendingCommand {
        entry,
        depth,
        dirty: false,
        upstream,
      })
      .collect();

    Ok(CommandDag { commands, order })
  }

  /// Command indices in descending depth order.
  pub fn order(&self) -> &[usize] {
    &self.order
  }

  /// Dirty command indices, still in descending depth order.
  pub fn dirty_order(&self) -> Vec<usize> {
    self
      .order
      .iter()
      .copied()
      .filter(|&index| self.commands[index].dirty)
      .collect()
  }
}

fn verify_acyclic(count: usize, upstream: &[Vec<usize>]) -> Result<(), ExecuteError> {
  let mut graph = DiGraph::<usize, ()>::with_capacity(count, count);
  let nodes: Vec<_> = (0..count).map(|i| graph.add_node(i)).collect();
  for (index, deps) in upstream.iter().enumerate() {
    for &dep in deps {
      // Edge from producer to consumer.
      graph.add_edge(nodes[dep], nodes[index], ());
    }
  }
  toposort(&graph, None).map_err(|_| ExecuteError::CycleDetected)?;
  Ok(())
}
