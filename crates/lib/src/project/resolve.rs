//! Configuration resolution.
//!
//! Produces one merged option collection for a (project-type, config-name,
//! target-OS) context by traversing links transitively and merging matching
//! selector buckets. Merge order, later entries overwriting scalars and
//! appending to sequences:
//!
//! 1. transitively resolved link contributions, in link-declaration order,
//!    depth-first;
//! 2. links declared inside the selected buckets, same recursion;
//! 3. the project's own base options (only when resolving locally);
//! 4. each selected bucket's options, in sorted selector order.
//!
//! Deduplication runs once, at the end of the top-level call.

use thiserror::Error;
use tracing::trace;

use super::selector::Transitivity;
use super::{ProjectRef, ProjectSet, ProjectType};
use crate::option::OptionCollection;
use crate::platform::Os;
use crate::stringid::StringId;

/// The merged result of resolving one project.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
  pub options: OptionCollection,
  /// Transitively linked projects, leaves first, each once.
  pub links: Vec<ProjectRef>,
}

/// Errors raised during resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
  /// The link graph has a cycle; resolution would recurse forever.
  #[error("project link cycle detected: {0}")]
  Cycle(String),
}

pub(super) fn resolve(
  set: &ProjectSet,
  root: ProjectRef,
  project_type: Option<ProjectType>,
  config_name: StringId,
  target_os: Os,
) -> Result<ResolvedConfig, ResolveError> {
  let mut visiting = Vec::new();
  let mut resolved = resolve_inner(
    set,
    root,
    project_type,
    config_name,
    target_os,
    true,
    &mut visiting,
  )?;
  resolved.options.deduplicate();
  dedup_links(&mut resolved.links);
  Ok(resolved)
}

fn resolve_inner(
  set: &ProjectSet,
  node: ProjectRef,
  project_type: Option<ProjectType>,
  config_name: StringId,
  target_os: Os,
  local: bool,
  visiting: &mut Vec<ProjectRef>,
) -> Result<ResolvedConfig, ResolveError> {
  if visiting.contains(&node) {
    return Err(ResolveError::Cycle(cycle_path(set, visiting, node)));
  }
  visiting.push(node);

  let project = set.get(node);
  trace!(project = %project.name, local, "resolving");

  // Buckets that contribute in this context. When resolving the project
  // itself, PublicOnly buckets are skipped; when visited via a link, only
  // Public and PublicOnly buckets contribute.
  let selected: Vec<_> = project
    .buckets
    .iter()
    .filter(|(selector, _)| {
      if local {
        if selector.transitivity == Some(Transitivity::PublicOnly) {
          return false;
        }
      } else if !matches!(
        selector.transitivity,
        Some(Transitivity::Public) | Some(Transitivity::PublicOnly)
      ) {
        return false;
      }
      selector.matches(project_type, config_name, target_os)
    })
    .map(|(_, bucket)| bucket)
    .collect();

  let mut result = ResolvedConfig::default();

  for &link in &project.base.links {
    merge_link(
      set,
      link,
      project_type,
      config_name,
      target_os,
      visiting,
      &mut result,
    )?;
  }
  for bucket in &selected {
    for &link in &bucket.links {
      merge_link(
        set,
        link,
        project_type,
        config_name,
        target_os,
        visiting,
        &mut result,
      )?;
    }
  }

  if local {
    result.options.combine(&project.base.options);
  }
  for bucket in &selected {
    result.options.combine(&bucket.options);
  }

  visiting.pop();
  Ok(result)
}

fn merge_link(
  set: &ProjectSet,
  link: ProjectRef,
  project_type: Option<ProjectType>,
  config_name: StringId,
  target_os: Os,
  visiting: &mut Vec<ProjectRef>,
  result: &mut ResolvedConfig,
) -> Result<(), ResolveError> {
  let sub = resolve_inner(
    set,
    link,
    project_type,
    config_name,
    target_os,
    false,
    visiting,
  )?;
  result.links.extend(sub.links);
  result.links.push(link);
  result.options.combine(&sub.options);
  Ok(())
}

fn dedup_links(links: &mut Vec<ProjectRef>) {
  let mut seen = std::collections::HashSet::with_capacity(links.len());
  links.retain(|link| seen.insert(*link));
}

fn cycle_path(set: &ProjectSet, visiting: &[ProjectRef], offender: ProjectRef) -> String {
  let mut names: Vec<&str> = visiting.iter().map(|&r| set.get(r).name.as_str()).collect();
  names.push(set.get(offender).name.as_str());
  names.join(" -> ")
}
