//! The project model.
//!
//! Projects are owned by a [`ProjectSet`] arena and reference each other by
//! index ([`ProjectRef`]), so the link graph has trivial lifetimes and cycle
//! detection is a visit set. Each project carries a base option bucket plus
//! selector-keyed buckets that contribute only when their selector matches
//! during resolution.

mod resolve;
mod selector;

pub use resolve::{ResolveError, ResolvedConfig};
pub use selector::{ConfigSelector, ProjectType, Transitivity};

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use crate::option::{standard, OptionCollection};
use crate::platform::Os;
use crate::stringid::StringId;

/// A bucket of options plus the projects linked from it.
#[derive(Debug, Clone, Default)]
pub struct ProjectConfig {
  pub options: OptionCollection,
  pub links: Vec<ProjectRef>,
}

/// Index of a project inside its [`ProjectSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProjectRef(pub(crate) usize);

/// A named unit of the build: an executable, library, or command group.
#[derive(Debug, Clone)]
pub struct Project {
  pub name: String,
  pub project_type: Option<ProjectType>,
  /// The project's local options and direct links.
  pub base: ProjectConfig,
  /// Selector-keyed contributions, merged in selector order when matching.
  pub buckets: BTreeMap<ConfigSelector, ProjectConfig>,
}

impl Project {
  /// The bucket for `selector`, created empty on first access.
  pub fn bucket_mut(&mut self, selector: impl Into<ConfigSelector>) -> &mut ProjectConfig {
    self.buckets.entry(selector.into()).or_default()
  }

  /// Link `dep` from the base bucket.
  pub fn link(&mut self, dep: ProjectRef) {
    self.base.links.push(dep);
  }

  /// The artifact path for this project under `resolved` options:
  /// `OutputPath` when set, otherwise
  /// `<OutputDir>/<OutputPrefix><stem><OutputSuffix><OutputExtension>` with
  /// the stem defaulting to the project name.
  pub fn output_path(&self, resolved: &OptionCollection) -> PathBuf {
    let path = resolved.get(standard::OUTPUT_PATH);
    if !path.as_os_str().is_empty() {
      return path;
    }

    let mut stem = resolved.get(standard::OUTPUT_STEM);
    if stem.is_empty() {
      stem = self.name.clone();
    }

    let file_name = format!(
      "{}{}{}{}",
      resolved.get(standard::OUTPUT_PREFIX),
      stem,
      resolved.get(standard::OUTPUT_SUFFIX),
      resolved.get(standard::OUTPUT_EXTENSION)
    );
    resolved.get(standard::OUTPUT_DIR).join(file_name)
  }
}

/// Arena owning every project of one generator run.
#[derive(Debug, Clone, Default)]
pub struct ProjectSet {
  projects: Vec<Project>,
}

impl ProjectSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a project and return its reference.
  pub fn create(
    &mut self,
    name: impl Into<String>,
    project_type: impl Into<Option<ProjectType>>,
  ) -> ProjectRef {
    self.projects.push(Project {
      name: name.into(),
      project_type: project_type.into(),
      base: ProjectConfig::default(),
      buckets: BTreeMap::new(),
    });
    ProjectRef(self.projects.len() - 1)
  }

  pub fn get(&self, project: ProjectRef) -> &Project {
    &self.projects[project.0]
  }

  pub fn get_mut(&mut self, project: ProjectRef) -> &mut Project {
    &mut self.projects[project.0]
  }

  pub fn len(&self) -> usize {
    self.projects.len()
  }

  pub fn is_empty(&self) -> bool {
    self.projects.is_empty()
  }

  pub fn refs(&self) -> impl Iterator<Item = ProjectRef> {
    (0..self.projects.len()).map(ProjectRef)
  }

  /// Depth-first discovery over links starting from `roots`: leaves precede
  /// their consumers, every project appears once.
  pub fn discover(&self, roots: &[ProjectRef]) -> Vec<ProjectRef> {
    let mut discovered = HashSet::new();
    let mut ordered = Vec::new();
    for &root in roots {
      self.discover_into(root, &mut discovered, &mut ordered);
    }
    ordered
  }

  fn discover_into(
    &self,
    node: ProjectRef,
    discovered: &mut HashSet<ProjectRef>,
    ordered: &mut Vec<ProjectRef>,
  ) {
    if !discovered.insert(node) {
      return;
    }
    let project = self.get(node);
    for &link in &project.base.links {
      self.discover_into(link, discovered, ordered);
    }
    for bucket in project.buckets.values() {
      for &link in &bucket.links {
        self.discover_into(link, discovered, ordered);
      }
    }
    ordered.push(node);
  }

  /// Resolve `project` for the given context into a merged, deduplicated
  /// option collection plus the ordered list of linked projects.
  ///
  /// # Errors
  ///
  /// Returns [`ResolveError::Cycle`] when the link graph contains a cycle
  /// reachable from `project`.
  pub fn resolve(
    &self,
    project: ProjectRef,
    project_type: Option<ProjectType>,
    config_name: StringId,
    target_os: Os,
  ) -> Result<ResolvedConfig, ResolveError> {
    resolve::resolve(self, project, project_type, config_name, target_os)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn create_and_access() {
    let mut set = ProjectSet::new();
    let a = set.create("a", ProjectType::Executable);
    let b = set.create("b", None);

    assert_eq!(set.len(), 2);
    assert_eq!(set.get(a).name, "a");
    assert_eq!(set.get(a).project_type, Some(ProjectType::Executable));
    assert_eq!(set.get(b).project_type, None);
  }

  #[test]
  fn discover_orders_leaves_first() {
    let mut set = ProjectSet::new();
    let leaf = set.create("leaf", ProjectType::StaticLib);
    let mid = set.create("mid", ProjectType::StaticLib);
    let root = set.create("root", ProjectType::Executable);
    set.get_mut(mid).link(leaf);
    set.get_mut(root).link(mid);

    assert_eq!(set.discover(&[root]), vec![leaf, mid, root]);
  }

  #[test]
  fn discover_deduplicates_diamonds() {
    let mut set = ProjectSet::new();
    let base = set.create("base", ProjectType::StaticLib);
    let left = set.create("left", ProjectType::StaticLib);
    let right = set.create("right", ProjectType::StaticLib);
    let top = set.create("top", ProjectType::Executable);
    set.get_mut(left).link(base);
    set.get_mut(right).link(base);
    set.get_mut(top).link(left);
    set.get_mut(top).link(right);

    let order = set.discover(&[top]);
    assert_eq!(order, vec![base, left, right, top]);
  }

  #[test]
  fn discover_includes_bucket_links() {
    let mut set = ProjectSet::new();
    let extra = set.create("extra", ProjectType::StaticLib);
    let root = set.create("root", ProjectType::Executable);
    set
      .get_mut(root)
      .bucket_mut(Transitivity::Public)
      .links
      .push(extra);

    assert_eq!(set.discover(&[root]), vec![extra, root]);
  }

  #[test]
  fn output_path_composition() {
    let mut set = ProjectSet::new();
    let p = set.create("tool", ProjectType::Executable);
    let project = set.get(p);

    // Bare default: just the project name.
    let options = OptionCollection::new();
    assert_eq!(project.output_path(&options), PathBuf::from("tool"));

    // Full composition.
    let mut options = OptionCollection::new();
    options.set(standard::OUTPUT_DIR, PathBuf::from("bin"));
    options.set(standard::OUTPUT_PREFIX, "lib".to_string());
    options.set(standard::OUTPUT_STEM, "core".to_string());
    options.set(standard::OUTPUT_SUFFIX, "-v2".to_string());
    options.set(standard::OUTPUT_EXTENSION, ".a".to_string());
    assert_eq!(
      project.output_path(&options),
      PathBuf::from("bin/libcore-v2.a")
    );

    // OutputPath overrides everything.
    let mut options = OptionCollection::new();
    options.set(standard::OUTPUT_PATH, PathBuf::from("exact/place"));
    options.set(standard::OUTPUT_DIR, PathBuf::from("ignored"));
    assert_eq!(project.output_path(&options), PathBuf::from("exact/place"));
  }
}
