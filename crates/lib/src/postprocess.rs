//! Post-processing hooks.
//!
//! A post-processor is a user-supplied callable run after a project's options
//! are resolved but before the toolchain materializes commands. Hooks may
//! append commands, write scratch files, and append further post-processors;
//! the invocation loop re-reads the hook list each step to pick those up.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::commands;
use crate::option::{standard, OptionCollection};
use crate::project::Project;

/// Errors raised by post-processing hooks.
#[derive(Debug, Error)]
pub enum PostProcessError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("{0}")]
  Message(String),
}

type PostProcessFn =
  dyn Fn(&Project, &mut OptionCollection) -> Result<(), PostProcessError> + Send + Sync;

/// A uniquely-identified post-processing callable.
///
/// Identity (equality, hashing, ordering) is by creation id, so the same
/// hook appended twice deduplicates to a single invocation while two
/// distinct hooks with identical behavior do not.
#[derive(Clone)]
pub struct PostProcessor {
  id: u64,
  func: Arc<PostProcessFn>,
}

impl PostProcessor {
  pub fn new(
    func: impl Fn(&Project, &mut OptionCollection) -> Result<(), PostProcessError>
      + Send
      + Sync
      + 'static,
  ) -> Self {
    static NEXT_ID: AtomicU64 = AtomicU64::new(0);
    PostProcessor {
      id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
      func: Arc::new(func),
    }
  }

  pub fn run(
    &self,
    project: &Project,
    resolved: &mut OptionCollection,
  ) -> Result<(), PostProcessError> {
    (self.func)(project, resolved)
  }
}

impl PartialEq for PostProcessor {
  fn eq(&self, other: &Self) -> bool {
    self.id == other.id
  }
}

impl Eq for PostProcessor {}

impl PartialOrd for PostProcessor {
  fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for PostProcessor {
  fn cmp(&self, other: &Self) -> std::cmp::Ordering {
    self.id.cmp(&other.id)
  }
}

impl Hash for PostProcessor {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.id.hash(state);
  }
}

impl fmt::Debug for PostProcessor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "PostProcessor({})", self.id)
  }
}

/// A hook packaging the project's output into an app bundle.
///
/// Writes a minimal Info.plist under `<DataDir>/<project>/` and appends copy
/// commands placing the binary and plist inside `<output>.<extension>`.
pub fn bundle(extension: &str) -> PostProcessor {
  let extension = extension.trim_start_matches('.').to_string();
  PostProcessor::new(move |project, resolved| {
    let project_output = project.output_path(resolved);
    let mut bundle_output = project_output.clone();
    bundle_output.set_extension(&extension);
    let bundle_binary = project_output
      .file_stem()
      .map(std::path::PathBuf::from)
      .unwrap_or_default();

    let data_dir = resolved.get(standard::DATA_DIR);
    let plist_path = data_dir.join(&project.name).join("Info.plist");
    write_file(&plist_path, &generate_plist(project, resolved))?;

    resolved.push(
      standard::COMMANDS,
      commands::copy(
        project_output,
        bundle_output.join("Contents/MacOS").join(&bundle_binary),
      ),
    );
    resolved.push(
      standard::COMMANDS,
      commands::copy(&plist_path, bundle_output.join("Contents/Info.plist")),
    );
    for entry in resolved.get(standard::BUNDLE_CONTENTS) {
      resolved.push(
        standard::COMMANDS,
        commands::copy(&entry.source, bundle_output.join(&entry.target)),
      );
    }
    Ok(())
  })
}

/// A minimal Info.plist scaffold.
pub fn generate_plist(_project: &Project, _resolved: &OptionCollection) -> String {
  let mut result = String::new();
  result.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
  result.push_str(
    "<!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n",
  );
  result.push_str("<plist version=\"1.0\">\n");
  result.push_str("<dict>\n");
  result.push_str("</dict>\n");
  result.push_str("</plist>\n");
  result
}

fn write_file(path: &Path, data: &str) -> std::io::Result<()> {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::write(path, data)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn identity_is_per_instance() {
    let noop = |_: &Project, _: &mut OptionCollection| Ok(());
    let a = PostProcessor::new(noop);
    let b = PostProcessor::new(noop);
    let a2 = a.clone();

    assert_eq!(a, a2);
    assert_ne!(a, b);
    assert!(a < b);
  }

  #[test]
  fn run_invokes_the_hook() {
    use crate::option::standard::DEFINES;
    use crate::project::ProjectSet;

    let mut set = ProjectSet::new();
    let r = set.create("p", None);

    let hook = PostProcessor::new(|_, resolved| {
      resolved.push(DEFINES, "FROM_HOOK".to_string());
      Ok(())
    });

    let mut options = OptionCollection::new();
    hook.run(set.get(r), &mut options).unwrap();
    assert_eq!(options.get(DEFINES), vec!["FROM_HOOK"]);
  }

  #[test]
  fn plist_is_wellformed_scaffold() {
    use crate::project::ProjectSet;

    let mut set = ProjectSet::new();
    let r = set.create("app", None);
    let plist = generate_plist(set.get(r), &OptionCollection::new());

    assert!(plist.starts_with("<?xml"));
    assert!(plist.contains("<plist version=\"1.0\">"));
    assert!(plist.ends_with("</plist>\n"));
  }
}
