//! Recursive source listing.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::option::{standard, OptionCollection};

/// Extensions collected into `Files` by [`source_list`].
const SOURCE_EXTENSIONS: [&str; 5] = ["c", "cpp", "mm", "h", "hpp"];

/// Errors raised while listing sources.
#[derive(Debug, Error)]
pub enum SourceError {
  #[error("source directory '{0}' does not exist")]
  Missing(PathBuf),

  #[error("source directory '{0}' contains no source files")]
  Empty(PathBuf),

  #[error("failed to walk '{path}': {source}")]
  Walk {
    path: PathBuf,
    #[source]
    source: walkdir::Error,
  },
}

/// Collect every C/C++/Objective-C source under `path` into `Files`.
///
/// The directory tree itself is recorded in `GeneratorDependencies` so
/// emitted builds re-run the generator when the tree changes.
///
/// # Errors
///
/// Fails when `path` is missing or is not a directory, and when the listing
/// matches no source files at all.
pub fn source_list(path: impl AsRef<Path>) -> Result<OptionCollection, SourceError> {
  let path = path.as_ref();
  if !path.is_dir() {
    return Err(SourceError::Missing(path.to_path_buf()));
  }

  let mut result = OptionCollection::new();
  result.push(standard::GENERATOR_DEPENDENCIES, path);

  let mut file_count = 0usize;
  for entry in WalkDir::new(path) {
    let entry = entry.map_err(|source| SourceError::Walk {
      path: path.to_path_buf(),
      source,
    })?;

    if entry.file_type().is_dir() {
      // Subdirectories are generator dependencies too: new files appearing
      // in them must trigger a re-generation.
      if entry.path() != path {
        result.push(standard::GENERATOR_DEPENDENCIES, entry.path());
      }
      continue;
    }
    if !entry.file_type().is_file() {
      continue;
    }

    let matches = entry
      .path()
      .extension()
      .and_then(|e| e.to_str())
      .is_some_and(|e| SOURCE_EXTENSIONS.contains(&e));
    if matches {
      result.push(standard::FILES, entry.path());
      file_count += 1;
    }
  }

  if file_count == 0 {
    return Err(SourceError::Empty(path.to_path_buf()));
  }

  debug!(path = %path.display(), files = file_count, "listed sources");
  Ok(result)
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn collects_sources_recursively() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir(temp.path().join("sub")).unwrap();
    std::fs::write(temp.path().join("a.cpp"), "").unwrap();
    std::fs::write(temp.path().join("a.h"), "").unwrap();
    std::fs::write(temp.path().join("notes.txt"), "").unwrap();
    std::fs::write(temp.path().join("sub/b.c"), "").unwrap();

    let options = source_list(temp.path()).unwrap();
    let files = options.get(standard::FILES);

    assert_eq!(files.len(), 3);
    assert!(files.iter().any(|f| f.ends_with("a.cpp")));
    assert!(files.iter().any(|f| f.ends_with("a.h")));
    assert!(files.iter().any(|f| f.ends_with("sub/b.c")));
    assert!(!files.iter().any(|f| f.ends_with("notes.txt")));

    let deps = options.get(standard::GENERATOR_DEPENDENCIES);
    assert!(deps.contains(&temp.path().to_path_buf()));
    assert!(deps.contains(&temp.path().join("sub")));
  }

  #[test]
  fn missing_directory_is_an_error() {
    let err = source_list("/nonexistent/girder/src").unwrap_err();
    assert!(matches!(err, SourceError::Missing(_)));
  }

  #[test]
  fn empty_listing_is_an_error() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("readme.md"), "").unwrap();

    let err = source_list(temp.path()).unwrap_err();
    assert!(matches!(err, SourceError::Empty(_)));
  }
}
