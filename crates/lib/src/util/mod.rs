//! Small path helpers shared by toolchains and emitters.

pub mod testutil;

use std::path::{Path, PathBuf};

/// Relative path from `dir` back to the generation root (the current
/// directory). Returns `.` when they are the same.
///
/// Emitters prefix this to root-relative paths so commands run from `dir`
/// still find them.
pub fn path_offset(dir: &Path) -> PathBuf {
  if dir.as_os_str().is_empty() || dir == Path::new(".") {
    return PathBuf::from(".");
  }
  let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
  let dir = if dir.is_absolute() {
    dir.to_path_buf()
  } else {
    cwd.join(dir)
  };
  if dir == cwd {
    return PathBuf::from(".");
  }
  pathdiff::diff_paths(&cwd, &dir).unwrap_or_else(|| PathBuf::from("."))
}

/// Rewrite a root-relative `path` to be valid from the directory `offset`
/// points away from. Absolute paths and the identity offset pass through.
pub fn rebase(offset: &Path, path: &Path) -> PathBuf {
  if path.is_absolute() || offset.as_os_str().is_empty() || offset == Path::new(".") {
    return path.to_path_buf();
  }
  offset.join(path)
}
