//! Cross-platform helpers for tests that execute shell commands.

/// A shell command string that copies `from` to `to`.
#[cfg(unix)]
pub fn copy_cmd(from: &str, to: &str) -> String {
  format!("cp \"{}\" \"{}\"", from, to)
}

#[cfg(windows)]
pub fn copy_cmd(from: &str, to: &str) -> String {
  format!("copy \"{}\" \"{}\"", from, to)
}

/// A shell command string that writes a line to a file.
#[cfg(unix)]
pub fn write_cmd(path: &str, line: &str) -> String {
  format!("echo \"{}\" > \"{}\"", line, path)
}

#[cfg(windows)]
pub fn write_cmd(path: &str, line: &str) -> String {
  format!("echo {} > \"{}\"", line, path)
}

/// A shell command string that always fails.
pub fn fail_cmd() -> String {
  "exit 1".to_string()
}
