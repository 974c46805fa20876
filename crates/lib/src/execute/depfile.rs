//! Make-style dependency file parser.
//!
//! Compilers write files of the form `outputs : inputs` with `\` line
//! continuations and `\ ` escaping spaces inside paths. Only the input
//! section matters here; it lists the headers a compile actually read.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors reading a depfile. Callers treat any of these as "the declaring
/// command is dirty" rather than failing the build.
#[derive(Debug, Error)]
pub enum DepfileError {
  #[error("failed to read depfile '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("depfile '{0}' is empty")]
  Empty(PathBuf),
}

/// Parse the depfile at `path` and return its input paths.
pub fn parse_file(path: &Path) -> Result<Vec<PathBuf>, DepfileError> {
  let text = std::fs::read_to_string(path).map_err(|source| DepfileError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  if text.trim().is_empty() {
    return Err(DepfileError::Empty(path.to_path_buf()));
  }
  Ok(parse(&text).into_iter().map(PathBuf::from).collect())
}

/// Parse depfile text into its input paths.
///
/// Tokens before the `:` terminator are targets and are discarded; a token
/// ending with `:` starts the input section. A backslash before a space
/// escapes the space into the path, a backslash before a newline continues
/// the logical line, and a backslash before anything else is a literal
/// backslash.
pub fn parse(text: &str) -> Vec<String> {
  let mut inputs = Vec::new();
  let mut token = String::new();
  let mut in_inputs = false;

  let mut flush = |token: &mut String, in_inputs: &mut bool| {
    if token.is_empty() {
      return;
    }
    if *in_inputs {
      inputs.push(std::mem::take(token));
    } else {
      if token.ends_with(':') {
        *in_inputs = true;
      }
      token.clear();
    }
  };

  let mut chars = text.chars().peekable();
  while let Some(c) = chars.next() {
    match c {
      '\\' => match chars.peek() {
        Some(' ') => {
          token.push(' ');
          chars.next();
        }
        Some('\n') => {
          chars.next();
          flush(&mut token, &mut in_inputs);
        }
        Some('\r') => {
          chars.next();
          if chars.peek() == Some(&'\n') {
            chars.next();
          }
          flush(&mut token, &mut in_inputs);
        }
        _ => token.push('\\'),
      },
      ' ' | '\t' | '\n' | '\r' => flush(&mut token, &mut in_inputs),
      _ => token.push(c),
    }
  }
  flush(&mut token, &mut in_inputs);

  inputs
}
