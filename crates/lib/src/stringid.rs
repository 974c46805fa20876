//! Interned string identifiers.
//!
//! Small labels (configuration names, option keys) are interned into a
//! process-global table and handled as copyable ids. Two ids compare equal
//! iff their underlying strings are equal, and the empty string maps to a
//! distinguished empty id.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, OnceLock};

/// A handle to an interned string.
///
/// Equality, ordering, and hashing operate on the table index, which is
/// stable for the lifetime of the process. The ordering is total and stable
/// within a run but otherwise unspecified.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StringId(u32);

struct Interner {
  strings: Vec<&'static str>,
  index: HashMap<&'static str, u32>,
}

fn interner() -> &'static Mutex<Interner> {
  static INTERNER: OnceLock<Mutex<Interner>> = OnceLock::new();
  INTERNER.get_or_init(|| {
    let mut index = HashMap::new();
    index.insert("", 0);
    Mutex::new(Interner {
      strings: vec![""],
      index,
    })
  })
}

impl StringId {
  /// The id of the empty string.
  pub const EMPTY: StringId = StringId(0);

  /// Intern `s` and return its id.
  ///
  /// Interning the same string twice returns the same id. The empty string
  /// always maps to [`StringId::EMPTY`].
  pub fn intern(s: &str) -> StringId {
    if s.is_empty() {
      return StringId::EMPTY;
    }

    let mut table = interner().lock().unwrap();
    if let Some(&id) = table.index.get(s) {
      return StringId(id);
    }

    // Interned strings are leaked so the handed-out &'static str stays valid
    // for the rest of the process.
    let entry: &'static str = Box::leak(s.to_owned().into_boxed_str());
    let id = table.strings.len() as u32;
    table.strings.push(entry);
    table.index.insert(entry, id);
    StringId(id)
  }

  /// Whether this is the empty id.
  pub fn is_empty(self) -> bool {
    self.0 == 0
  }

  /// The interned string.
  pub fn as_str(self) -> &'static str {
    interner().lock().unwrap().strings[self.0 as usize]
  }
}

impl Default for StringId {
  fn default() -> Self {
    StringId::EMPTY
  }
}

impl From<&str> for StringId {
  fn from(s: &str) -> Self {
    StringId::intern(s)
  }
}

impl From<String> for StringId {
  fn from(s: String) -> Self {
    StringId::intern(&s)
  }
}

impl fmt::Display for StringId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl fmt::Debug for StringId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "StringId({:?})", self.as_str())
  }
}
