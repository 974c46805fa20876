//! Heterogeneous, type-safe option storage.
//!
//! Options are typed keys ([`Opt`]) into an [`OptionCollection`]. The payload
//! of each entry is one of a closed set of value shapes ([`OptionValue`]);
//! the key's phantom type selects the shape, so reading an option with the
//! wrong type is caught at the single dispatch point instead of anywhere a
//! type-erased pointer is touched.
//!
//! Combining two collections overwrites scalar entries with the right-hand
//! side and appends sequence entries. Deduplication removes later duplicates
//! of sequence elements while preserving first-occurrence order.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

use crate::commands::{BundleEntry, CommandEntry};
use crate::postprocess::PostProcessor;
use crate::stringid::StringId;
use crate::toolchain::ToolchainProvider;

pub mod standard;

/// Shared handle to a toolchain implementation.
pub type ToolchainHandle = Arc<dyn ToolchainProvider>;

/// A typed option key.
///
/// The name identifies the entry in a collection; the phantom type selects
/// the payload shape. Keys are cheap, copyable constants; see
/// [`standard`] for the known options.
pub struct Opt<T> {
  name: &'static str,
  _shape: PhantomData<fn() -> T>,
}

impl<T> Opt<T> {
  pub const fn new(name: &'static str) -> Self {
    Opt {
      name,
      _shape: PhantomData,
    }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn id(&self) -> StringId {
    StringId::intern(self.name)
  }
}

impl<T> Clone for Opt<T> {
  fn clone(&self) -> Self {
    *self
  }
}

impl<T> Copy for Opt<T> {}

impl<T> fmt::Debug for Opt<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Opt({:?})", self.name)
  }
}

/// The closed set of payload shapes an option can hold.
#[derive(Clone)]
pub enum OptionValue {
  Str(String),
  Path(PathBuf),
  Paths(Vec<PathBuf>),
  Strs(Vec<String>),
  Bundles(Vec<BundleEntry>),
  Commands(Vec<CommandEntry>),
  Processors(Vec<PostProcessor>),
  Toolchain(ToolchainHandle),
}

impl OptionValue {
  fn shape_name(&self) -> &'static str {
    match self {
      OptionValue::Str(_) => "string",
      OptionValue::Path(_) => "path",
      OptionValue::Paths(_) => "path sequence",
      OptionValue::Strs(_) => "string sequence",
      OptionValue::Bundles(_) => "bundle-entry sequence",
      OptionValue::Commands(_) => "command sequence",
      OptionValue::Processors(_) => "post-processor sequence",
      OptionValue::Toolchain(_) => "toolchain",
    }
  }

  /// Merge `other` into `self`: scalars are overwritten by the right-hand
  /// side, sequences append. Mixing shapes under one key is a programmer
  /// error and aborts.
  fn combine(&mut self, other: &OptionValue, key: StringId) {
    use OptionValue::*;
    match (self, other) {
      (Str(a), Str(b)) => *a = b.clone(),
      (Path(a), Path(b)) => *a = b.clone(),
      (Toolchain(a), Toolchain(b)) => *a = b.clone(),
      (Paths(a), Paths(b)) => a.extend(b.iter().cloned()),
      (Strs(a), Strs(b)) => a.extend(b.iter().cloned()),
      (Bundles(a), Bundles(b)) => a.extend(b.iter().cloned()),
      (Commands(a), Commands(b)) => a.extend(b.iter().cloned()),
      (Processors(a), Processors(b)) => a.extend(b.iter().cloned()),
      (a, b) => panic!(
        "option '{}' combined with mismatched value shapes ({} vs {})",
        key,
        a.shape_name(),
        b.shape_name()
      ),
    }
  }

  /// Remove later duplicates from sequence shapes, keeping first occurrences.
  fn deduplicate(&mut self) {
    match self {
      OptionValue::Paths(v) => dedup_stable(v),
      OptionValue::Strs(v) => dedup_stable(v),
      OptionValue::Bundles(v) => dedup_stable(v),
      OptionValue::Commands(v) => dedup_stable(v),
      OptionValue::Processors(v) => dedup_stable(v),
      OptionValue::Str(_) | OptionValue::Path(_) | OptionValue::Toolchain(_) => {}
    }
  }
}

impl fmt::Debug for OptionValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      OptionValue::Str(v) => write!(f, "Str({:?})", v),
      OptionValue::Path(v) => write!(f, "Path({:?})", v),
      OptionValue::Paths(v) => write!(f, "Paths({:?})", v),
      OptionValue::Strs(v) => write!(f, "Strs({:?})", v),
      OptionValue::Bundles(v) => write!(f, "Bundles({} entries)", v.len()),
      OptionValue::Commands(v) => write!(f, "Commands({} entries)", v.len()),
      OptionValue::Processors(v) => write!(f, "Processors({} entries)", v.len()),
      OptionValue::Toolchain(t) => write!(f, "Toolchain({:?})", t.name()),
    }
  }
}

fn dedup_stable<T: Eq + Hash + Clone>(values: &mut Vec<T>) {
  let mut seen = HashSet::with_capacity(values.len());
  values.retain(|value| seen.insert(value.clone()));
}

/// Maps a Rust payload type onto its [`OptionValue`] shape.
pub trait OptionShape: Sized {
  fn into_value(self) -> OptionValue;
  fn from_value(value: &OptionValue) -> Option<&Self>;
  fn from_value_mut(value: &mut OptionValue) -> Option<&mut Self>;
}

macro_rules! impl_option_shape {
  ($ty:ty, $variant:ident) => {
    impl OptionShape for $ty {
      fn into_value(self) -> OptionValue {
        OptionValue::$variant(self)
      }

      fn from_value(value: &OptionValue) -> Option<&Self> {
        match value {
          OptionValue::$variant(v) => Some(v),
          _ => None,
        }
      }

      fn from_value_mut(value: &mut OptionValue) -> Option<&mut Self> {
        match value {
          OptionValue::$variant(v) => Some(v),
          _ => None,
        }
      }
    }
  };
}

impl_option_shape!(String, Str);
impl_option_shape!(PathBuf, Path);
impl_option_shape!(Vec<PathBuf>, Paths);
impl_option_shape!(Vec<String>, Strs);
impl_option_shape!(Vec<BundleEntry>, Bundles);
impl_option_shape!(Vec<CommandEntry>, Commands);
impl_option_shape!(Vec<PostProcessor>, Processors);
impl_option_shape!(ToolchainHandle, Toolchain);

/// An associative structure of option values keyed by option name.
#[derive(Clone, Debug, Default)]
pub struct OptionCollection {
  values: BTreeMap<StringId, OptionValue>,
}

impl OptionCollection {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn contains<T>(&self, option: Opt<T>) -> bool {
    self.values.contains_key(&option.id())
  }

  /// Read a copy of the value, or the shape's default when unset.
  pub fn get<T: OptionShape + Default + Clone>(&self, option: Opt<T>) -> T {
    match self.values.get(&option.id()) {
      Some(value) => expect_shape::<T>(option.name(), value).clone(),
      None => T::default(),
    }
  }

  /// Borrow the value if set.
  pub fn get_ref<T: OptionShape>(&self, option: Opt<T>) -> Option<&T> {
    self
      .values
      .get(&option.id())
      .map(|value| expect_shape::<T>(option.name(), value))
  }

  /// Overwrite the value.
  pub fn set<T: OptionShape>(&mut self, option: Opt<T>, value: T) {
    if let Some(existing) = self.values.get(&option.id()) {
      let shape = existing.shape_name();
      if T::from_value(existing).is_none() {
        panic!(
          "option '{}' written with a different value shape than before ({})",
          option.name(),
          shape
        );
      }
    }
    self.values.insert(option.id(), value.into_value());
  }

  /// Mutable access to the value, inserting the shape's default first when
  /// the option is unset.
  pub fn entry<T: OptionShape + Default>(&mut self, option: Opt<T>) -> &mut T {
    let value = self
      .values
      .entry(option.id())
      .or_insert_with(|| T::default().into_value());
    let shape = value.shape_name();
    match T::from_value_mut(value) {
      Some(v) => v,
      None => panic!(
        "option '{}' accessed with a different value shape than it was written with ({})",
        option.name(),
        shape
      ),
    }
  }

  /// Append one element to a sequence option.
  pub fn push<T>(&mut self, option: Opt<Vec<T>>, item: impl Into<T>)
  where
    Vec<T>: OptionShape,
  {
    self.entry(option).push(item.into());
  }

  /// Append several elements to a sequence option.
  pub fn extend<T, I>(&mut self, option: Opt<Vec<T>>, items: I)
  where
    Vec<T>: OptionShape,
    I: IntoIterator,
    I::Item: Into<T>,
  {
    self.entry(option).extend(items.into_iter().map(Into::into));
  }

  /// Merge `other` into `self`, key by key.
  ///
  /// Keys absent locally are cloned from `other`; keys present are combined
  /// (overwrite for scalars, append for sequences).
  pub fn combine(&mut self, other: &OptionCollection) {
    for (key, value) in &other.values {
      match self.values.get_mut(key) {
        Some(existing) => existing.combine(value, *key),
        None => {
          self.values.insert(*key, value.clone());
        }
      }
    }
  }

  /// Deduplicate every sequence-shaped entry, keeping first occurrences.
  pub fn deduplicate(&mut self) {
    for value in self.values.values_mut() {
      value.deduplicate();
    }
  }
}

fn expect_shape<'a, T: OptionShape>(name: &str, value: &'a OptionValue) -> &'a T {
  let shape = value.shape_name();
  match T::from_value(value) {
    Some(v) => v,
    None => panic!(
      "option '{}' accessed with a different value shape than it was written with ({})",
      name, shape
    ),
  }
}
