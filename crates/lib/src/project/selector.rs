//! Configuration selectors.
//!
//! A selector qualifies when a bucket of options applies: by transitivity,
//! project type, configuration name, and target OS. Unset fields are
//! wildcards. Selectors compose with `/`, e.g.
//! `Transitivity::Public / ProjectType::Executable / "release"`; setting the
//! same field twice is an error in the build description.

use std::ops::Div;

use crate::platform::Os;
use crate::stringid::StringId;

/// The role a project plays in the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProjectType {
  Executable,
  StaticLib,
  SharedLib,
  Command,
}

/// Visibility of an option bucket to consumers of a project via links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Transitivity {
  /// Applies to the project itself only.
  Local,
  /// Applies to the project and its consumers.
  Public,
  /// Applies to consumers only.
  PublicOnly,
}

/// A filter over (transitivity, project type, config name, target OS).
///
/// Field order matters: the derived ordering keys the sorted bucket map, and
/// with it the merge order of matching buckets during resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigSelector {
  pub transitivity: Option<Transitivity>,
  pub project_type: Option<ProjectType>,
  pub name: Option<StringId>,
  pub target_os: Option<Os>,
}

impl ConfigSelector {
  /// Whether every non-wildcard field matches the active resolution context.
  pub fn matches(
    &self,
    project_type: Option<ProjectType>,
    config_name: StringId,
    target_os: Os,
  ) -> bool {
    if let Some(t) = self.project_type {
      if Some(t) != project_type {
        return false;
      }
    }
    if let Some(name) = self.name {
      if name != config_name {
        return false;
      }
    }
    if let Some(os) = self.target_os {
      if os != target_os {
        return false;
      }
    }
    true
  }

  fn merged(mut self, other: ConfigSelector) -> ConfigSelector {
    if let Some(transitivity) = other.transitivity {
      if self.transitivity.is_some() {
        panic!("Transitivity was specified twice.");
      }
      self.transitivity = Some(transitivity);
    }
    if let Some(project_type) = other.project_type {
      if self.project_type.is_some() {
        panic!("Project type was specified twice.");
      }
      self.project_type = Some(project_type);
    }
    if let Some(name) = other.name {
      if self.name.is_some() {
        panic!("Configuration name was specified twice.");
      }
      self.name = Some(name);
    }
    if let Some(target_os) = other.target_os {
      if self.target_os.is_some() {
        panic!("Configuration target operating system was specified twice.");
      }
      self.target_os = Some(target_os);
    }
    self
  }
}

impl From<Transitivity> for ConfigSelector {
  fn from(transitivity: Transitivity) -> Self {
    ConfigSelector {
      transitivity: Some(transitivity),
      ..Default::default()
    }
  }
}

impl From<ProjectType> for ConfigSelector {
  fn from(project_type: ProjectType) -> Self {
    ConfigSelector {
      project_type: Some(project_type),
      ..Default::default()
    }
  }
}

impl From<StringId> for ConfigSelector {
  fn from(name: StringId) -> Self {
    ConfigSelector {
      name: Some(name),
      ..Default::default()
    }
  }
}

impl From<&str> for ConfigSelector {
  fn from(name: &str) -> Self {
    ConfigSelector::from(StringId::intern(name))
  }
}

impl From<Os> for ConfigSelector {
  fn from(target_os: Os) -> Self {
    ConfigSelector {
      target_os: Some(target_os),
      ..Default::default()
    }
  }
}

impl<R: Into<ConfigSelector>> Div<R> for ConfigSelector {
  type Output = ConfigSelector;

  fn div(self, rhs: R) -> ConfigSelector {
    self.merged(rhs.into())
  }
}

impl<R: Into<ConfigSelector>> Div<R> for Transitivity {
  type Output = ConfigSelector;

  fn div(self, rhs: R) -> ConfigSelector {
    ConfigSelector::from(self).merged(rhs.into())
  }
}

impl<R: Into<ConfigSelector>> Div<R> for ProjectType {
  type Output = ConfigSelector;

  fn div(self, rhs: R) -> ConfigSelector {
    ConfigSelector::from(self).merged(rhs.into())
  }
}

impl<R: Into<ConfigSelector>> Div<R> for Os {
  type Output = ConfigSelector;

  fn div(self, rhs: R) -> ConfigSelector {
    ConfigSelector::from(self).merged(rhs.into())
  }
}
