//! Minimal MSVC project emitter.
//!
//! Writes a `.vcxproj` per project naming the project configurations and the
//! compilable sources. Full MSBuild target semantics are out of scope; this
//! is the thin serializer end of the pipeline only.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::platform::Os;
use crate::project::{ProjectRef, ProjectSet};
use crate::stringid::StringId;

use super::GenerateError;
use crate::option::standard;

const COMPILE_EXTENSIONS: [&str; 3] = ["c", "cpp", "mm"];

/// Emit `.vcxproj` files for every discovered project into `target`.
pub fn emit(
  set: &mut ProjectSet,
  roots: &[ProjectRef],
  target: &Path,
  configs: &[StringId],
  target_os: Os,
) -> Result<(), GenerateError> {
  std::fs::create_dir_all(target)?;

  for project_ref in set.discover(roots) {
    let project_type = set.get(project_ref).project_type;
    if project_type.is_none() {
      continue;
    }
    let resolved = set.resolve(project_ref, project_type, StringId::EMPTY, target_os)?;

    let project = set.get(project_ref);
    if project.name.is_empty() {
      return Err(GenerateError::MissingProjectName);
    }

    info!(project = %project.name, "emitting msvc project");

    let mut xml = XmlWriter::create(&target.join(format!("{}.vcxproj", project.name)))?;
    xml.open(
      "Project",
      &[
        ("DefaultTargets", "Build"),
        ("ToolsVersion", "16.0"),
        ("xmlns", "http://schemas.microsoft.com/developer/msbuild/2003"),
      ],
    )?;

    xml.open("ItemGroup", &[("Label", "ProjectConfigurations")])?;
    for config in configs {
      xml.open("ProjectConfiguration", &[("Include", config.as_str())])?;
      xml.leaf("Configuration", &[], config.as_str())?;
      xml.leaf("Platform", &[], "x64")?;
      xml.close()?;
    }
    xml.close()?;

    xml.open("PropertyGroup", &[("Label", "Globals")])?;
    xml.close()?;

    xml.open("ItemGroup", &[])?;
    for input in resolved.options.get(standard::FILES) {
      let compilable = input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| COMPILE_EXTENSIONS.contains(&e));
      if compilable {
        xml.leaf_empty("ClCompile", &[("Include", &input.display().to_string())])?;
      }
    }
    xml.close()?;

    xml.close()?;
    xml.finish()?;
  }

  Ok(())
}

/// Indented XML writer with an explicit open/close tag stack.
struct XmlWriter {
  out: BufWriter<File>,
  stack: Vec<String>,
}

impl XmlWriter {
  fn create(path: &Path) -> io::Result<Self> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "<?xml version=\"1.0\" encoding=\"utf-8\"?>")?;
    Ok(XmlWriter {
      out,
      stack: Vec::new(),
    })
  }

  fn indent(&self) -> String {
    "  ".repeat(self.stack.len())
  }

  fn open(&mut self, tag: &str, attributes: &[(&str, &str)]) -> io::Result<()> {
    write!(self.out, "{}<{}", self.indent(), tag)?;
    for (name, value) in attributes {
      write!(self.out, " {}=\"{}\"", name, value)?;
    }
    writeln!(self.out, ">")?;
    self.stack.push(tag.to_string());
    Ok(())
  }

  fn close(&mut self) -> io::Result<()> {
    let tag = self.stack.pop().unwrap_or_default();
    writeln!(self.out, "{}</{}>", self.indent(), tag)
  }

  fn leaf(&mut self, tag: &str, attributes: &[(&str, &str)], content: &str) -> io::Result<()> {
    write!(self.out, "{}<{}", self.indent(), tag)?;
    for (name, value) in attributes {
      write!(self.out, " {}=\"{}\"", name, value)?;
    }
    writeln!(self.out, ">{}</{}>", content, tag)
  }

  fn leaf_empty(&mut self, tag: &str, attributes: &[(&str, &str)]) -> io::Result<()> {
    write!(self.out, "{}<{}", self.indent(), tag)?;
    for (name, value) in attributes {
      write!(self.out, " {}=\"{}\"", name, value)?;
    }
    writeln!(self.out, " />")
  }

  fn finish(mut self) -> io::Result<()> {
    self.out.flush()
  }
}
