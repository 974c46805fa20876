//! GCC/Clang-style toolchain.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::{ToolchainError, ToolchainProvider};
use crate::commands::CommandEntry;
use crate::option::{standard, OptionCollection};
use crate::project::{Project, ProjectType, Transitivity};
use crate::stringid::StringId;
use crate::util;

/// Extensions the compile stage accepts; other `Files` entries are ignored.
const COMPILE_EXTENSIONS: [&str; 3] = ["c", "cpp", "mm"];

/// A toolchain driving a GCC-compatible compiler/linker and an `ar`-style
/// archiver.
pub struct GccLikeToolchain {
  compiler: String,
  linker: String,
  archiver: String,
}

impl GccLikeToolchain {
  pub fn new(
    compiler: impl Into<String>,
    linker: impl Into<String>,
    archiver: impl Into<String>,
  ) -> Self {
    GccLikeToolchain {
      compiler: compiler.into(),
      linker: linker.into(),
      archiver: archiver.into(),
    }
  }

  /// Default artifact naming per project type, applied only when the user
  /// left the corresponding option unset.
  fn apply_output_defaults(project_type: Option<ProjectType>, resolved: &mut OptionCollection) {
    let (prefix, extension) = match project_type {
      Some(ProjectType::StaticLib) => ("lib", ".a"),
      Some(ProjectType::SharedLib) => ("lib", ".so"),
      _ => return,
    };
    if resolved.get_ref(standard::OUTPUT_PREFIX).is_none() {
      resolved.set(standard::OUTPUT_PREFIX, prefix.to_string());
    }
    if resolved.get_ref(standard::OUTPUT_EXTENSION).is_none() {
      resolved.set(standard::OUTPUT_EXTENSION, extension.to_string());
    }
  }
}

impl ToolchainProvider for GccLikeToolchain {
  fn name(&self) -> &str {
    "gcc-like"
  }

  fn compiler(&self, _project: &Project, _resolved: &OptionCollection, _offset: &Path) -> String {
    self.compiler.clone()
  }

  fn common_compiler_flags(
    &self,
    _project: &Project,
    resolved: &OptionCollection,
    path_offset: &Path,
  ) -> String {
    let mut flags = String::new();

    for define in resolved.get(standard::DEFINES) {
      flags.push_str(&format!(" -D\"{}\"", define));
    }
    for path in resolved.get(standard::INCLUDE_PATHS) {
      flags.push_str(&format!(
        " -I\"{}\"",
        util::rebase(path_offset, &path).display()
      ));
    }
    if resolved.get(standard::PLATFORM) == "x64" {
      flags.push_str(" -m64 -arch x86_64");
    }

    for feature in resolved.get(standard::FEATURES) {
      match feature.as_str() {
        "c++17" => flags.push_str(" -std=c++17"),
        "libc++" => flags.push_str(" -stdlib=libc++"),
        "optimize" => flags.push_str(" -O3"),
        "debuginfo" => flags.push_str(" -g"),
        _ => {}
      }
    }

    flags
  }

  fn compiler_flags(
    &self,
    _project: &Project,
    _resolved: &OptionCollection,
    _offset: &Path,
    input: &str,
    output: &str,
  ) -> String {
    format!(" -MMD -MF {output}.d -c -o {output} {input}")
  }

  fn linker(&self, project: &Project, _resolved: &OptionCollection, _offset: &Path) -> String {
    if project.project_type == Some(ProjectType::StaticLib) {
      self.archiver.clone()
    } else {
      self.linker.clone()
    }
  }

  fn common_linker_flags(
    &self,
    project: &Project,
    resolved: &OptionCollection,
    path_offset: &Path,
  ) -> Result<String, ToolchainError> {
    let mut flags = String::new();

    match project.project_type {
      Some(ProjectType::StaticLib) => {
        flags.push_str(" -rcs");
      }
      Some(ProjectType::Executable) | Some(ProjectType::SharedLib) => {
        for path in resolved.get(standard::LIBS) {
          flags.push_str(&format!(" {}", util::rebase(path_offset, &path).display()));
        }
        for framework in resolved.get(standard::FRAMEWORKS) {
          flags.push_str(&format!(" -framework {}", framework));
        }
        if project.project_type == Some(ProjectType::SharedLib) {
          if resolved.get(standard::FEATURES).iter().any(|f| f == "bundle") {
            flags.push_str(" -bundle");
          } else {
            flags.push_str(" -shared");
          }
        }
      }
      _ => {
        return Err(ToolchainError::UnsupportedProjectType {
          project: project.name.clone(),
        })
      }
    }

    Ok(flags)
  }

  fn linker_flags(
    &self,
    project: &Project,
    _resolved: &OptionCollection,
    _offset: &Path,
    inputs: &[String],
    output: &str,
  ) -> Result<String, ToolchainError> {
    let mut flags = String::new();

    match project.project_type {
      Some(ProjectType::StaticLib) => {
        flags.push_str(&format!(" \"{}\"", output));
      }
      Some(ProjectType::Executable) | Some(ProjectType::SharedLib) => {
        flags.push_str(&format!(" -o \"{}\"", output));
      }
      _ => {
        return Err(ToolchainError::UnsupportedProjectType {
          project: project.name.clone(),
        })
      }
    }
    for input in inputs {
      flags.push_str(&format!(" \"{}\"", input));
    }

    Ok(flags)
  }

  fn process(
    &self,
    project: &mut Project,
    resolved: &mut OptionCollection,
    config: StringId,
    working_dir: &Path,
  ) -> Result<Vec<PathBuf>, ToolchainError> {
    if !matches!(
      project.project_type,
      Some(ProjectType::Executable) | Some(ProjectType::SharedLib) | Some(ProjectType::StaticLib)
    ) {
      return Ok(Vec::new());
    }

    let path_offset = util::path_offset(working_dir);
    let data_dir = resolved.get(standard::DATA_DIR);

    Self::apply_output_defaults(project.project_type, resolved);

    let compiler = self.compiler(project, resolved, &path_offset);
    let mut common_compiler_flags = self.common_compiler_flags(project, resolved, &path_offset);
    let linker = self.linker(project, resolved, &path_offset);
    let common_linker_flags = self.common_linker_flags(project, resolved, &path_offset)?;

    let build_pch = resolved.get(standard::BUILD_PCH);
    let import_pch = resolved.get(standard::IMPORT_PCH);

    if !build_pch.as_os_str().is_empty() {
      let input = build_pch;
      let input_str = util::rebase(&path_offset, &input).display().to_string();
      let output = data_dir.join("pch").join(format!("{}.pch", input.display()));
      let output_str = util::rebase(&path_offset, &output).display().to_string();

      let command = CommandEntry {
        command: format!(
          "{}{} -x c++-header -Xclang -emit-pch{}",
          compiler,
          common_compiler_flags,
          self.compiler_flags(project, resolved, &path_offset, &input_str, &output_str)
        ),
        dep_file: Some(PathBuf::from(format!("{}.d", output.display()))),
        description: format!("Compiling {} PCH: {}", project.name, input.display()),
        working_directory: working_dir.to_path_buf(),
        outputs: vec![output],
        inputs: vec![input],
      };
      resolved.push(standard::COMMANDS, command);
    }

    let mut pch_inputs = Vec::new();
    if !import_pch.as_os_str().is_empty() {
      let input = data_dir
        .join("pch")
        .join(format!("{}.pch", import_pch.display()));
      common_compiler_flags.push_str(&format!(
        " -Xclang -include-pch -Xclang {}",
        util::rebase(&path_offset, &input).display()
      ));
      pch_inputs.push(input);
    }

    let mut linker_inputs = Vec::new();
    for input in resolved.get(standard::FILES) {
      let compilable = input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| COMPILE_EXTENSIONS.contains(&e));
      if !compilable {
        continue;
      }

      let input_str = util::rebase(&path_offset, &input).display().to_string();
      let output = data_dir
        .join("obj")
        .join(&project.name)
        .join(format!("{}.o", input.display()));
      let output_str = util::rebase(&path_offset, &output).display().to_string();

      let mut inputs = vec![input.clone()];
      inputs.extend(pch_inputs.iter().cloned());

      let command = CommandEntry {
        command: format!(
          "{}{}{}",
          compiler,
          common_compiler_flags,
          self.compiler_flags(project, resolved, &path_offset, &input_str, &output_str)
        ),
        dep_file: Some(PathBuf::from(format!("{}.d", output.display()))),
        description: format!("Compiling {}: {}", project.name, input.display()),
        working_directory: working_dir.to_path_buf(),
        outputs: vec![output.clone()],
        inputs,
      };
      resolved.push(standard::COMMANDS, command);

      linker_inputs.push(output);
    }

    let mut outputs = Vec::new();

    if !linker.is_empty() {
      for output in resolved.get(standard::LINKED_OUTPUTS) {
        linker_inputs.push(output);
      }

      let linker_input_strs: Vec<String> = linker_inputs
        .iter()
        .map(|input| util::rebase(&path_offset, input).display().to_string())
        .collect();

      let output = project.output_path(resolved);
      let output_str = util::rebase(&path_offset, &output).display().to_string();

      let command = CommandEntry {
        command: format!(
          "{}{}{}",
          linker,
          common_linker_flags,
          self.linker_flags(project, resolved, &path_offset, &linker_input_strs, &output_str)?
        ),
        description: format!("Linking {}: {}", project.name, output.display()),
        working_directory: working_dir.to_path_buf(),
        inputs: linker_inputs,
        outputs: vec![output.clone()],
        dep_file: None,
      };
      resolved.push(standard::COMMANDS, command);

      debug!(project = %project.name, output = %output.display(), "linked output");
      outputs.push(output.clone());

      if project.project_type == Some(ProjectType::StaticLib) {
        project
          .bucket_mut(Transitivity::Public / config)
          .options
          .push(standard::LINKED_OUTPUTS, output);
      }
    }

    Ok(outputs)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::option::OptionCollection;
  use crate::platform::Os;
  use crate::project::ProjectSet;

  fn toolchain() -> GccLikeToolchain {
    GccLikeToolchain::new("g++", "g++", "ar")
  }

  fn process_project(
    set: &mut ProjectSet,
    project: crate::project::ProjectRef,
    config: StringId,
  ) -> (OptionCollection, Vec<PathBuf>) {
    let project_type = set.get(project).project_type;
    let resolved = set
      .resolve(project, project_type, config, Os::Linux)
      .unwrap();
    let mut options = resolved.options;
    options.set(standard::DATA_DIR, PathBuf::from("data"));
    let outputs = toolchain()
      .process(set.get_mut(project), &mut options, config, Path::new("."))
      .unwrap();
    (options, outputs)
  }

  #[test]
  fn single_file_executable_gets_compile_and_link() {
    let mut set = ProjectSet::new();
    let hello = set.create("hello", ProjectType::Executable);
    set.get_mut(hello).base.options.push(standard::FILES, "hello.cpp");

    let (options, outputs) = process_project(&mut set, hello, StringId::EMPTY);
    let commands = options.get(standard::COMMANDS);

    assert_eq!(commands.len(), 2);

    let compile = &commands[0];
    assert_eq!(
      compile.command,
      "g++ -MMD -MF data/obj/hello/hello.cpp.o.d -c -o data/obj/hello/hello.cpp.o hello.cpp"
    );
    assert_eq!(compile.inputs, vec![PathBuf::from("hello.cpp")]);
    assert_eq!(compile.outputs, vec![PathBuf::from("data/obj/hello/hello.cpp.o")]);
    assert_eq!(
      compile.dep_file,
      Some(PathBuf::from("data/obj/hello/hello.cpp.o.d"))
    );

    let link = &commands[1];
    assert_eq!(link.command, "g++ -o \"hello\" \"data/obj/hello/hello.cpp.o\"");
    assert_eq!(link.outputs, vec![PathBuf::from("hello")]);

    assert_eq!(outputs, vec![PathBuf::from("hello")]);
  }

  #[test]
  fn non_compilable_files_are_ignored() {
    let mut set = ProjectSet::new();
    let p = set.create("p", ProjectType::Executable);
    set
      .get_mut(p)
      .base
      .options
      .extend(standard::FILES, ["a.cpp", "a.h", "readme.md", "b.c", "c.mm"]);

    let (options, _) = process_project(&mut set, p, StringId::EMPTY);
    let commands = options.get(standard::COMMANDS);

    // Three compiles plus the link.
    assert_eq!(commands.len(), 4);
  }

  #[test]
  fn static_lib_archives_and_publishes_linked_output() {
    let mut set = ProjectSet::new();
    let util = set.create("util", ProjectType::StaticLib);
    set.get_mut(util).base.options.push(standard::FILES, "util.cpp");

    let config = StringId::intern("rel");
    let (options, outputs) = process_project(&mut set, util, config);
    let commands = options.get(standard::COMMANDS);

    let archive = &commands[1];
    assert_eq!(
      archive.command,
      "ar -rcs \"libutil.a\" \"data/obj/util/util.cpp.o\""
    );
    assert_eq!(outputs, vec![PathBuf::from("libutil.a")]);

    // The archive is now a public contribution for this config.
    let published = set
      .get_mut(util)
      .bucket_mut(Transitivity::Public / config)
      .options
      .get(standard::LINKED_OUTPUTS);
    assert_eq!(published, vec![PathBuf::from("libutil.a")]);
  }

  #[test]
  fn linked_outputs_surface_into_consumer_link_line() {
    let mut set = ProjectSet::new();
    let util = set.create("util", ProjectType::StaticLib);
    set.get_mut(util).base.options.push(standard::FILES, "util.cpp");
    let app = set.create("app", ProjectType::Executable);
    set.get_mut(app).base.options.push(standard::FILES, "app.cpp");
    set.get_mut(app).link(util);

    // Leaves first, as emission does.
    let (_, _) = process_project(&mut set, util, StringId::EMPTY);
    let (options, _) = process_project(&mut set, app, StringId::EMPTY);

    let commands = options.get(standard::COMMANDS);
    assert_eq!(commands.len(), 2);
    let link = &commands[1];
    assert!(link.inputs.contains(&PathBuf::from("data/obj/app/app.cpp.o")));
    assert!(link.inputs.contains(&PathBuf::from("libutil.a")));
    assert!(link.command.contains("\"libutil.a\""));
  }

  #[test]
  fn defines_includes_platform_and_features_translate() {
    let mut set = ProjectSet::new();
    let p = set.create("p", ProjectType::Executable);
    {
      let options = &mut set.get_mut(p).base.options;
      options.push(standard::FILES, "main.cpp");
      options.push(standard::DEFINES, "NDEBUG".to_string());
      options.push(standard::INCLUDE_PATHS, "include");
      options.set(standard::PLATFORM, "x64".to_string());
      options.extend(
        standard::FEATURES,
        ["c++17", "optimize", "unknown-knob"].map(String::from),
      );
    }

    let (options, _) = process_project(&mut set, p, StringId::EMPTY);
    let compile = &options.get(standard::COMMANDS)[0];

    assert!(compile.command.contains(" -D\"NDEBUG\""));
    assert!(compile.command.contains(" -I\"include\""));
    assert!(compile.command.contains(" -m64 -arch x86_64"));
    assert!(compile.command.contains(" -std=c++17"));
    assert!(compile.command.contains(" -O3"));
    assert!(!compile.command.contains("unknown-knob"));
  }

  #[test]
  fn pch_build_and_import() {
    let mut set = ProjectSet::new();
    let p = set.create("p", ProjectType::Executable);
    {
      let options = &mut set.get_mut(p).base.options;
      options.push(standard::FILES, "main.cpp");
      options.set(standard::BUILD_PCH, PathBuf::from("pch.h"));
      options.set(standard::IMPORT_PCH, PathBuf::from("pch.h"));
    }

    let (options, _) = process_project(&mut set, p, StringId::EMPTY);
    let commands = options.get(standard::COMMANDS);
    assert_eq!(commands.len(), 3);

    let pch = &commands[0];
    assert!(pch.command.contains(" -x c++-header -Xclang -emit-pch"));
    assert_eq!(pch.outputs, vec![PathBuf::from("data/pch/pch.h.pch")]);

    let compile = &commands[1];
    assert!(compile
      .command
      .contains(" -Xclang -include-pch -Xclang data/pch/pch.h.pch"));
    // The PCH is an implicit input of every compile.
    assert!(compile.inputs.contains(&PathBuf::from("data/pch/pch.h.pch")));
  }

  #[test]
  fn shared_lib_flags() {
    let mut set = ProjectSet::new();
    let plugin = set.create("plugin", ProjectType::SharedLib);
    set.get_mut(plugin).base.options.push(standard::FILES, "plugin.cpp");

    let (options, outputs) = process_project(&mut set, plugin, StringId::EMPTY);
    let link = &options.get(standard::COMMANDS)[1];
    assert!(link.command.contains(" -shared"));
    assert_eq!(outputs, vec![PathBuf::from("libplugin.so")]);

    // The `bundle` feature switches -shared to -bundle.
    let mut set = ProjectSet::new();
    let bundle = set.create("plugin", ProjectType::SharedLib);
    set.get_mut(bundle).base.options.push(standard::FILES, "plugin.cpp");
    set
      .get_mut(bundle)
      .base
      .options
      .push(standard::FEATURES, "bundle".to_string());
    let (options, _) = process_project(&mut set, bundle, StringId::EMPTY);
    let link = &options.get(standard::COMMANDS)[1];
    assert!(link.command.contains(" -bundle"));
    assert!(!link.command.contains(" -shared"));
  }

  #[test]
  fn command_projects_produce_nothing() {
    let mut set = ProjectSet::new();
    let group = set.create("group", ProjectType::Command);
    set.get_mut(group).base.options.push(standard::FILES, "x.cpp");

    let (options, outputs) = process_project(&mut set, group, StringId::EMPTY);
    assert!(outputs.is_empty());
    assert!(options.get(standard::COMMANDS).is_empty());
  }

  #[test]
  fn explicit_output_naming_wins_over_defaults() {
    let mut set = ProjectSet::new();
    let lib = set.create("core", ProjectType::StaticLib);
    {
      let options = &mut set.get_mut(lib).base.options;
      options.push(standard::FILES, "core.cpp");
      options.set(standard::OUTPUT_PREFIX, String::new());
      options.set(standard::OUTPUT_EXTENSION, ".lib".to_string());
    }

    let (_, outputs) = process_project(&mut set, lib, StringId::EMPTY);
    assert_eq!(outputs, vec![PathBuf::from("core.lib")]);
  }
}
