//! Build description for the hello demo: a static `util` library consumed
//! by a `hello` executable, in debug and release configurations.
//!
//! Run with `--ninja[=DIR]` to generate Ninja files, or `--direct` to build
//! in place (requires a C++ toolchain on PATH).

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use girder_lib::cli::{self, Cli};
use girder_lib::option::standard::{FEATURES, FILES, INCLUDE_PATHS};
use girder_lib::project::{ConfigSelector, ProjectSet, ProjectType, Transitivity};
use girder_lib::stringid::StringId;

fn main() -> Result<()> {
  let args = Cli::parse();

  let level = if args.verbose {
    Level::DEBUG
  } else {
    Level::INFO
  };
  FmtSubscriber::builder()
    .with_max_level(level)
    .with_target(false)
    .without_time()
    .init();

  let mut set = ProjectSet::new();

  let util = set.create("util", ProjectType::StaticLib);
  set.get_mut(util).base.options.push(FILES, "cpp/util.cpp");
  set
    .get_mut(util)
    .bucket_mut(Transitivity::Public)
    .options
    .push(INCLUDE_PATHS, "cpp/include");

  let hello = set.create("hello", ProjectType::Executable);
  set.get_mut(hello).base.options.push(FILES, "cpp/hello.cpp");
  set
    .get_mut(hello)
    .base
    .options
    .push(FEATURES, "c++17".to_string());
  set.get_mut(hello).link(util);

  for project in [util, hello] {
    set
      .get_mut(project)
      .bucket_mut(ConfigSelector::from("debug"))
      .options
      .push(FEATURES, "debuginfo".to_string());
    set
      .get_mut(project)
      .bucket_mut(ConfigSelector::from("release"))
      .options
      .push(FEATURES, "optimize".to_string());
  }

  let configs = [StringId::intern("debug"), StringId::intern("release")];
  cli::generate_with(&mut set, &[hello], &configs, args)?;
  Ok(())
}
