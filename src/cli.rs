//! CLI argument parsing using clap derive macros

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, CommandFactory, Parser, ValueEnum};

use crate::commands;
use crate::config::{Arch, Configuration};
use crate::exec::ProcessRunner;
use crate::platform::Platform;
use crate::utils::paths::find_project_root;

const EXAMPLES: &str = "\
Example Usage:

  nomdev gen --arch x64 --build_dir build-x64 --debug --examples
  nomdev build --build_dir build-x64
  nomdev install --prefix ~/Library/Frameworks";

/// First arguments that print help instead of being parsed
const HELP_SENTINELS: &[&str] = &["help", "/?", "usage"];

/// nomdev - build helper for CMake projects
///
/// Generates build scripts with CMake and drives make or MSBuild.
#[derive(Parser, Debug)]
#[command(name = "nomdev")]
#[command(version, about, long_about = None)]
#[command(disable_help_flag = true, disable_version_flag = true)]
#[command(args_override_self = true)]
#[command(after_help = EXAMPLES)]
pub struct Cli {
    /// Command to run
    #[arg(value_enum, value_name = "COMMAND")]
    pub command: Verb,

    /// Show nomdev help message
    #[arg(short = 'h', long = "help", visible_alias = "usage", action = ArgAction::Help)]
    #[allow(dead_code)]
    help: Option<bool>,

    /// Show version string for nomdev
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    #[allow(dead_code)]
    version: Option<bool>,

    /// Directory used for building the project
    #[arg(short = 'b', long = "build_dir", visible_alias = "build-dir", value_name = "BUILD", default_value = "build")]
    pub build_dir: PathBuf,

    /// Generate build scripts for a specific architecture
    #[arg(short = 'a', long, value_enum, default_value_t = Arch::X86)]
    pub arch: Arch,

    /// Enable building of debugging features
    #[arg(long, overrides_with = "no_debug")]
    pub debug: bool,

    /// Disable building of debugging features
    #[arg(long, overrides_with = "debug")]
    #[allow(dead_code)]
    no_debug: bool,

    /// Enable building of examples
    #[arg(long, overrides_with = "no_examples")]
    pub examples: bool,

    /// Disable building of examples
    #[arg(long, overrides_with = "examples")]
    #[allow(dead_code)]
    no_examples: bool,

    /// Enable building of unit tests
    #[arg(long, overrides_with = "no_tests")]
    pub tests: bool,

    /// Disable building of unit tests
    #[arg(long, overrides_with = "tests")]
    #[allow(dead_code)]
    no_tests: bool,

    /// Enable building of documentation
    #[arg(long, overrides_with = "no_docs")]
    pub docs: bool,

    /// Disable building of documentation
    #[arg(long, overrides_with = "docs")]
    #[allow(dead_code)]
    no_docs: bool,

    /// Installation path [default: <project>/<build_dir>]
    #[arg(short = 'i', long, value_name = "INSTALL_PREFIX")]
    pub prefix: Option<PathBuf>,

    /// Enable developer options; implies --debug --examples
    #[arg(long)]
    pub developer: bool,

    /// Override the automatic platform detection
    #[arg(short = 'p', long, value_name = "PLATFORM")]
    pub platform: Option<String>,

    /// Override the automatic number of CPU threads to build with (`4` or `-j4`)
    #[arg(long, value_name = "THREADS", allow_hyphen_values = true)]
    pub threads: Option<String>,

    /// Show what would be done, but do not do it
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,

    /// Print every command before running it
    #[arg(long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Available commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Verb {
    /// Generate build scripts in the build directory using CMake
    #[value(name = "gen", alias = "generate")]
    Gen,
    /// Build the project
    Build,
    /// Clean the project
    Clean,
    /// Clean, then build the project
    Rebuild,
    /// Install the project
    Install,
    /// Remove the installed project
    #[value(alias = "remove")]
    Uninstall,
    /// Purge the build directory
    Wipe,
    /// Build the documentation
    #[value(alias = "documentation")]
    Docs,
    /// Run static analysis on the project
    Analyze,
    /// Build the unit tests
    #[value(alias = "tests")]
    Test,
    /// Package the project for distribution
    Package,
    /// Download prebuilt third-party dependencies
    Get,
    /// Archive third-party dependencies
    Archive,
    /// Remove dependency archives and downloads
    CleanDeps,
    /// Report current LOC (lines of code) of the project
    #[value(alias = "LOC")]
    Loc,
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_possible_value() {
            Some(value) => write!(f, "{}", value.get_name()),
            None => write!(f, "{:?}", self),
        }
    }
}

/// Result of reading the command line
#[derive(Debug)]
pub enum Parsed {
    Run(Box<Cli>),
    /// Empty argv or a help sentinel
    Help,
    /// clap error, including `--help` and `--version` displays
    Error(clap::Error),
}

/// Parse argv (including the program name)
pub fn parse_args<I, T>(args: I) -> Parsed
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();

    match args.get(1).and_then(|a| a.to_str()) {
        None if args.len() <= 1 => return Parsed::Help,
        Some(first) if HELP_SENTINELS.contains(&first) => return Parsed::Help,
        _ => {}
    }

    match Cli::try_parse_from(args) {
        Ok(cli) => Parsed::Run(Box::new(cli)),
        Err(err) => Parsed::Error(err),
    }
}

/// Print the full help text to stdout
pub fn print_help() {
    let _ = Cli::command().print_help();
}

impl Cli {
    /// Platform the run targets, before anything else is resolved
    pub fn effective_platform(&self) -> Platform {
        self.platform
            .as_deref()
            .map(Platform::classify)
            .unwrap_or_else(Platform::detect)
    }

    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        if self.no_color {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }

        let project_root = find_project_root()?;
        let config = Configuration::resolve(&self, &project_root, |key| std::env::var(key).ok())?;

        if config.verbose {
            config.describe();
        }

        let runner = ProcessRunner::new(config.dry_run, config.verbose);
        commands::dispatch(self.command, &config, &runner)
    }
}
