//! Resolved run configuration
//!
//! [`Configuration`] is built once from the parsed command line, the
//! environment and the project root, and is read-only afterwards.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::ValueEnum;

use super::nomdev_toml::ProjectSettings;
use crate::cli::Cli;
use crate::platform::Platform;

/// Target architecture for generated build scripts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Arch {
    #[default]
    X86,
    X64,
}

impl std::fmt::Display for Arch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arch::X86 => write!(f, "x86"),
            Arch::X64 => write!(f, "x64"),
        }
    }
}

/// Everything a command needs to know about this run
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub platform: Platform,
    pub arch: Arch,
    /// As given on the command line; see [`Configuration::build_path`]
    pub build_dir: PathBuf,
    pub build_debug: bool,
    pub build_examples: bool,
    pub build_tests: bool,
    pub build_docs: bool,
    pub install_prefix: PathBuf,
    pub developer: bool,
    pub dry_run: bool,
    pub verbose: bool,
    /// Job count forwarded to make/msbuild, e.g. `4` or `-j8`
    pub threads: Option<String>,
    pub project_root: PathBuf,
    pub project: ProjectSettings,
}

impl Configuration {
    /// Resolve a configuration from the command line.
    ///
    /// `env` looks up environment variables; it is a parameter so callers
    /// can resolve against something other than the process environment.
    pub fn resolve(
        cli: &Cli,
        project_root: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let platform = cli.effective_platform();

        let threads = cli
            .threads
            .clone()
            .or_else(|| env(platform.threads_env_var()))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        let install_prefix = cli
            .prefix
            .clone()
            .unwrap_or_else(|| project_root.join(&cli.build_dir));

        let project = ProjectSettings::load(project_root)?;

        Ok(Self {
            platform,
            arch: cli.arch,
            build_dir: cli.build_dir.clone(),
            build_debug: cli.developer || cli.debug,
            build_examples: cli.developer || cli.examples,
            build_tests: cli.tests,
            build_docs: cli.docs,
            install_prefix,
            developer: cli.developer,
            dry_run: cli.dry_run,
            verbose: cli.verbose,
            threads,
            project_root: project_root.to_path_buf(),
            project,
        })
    }

    /// Absolute location of the build directory
    pub fn build_path(&self) -> PathBuf {
        self.project_root.join(&self.build_dir)
    }

    /// Render the flags that reproduce this configuration
    pub fn to_args(&self) -> Vec<String> {
        let toggle = |on: bool, name: &str| {
            if on {
                format!("--{}", name)
            } else {
                format!("--no-{}", name)
            }
        };

        let mut args = vec![
            "--build_dir".to_string(),
            self.build_dir.display().to_string(),
            "--arch".to_string(),
            self.arch.to_string(),
            toggle(self.build_debug, "debug"),
            toggle(self.build_examples, "examples"),
            toggle(self.build_tests, "tests"),
            toggle(self.build_docs, "docs"),
            "--prefix".to_string(),
            self.install_prefix.display().to_string(),
            "--platform".to_string(),
            self.platform.to_string(),
        ];

        if self.developer {
            args.push("--developer".to_string());
        }
        // `=` keeps make-style values like `-j8` attached to the flag
        if let Some(threads) = &self.threads {
            args.push(format!("--threads={}", threads));
        }
        if self.dry_run {
            args.push("--dry-run".to_string());
        }
        if self.verbose {
            args.push("--verbose".to_string());
        }

        args
    }

    /// Print the resolved settings (verbose mode)
    pub fn describe(&self) {
        eprintln!("platform:       {}", self.platform);
        eprintln!("arch:           {}", self.arch);
        eprintln!("project root:   {}", self.project_root.display());
        eprintln!("build dir:      {}", self.build_path().display());
        eprintln!("install prefix: {}", self.install_prefix.display());
        eprintln!(
            "features:       debug={} examples={} tests={} docs={}",
            self.build_debug, self.build_examples, self.build_tests, self.build_docs
        );
        eprintln!(
            "threads:        {}",
            self.threads.as_deref().unwrap_or("<default>")
        );
        eprintln!("dry run:        {}", self.dry_run);
        eprintln!("flags:          {}", self.to_args().join(" "));
    }
}

#[cfg(test)]
impl Configuration {
    /// Defaults for `root` with the given platform, as `nomdev <verb>` would resolve them
    pub fn for_test(root: &Path, platform: Platform) -> Self {
        Self {
            platform,
            arch: Arch::X86,
            build_dir: PathBuf::from("build"),
            build_debug: false,
            build_examples: false,
            build_tests: false,
            build_docs: false,
            install_prefix: root.join("build"),
            developer: false,
            dry_run: false,
            verbose: false,
            threads: None,
            project_root: root.to_path_buf(),
            project: ProjectSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{parse_args, Parsed};

    fn cli(args: &[&str]) -> Cli {
        let argv = std::iter::once("nomdev").chain(args.iter().copied());
        match parse_args(argv) {
            Parsed::Run(cli) => *cli,
            Parsed::Help => panic!("unexpected help for {:?}", args),
            Parsed::Error(err) => panic!("parse failed for {:?}: {}", args, err),
        }
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn resolve(args: &[&str]) -> Configuration {
        Configuration::resolve(&cli(args), Path::new("/work/proj"), no_env).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = resolve(&["build", "--platform", "linux"]);
        assert_eq!(config.platform, Platform::Linux);
        assert_eq!(config.arch, Arch::X86);
        assert_eq!(config.build_dir, PathBuf::from("build"));
        assert!(!config.build_debug);
        assert!(!config.build_examples);
        assert!(!config.build_tests);
        assert!(!config.build_docs);
        assert!(!config.developer);
        assert!(!config.dry_run);
        assert_eq!(config.install_prefix, PathBuf::from("/work/proj/build"));
        assert_eq!(config.threads, None);
        assert_eq!(config.project, ProjectSettings::default());
    }

    #[test]
    fn test_platform_defaults_to_detected() {
        let config = resolve(&["build"]);
        assert_eq!(config.platform, Platform::detect());
    }

    #[test]
    fn test_install_prefix_follows_build_dir() {
        let config = resolve(&["gen", "--build_dir", "build-x64"]);
        assert_eq!(config.install_prefix, PathBuf::from("/work/proj/build-x64"));
        assert_eq!(config.build_path(), PathBuf::from("/work/proj/build-x64"));

        let config = resolve(&["gen", "--prefix", "/opt/nomlib"]);
        assert_eq!(config.install_prefix, PathBuf::from("/opt/nomlib"));
    }

    #[test]
    fn test_developer_implies_debug_and_examples() {
        for args in [
            &["gen", "--developer"][..],
            &["gen", "--no-debug", "--no-examples", "--developer"][..],
            &["gen", "--developer", "--no-debug", "--no-examples"][..],
        ] {
            let config = resolve(args);
            assert!(config.build_debug, "{:?}", args);
            assert!(config.build_examples, "{:?}", args);
            assert!(!config.build_tests, "{:?}", args);
            assert!(!config.build_docs, "{:?}", args);
        }
    }

    #[test]
    fn test_later_flags_win() {
        let config = resolve(&["gen", "--debug", "--no-debug", "--no-tests", "--tests"]);
        assert!(!config.build_debug);
        assert!(config.build_tests);

        let config = resolve(&["gen", "-b", "one", "--build_dir", "two", "-a", "x64", "-a", "x86"]);
        assert_eq!(config.build_dir, PathBuf::from("two"));
        assert_eq!(config.arch, Arch::X86);
    }

    #[test]
    fn test_threads_from_environment() {
        let env = |key: &str| match key {
            "MAKEFLAGS" => Some("-j8".to_string()),
            "NUMBER_OF_PROCESSORS" => Some("12".to_string()),
            _ => None,
        };

        let config =
            Configuration::resolve(&cli(&["build", "-p", "macosx"]), Path::new("/p"), env).unwrap();
        assert_eq!(config.threads.as_deref(), Some("-j8"));

        let config =
            Configuration::resolve(&cli(&["build", "-p", "windows"]), Path::new("/p"), env).unwrap();
        assert_eq!(config.threads.as_deref(), Some("12"));

        let config = Configuration::resolve(
            &cli(&["build", "-p", "windows", "--threads", "2"]),
            Path::new("/p"),
            env,
        )
        .unwrap();
        assert_eq!(config.threads.as_deref(), Some("2"));
    }

    #[test]
    fn test_blank_threads_env_is_ignored() {
        let env = |_: &str| Some("  ".to_string());
        let config =
            Configuration::resolve(&cli(&["build", "-p", "linux"]), Path::new("/p"), env).unwrap();
        assert_eq!(config.threads, None);
    }

    #[test]
    fn test_to_args_round_trips() {
        let cases: &[&[&str]] = &[
            &["build"],
            &["build", "--developer", "--tests", "-n"],
            &["gen", "--arch", "x64", "--build_dir", "build-x64", "--docs", "--threads", "6"],
            &["gen", "-p", "windows", "-i", "/opt/prefix", "--verbose"],
            &["build", "-p", "linux", "--threads", "-j8"],
        ];

        for args in cases {
            let config = resolve(args);
            let mut reparsed_args = vec![args[0].to_string()];
            reparsed_args.extend(config.to_args());
            let reparsed_refs: Vec<&str> = reparsed_args.iter().map(String::as_str).collect();
            let reparsed = resolve(&reparsed_refs);
            assert_eq!(config, reparsed, "{:?}", args);
        }
    }

    #[test]
    fn test_to_args_round_trips_environment_threads() {
        let makeflags = |key: &str| (key == "MAKEFLAGS").then(|| "-j8".to_string());
        let config =
            Configuration::resolve(&cli(&["build", "-p", "linux"]), Path::new("/work/proj"), makeflags)
                .unwrap();
        assert_eq!(config.threads.as_deref(), Some("-j8"));

        let mut reparsed_args = vec!["build".to_string()];
        reparsed_args.extend(config.to_args());
        assert!(reparsed_args.contains(&"--threads=-j8".to_string()));
        let reparsed_refs: Vec<&str> = reparsed_args.iter().map(String::as_str).collect();
        assert_eq!(resolve(&reparsed_refs), config);
    }
}
