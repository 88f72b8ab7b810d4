//! CMake project generation
//!
//! `nomdev gen` prepares the build directory, drops any stale
//! `CMakeCache.txt` and runs CMake with the generator matching the platform.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::{Arch, Configuration};
use crate::error::NomdevError;
use crate::exec::{Invocation, Runner};
use crate::platform::Platform;
use crate::utils::paths::ensure_dir;
use crate::utils::terminal::{print_dry_run, print_success};

pub const CMAKE_CACHE_FILE: &str = "CMakeCache.txt";

/// Visual Studio release the Windows generator targets
const VISUAL_STUDIO_GENERATOR: &str = "Visual Studio 12";

/// CMake configuration builder
#[derive(Debug, Default)]
pub struct CMakeConfig {
    /// Source directory (where CMakeLists.txt is located)
    source_dir: PathBuf,
    /// Build directory, also the working directory of the cmake run
    build_dir: PathBuf,
    install_prefix: Option<PathBuf>,
    /// CMake variables (-D options)
    variables: Vec<(String, String)>,
    /// Generator (e.g., "Unix Makefiles", "Visual Studio 12 Win64")
    generator: Option<String>,
}

impl CMakeConfig {
    pub fn new(source_dir: PathBuf, build_dir: PathBuf) -> Self {
        Self {
            source_dir,
            build_dir,
            ..Default::default()
        }
    }

    pub fn install_prefix(mut self, prefix: PathBuf) -> Self {
        self.install_prefix = Some(prefix);
        self
    }

    /// Set a CMake variable
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.push((name.into(), value.into()));
        self
    }

    /// Set a boolean CMake option as `on`/`off`
    pub fn option(self, name: impl Into<String>, enabled: bool) -> Self {
        self.variable(name, if enabled { "on" } else { "off" })
    }

    pub fn generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = Some(generator.into());
        self
    }

    /// The configure step as an invocation
    pub fn configure_invocation(&self) -> Invocation {
        let mut invocation = Invocation::new("cmake")
            .cwd(&self.build_dir)
            .purpose("generating build scripts");

        if let Some(generator) = &self.generator {
            invocation = invocation.arg("-G").arg(generator.as_str());
        }

        if let Some(prefix) = &self.install_prefix {
            invocation = invocation.arg(format!("-DCMAKE_INSTALL_PREFIX={}", prefix.display()));
        }

        for (name, value) in &self.variables {
            invocation = invocation.arg(format!("-D{}={}", name, value));
        }

        invocation.arg(self.source_dir.display().to_string())
    }
}

/// CMake generator string for a platform
pub fn generator_for(platform: Platform, arch: Arch) -> Result<String, NomdevError> {
    match platform {
        Platform::Macosx | Platform::Linux | Platform::Unix => Ok("Unix Makefiles".to_string()),
        Platform::Windows => Ok(match arch {
            Arch::X64 => format!("{} Win64", VISUAL_STUDIO_GENERATOR),
            Arch::X86 => VISUAL_STUDIO_GENERATOR.to_string(),
        }),
        Platform::Unknown => Err(NomdevError::unsupported_platform(platform, "project generation")),
    }
}

/// Build the CMake configuration for a run
pub fn cmake_config(config: &Configuration) -> Result<CMakeConfig, NomdevError> {
    let generator = generator_for(config.platform, config.arch)?;
    Ok(
        CMakeConfig::new(config.project_root.clone(), config.build_path())
            .generator(generator)
            .install_prefix(config.install_prefix.clone())
            .option("DEBUG", config.build_debug)
            .option("EXAMPLES", config.build_examples)
            .option("NOM_BUILD_TESTS", config.build_tests)
            .option("NOM_BUILD_DOCS", config.build_docs)
            .option("ARCH_64", config.arch == Arch::X64),
    )
}

/// Generate build scripts in the configured build directory
pub fn generate(config: &Configuration, runner: &dyn Runner) -> Result<()> {
    // Resolve the generator first so an unknown platform leaves no trace
    let cmake = cmake_config(config)?;
    let build_path = config.build_path();

    prepare_build_dir(&build_path, runner.dry_run())?;
    runner.run(&cmake.configure_invocation())?;

    if !runner.dry_run() {
        print_success(&format!("Build scripts generated in {}", build_path.display()));
    }
    Ok(())
}

/// Create the build directory if needed and remove a stale CMake cache
fn prepare_build_dir(build_path: &Path, dry_run: bool) -> Result<()> {
    if !build_path.exists() {
        if dry_run {
            print_dry_run(&format!("Would create {}", build_path.display()));
        } else {
            ensure_dir(build_path)?;
        }
    }

    let cache = build_path.join(CMAKE_CACHE_FILE);
    if cache.exists() {
        if dry_run {
            print_dry_run(&format!("Would remove {}", cache.display()));
        } else {
            std::fs::remove_file(&cache)
                .with_context(|| format!("Failed to remove {}", cache.display()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::subprocess::testing::RecordingRunner;

    fn make_config(root: &Path, platform: Platform, arch: Arch, build_dir: &str) -> Configuration {
        let mut config = Configuration::for_test(root, platform);
        config.arch = arch;
        config.build_dir = PathBuf::from(build_dir);
        config.install_prefix = root.join(build_dir);
        config
    }

    #[test]
    fn test_generator_for_platforms() {
        assert_eq!(generator_for(Platform::Macosx, Arch::X64).unwrap(), "Unix Makefiles");
        assert_eq!(generator_for(Platform::Linux, Arch::X86).unwrap(), "Unix Makefiles");
        assert_eq!(generator_for(Platform::Unix, Arch::X86).unwrap(), "Unix Makefiles");
        assert_eq!(
            generator_for(Platform::Windows, Arch::X64).unwrap(),
            "Visual Studio 12 Win64"
        );
        assert_eq!(
            generator_for(Platform::Windows, Arch::X86).unwrap(),
            "Visual Studio 12"
        );
        assert!(matches!(
            generator_for(Platform::Unknown, Arch::X86),
            Err(NomdevError::UnsupportedPlatform { .. })
        ));
    }

    #[test]
    fn test_generate_macosx_x64_creates_build_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let config = make_config(root, Platform::Macosx, Arch::X64, "build-x64");
        let runner = RecordingRunner::new();

        generate(&config, &runner).unwrap();

        assert!(root.join("build-x64").is_dir());
        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 1);
        let invocation = &calls[0];
        assert_eq!(invocation.program(), "cmake");
        assert_eq!(invocation.get_cwd(), Some(root.join("build-x64").as_path()));
        assert_eq!(invocation.get_args()[0..2], ["-G", "Unix Makefiles"]);
        assert!(invocation.get_args().contains(&"-DARCH_64=on".to_string()));
        assert!(invocation.get_args().contains(&"-DDEBUG=off".to_string()));
        assert_eq!(
            invocation.get_args().last().map(String::as_str),
            Some(root.display().to_string().as_str())
        );
    }

    #[test]
    fn test_generate_removes_stale_cache() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let build = root.join("build");
        std::fs::create_dir_all(&build).unwrap();
        std::fs::write(build.join(CMAKE_CACHE_FILE), "stale").unwrap();
        std::fs::write(build.join("Makefile"), "keep").unwrap();

        let config = make_config(root, Platform::Linux, Arch::X86, "build");
        generate(&config, &RecordingRunner::new()).unwrap();

        assert!(!build.join(CMAKE_CACHE_FILE).exists());
        assert!(build.join("Makefile").exists());
    }

    #[test]
    fn test_generate_dry_run_touches_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        std::fs::create_dir_all(root.join("build")).unwrap();
        std::fs::write(root.join("build").join(CMAKE_CACHE_FILE), "stale").unwrap();

        let runner = RecordingRunner {
            dry_run: true,
            ..RecordingRunner::default()
        };

        let config = make_config(root, Platform::Linux, Arch::X86, "build");
        generate(&config, &runner).unwrap();
        assert!(root.join("build").join(CMAKE_CACHE_FILE).exists());

        let fresh = make_config(root, Platform::Linux, Arch::X86, "fresh");
        generate(&fresh, &runner).unwrap();
        assert!(!root.join("fresh").exists());
        assert_eq!(runner.calls.borrow().len(), 2);
    }

    #[test]
    fn test_generate_windows_forwards_flags() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let mut config = make_config(root, Platform::Windows, Arch::X86, "build");
        config.build_debug = true;
        config.build_examples = true;

        let runner = RecordingRunner::new();
        generate(&config, &runner).unwrap();

        let args = runner.calls.borrow()[0].get_args().to_vec();
        assert_eq!(args[0..2], ["-G", "Visual Studio 12"]);
        for expected in [
            "-DDEBUG=on",
            "-DEXAMPLES=on",
            "-DNOM_BUILD_TESTS=off",
            "-DNOM_BUILD_DOCS=off",
            "-DARCH_64=off",
        ] {
            assert!(args.contains(&expected.to_string()), "missing {}", expected);
        }
        assert!(args.contains(&format!(
            "-DCMAKE_INSTALL_PREFIX={}",
            root.join("build").display()
        )));
        // Debug is a project option only; no CMake build type is forced
        assert!(!args.iter().any(|a| a.starts_with("-DCMAKE_BUILD_TYPE")));
    }

    #[test]
    fn test_generate_unknown_platform_fails_before_touching_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let config = make_config(tmp.path(), Platform::Unknown, Arch::X86, "build");
        let runner = RecordingRunner::new();

        let err = generate(&config, &runner).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<NomdevError>(),
            Some(NomdevError::UnsupportedPlatform { .. })
        ));
        assert!(!tmp.path().join("build").exists());
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn test_generate_propagates_cmake_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let config = make_config(tmp.path(), Platform::Linux, Arch::X86, "build");
        let runner = RecordingRunner::failing_at(0);

        let err = generate(&config, &runner).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<NomdevError>(),
            Some(NomdevError::ToolFailed { .. })
        ));
    }
}
