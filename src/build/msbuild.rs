//! MSBuild build system (windows)
//!
//! Builds the Visual Studio solution CMake generated, one project at a time,
//! with separate error and warning log files.

use std::path::{Path, PathBuf};

use anyhow::Result;

use super::BuildSystem;
use crate::config::Configuration;
use crate::error::NomdevError;
use crate::exec::subprocess::command_exists;
use crate::exec::{Invocation, Runner};

/// Projects built in order; INSTALL depends on ALL_BUILD having succeeded
pub const PROJECTS: [&str; 2] = ["ALL_BUILD.vcxproj", "INSTALL.vcxproj"];

/// Environment variable pointing at the Visual Studio installation
pub const VS_INSTALL_ENV: &str = "VSINSTALLDIR";

#[derive(Debug, Clone)]
pub struct MsBuild {
    program: String,
    build_dir: PathBuf,
    args: Vec<String>,
}

impl MsBuild {
    pub fn new(config: &Configuration) -> Self {
        let program = locate_msbuild(command_exists("msbuild"), |key| std::env::var(key).ok());
        Self::with_program(config, program)
    }

    pub fn with_program(config: &Configuration, program: impl Into<String>) -> Self {
        let max_cpu = match &config.threads {
            Some(threads) => format!("/maxcpucount:{}", threads),
            None => "/maxcpucount".to_string(),
        };

        let args = vec![
            max_cpu,
            // File logger for errors
            "/fl1".to_string(),
            format!("/flp1:LogFile={};errorsonly", config.project.error_log_name()),
            // File logger for warnings
            "/fl2".to_string(),
            format!("/flp2:LogFile={};warningsonly", config.project.warning_log_name()),
            "/Verbosity:minimal".to_string(),
        ];

        Self {
            program: program.into(),
            build_dir: config.build_path(),
            args,
        }
    }

    /// Run one target against every project, stopping at the first failure
    fn run_target(&self, target: &str, runner: &dyn Runner) -> Result<()> {
        for project in PROJECTS {
            let invocation = Invocation::new(self.program.as_str())
                .args(self.args.iter().cloned())
                .arg(format!("/t:{}", target))
                .arg(project)
                .cwd(&self.build_dir)
                .purpose("building with MSBuild");
            runner.run(&invocation)?;
        }
        Ok(())
    }

    fn not_implemented(&self, operation: &str) -> Result<()> {
        Err(NomdevError::not_implemented(self.name(), operation).into())
    }
}

/// Pick the msbuild executable.
///
/// Prefers `msbuild` on PATH, then the copy inside `VSINSTALLDIR`. Falls back
/// to the bare name so the runner can report it missing.
pub fn locate_msbuild(on_path: bool, env: impl Fn(&str) -> Option<String>) -> String {
    if on_path {
        return "msbuild".to_string();
    }

    env(VS_INSTALL_ENV)
        .filter(|dir| !dir.trim().is_empty())
        .map(|dir| {
            Path::new(&dir)
                .join("MSBuild")
                .join("Current")
                .join("Bin")
                .join("MSBuild.exe")
                .display()
                .to_string()
        })
        .unwrap_or_else(|| "msbuild".to_string())
}

impl BuildSystem for MsBuild {
    fn name(&self) -> &str {
        "MSBuild"
    }

    fn build(&self, runner: &dyn Runner) -> Result<()> {
        self.run_target("build", runner)
    }

    fn clean(&self, runner: &dyn Runner) -> Result<()> {
        self.run_target("clean", runner)
    }

    // INSTALL.vcxproj is part of every build, so installing is building.
    fn install(&self, runner: &dyn Runner) -> Result<()> {
        self.build(runner)
    }

    // TODO: uninstall needs its own target; it currently re-runs the build like install does.
    fn uninstall(&self, runner: &dyn Runner) -> Result<()> {
        self.build(runner)
    }

    fn docs(&self, _runner: &dyn Runner) -> Result<()> {
        self.not_implemented("docs")
    }

    fn tests(&self, _runner: &dyn Runner) -> Result<()> {
        self.not_implemented("tests")
    }

    fn analyze(&self, _runner: &dyn Runner) -> Result<()> {
        self.not_implemented("analyze")
    }

    fn package(&self, _runner: &dyn Runner) -> Result<()> {
        self.not_implemented("package")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::subprocess::testing::RecordingRunner;
    use crate::platform::Platform;

    fn msbuild(threads: Option<&str>) -> MsBuild {
        let mut config = Configuration::for_test(Path::new("C:/nomlib"), Platform::Windows);
        config.threads = threads.map(String::from);
        MsBuild::with_program(&config, "msbuild")
    }

    #[test]
    fn test_build_runs_both_projects() {
        let runner = RecordingRunner::new();
        msbuild(Some("8")).build(&runner).unwrap();

        let common = "/maxcpucount:8 /fl1 /flp1:LogFile=nomlib_err.log;errorsonly \
                      /fl2 /flp2:LogFile=nomlib_warn.log;warningsonly /Verbosity:minimal";
        assert_eq!(
            runner.command_lines(),
            vec![
                format!("msbuild {} /t:build ALL_BUILD.vcxproj", common),
                format!("msbuild {} /t:build INSTALL.vcxproj", common),
            ]
        );
        assert_eq!(
            runner.calls.borrow()[0].get_cwd(),
            Some(Path::new("C:/nomlib/build"))
        );
    }

    #[test]
    fn test_clean_target() {
        let runner = RecordingRunner::new();
        msbuild(None).clean(&runner).unwrap();
        let lines = runner.command_lines();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.starts_with("msbuild /maxcpucount ")));
        assert!(lines.iter().all(|l| l.contains("/t:clean")));
    }

    #[test]
    fn test_repeated_calls_do_not_accumulate_targets() {
        let runner = RecordingRunner::new();
        let backend = msbuild(None);
        backend.clean(&runner).unwrap();
        backend.build(&runner).unwrap();

        let last = runner.command_lines().pop().unwrap();
        assert!(last.contains("/t:build"));
        assert!(!last.contains("/t:clean"));
    }

    #[test]
    fn test_install_and_uninstall_build() {
        let runner = RecordingRunner::new();
        let backend = msbuild(None);
        backend.install(&runner).unwrap();
        backend.uninstall(&runner).unwrap();
        let lines = runner.command_lines();
        assert_eq!(lines.len(), 4);
        assert!(lines.iter().all(|l| l.contains("/t:build")));
    }

    #[test]
    fn test_stops_after_first_failure() {
        let runner = RecordingRunner::failing_at(0);
        let err = msbuild(None).build(&runner).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<NomdevError>(),
            Some(NomdevError::ToolFailed { .. })
        ));
        assert_eq!(runner.calls.borrow().len(), 1);
    }

    #[test]
    fn test_placeholders_are_not_implemented() {
        let runner = RecordingRunner::new();
        let backend = msbuild(None);
        for result in [
            backend.docs(&runner),
            backend.tests(&runner),
            backend.analyze(&runner),
            backend.package(&runner),
        ] {
            let err = result.unwrap_err();
            assert!(matches!(
                err.downcast_ref::<NomdevError>(),
                Some(NomdevError::NotImplemented { .. })
            ));
        }
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn test_locate_msbuild() {
        assert_eq!(locate_msbuild(true, |_| None), "msbuild");
        assert_eq!(locate_msbuild(false, |_| None), "msbuild");

        let located = locate_msbuild(false, |key| {
            (key == VS_INSTALL_ENV).then(|| "/vs".to_string())
        });
        assert!(located.starts_with("/vs"));
        assert!(located.ends_with("MSBuild.exe"));
    }
}
