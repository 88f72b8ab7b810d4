//! Unix Makefiles build system (macosx, linux, unix)

use std::path::PathBuf;

use anyhow::Result;

use super::BuildSystem;
use crate::config::Configuration;
use crate::exec::{Invocation, Runner};

/// Drives the Makefiles generated by CMake
#[derive(Debug, Clone)]
pub struct UnixMakefiles {
    build_dir: PathBuf,
    jobs: Option<String>,
}

impl UnixMakefiles {
    pub fn new(config: &Configuration) -> Self {
        Self {
            build_dir: config.build_path(),
            jobs: config.threads.as_deref().map(jobs_arg),
        }
    }

    fn make(&self, target: Option<&str>) -> Invocation {
        Invocation::new("make")
            .args(target)
            .args(self.jobs.clone())
            .cwd(&self.build_dir)
            .purpose("building with Unix Makefiles")
    }
}

/// Turn a thread setting into a make argument.
///
/// `MAKEFLAGS`-style values (`-j8`) pass through, bare counts become `-jN`.
pub fn jobs_arg(threads: &str) -> String {
    if threads.starts_with('-') {
        threads.to_string()
    } else {
        format!("-j{}", threads)
    }
}

impl BuildSystem for UnixMakefiles {
    fn name(&self) -> &str {
        "Unix Makefiles"
    }

    fn build(&self, runner: &dyn Runner) -> Result<()> {
        runner.run(&self.make(None))
    }

    fn clean(&self, runner: &dyn Runner) -> Result<()> {
        runner.run(&self.make(Some("clean")))
    }

    fn install(&self, runner: &dyn Runner) -> Result<()> {
        runner.run(&self.make(Some("install")))
    }

    fn uninstall(&self, runner: &dyn Runner) -> Result<()> {
        runner.run(&self.make(Some("uninstall")))
    }

    fn docs(&self, runner: &dyn Runner) -> Result<()> {
        runner.run(&self.make(Some("docs")))
    }

    fn tests(&self, runner: &dyn Runner) -> Result<()> {
        runner.run(&self.make(Some("tests")))
    }

    fn analyze(&self, runner: &dyn Runner) -> Result<()> {
        let invocation = Invocation::new("scan-build")
            .arg("make")
            .args(self.jobs.clone())
            .cwd(&self.build_dir)
            .purpose("static analysis");
        runner.run(&invocation)
    }

    fn package(&self, runner: &dyn Runner) -> Result<()> {
        runner.run(&self.make(Some("package")))
    }
}
