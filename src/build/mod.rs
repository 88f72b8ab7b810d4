//! Build orchestration
//!
//! ## Architecture
//!
//! ```text
//! nomdev gen            → cmake.rs   → cmake -G <generator>
//! nomdev build|clean|…  → BuildSystem → make.rs    → make
//!                                     → msbuild.rs → msbuild
//! ```
//!
//! The build system is chosen once per run from the configured platform.

pub mod cmake;
pub mod make;
pub mod msbuild;

use anyhow::Result;

use crate::config::Configuration;
use crate::error::NomdevError;
use crate::exec::Runner;
use crate::platform::Platform;

pub use make::UnixMakefiles;
pub use msbuild::MsBuild;

/// A native build tool driving the scripts CMake generated
pub trait BuildSystem {
    fn name(&self) -> &str;

    fn build(&self, runner: &dyn Runner) -> Result<()>;

    fn clean(&self, runner: &dyn Runner) -> Result<()>;

    fn install(&self, runner: &dyn Runner) -> Result<()>;

    fn uninstall(&self, runner: &dyn Runner) -> Result<()>;

    fn docs(&self, runner: &dyn Runner) -> Result<()>;

    fn tests(&self, runner: &dyn Runner) -> Result<()>;

    fn analyze(&self, runner: &dyn Runner) -> Result<()>;

    fn package(&self, runner: &dyn Runner) -> Result<()>;
}

/// Select the build system for the configured platform
pub fn select_backend(config: &Configuration) -> Result<Box<dyn BuildSystem>, NomdevError> {
    match config.platform {
        Platform::Macosx | Platform::Linux | Platform::Unix => {
            Ok(Box::new(UnixMakefiles::new(config)))
        }
        Platform::Windows => Ok(Box::new(MsBuild::new(config))),
        Platform::Unknown => Err(NomdevError::unsupported_platform(
            config.platform,
            "building",
        )),
    }
}
