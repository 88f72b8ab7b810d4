//! Command implementations
//!
//! [`dispatch`] maps each verb to the generator, the platform's build
//! system, the dependency manager, or one of the commands below.

pub mod loc;
pub mod wipe;

use anyhow::Result;

use crate::build::{cmake, select_backend, BuildSystem};
use crate::cli::Verb;
use crate::config::Configuration;
use crate::deps::ExternalDeps;
use crate::error::{hints, NomdevError};
use crate::exec::Runner;
use crate::utils::terminal::print_success;

/// Run one verb to completion
pub fn dispatch(verb: Verb, config: &Configuration, runner: &dyn Runner) -> Result<()> {
    match verb {
        Verb::Gen => cmake::generate(config, runner),
        Verb::Build => with_backend(verb, config, runner, |b| b.build(runner)),
        Verb::Clean => with_backend(verb, config, runner, |b| b.clean(runner)),
        Verb::Rebuild => {
            if config.platform.is_windows() {
                return Err(NomdevError::usage(
                    "rebuild: feature currently disabled; broken on Windows platform.",
                )
                .into());
            }
            with_backend(verb, config, runner, |b| {
                b.clean(runner)?;
                b.build(runner)
            })
        }
        Verb::Install => with_backend(verb, config, runner, |b| b.install(runner)),
        Verb::Uninstall => with_backend(verb, config, runner, |b| b.uninstall(runner)),
        Verb::Docs => with_backend(verb, config, runner, |b| b.docs(runner)),
        Verb::Analyze => with_backend(verb, config, runner, |b| b.analyze(runner)),
        Verb::Test => with_backend(verb, config, runner, |b| b.tests(runner)),
        Verb::Package => with_backend(verb, config, runner, |b| b.package(runner)),
        Verb::Wipe => wipe::execute(config).map(|_| ()),
        Verb::Get => ExternalDeps::new(config).get(),
        Verb::Archive => ExternalDeps::new(config).archive(config.platform).map(|_| ()),
        Verb::CleanDeps => ExternalDeps::new(config).clean().map(|_| ()),
        Verb::Loc => loc::execute(config, runner).map(|_| ()),
    }
}

/// Select the build system and run `action` inside an existing build directory
fn with_backend<F>(verb: Verb, config: &Configuration, runner: &dyn Runner, action: F) -> Result<()>
where
    F: FnOnce(&dyn BuildSystem) -> Result<()>,
{
    let backend = select_backend(config)?;

    let build_path = config.build_path();
    if !runner.dry_run() && !build_path.is_dir() {
        return Err(NomdevError::precondition(
            format!("Build directory not found: {}", build_path.display()),
            Some(hints::build_dir_missing().to_string()),
        )
        .into());
    }

    action(backend.as_ref())?;

    if !runner.dry_run() {
        print_success(&format!("{} finished ({})", verb, backend.name()));
    }
    Ok(())
}
