//! nomdev - developer convenience CLI for nomlib-style CMake projects
//!
//! Generates build scripts with CMake, drives the platform's native build
//! tool, and packages the third-party dependency bundle.
//!
//! ## Architecture
//!
//! ```text
//! argv → cli (Configuration) → commands::dispatch → build/ | deps/ | commands/
//!                                                 → exec::Runner → cmake, make, msbuild, cloc
//! ```

mod build;
mod cli;
mod commands;
mod config;
mod deps;
mod error;
mod exec;
mod platform;
mod utils;

use std::process::ExitCode;

use cli::{parse_args, print_help, Parsed};
use error::NomdevError;
use platform::Platform;
use utils::terminal::{pause_for_keypress, print_error};

fn main() -> ExitCode {
    let cli = match parse_args(std::env::args_os()) {
        Parsed::Run(cli) => cli,
        Parsed::Help => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Parsed::Error(err) => {
            // --help and --version are reported through clap errors too
            let _ = err.print();
            if !err.use_stderr() {
                return ExitCode::SUCCESS;
            }
            return fail(Platform::detect());
        }
    };

    let platform = cli.effective_platform();
    match cli.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            fail(platform)
        }
    }
}

fn report_error(err: &anyhow::Error) {
    match err.chain().find_map(|cause| cause.downcast_ref::<NomdevError>()) {
        Some(nomdev_err) => nomdev_err.display_with_hints(),
        None => print_error(&format!("{:#}", err)),
    }
}

/// Exit 1, keeping a windows console open long enough to read the error
fn fail(platform: Platform) -> ExitCode {
    if platform.is_windows() {
        pause_for_keypress();
    }
    ExitCode::from(1)
}
