//! Subprocess execution with dry-run support
//!
//! Every external tool nomdev drives (cmake, make, msbuild, cloc) is described
//! as an [`Invocation`] and handed to a [`Runner`]. Dry-run lives here and
//! nowhere else: callers never check the flag before running a tool.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

use crate::error::{hints, NomdevError};

/// A single external tool run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    purpose: String,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            purpose: "this command".to_string(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Working directory of the child; our own cwd is never changed
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// What the tool is needed for, used in missing-tool errors
    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = purpose.into();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Short tool name (`msbuild` for `C:\...\MSBuild.exe`)
    pub fn tool_name(&self) -> String {
        Path::new(&self.program)
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_else(|| self.program.clone())
    }

    /// The command line exactly as it would be executed
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(quote)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Build the `Command` for this invocation using a resolved program path
    pub fn to_command(&self, program: &Path) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(&self.args);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.command_line())
    }
}

fn quote(arg: &str) -> String {
    if arg.is_empty() || arg.chars().any(char::is_whitespace) {
        format!("\"{}\"", arg)
    } else {
        arg.to_string()
    }
}

/// Executes invocations
pub trait Runner {
    /// Run to completion. A non-zero exit is an error.
    fn run(&self, invocation: &Invocation) -> Result<()>;

    /// Whether side effects are suppressed
    fn dry_run(&self) -> bool;
}

/// Runs tools synchronously with inherited stdio
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner {
    dry_run: bool,
    verbose: bool,
}

impl ProcessRunner {
    pub fn new(dry_run: bool, verbose: bool) -> Self {
        Self { dry_run, verbose }
    }
}

impl Runner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        if self.dry_run {
            println!("{}", invocation.command_line());
            return Ok(());
        }

        if self.verbose {
            eprintln!("Running: {}", invocation.command_line());
            if let Some(cwd) = invocation.get_cwd() {
                eprintln!("     in: {}", cwd.display());
            }
        }

        let tool = invocation.tool_name();
        let program = which::which(invocation.program()).map_err(|_| {
            NomdevError::missing_tool(&tool, &invocation.purpose, hints::for_tool(&tool))
        })?;

        let status = invocation
            .to_command(&program)
            .stdin(Stdio::null())
            .status()
            .with_context(|| format!("Failed to execute {}", invocation.program()))?;

        if !status.success() {
            return Err(NomdevError::ToolFailed {
                tool,
                code: status.code(),
                command_line: invocation.command_line(),
            }
            .into());
        }

        Ok(())
    }

    fn dry_run(&self) -> bool {
        self.dry_run
    }
}

/// Check if a command exists in PATH
pub fn command_exists(program: &str) -> bool {
    which::which(program).is_ok()
}
