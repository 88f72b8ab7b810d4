//! Error types and helpers for user-friendly error messages
//!
//! Every failure is terminal for the run. Errors bubble up as values to the
//! single handler in `main`, which prints them (with hints) and exits 1.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors with an optional actionable hint
#[derive(Error, Debug)]
pub enum NomdevError {
    /// Bad flags, unknown verb, missing settings
    #[error("{message}")]
    Usage {
        message: String,
        hint: Option<String>,
    },

    /// The requested action has no implementation for this platform
    #[error("Unsupported platform '{platform}' for {operation}")]
    UnsupportedPlatform { platform: String, operation: String },

    /// Tool/executable not found
    #[error("Missing tool: {tool}")]
    MissingTool {
        tool: String,
        required_for: String,
        hint: String,
    },

    /// An external tool exited unsuccessfully
    #[error("{tool} failed with exit code {}", .code.map(|c| c.to_string()).unwrap_or_else(|| "<signal>".to_string()))]
    ToolFailed {
        tool: String,
        code: Option<i32>,
        command_line: String,
    },

    /// Placeholder operations on a build backend
    #[error("{operation} is not implemented for the {backend} build system")]
    NotImplemented { backend: String, operation: String },

    /// Refusing to overwrite an existing archive
    #[error("Archive already exists: {}", .path.display())]
    ArchiveExists { path: PathBuf },

    /// Filesystem state the command depends on is missing or unsafe
    #[error("{message}")]
    Precondition {
        message: String,
        hint: Option<String>,
    },

    /// A report file produced by a tool is missing or malformed
    #[error("Could not {action} {}", .path.display())]
    Report { action: String, path: PathBuf },
}

impl NomdevError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            hint: None,
        }
    }

    pub fn usage_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    pub fn unsupported_platform(
        platform: impl std::fmt::Display,
        operation: impl Into<String>,
    ) -> Self {
        Self::UnsupportedPlatform {
            platform: platform.to_string(),
            operation: operation.into(),
        }
    }

    pub fn missing_tool(
        tool: impl Into<String>,
        required_for: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self::MissingTool {
            tool: tool.into(),
            required_for: required_for.into(),
            hint: hint.into(),
        }
    }

    pub fn not_implemented(backend: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::NotImplemented {
            backend: backend.into(),
            operation: operation.into(),
        }
    }

    pub fn precondition(message: impl Into<String>, hint: Option<String>) -> Self {
        Self::Precondition {
            message: message.into(),
            hint,
        }
    }

    /// Hint shown under the error, if any
    pub fn hint(&self) -> Option<String> {
        match self {
            NomdevError::Usage { hint, .. } | NomdevError::Precondition { hint, .. } => {
                hint.clone()
            }
            NomdevError::MissingTool { hint, .. } => Some(hint.clone()),
            NomdevError::UnsupportedPlatform { .. } => Some(hints::platform().to_string()),
            NomdevError::ArchiveExists { .. } => Some(hints::archive_exists().to_string()),
            NomdevError::ToolFailed { .. }
            | NomdevError::NotImplemented { .. }
            | NomdevError::Report { .. } => None,
        }
    }

    /// Display error with formatting and hints
    pub fn display_with_hints(&self) {
        use console::style;

        eprintln!("\n{} {}", style("ERROR:").red().bold(), self);

        if let NomdevError::MissingTool { required_for, .. } = self {
            eprintln!("  (required for {})", required_for);
        }

        if let NomdevError::ToolFailed { command_line, .. } = self {
            eprintln!("\n{}", style("COMMAND:").cyan().bold());
            eprintln!("  {}", command_line);
        }

        if let Some(hint) = self.hint() {
            eprintln!("\n{} {}", style("HINT:").yellow().bold(), hint);
        }

        eprintln!();
    }
}

/// Common error hints
pub mod hints {
    pub fn cmake() -> &'static str {
        "Install CMake from https://cmake.org/ or use your package manager:\n\
         • macOS: brew install cmake\n\
         • Ubuntu: sudo apt install cmake\n\
         • Windows: winget install Kitware.CMake"
    }

    pub fn make() -> &'static str {
        "Install a make implementation:\n\
         • macOS: xcode-select --install\n\
         • Ubuntu: sudo apt install build-essential"
    }

    pub fn msbuild() -> &'static str {
        "MSBuild ships with Visual Studio and the Visual Studio Build Tools.\n\
         Run nomdev from a Developer Command Prompt, or set VSINSTALLDIR\n\
         to your Visual Studio installation path."
    }

    pub fn cloc() -> &'static str {
        "Install cloc from https://github.com/AlDanial/cloc or use your package manager:\n\
         • macOS: brew install cloc\n\
         • Ubuntu: sudo apt install cloc"
    }

    pub fn scan_build() -> &'static str {
        "scan-build is part of the clang static analyzer:\n\
         • macOS: brew install llvm\n\
         • Ubuntu: sudo apt install clang-tools"
    }

    pub fn generic_tool() -> &'static str {
        "Make sure the tool is installed and available in PATH."
    }

    pub fn platform() -> &'static str {
        "Override the detected platform with --platform (windows, macosx, linux, unix)."
    }

    pub fn archive_exists() -> &'static str {
        "Remove the existing archive first, for example with: nomdev clean-deps"
    }

    pub fn build_dir_missing() -> &'static str {
        "Generate the build scripts first: nomdev gen"
    }

    pub fn deps_url() -> &'static str {
        "Set the download location in nomdev.toml:\n\
         \n\
         [dependencies]\n\
         url = \"https://...\"\n\
         \n\
         or export NOMDEV_DEPS_URL."
    }

    /// Pick the install hint for a tool name
    pub fn for_tool(tool: &str) -> &'static str {
        match tool {
            "cmake" => cmake(),
            "make" => make(),
            "msbuild" => msbuild(),
            "cloc" => cloc(),
            "scan-build" => scan_build(),
            _ => generic_tool(),
        }
    }
}
