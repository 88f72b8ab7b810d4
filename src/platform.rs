//! Host platform detection
//!
//! Every platform-dependent decision (generator string, build backend,
//! archive format, pause-before-exit) goes through [`Platform`].

use std::sync::OnceLock;

/// Platform family a build is driven for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    Macosx,
    Linux,
    Unix,
    Unknown,
}

static HOST_PLATFORM: OnceLock<Platform> = OnceLock::new();

impl Platform {
    /// Detect the platform this process runs on.
    ///
    /// The answer is computed once and cached for the lifetime of the process.
    pub fn detect() -> Platform {
        *HOST_PLATFORM.get_or_init(|| Platform::classify(std::env::consts::OS))
    }

    /// Classify an OS identifier by substring match.
    ///
    /// Accepts Rust target names (`macos`), Ruby-style host strings
    /// (`x86_64-darwin12`, `i386-mingw32`) and the names printed by
    /// [`Platform::as_str`]. Anything unrecognized maps to `Unknown`.
    pub fn classify(host: &str) -> Platform {
        let host = host.to_ascii_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| host.contains(n));

        // "darwin" contains "win", so the windows check must not use a bare "win"
        if has(&["mswin", "mingw", "cygwin", "windows", "win32", "win64"]) {
            Platform::Windows
        } else if has(&["darwin", "macos", "osx"]) {
            Platform::Macosx
        } else if has(&["linux"]) {
            Platform::Linux
        } else if has(&["bsd", "solaris", "unix", "aix", "illumos"]) {
            Platform::Unix
        } else {
            Platform::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Macosx => "macosx",
            Platform::Linux => "linux",
            Platform::Unix => "unix",
            Platform::Unknown => "unknown",
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Platform::Windows)
    }

    /// Environment variable holding the default job count on this platform
    pub fn threads_env_var(&self) -> &'static str {
        match self {
            Platform::Windows => "NUMBER_OF_PROCESSORS",
            _ => "MAKEFLAGS",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
