//! nomdev.toml project settings
//!
//! The file is optional. Every key has a default, so a project that never
//! writes one still gets nomlib's historical names:
//!
//! ```toml
//! [project]
//! name = "nomlib"
//!
//! [dependencies]
//! url = "https://example.com/nomlib-dependencies.zip"
//! file = "nomlib-dependencies.zip"
//! dir = "third-party"
//!
//! [loc]
//! exclude_dirs = ["build", "third-party"]
//! ```

use std::path::{Component, Path};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

pub const CONFIG_FILE_NAME: &str = "nomdev.toml";

/// Environment variable overriding `[dependencies] url`
pub const DEPS_URL_ENV: &str = "NOMDEV_DEPS_URL";

const DEFAULT_PROJECT_NAME: &str = "nomlib";
const DEFAULT_DEPS_DIR: &str = "third-party";
const DEFAULT_LOC_EXCLUDES: &[&str] = &[
    "scale2x",
    "hqx",
    "jsoncpp",
    "build",
    "extra",
    "third-party",
    "tmp",
    "wiki",
];

/// Root of nomdev.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSettings {
    #[serde(default)]
    pub project: ProjectSection,

    #[serde(default)]
    pub dependencies: DependenciesSection,

    #[serde(default)]
    pub loc: LocSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    /// Prefix for archive and log file names
    #[serde(default = "default_project_name")]
    pub name: String,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            name: default_project_name(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependenciesSection {
    /// Where `nomdev get` downloads from
    pub url: Option<String>,

    /// Local file name of the download; defaults to `<name>-dependencies.zip`
    pub file: Option<String>,

    /// Vendored dependency tree that `nomdev archive` packs
    pub dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocSection {
    #[serde(default = "default_loc_excludes")]
    pub exclude_dirs: Vec<String>,
}

impl Default for LocSection {
    fn default() -> Self {
        Self {
            exclude_dirs: default_loc_excludes(),
        }
    }
}

fn default_project_name() -> String {
    DEFAULT_PROJECT_NAME.to_string()
}

fn default_loc_excludes() -> Vec<String> {
    DEFAULT_LOC_EXCLUDES.iter().map(|s| s.to_string()).collect()
}

/// A single normal path component, so joining it onto the root stays in the root
fn is_plain_file_name(value: &str) -> bool {
    let mut components = Path::new(value).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

impl ProjectSettings {
    /// Load `nomdev.toml` from the project root, or defaults if there is none
    pub fn load(project_root: &Path) -> Result<Self> {
        let path = project_root.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid {}", path.display()))
    }

    /// Parse settings from a TOML string
    pub fn parse(content: &str) -> Result<Self> {
        let settings: Self = toml::from_str(content).context("Failed to parse nomdev.toml")?;

        if settings.project.name.trim().is_empty() {
            bail!("[project] name must not be empty");
        }
        // The name prefixes files written and deleted in the project root
        if !is_plain_file_name(&settings.project.name) {
            bail!("[project] name must be a plain name, not a path");
        }
        if let Some(file) = &settings.dependencies.file {
            if !is_plain_file_name(file) {
                bail!("[dependencies] file must be a file name in the project root, not a path");
            }
        }
        if let Some(dir) = &settings.dependencies.dir {
            if dir.trim().is_empty() {
                bail!("[dependencies] dir must not be empty");
            }
        }

        Ok(settings)
    }

    pub fn name(&self) -> &str {
        &self.project.name
    }

    /// Download URL, with the environment taking precedence over the file
    pub fn deps_url(&self) -> Option<String> {
        std::env::var(DEPS_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.dependencies.url.clone())
    }

    pub fn deps_file(&self) -> String {
        self.dependencies
            .file
            .clone()
            .unwrap_or_else(|| format!("{}-dependencies.zip", self.name()))
    }

    pub fn deps_dir(&self) -> &str {
        self.dependencies.dir.as_deref().unwrap_or(DEFAULT_DEPS_DIR)
    }

    pub fn osx_archive_name(&self) -> String {
        format!("{}_osx-dependencies.tar.gz", self.name())
    }

    pub fn windows_archive_name(&self) -> String {
        format!("{}_windows-dependencies.zip", self.name())
    }

    pub fn error_log_name(&self) -> String {
        format!("{}_err.log", self.name())
    }

    pub fn warning_log_name(&self) -> String {
        format!("{}_warn.log", self.name())
    }
}
