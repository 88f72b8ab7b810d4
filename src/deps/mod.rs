//! Third-party dependency bundles
//!
//! `get` fetches the prebuilt bundle, `archive` packs the vendored
//! dependency tree for the current platform, and `clean` removes what
//! either of them produced. All paths live in the project root.

pub mod archive;
pub mod download;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::Configuration;
use crate::error::{hints, NomdevError};
use crate::platform::Platform;
use crate::utils::terminal::{print_dry_run, print_info, print_success};

use archive::{create_tar_gz, create_zip, ArchiveFilter};

/// Subtrees of the dependency tree that belong to other platforms
const OSX_EXCLUDES: &[&str] = &["windows", "linux"];
const WINDOWS_EXCLUDES: &[&str] = &["osx", "linux"];

pub struct ExternalDeps<'a> {
    config: &'a Configuration,
}

impl<'a> ExternalDeps<'a> {
    pub fn new(config: &'a Configuration) -> Self {
        Self { config }
    }

    fn root(&self) -> &Path {
        &self.config.project_root
    }

    /// Where `get` saves the bundle
    pub fn download_path(&self) -> PathBuf {
        self.root().join(self.config.project.deps_file())
    }

    /// The vendored tree `archive` packs
    pub fn source_dir(&self) -> PathBuf {
        self.root().join(self.config.project.deps_dir())
    }

    /// Archive produced by `archive` on a platform
    pub fn archive_path(&self, platform: Platform) -> Result<PathBuf, NomdevError> {
        let settings = &self.config.project;
        match platform {
            Platform::Macosx => Ok(self.root().join(settings.osx_archive_name())),
            Platform::Windows => Ok(self.root().join(settings.windows_archive_name())),
            other => Err(NomdevError::unsupported_platform(other, "archiving dependencies")),
        }
    }

    /// Download the prebuilt dependency bundle, replacing any local copy
    pub fn get(&self) -> Result<()> {
        let url = self.config.project.deps_url().ok_or_else(|| {
            NomdevError::usage_with_hint("No dependency download URL configured", hints::deps_url())
        })?;
        let dest = self.download_path();

        if self.config.dry_run {
            if dest.exists() {
                print_dry_run(&format!("Would remove {}", dest.display()));
            }
            print_dry_run(&format!("Would download {} to {}", url, dest.display()));
            return Ok(());
        }

        remove_if_exists(&dest)?;
        let bytes = download::download(&url, &dest)?;
        print_success(&format!("Downloaded {} ({} bytes)", dest.display(), bytes));
        Ok(())
    }

    /// Pack the dependency tree for `platform`. Never overwrites an existing archive.
    pub fn archive(&self, platform: Platform) -> Result<PathBuf> {
        let archive_path = self.archive_path(platform)?;

        if archive_path.exists() {
            return Err(NomdevError::ArchiveExists { path: archive_path }.into());
        }

        let source = self.source_dir();
        if !source.is_dir() {
            return Err(NomdevError::precondition(
                format!("Dependency directory not found: {}", source.display()),
                Some("Set [dependencies] dir in nomdev.toml if it lives elsewhere".to_string()),
            )
            .into());
        }

        if self.config.dry_run {
            print_dry_run(&format!(
                "Would archive {} to {}",
                source.display(),
                archive_path.display()
            ));
            return Ok(archive_path);
        }

        let written = match platform {
            Platform::Macosx => {
                create_tar_gz(&source, &archive_path, &ArchiveFilter::excluding(OSX_EXCLUDES))
            }
            _ => create_zip(&source, &archive_path, &ArchiveFilter::excluding(WINDOWS_EXCLUDES)),
        };

        // Don't leave a truncated archive behind; it would block the next attempt
        let files = match written {
            Ok(files) => files,
            Err(err) => {
                let _ = std::fs::remove_file(&archive_path);
                return Err(err);
            }
        };

        print_success(&format!(
            "Archived {} files to {}",
            files,
            archive_path.display()
        ));
        Ok(archive_path)
    }

    /// Remove both platform archives and the downloaded bundle
    pub fn clean(&self) -> Result<Vec<PathBuf>> {
        let candidates = [
            self.archive_path(Platform::Macosx)?,
            self.archive_path(Platform::Windows)?,
            self.download_path(),
        ];

        let mut removed = Vec::new();
        for path in candidates {
            if !path.exists() {
                continue;
            }
            if self.config.dry_run {
                print_dry_run(&format!("Would remove {}", path.display()));
            } else {
                remove_if_exists(&path)?;
                print_info(&format!("Removed {}", path.display()));
            }
            removed.push(path);
        }

        Ok(removed)
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}
