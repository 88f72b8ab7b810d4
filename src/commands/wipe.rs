//! Wipe command implementation
//!
//! Removes the whole build directory. The directory must resolve to a
//! path strictly below the project root, and no symlinked parent may lead
//! out of it; anything else is refused before anything is removed.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::config::Configuration;
use crate::error::NomdevError;
use crate::utils::paths::{parent_within, resolve_inside};
use crate::utils::terminal::{print_dry_run, print_info, print_success, print_warning};

/// What a wipe did (or would do, under dry-run)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WipeOutcome {
    Removed { path: PathBuf, size: u64 },
    WouldRemove { path: PathBuf, size: u64 },
    Missing { path: PathBuf },
}

pub fn execute(config: &Configuration) -> Result<WipeOutcome> {
    let outside_root = || {
        NomdevError::usage_with_hint(
            format!(
                "Refusing to wipe '{}': it is not inside the project root {}",
                config.build_dir.display(),
                config.project_root.display()
            ),
            "Pass a build directory below the project root with --build_dir",
        )
    };
    let target = resolve_inside(&config.project_root, &config.build_dir).ok_or_else(outside_root)?;

    let metadata = match fs::symlink_metadata(&target) {
        Ok(metadata) => metadata,
        Err(_) => {
            print_info(&format!("{} does not exist, nothing to wipe", target.display()));
            return Ok(WipeOutcome::Missing { path: target });
        }
    };

    // Symlinked directories on the way to the target must not lead out of the root
    if !parent_within(&config.project_root, &target) {
        return Err(outside_root().into());
    }

    // A symlinked build dir is unlinked; its target is left alone
    if metadata.file_type().is_symlink() {
        print_warning(&format!(
            "{} is a symlink; only the link is removed",
            target.display()
        ));
        if config.dry_run {
            print_dry_run(&format!("Would remove link: {}", target.display()));
            return Ok(WipeOutcome::WouldRemove { path: target, size: 0 });
        }
        remove_link(&target)?;
        print_success(&format!("Removed link: {}", target.display()));
        return Ok(WipeOutcome::Removed { path: target, size: 0 });
    }

    if !metadata.is_dir() {
        return Err(NomdevError::precondition(
            format!("{} is not a directory", target.display()),
            None,
        )
        .into());
    }

    let size = dir_size(&target);

    if config.dry_run {
        print_dry_run(&format!(
            "Would remove: {} ({})",
            target.display(),
            format_size(size)
        ));
        return Ok(WipeOutcome::WouldRemove { path: target, size });
    }

    fs::remove_dir_all(&target)
        .with_context(|| format!("Failed to remove {}", target.display()))?;
    print_success(&format!("Removed: {} ({})", target.display(), format_size(size)));

    Ok(WipeOutcome::Removed { path: target, size })
}

#[cfg(windows)]
fn remove_link(path: &Path) -> Result<()> {
    // Directory junctions and symlinks both unlink with remove_dir on windows
    fs::remove_dir(path)
        .or_else(|_| fs::remove_file(path))
        .with_context(|| format!("Failed to remove {}", path.display()))
}

#[cfg(not(windows))]
fn remove_link(path: &Path) -> Result<()> {
    fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))
}

fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.metadata().ok())
        .filter(|metadata| metadata.is_file())
        .map(|metadata| metadata.len())
        .sum()
}

fn format_size(size_bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size_bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_idx])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;

    fn project_with_build_dir() -> (tempfile::TempDir, Configuration) {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("nomlib");
        let build = root.join("build");
        fs::create_dir_all(build.join("CMakeFiles")).unwrap();
        fs::write(build.join("CMakeCache.txt"), "0123456789").unwrap();
        fs::write(build.join("CMakeFiles").join("Makefile.cmake"), "01234").unwrap();
        let config = Configuration::for_test(&root, Platform::Linux);
        (tmp, config)
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0.00 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1024 * 1024 * 3), "3.00 MB");
    }

    #[test]
    fn test_wipe_removes_build_dir() {
        let (_tmp, config) = project_with_build_dir();
        let build = config.build_path();

        let outcome = execute(&config).unwrap();
        assert_eq!(outcome, WipeOutcome::Removed { path: build.clone(), size: 15 });
        assert!(!build.exists());
        assert!(config.project_root.exists());
    }

    #[test]
    fn test_wipe_dry_run_keeps_build_dir() {
        let (_tmp, mut config) = project_with_build_dir();
        config.dry_run = true;

        let outcome = execute(&config).unwrap();
        assert!(matches!(outcome, WipeOutcome::WouldRemove { size: 15, .. }));
        assert!(config.build_path().join("CMakeCache.txt").exists());
    }

    #[test]
    fn test_wipe_missing_dir_succeeds() {
        let (_tmp, mut config) = project_with_build_dir();
        config.build_dir = PathBuf::from("build-x64");
        assert!(matches!(execute(&config).unwrap(), WipeOutcome::Missing { .. }));
    }

    #[test]
    fn test_wipe_refuses_paths_outside_root() {
        let (tmp, mut config) = project_with_build_dir();
        let sibling = tmp.path().join("precious");
        fs::create_dir_all(&sibling).unwrap();

        for build_dir in [
            PathBuf::from(".."),
            PathBuf::from("."),
            PathBuf::from("build/../.."),
            PathBuf::from("../precious"),
            sibling.clone(),
        ] {
            config.build_dir = build_dir.clone();
            let err = execute(&config).unwrap_err();
            assert!(
                matches!(err.downcast_ref::<NomdevError>(), Some(NomdevError::Usage { .. })),
                "expected refusal for {}",
                build_dir.display()
            );
        }

        assert!(sibling.exists());
        assert!(config.project_root.join("build").exists());
    }

    #[test]
    fn test_wipe_accepts_absolute_path_inside_root() {
        let (_tmp, mut config) = project_with_build_dir();
        let build = config.project_root.join("build");
        config.build_dir = build.clone();
        execute(&config).unwrap();
        assert!(!build.exists());
    }

    #[test]
    fn test_wipe_refuses_regular_file() {
        let (_tmp, mut config) = project_with_build_dir();
        fs::write(config.project_root.join("notes.txt"), "keep").unwrap();
        config.build_dir = PathBuf::from("notes.txt");
        let err = execute(&config).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<NomdevError>(),
            Some(NomdevError::Precondition { .. })
        ));
        assert!(config.project_root.join("notes.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_wipe_unlinks_symlink_without_following() {
        let (tmp, mut config) = project_with_build_dir();
        let outside = tmp.path().join("outside");
        fs::create_dir_all(&outside).unwrap();
        fs::write(outside.join("keep.txt"), "keep").unwrap();
        std::os::unix::fs::symlink(&outside, config.project_root.join("linked")).unwrap();
        config.build_dir = PathBuf::from("linked");

        execute(&config).unwrap();
        assert!(!config.project_root.join("linked").exists());
        assert!(outside.join("keep.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_wipe_refuses_build_dir_under_symlinked_parent() {
        let (tmp, mut config) = project_with_build_dir();
        let inner = tmp.path().join("outside").join("inner");
        fs::create_dir_all(&inner).unwrap();
        fs::write(inner.join("precious.txt"), "keep").unwrap();
        std::os::unix::fs::symlink(tmp.path().join("outside"), config.project_root.join("link"))
            .unwrap();
        config.build_dir = PathBuf::from("link/inner");

        for dry_run in [true, false] {
            config.dry_run = dry_run;
            let err = execute(&config).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<NomdevError>(),
                Some(NomdevError::Usage { .. })
            ));
        }
        assert!(inner.join("precious.txt").exists());
    }
}
