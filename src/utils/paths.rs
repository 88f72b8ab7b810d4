//! Path utilities for nomdev

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::nomdev_toml::CONFIG_FILE_NAME;

/// Find the project root starting from the current directory
pub fn find_project_root() -> Result<PathBuf> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    Ok(find_project_root_from(&current_dir))
}

/// Find the project root starting from a specific directory.
///
/// The nearest ancestor holding `nomdev.toml` wins, then the nearest one
/// holding `CMakeLists.txt`. With neither, `start` itself is the root.
pub fn find_project_root_from(start: &Path) -> PathBuf {
    find_project_root_within(start, None)
}

/// Like [`find_project_root_from`], but never looks above `boundary`
pub fn find_project_root_within(start: &Path, boundary: Option<&Path>) -> PathBuf {
    find_ancestor_with(start, boundary, CONFIG_FILE_NAME)
        .or_else(|| find_ancestor_with(start, boundary, "CMakeLists.txt"))
        .unwrap_or_else(|| start.to_path_buf())
}

fn find_ancestor_with(start: &Path, boundary: Option<&Path>, file_name: &str) -> Option<PathBuf> {
    let mut past_boundary = false;
    start
        .ancestors()
        .take_while(|dir| {
            let keep = !past_boundary;
            past_boundary = past_boundary || boundary == Some(*dir);
            keep
        })
        .find(|dir| dir.join(file_name).is_file())
        .map(Path::to_path_buf)
}

/// Lexically normalize a path, resolving `.` and `..` without touching the disk
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `..` at the root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    out
}

/// Resolve `relative` against `root` and require the result to lie strictly inside it
pub fn resolve_inside(root: &Path, relative: &Path) -> Option<PathBuf> {
    let root = normalize(root);
    let candidate = normalize(&root.join(relative));
    if candidate != root && candidate.starts_with(&root) {
        Some(candidate)
    } else {
        None
    }
}

/// True when the parent directory of `path` resolves, symlinks included, inside `root`.
///
/// The parent may equal the root. The final component is left unresolved so
/// a symlink there can still be unlinked instead of followed.
pub fn parent_within(root: &Path, path: &Path) -> bool {
    let Some(parent) = path.parent() else {
        return false;
    };
    match (root.canonicalize(), parent.canonicalize()) {
        (Ok(root), Ok(parent)) => parent.starts_with(root),
        _ => false,
    }
}

/// Ensure a directory exists
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    }
    Ok(())
}
