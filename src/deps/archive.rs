//! Third-party archive writers
//!
//! Both formats store entries under the archived directory's own name, so
//! `third-party/include/foo.h` unpacks to the same place on every platform.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use walkdir::{DirEntry, WalkDir};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Finder/Explorer metadata never worth shipping
const METADATA_FILES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini"];

/// Which subtrees and files to leave out of an archive
#[derive(Debug, Clone, Default)]
pub struct ArchiveFilter {
    /// Directory names skipped at the top level of the archived tree
    excluded_dirs: Vec<String>,
}

impl ArchiveFilter {
    pub fn excluding(dirs: &[&str]) -> Self {
        Self {
            excluded_dirs: dirs.iter().map(|d| d.to_string()).collect(),
        }
    }

    /// Whether a path (relative to the archived directory) is packed
    pub fn includes(&self, relative: &Path, is_dir: bool) -> bool {
        let Some(name) = relative.file_name().and_then(|n| n.to_str()) else {
            return true;
        };

        if !is_dir && (METADATA_FILES.contains(&name) || name.starts_with("._")) {
            return false;
        }

        // Only top-level platform folders are excluded; nested names are sources
        let depth = relative.components().count();
        !(is_dir && depth == 1 && self.excluded_dirs.iter().any(|d| d == name))
    }
}

/// Collect the files and directories to pack, relative to `source_dir`
pub fn collect_entries(source_dir: &Path, filter: &ArchiveFilter) -> Result<Vec<(PathBuf, bool)>> {
    let mut entries = Vec::new();

    let walker = WalkDir::new(source_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| keep(entry, source_dir, filter));

    for entry in walker {
        let entry = entry.context("Failed to read directory entry")?;
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .context("Failed to get relative path")?;

        // Skip the root directory
        if relative.as_os_str().is_empty() {
            continue;
        }

        entries.push((relative.to_path_buf(), entry.file_type().is_dir()));
    }

    Ok(entries)
}

fn keep(entry: &DirEntry, source_dir: &Path, filter: &ArchiveFilter) -> bool {
    match entry.path().strip_prefix(source_dir) {
        Ok(relative) if relative.as_os_str().is_empty() => true,
        Ok(relative) => filter.includes(relative, entry.file_type().is_dir()),
        Err(_) => false,
    }
}

/// Name of the archived directory, used as the root inside the archive
fn archive_root(source_dir: &Path) -> Result<PathBuf> {
    source_dir
        .file_name()
        .map(PathBuf::from)
        .with_context(|| format!("Cannot archive {}", source_dir.display()))
}

/// Write a gzip-compressed tarball of `source_dir`
pub fn create_tar_gz(source_dir: &Path, archive_path: &Path, filter: &ArchiveFilter) -> Result<usize> {
    let root = archive_root(source_dir)?;
    let entries = collect_entries(source_dir, filter)?;

    let file = File::create(archive_path)
        .with_context(|| format!("Failed to create archive: {}", archive_path.display()))?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    builder
        .append_dir(&root, source_dir)
        .with_context(|| format!("Failed to add {} to archive", root.display()))?;

    for (relative, is_dir) in &entries {
        let path = source_dir.join(relative);
        let name = root.join(relative);
        let appended = if *is_dir {
            builder.append_dir(&name, &path)
        } else {
            builder.append_path_with_name(&path, &name)
        };
        appended.with_context(|| format!("Failed to add {} to archive", name.display()))?;
    }

    let encoder = builder.into_inner().context("Failed to finish tar archive")?;
    encoder.finish().context("Failed to finish gzip stream")?;

    Ok(entries.iter().filter(|(_, is_dir)| !is_dir).count())
}

/// Write a deflate-compressed ZIP of `source_dir`
pub fn create_zip(source_dir: &Path, archive_path: &Path, filter: &ArchiveFilter) -> Result<usize> {
    let root = archive_root(source_dir)?;
    let entries = collect_entries(source_dir, filter)?;

    let file = File::create(archive_path)
        .with_context(|| format!("Failed to create archive: {}", archive_path.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let zip_name = |path: &Path| path.to_string_lossy().replace('\\', "/");

    zip.add_directory(zip_name(&root), options)
        .context("Failed to add root directory to archive")?;

    for (relative, is_dir) in &entries {
        let name = zip_name(&root.join(relative));
        if *is_dir {
            zip.add_directory(&name, options)
                .with_context(|| format!("Failed to add directory to archive: {}", name))?;
        } else {
            zip.start_file(&name, options)
                .with_context(|| format!("Failed to start file in archive: {}", name))?;
            let path = source_dir.join(relative);
            let mut file = File::open(&path)
                .with_context(|| format!("Failed to open file: {}", path.display()))?;
            io::copy(&mut file, &mut zip)
                .with_context(|| format!("Failed to write file to archive: {}", name))?;
        }
    }

    zip.finish().context("Failed to finish ZIP archive")?;

    Ok(entries.iter().filter(|(_, is_dir)| !is_dir).count())
}
