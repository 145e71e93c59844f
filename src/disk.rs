//! Loading a directory into a file mapping and writing it back out.

use anyhow::{Context, Result, anyhow};
use jwalk::WalkDir;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::pipeline::{FileRecord, Files};

/// Files never loaded into the mapping.
const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Collect all files from a directory recursively
fn collect_all_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name)
        })
        .map(|e| e.path())
        .collect()
}

/// Virtual path of `path` inside `root`, always with `/` separators.
fn virtual_path(path: &Path, root: &Path) -> Result<String> {
    let rel = path.strip_prefix(root)?;
    let parts: Option<Vec<&str>> = rel.components().map(|c| c.as_os_str().to_str()).collect();
    parts
        .map(|parts| parts.join("/"))
        .ok_or_else(|| anyhow!("Invalid path: {}", path.display()))
}

/// Read every file under `dir` into a mapping keyed by relative path.
pub fn read_files(dir: &Path) -> Result<Files> {
    collect_all_files(dir)
        .par_iter()
        .map(|path| -> Result<(String, FileRecord)> {
            let key = virtual_path(path, dir)?;
            let contents =
                fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
            Ok((key, FileRecord::new(contents)))
        })
        .collect()
}

/// Write every record to `dir`, creating parent directories.
///
/// With `clean`, the directory is removed first. Returns the number of files written.
pub fn write_files(files: &Files, dir: &Path, clean: bool) -> Result<usize> {
    if clean && dir.exists() {
        fs::remove_dir_all(dir)
            .with_context(|| format!("Failed to clear output directory: {}", dir.display()))?;
    }

    files.par_iter().try_for_each(|(key, file)| -> Result<()> {
        let output = dir.join(key);
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&output, &file.contents)
            .with_context(|| format!("Failed to write {}", output.display()))
    })?;

    Ok(files.len())
}
