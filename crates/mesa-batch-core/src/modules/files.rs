//! Directory listing and copying used by the batch drivers.

use crate::domain::{BatchError, BatchResult};
use globset::{Glob, GlobMatcher};
use std::fs;
use std::path::{Path, PathBuf};

pub const INLIST_GLOB: &str = "*.inp";

pub fn file_matcher(pattern: &str) -> BatchResult<GlobMatcher> {
    Glob::new(pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|source| {
            BatchError::validation(
                "VALIDATION.GLOB",
                format!("invalid glob pattern '{}': {}", pattern, source),
            )
        })
}

/// Regular files directly inside `dir` whose name matches `pattern`, sorted by name.
/// A missing directory lists as empty.
pub fn list_files(dir: &Path, pattern: &str) -> BatchResult<Vec<PathBuf>> {
    let matcher = file_matcher(pattern)?;
    let mut files: Vec<PathBuf> = entries(dir)?
        .into_iter()
        .filter(|path| path.is_file())
        .filter(|path| path.file_name().is_some_and(|name| matcher.is_match(name)))
        .collect();
    files.sort();
    Ok(files)
}

/// Subdirectories of `dir`, sorted by name. A missing directory lists as empty.
pub fn list_dirs(dir: &Path) -> BatchResult<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = entries(dir)?
        .into_iter()
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn entries(dir: &Path) -> BatchResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let read_error = |source: std::io::Error| {
        BatchError::io_system(
            "IO.LIST_DIR",
            format!("failed to list '{}': {}", dir.display(), source),
        )
    };
    fs::read_dir(dir)
        .map_err(read_error)?
        .map(|entry| entry.map(|entry| entry.path()).map_err(read_error))
        .collect()
}

pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn copy_file(from: &Path, to: &Path) -> BatchResult<()> {
    fs::copy(from, to).map(|_| ()).map_err(|source| {
        BatchError::io_system(
            "IO.COPY",
            format!(
                "failed to copy '{}' to '{}': {}",
                from.display(),
                to.display(),
                source
            ),
        )
    })
}

/// Copies every regular file of `from` (not recursing) into `to`; returns how many were copied.
pub fn copy_dir_files(from: &Path, to: &Path) -> BatchResult<usize> {
    let files = list_files(from, "*")?;
    for file in &files {
        copy_file(file, &to.join(file_name_of(file)))?;
    }
    Ok(files.len())
}
