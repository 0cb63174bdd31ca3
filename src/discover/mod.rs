//! File Discovery
//!
//! Recursively enumerates a root directory for candidate point-cloud
//! files, pruning log directories. Traversal is sequential and sorted
//! by file name so downstream reports are deterministic.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

/// Directory names that are never descended into.
pub const DEFAULT_SKIP_DIRS: [&str; 3] = ["log", "logs", ".log"];

/// File extensions (without the dot) that are collected.
pub const DEFAULT_KEEP_EXTENSIONS: [&str; 2] = ["las", "laz"];

/// Errors from directory discovery. Both are fatal to the whole run:
/// discovery is all-or-nothing and never returns partial results.
#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("error while traversing {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
}

/// Recursive finder for point-cloud files.
#[derive(Debug, Clone)]
pub struct FileDiscoverer {
    /// Directory names to prune (exact, case-sensitive).
    skip_dirs: Vec<String>,

    /// Extensions to collect (exact, case-sensitive, no dot).
    keep_extensions: Vec<String>,
}

impl Default for FileDiscoverer {
    fn default() -> Self {
        Self {
            skip_dirs: DEFAULT_SKIP_DIRS.iter().map(|s| s.to_string()).collect(),
            keep_extensions: DEFAULT_KEEP_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl FileDiscoverer {
    /// Create a discoverer with the default skip and keep sets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set of pruned directory names.
    pub fn with_skip_dirs(mut self, skip_dirs: Vec<String>) -> Self {
        self.skip_dirs = skip_dirs;
        self
    }

    /// Replace the set of collected file extensions.
    pub fn with_keep_extensions(mut self, keep_extensions: Vec<String>) -> Self {
        self.keep_extensions = keep_extensions;
        self
    }

    /// Walk the tree under `root` and collect matching file paths in
    /// traversal order.
    ///
    /// Pruned directories are not descended into and nothing inside
    /// them is emitted. Any enumeration error aborts the whole
    /// discovery.
    pub fn discover(&self, root: &Path) -> Result<Vec<PathBuf>, DiscoverError> {
        if !root.is_dir() {
            return Err(DiscoverError::NotADirectory(root.to_path_buf()));
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| self.should_descend(entry));

        for entry in walker {
            let entry = entry.map_err(|source| {
                let path = source
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                tracing::warn!(
                    path = %path.display(),
                    error = %source,
                    "aborting discovery on traversal error"
                );
                DiscoverError::Walk { path, source }
            })?;

            if entry.file_type().is_file() && self.keeps(entry.path()) {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    /// The root itself is never pruned, whatever it is named.
    fn should_descend(&self, entry: &walkdir::DirEntry) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        !self.skip_dirs.iter().any(|skip| skip == name.as_ref())
    }

    fn keeps(&self, path: &Path) -> bool {
        path.extension()
            .and_then(OsStr::to_str)
            .map(|ext| self.keep_extensions.iter().any(|keep| keep == ext))
            .unwrap_or(false)
    }
}
