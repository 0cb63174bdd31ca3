//! Quarantine Module
//!
//! Moves misclassified files into the quarantine directory for manual
//! remediation. The move is a copy followed by a delete, never a
//! rename, because the quarantine directory may live on a different
//! volume than the source. A JSON sidecar records where each file came
//! from, since quarantined files are flattened to their base name.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Suffix appended to a quarantined file's name for its sidecar.
pub const SIDECAR_SUFFIX: &str = ".quarantine.json";

/// How to handle a name collision in the quarantine directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Return an error and leave the source in place.
    Fail,
    /// Leave the source in place and report the file as skipped.
    Skip,
    /// Generate a unique name (_1, _2, etc.) and proceed.
    #[default]
    AutoRename,
}

/// Outcome of quarantining a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuarantineOutcome {
    /// Moved under its original base name.
    Quarantined(PathBuf),
    /// Moved under a generated unique name.
    Renamed(PathBuf),
    /// Left in place (includes reason).
    Skipped(String),
}

/// Errors from a quarantine move.
///
/// All variants leave the filesystem in a stated condition so the
/// caller can surface what remains where.
#[derive(Error, Debug)]
pub enum QuarantineError {
    #[error("failed to create quarantine directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("destination already exists: {path}")]
    DestinationExists { path: PathBuf },

    #[error("failed to copy {source_path} to {destination}: {source}")]
    Copy {
        source_path: PathBuf,
        destination: PathBuf,
        source: std::io::Error,
    },

    /// The copy succeeded but the original could not be deleted, so a
    /// duplicate of the file now exists at both paths.
    #[error(
        "copied {source_path} to {destination} but could not remove the original \
         (a duplicate now exists): {source}"
    )]
    SourceNotRemoved {
        source_path: PathBuf,
        destination: PathBuf,
        source: std::io::Error,
    },
}

/// Sidecar metadata for a quarantined file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarantinedItem {
    /// Current path in the quarantine directory.
    pub path: PathBuf,

    /// Original base file name.
    pub name: String,

    /// Path the file was moved from.
    pub original_path: PathBuf,

    /// When the file was quarantined.
    pub quarantine_date: DateTime<Utc>,

    /// Size in bytes.
    pub size: u64,
}

/// Moves files into a quarantine directory, flattened to their base
/// file name.
#[derive(Debug, Clone)]
pub struct QuarantineMover {
    dest_dir: PathBuf,
    on_collision: CollisionPolicy,
}

impl QuarantineMover {
    pub fn new(dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            dest_dir: dest_dir.into(),
            on_collision: CollisionPolicy::default(),
        }
    }

    pub fn with_collision_policy(mut self, on_collision: CollisionPolicy) -> Self {
        self.on_collision = on_collision;
        self
    }

    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    /// Create the quarantine directory. An already-existing directory
    /// is fine; any other failure is returned.
    pub fn ensure_dest_dir(&self) -> Result<(), QuarantineError> {
        fs::create_dir_all(&self.dest_dir).map_err(|source| QuarantineError::CreateDir {
            path: self.dest_dir.clone(),
            source,
        })
    }

    /// Move `source` into the quarantine directory.
    ///
    /// Copy first, then delete the original. If the delete fails after
    /// a successful copy, the distinct
    /// [`QuarantineError::SourceNotRemoved`] is returned so the caller
    /// knows a duplicate now exists.
    pub fn quarantine(&self, source: &Path) -> Result<QuarantineOutcome, QuarantineError> {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let mut destination = self.dest_dir.join(&name);
        let mut renamed = false;

        if destination.exists() {
            match self.on_collision {
                CollisionPolicy::Fail => {
                    return Err(QuarantineError::DestinationExists { path: destination });
                }
                CollisionPolicy::Skip => {
                    return Ok(QuarantineOutcome::Skipped(format!(
                        "destination exists: {}",
                        destination.display()
                    )));
                }
                CollisionPolicy::AutoRename => {
                    destination = generate_unique_path(&destination);
                    renamed = true;
                }
            }
        }

        let size = fs::metadata(source).map(|m| m.len()).unwrap_or(0);

        fs::copy(source, &destination).map_err(|io| QuarantineError::Copy {
            source_path: source.to_path_buf(),
            destination: destination.clone(),
            source: io,
        })?;

        fs::remove_file(source).map_err(|io| QuarantineError::SourceNotRemoved {
            source_path: source.to_path_buf(),
            destination: destination.clone(),
            source: io,
        })?;

        self.write_sidecar(&destination, source, name, size);

        tracing::info!(
            from = %source.display(),
            to = %destination.display(),
            "quarantined file"
        );

        Ok(if renamed {
            QuarantineOutcome::Renamed(destination)
        } else {
            QuarantineOutcome::Quarantined(destination)
        })
    }

    /// Sidecar write failure never fails the move; the file is already
    /// safely in quarantine at that point.
    fn write_sidecar(&self, destination: &Path, source: &Path, name: String, size: u64) {
        let item = QuarantinedItem {
            path: destination.to_path_buf(),
            name,
            original_path: source.to_path_buf(),
            quarantine_date: Utc::now(),
            size,
        };

        let sidecar = sidecar_path(destination);
        let json = match serde_json::to_string_pretty(&item) {
            Ok(json) => json,
            Err(error) => {
                tracing::warn!(%error, "failed to serialize quarantine sidecar");
                return;
            }
        };
        if let Err(error) = fs::write(&sidecar, json) {
            tracing::warn!(
                path = %sidecar.display(),
                %error,
                "failed to write quarantine sidecar"
            );
        }
    }
}

/// Sidecar path for a quarantined file, e.g. `orig/b.laz.quarantine.json`.
pub fn sidecar_path(quarantined: &Path) -> PathBuf {
    let name = quarantined
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    quarantined.with_file_name(format!("{name}{SIDECAR_SUFFIX}"))
}

/// Generate a unique path by appending a counter suffix.
fn generate_unique_path(original: &Path) -> PathBuf {
    let parent = original.parent().unwrap_or(Path::new("."));
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());
    let ext = original
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1;
    loop {
        let candidate = parent.join(format!("{stem}_{counter}{ext}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
        if counter > 1000 {
            // Safety limit - fall back to a UUID suffix
            return parent.join(format!("{stem}_{}{ext}", uuid::Uuid::new_v4()));
        }
    }
}
