//! Classification Scanner
//!
//! Decides, for one point-cloud file, whether every point carries the
//! expected classification code. Uniform classification is a
//! whole-file property, so the scan stops at the first violating
//! record instead of reading the rest of the cloud.

use std::path::Path;

use crate::reader::{LasFileReader, PointCloudReader, PointStream};

/// LAS classification code for ground points.
pub const GROUND_CLASS: u16 = 2;

/// Terminal result of scanning one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Every point carries the expected classification.
    Clean,

    /// At least one point carries a different classification.
    Misclassified,

    /// The file could not be opened, failed mid-read, or ended before
    /// the header-declared point count.
    Unreadable,
}

/// Scans point-cloud files for uniform classification.
#[derive(Debug, Clone)]
pub struct ClassificationScanner<R> {
    reader: R,
    expected_class: u16,
}

impl Default for ClassificationScanner<LasFileReader> {
    fn default() -> Self {
        Self::new(LasFileReader)
    }
}

impl<R: PointCloudReader> ClassificationScanner<R> {
    /// Create a scanner expecting ground (class 2) points.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            expected_class: GROUND_CLASS,
        }
    }

    /// Override the expected classification code.
    pub fn with_expected_class(mut self, expected_class: u16) -> Self {
        self.expected_class = expected_class;
        self
    }

    /// The classification code every point must carry.
    pub fn expected_class(&self) -> u16 {
        self.expected_class
    }

    /// Scan one file. Never fails the run: reader errors become
    /// [`ScanOutcome::Unreadable`].
    ///
    /// The header may populate either the legacy or the extended point
    /// count; the scan iterates to the legacy count when it is
    /// nonzero, otherwise to the extended count.
    pub fn scan(&self, path: &Path) -> ScanOutcome {
        let mut stream = match self.reader.open(path) {
            Ok(stream) => stream,
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "cannot open point cloud");
                return ScanOutcome::Unreadable;
            }
        };

        let total = stream.point_counts().effective();
        for read in 0..total {
            match stream.next_classification() {
                Ok(Some(class)) if class == self.expected_class => {}
                Ok(Some(_)) => return ScanOutcome::Misclassified,
                Ok(None) => {
                    tracing::warn!(
                        path = %path.display(),
                        expected = total,
                        read,
                        "point stream ended before the header-declared count"
                    );
                    return ScanOutcome::Unreadable;
                }
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "point read failed");
                    return ScanOutcome::Unreadable;
                }
            }
        }

        ScanOutcome::Clean
    }
}
