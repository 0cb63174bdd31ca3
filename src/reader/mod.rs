//! Point-Cloud Reader
//!
//! Contract the triage pipeline needs from a LAS/LAZ format library:
//! open a file, expose the header point counts, and iterate point
//! records yielding their classification codes. The production
//! implementation wraps the `las` crate; the traits exist so the
//! scanner can be exercised with fakes.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from opening or reading a point-cloud file.
///
/// These are always per-file: the pipeline maps them to an
/// `Unreadable` outcome instead of aborting the run.
#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("failed to open point cloud {path}: {source}")]
    Open {
        path: PathBuf,
        source: las::Error,
    },

    #[error("failed to decode header of {path}: {source}")]
    Header {
        path: PathBuf,
        source: las::Error,
    },

    #[error("failed to read point from {path}: {source}")]
    Read {
        path: PathBuf,
        source: las::Error,
    },
}

/// Header point counts as stored in the container.
///
/// Legacy containers populate the 32-bit count; LAS 1.4 files with
/// more points than fit in 32 bits populate the extended 64-bit count
/// and may leave the legacy field zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointCounts {
    /// Legacy 32-bit record count, widened.
    pub legacy: u64,

    /// Extended 64-bit record count (zero when absent).
    pub extended: u64,
}

impl PointCounts {
    /// The count the scanner iterates to: the legacy field when
    /// nonzero, otherwise the extended field.
    pub fn effective(&self) -> u64 {
        if self.legacy != 0 {
            self.legacy
        } else {
            self.extended
        }
    }
}

/// Opens point-cloud files.
pub trait PointCloudReader {
    type Stream: PointStream;

    /// Open `path` for reading. Open failure covers both parse errors
    /// and files that vanished after discovery.
    fn open(&self, path: &Path) -> Result<Self::Stream, ReaderError>;
}

/// A forward-only cursor over the point records of one open file.
///
/// Resources are released when the stream is dropped, so every exit
/// path closes the underlying handle exactly once.
pub trait PointStream {
    /// Point counts reported by the file header.
    fn point_counts(&self) -> PointCounts;

    /// Read the next record and return its classification code.
    ///
    /// Returns `Ok(None)` at end of stream.
    fn next_classification(&mut self) -> Result<Option<u16>, ReaderError>;
}

/// Production reader backed by the `las` crate (LAZ decompression
/// enabled via the `laz` feature).
#[derive(Debug, Clone, Copy, Default)]
pub struct LasFileReader;

/// An open LAS/LAZ file.
pub struct LasPointStream {
    reader: las::Reader,
    counts: PointCounts,
    path: PathBuf,
}

impl PointCloudReader for LasFileReader {
    type Stream = LasPointStream;

    fn open(&self, path: &Path) -> Result<LasPointStream, ReaderError> {
        let reader = las::Reader::from_path(path).map_err(|source| ReaderError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        // The high-level header resolves the two count fields; the raw
        // header keeps them separate, which is what the scanner's
        // fallback rule needs.
        let raw = reader
            .header()
            .clone()
            .into_raw()
            .map_err(|source| ReaderError::Header {
                path: path.to_path_buf(),
                source,
            })?;
        let counts = PointCounts {
            legacy: u64::from(raw.number_of_point_records),
            extended: raw
                .large_file
                .map(|lf| lf.number_of_point_records)
                .unwrap_or(0),
        };

        Ok(LasPointStream {
            reader,
            counts,
            path: path.to_path_buf(),
        })
    }
}

impl PointStream for LasPointStream {
    fn point_counts(&self) -> PointCounts {
        self.counts
    }

    fn next_classification(&mut self) -> Result<Option<u16>, ReaderError> {
        match self.reader.read_point() {
            // Classification is a u8 in the container; the contract
            // widens it to u16.
            Ok(Some(point)) => Ok(Some(u16::from(u8::from(point.classification)))),
            Ok(None) => Ok(None),
            Err(source) => Err(ReaderError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
