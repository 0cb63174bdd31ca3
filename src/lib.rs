//! Audit a directory tree of LAS/LAZ point clouds for files whose
//! points are not uniformly classified as ground, then reorganize the
//! offenders: unreadable files are listed in a corruption report and
//! misclassified files are quarantined into `<root>/orig/` for manual
//! remediation.

pub mod discover;
pub mod pipeline;
pub mod quarantine;
pub mod reader;
pub mod scanner;

pub use discover::{DiscoverError, FileDiscoverer};
pub use pipeline::{PipelineError, TriagePipeline, TriageReport, TriageSummary};
pub use quarantine::{CollisionPolicy, QuarantineError, QuarantineMover, QuarantineOutcome};
pub use reader::{LasFileReader, PointCloudReader, PointCounts, PointStream, ReaderError};
pub use scanner::{ClassificationScanner, ScanOutcome, GROUND_CLASS};
