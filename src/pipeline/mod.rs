//! Triage Pipeline
//!
//! Orchestrates discovery and scanning over a directory tree, then
//! drives the two side effects: the corruption report and the
//! quarantine move of misclassified files. Everything runs
//! sequentially; no file is moved while any scan may still be reading.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::discover::{DiscoverError, FileDiscoverer};
use crate::quarantine::{CollisionPolicy, QuarantineMover, QuarantineOutcome};
use crate::reader::{LasFileReader, PointCloudReader};
use crate::scanner::{ClassificationScanner, ScanOutcome};

/// Report listing unreadable files, written under the root.
pub const REPORT_FILE_NAME: &str = "corrupt_and_missing_laz.txt";

/// Remediation script stub, written under the root.
pub const SCRIPT_FILE_NAME: &str = "setup_reclassify.bat";

/// Quarantine directory name under the root.
pub const QUARANTINE_DIR_NAME: &str = "orig";

// Report and script carry the line convention of the tooling that
// consumes them.
const CRLF: &str = "\r\n";

/// Fatal pipeline errors. Per-file scan and quarantine failures are
/// not errors; they are recorded in the [`TriageSummary`].
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Discover(#[from] DiscoverError),

    #[error(transparent)]
    Quarantine(#[from] crate::quarantine::QuarantineError),

    #[error("failed to write report {path}: {source}")]
    WriteReport {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write remediation script {path}: {source}")]
    WriteScript {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Per-outcome path lists accumulated during a run, in discovery
/// order. A path lands in at most one list; clean files are in
/// neither.
#[derive(Debug, Clone, Default)]
pub struct TriageReport {
    pub unreadable: Vec<PathBuf>,
    pub misclassified: Vec<PathBuf>,
}

/// Result of a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriageSummary {
    /// Number of files discovered and scanned.
    pub files_scanned: usize,

    /// Files whose every point carried the expected class.
    pub clean_count: usize,

    /// Files with at least one off-class point.
    pub misclassified_count: usize,

    /// Files that could not be opened or read.
    pub unreadable_count: usize,

    /// Misclassified files moved under their own name.
    pub quarantined_count: usize,

    /// Misclassified files moved under a generated unique name.
    pub renamed_count: usize,

    /// Misclassified files left in place by the collision policy.
    pub skipped_count: usize,

    /// Error messages from failed quarantine moves.
    pub quarantine_errors: Vec<String>,

    /// Whether every applicable quarantine move succeeded.
    pub success: bool,
}

/// End-to-end triage: discover, scan, report, quarantine.
#[derive(Debug, Clone)]
pub struct TriagePipeline<R = LasFileReader> {
    discoverer: FileDiscoverer,
    scanner: ClassificationScanner<R>,
    collision_policy: CollisionPolicy,
}

impl TriagePipeline<LasFileReader> {
    /// Pipeline with the production LAS/LAZ reader, default skip/keep
    /// sets, ground class, and auto-rename collision handling.
    pub fn new() -> Self {
        Self::with_scanner(ClassificationScanner::default())
    }
}

impl Default for TriagePipeline<LasFileReader> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: PointCloudReader> TriagePipeline<R> {
    pub fn with_scanner(scanner: ClassificationScanner<R>) -> Self {
        Self {
            discoverer: FileDiscoverer::new(),
            scanner,
            collision_policy: CollisionPolicy::default(),
        }
    }

    pub fn with_discoverer(mut self, discoverer: FileDiscoverer) -> Self {
        self.discoverer = discoverer;
        self
    }

    pub fn with_collision_policy(mut self, collision_policy: CollisionPolicy) -> Self {
        self.collision_policy = collision_policy;
        self
    }

    /// Run the pipeline over `root`.
    ///
    /// Discovery failure aborts with no artifacts written. Per-file
    /// scan failures become report entries; per-file quarantine
    /// failures are collected into the summary and the remaining moves
    /// continue.
    pub fn run(&self, root: &Path) -> Result<TriageSummary, PipelineError> {
        let files = self.discoverer.discover(root)?;
        tracing::info!(root = %root.display(), count = files.len(), "discovered candidate files");

        let mut report = TriageReport::default();
        let files_scanned = files.len();
        let mut clean_count = 0;

        for path in files {
            match self.scanner.scan(&path) {
                ScanOutcome::Clean => {
                    println!("clean: {}", path.display());
                    clean_count += 1;
                }
                ScanOutcome::Misclassified => {
                    println!("misclassified: {}", path.display());
                    report.misclassified.push(path);
                }
                ScanOutcome::Unreadable => {
                    println!("unreadable: {}", path.display());
                    report.unreadable.push(path);
                }
            }
        }

        if !report.unreadable.is_empty() {
            self.write_failure_report(root, &report.unreadable)?;
        }

        let mut quarantined_count = 0;
        let mut renamed_count = 0;
        let mut skipped_count = 0;
        let mut quarantine_errors = Vec::new();

        if !report.misclassified.is_empty() {
            let mover = QuarantineMover::new(root.join(QUARANTINE_DIR_NAME))
                .with_collision_policy(self.collision_policy);
            mover.ensure_dest_dir()?;
            self.write_remediation_script(root)?;

            for path in &report.misclassified {
                match mover.quarantine(path) {
                    Ok(QuarantineOutcome::Quarantined(_)) => quarantined_count += 1,
                    Ok(QuarantineOutcome::Renamed(destination)) => {
                        renamed_count += 1;
                        tracing::info!(
                            from = %path.display(),
                            to = %destination.display(),
                            "quarantined under a unique name"
                        );
                    }
                    Ok(QuarantineOutcome::Skipped(reason)) => {
                        skipped_count += 1;
                        tracing::warn!(path = %path.display(), reason, "quarantine skipped");
                    }
                    Err(error) => {
                        tracing::error!(path = %path.display(), %error, "quarantine failed");
                        quarantine_errors.push(error.to_string());
                    }
                }
            }
        }

        let success = quarantine_errors.is_empty();
        Ok(TriageSummary {
            files_scanned,
            clean_count,
            misclassified_count: report.misclassified.len(),
            unreadable_count: report.unreadable.len(),
            quarantined_count,
            renamed_count,
            skipped_count,
            quarantine_errors,
            success,
        })
    }

    /// Write the corruption report, one annotated path per line in
    /// discovery order, truncating any previous report.
    fn write_failure_report(
        &self,
        root: &Path,
        unreadable: &[PathBuf],
    ) -> Result<(), PipelineError> {
        let path = root.join(REPORT_FILE_NAME);
        let mut contents = String::new();
        for entry in unreadable {
            contents.push_str(&format!("{} (Corrupt){CRLF}", entry.display()));
        }

        fs::write(&path, contents).map_err(|source| PipelineError::WriteReport {
            path: path.clone(),
            source,
        })?;

        tracing::info!(path = %path.display(), entries = unreadable.len(), "wrote corruption report");
        Ok(())
    }

    /// Placeholder hook for the external reclassification tool.
    fn write_remediation_script(&self, root: &Path) -> Result<(), PipelineError> {
        let path = root.join(SCRIPT_FILE_NAME);
        fs::write(&path, format!("placeholder{CRLF}")).map_err(|source| {
            PipelineError::WriteScript {
                path: path.clone(),
                source,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use las::point::Classification;
    use las::{Builder, Point, Writer};
    use tempfile::TempDir;

    fn write_cloud(path: &Path, classes: &[Classification]) {
        let mut builder = Builder::from((1, 2));
        builder.point_format = las::point::Format::new(0).unwrap();
        let header = builder.into_header().unwrap();

        let mut writer = Writer::from_path(path, header).unwrap();
        for &classification in classes {
            let point = Point {
                x: 1.0,
                y: 2.0,
                z: 3.0,
                classification,
                ..Default::default()
            };
            writer.write_point(point).unwrap();
        }
        writer.close().unwrap();
    }

    fn write_clean(path: &Path) {
        write_cloud(path, &[Classification::Ground; 3]);
    }

    fn write_misclassified(path: &Path) {
        write_cloud(
            path,
            &[
                Classification::Ground,
                Classification::HighVegetation,
                Classification::Ground,
            ],
        );
    }

    #[test]
    fn test_end_to_end_triage() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        write_clean(&root.join("a.laz"));
        write_misclassified(&root.join("b.laz"));
        std::fs::write(root.join("c.laz"), b"corrupt garbage").unwrap();

        let summary = TriagePipeline::new().run(root).unwrap();

        assert_eq!(summary.files_scanned, 3);
        assert_eq!(summary.clean_count, 1);
        assert_eq!(summary.misclassified_count, 1);
        assert_eq!(summary.unreadable_count, 1);
        assert_eq!(summary.quarantined_count, 1);
        assert!(summary.success);

        // a.laz untouched in place
        assert!(root.join("a.laz").exists());

        // c.laz reported as corrupt
        let report = std::fs::read_to_string(root.join(REPORT_FILE_NAME)).unwrap();
        assert_eq!(
            report,
            format!("{} (Corrupt)\r\n", root.join("c.laz").display())
        );

        // b.laz moved into orig/, script written
        assert!(!root.join("b.laz").exists());
        assert!(root.join(QUARANTINE_DIR_NAME).join("b.laz").exists());
        let script = std::fs::read_to_string(root.join(SCRIPT_FILE_NAME)).unwrap();
        assert_eq!(script, "placeholder\r\n");
    }

    #[test]
    fn test_clean_tree_produces_no_artifacts() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write_clean(&root.join("a.laz"));
        write_clean(&root.join("b.laz"));

        let summary = TriagePipeline::new().run(root).unwrap();

        assert_eq!(summary.clean_count, 2);
        assert!(!root.join(REPORT_FILE_NAME).exists());
        assert!(!root.join(SCRIPT_FILE_NAME).exists());
        assert!(!root.join(QUARANTINE_DIR_NAME).exists());
    }

    #[test]
    fn test_rerun_on_clean_tree_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write_clean(&root.join("a.laz"));

        TriagePipeline::new().run(root).unwrap();
        let summary = TriagePipeline::new().run(root).unwrap();

        assert_eq!(summary.files_scanned, 1);
        assert_eq!(summary.clean_count, 1);
        assert!(root.join("a.laz").exists());
        assert!(!root.join(REPORT_FILE_NAME).exists());
        assert!(!root.join(SCRIPT_FILE_NAME).exists());
        assert!(!root.join(QUARANTINE_DIR_NAME).exists());
    }

    #[test]
    fn test_report_preserves_discovery_order() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::write(root.join("x.laz"), b"bad").unwrap();
        std::fs::write(root.join("y.laz"), b"bad").unwrap();
        std::fs::write(root.join("z.laz"), b"bad").unwrap();

        TriagePipeline::new().run(root).unwrap();

        let report = std::fs::read_to_string(root.join(REPORT_FILE_NAME)).unwrap();
        let lines: Vec<&str> = report.split_terminator("\r\n").collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with(&root.join("x.laz").display().to_string()));
        assert!(lines[1].starts_with(&root.join("y.laz").display().to_string()));
        assert!(lines[2].starts_with(&root.join("z.laz").display().to_string()));
    }

    #[test]
    fn test_report_overwrites_previous_contents() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::write(root.join(REPORT_FILE_NAME), "stale contents that are long").unwrap();
        std::fs::write(root.join("only.laz"), b"bad").unwrap();

        TriagePipeline::new().run(root).unwrap();

        let report = std::fs::read_to_string(root.join(REPORT_FILE_NAME)).unwrap();
        assert_eq!(
            report,
            format!("{} (Corrupt)\r\n", root.join("only.laz").display())
        );
    }

    #[test]
    fn test_flattening_collisions_are_renamed() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir(root.join("north")).unwrap();
        std::fs::create_dir(root.join("south")).unwrap();
        write_misclassified(&root.join("north/dup.laz"));
        write_misclassified(&root.join("south/dup.laz"));

        let summary = TriagePipeline::new().run(root).unwrap();

        assert_eq!(summary.misclassified_count, 2);
        assert_eq!(summary.quarantined_count, 1);
        assert_eq!(summary.renamed_count, 1);
        assert!(summary.success);
        assert!(root.join("orig/dup.laz").exists());
        assert!(root.join("orig/dup_1.laz").exists());
        assert!(!root.join("north/dup.laz").exists());
        assert!(!root.join("south/dup.laz").exists());
    }

    #[test]
    fn test_files_in_log_dirs_are_ignored() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir(root.join("logs")).unwrap();
        write_misclassified(&root.join("logs/hidden.laz"));

        let summary = TriagePipeline::new().run(root).unwrap();

        assert_eq!(summary.files_scanned, 0);
        assert!(root.join("logs/hidden.laz").exists());
        assert!(!root.join(QUARANTINE_DIR_NAME).exists());
    }

    #[test]
    fn test_invalid_root_fails_without_artifacts() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        let result = TriagePipeline::new().run(&missing);

        assert!(matches!(
            result,
            Err(PipelineError::Discover(DiscoverError::NotADirectory(_)))
        ));
        assert!(!dir.path().join(REPORT_FILE_NAME).exists());
    }

    #[test]
    fn test_existing_orig_dir_is_reused() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir(root.join(QUARANTINE_DIR_NAME)).unwrap();
        write_misclassified(&root.join("b.laz"));

        let summary = TriagePipeline::new().run(root).unwrap();

        assert_eq!(summary.quarantined_count, 1);
        assert!(root.join("orig/b.laz").exists());
    }
}
