// Verification module
// Recomputes every manifest entry and compares it with the stored record

use std::path::Path;

use tracing::{debug, error, info, warn};

use super::error::HashUtilityError;
use super::path_utils;
use super::pipeline::DigestPipeline;
use super::record::{digests_to_text, ManifestRecord};
use super::store::{ManifestSource, TarManifestReader};
use super::walk;

/// Represents a record mismatch between stored and recomputed text
#[derive(Debug, Clone, serde::Serialize)]
pub struct Mismatch {
    pub path: String,
    pub expected: String,
    pub actual: String,
}

/// Report of verification results
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct VerifyReport {
    pub files_checked: usize,
    pub mismatches: Vec<Mismatch>,
    pub missing_files: Vec<String>,
    pub read_failures: Vec<String>,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty() && self.missing_files.is_empty() && self.read_failures.is_empty()
    }

    /// Entries that were recomputed and matched
    pub fn matches(&self) -> usize {
        self.files_checked - self.mismatches.len() - self.missing_files.len() - self.read_failures.len()
    }

    /// Total number of reported problems
    pub fn error_count(&self) -> usize {
        self.mismatches.len() + self.missing_files.len() + self.read_failures.len()
    }
}

/// Engine verifying file contents against a manifest
pub struct VerifyEngine {
    pipeline: DigestPipeline,
}

impl VerifyEngine {
    /// The pipeline must use the algorithm set the manifest was recorded with
    pub fn new(pipeline: DigestPipeline) -> Self {
        Self { pipeline }
    }

    /// Verify the tree at `root` against the manifest at `manifest`
    pub fn verify(&self, root: &Path, manifest: &Path) -> Result<VerifyReport, HashUtilityError> {
        info!("Verifying all hashes");
        let reader = TarManifestReader::open(manifest)?;
        let root = walk::canonical_root(root)?;

        let report = self.verify_against(&root, &reader)?;
        info!("Verification complete, {} files checked", report.files_checked);
        Ok(report)
    }

    /// Verify against any manifest source
    ///
    /// Matching files produce no output. Missing files, unreadable files and
    /// mismatches are reported and the run continues.
    pub fn verify_against<S: ManifestSource>(&self, root: &Path, source: &S) -> Result<VerifyReport, HashUtilityError> {
        let mut report = VerifyReport::default();

        for key in source.file_paths("") {
            report.files_checked += 1;
            let path = path_utils::resolve_in_root(root, key);
            debug!("{}", path.display());

            if !path.is_file() {
                error!("File not found: {}", path.display());
                report.missing_files.push(key.to_string());
                continue;
            }

            let stored = source.read_file(key)?;
            let digests = match self.pipeline.digest_file(&path) {
                Ok(digests) => digests,
                Err(e) if e.is_per_file() => {
                    warn!("Could not read {}: {}", path.display(), e);
                    report.read_failures.push(key.to_string());
                    continue;
                }
                Err(e) => return Err(e),
            };

            let actual = digests_to_text(&digests);
            if actual.as_bytes() != stored {
                error!("Hash verification error: {}", path.display());
                let expected = String::from_utf8_lossy(stored).into_owned();
                log_divergence(key, &expected, ManifestRecord::new(key, digests));
                report.mismatches.push(Mismatch {
                    path: key.to_string(),
                    expected,
                    actual,
                });
            }
        }

        Ok(report)
    }
}

impl Default for VerifyEngine {
    fn default() -> Self {
        Self::new(DigestPipeline::default())
    }
}

/// Debug detail naming the algorithms that disagree
fn log_divergence(key: &str, expected: &str, actual: ManifestRecord) {
    match ManifestRecord::parse(key, expected) {
        Ok(stored) => {
            let names: Vec<&str> = stored
                .diverging_algorithms(&actual)
                .into_iter()
                .map(|a| a.name())
                .collect();
            debug!("{}: diverging algorithms: {}", key, names.join(", "));
        }
        Err(e) => debug!("{}: stored record unreadable: {}", key, e),
    }
}
