// Structure check module
// Presence-only diff between a live tree and a manifest, in both directions

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use super::error::HashUtilityError;
use super::path_utils;
use super::store::{ManifestSource, TarManifestReader};
use super::walk;

/// Result of a structure check
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct CheckReport {
    /// Regular files found in the tree
    pub files_examined: usize,
    /// Files on disk with no manifest entry
    pub missing_hashes: Vec<String>,
    /// Manifest entries with no regular file on disk
    pub missing_files: Vec<String>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.missing_hashes.is_empty() && self.missing_files.is_empty()
    }
}

/// Engine comparing tree structure against a manifest
#[derive(Debug, Default)]
pub struct CheckEngine;

impl CheckEngine {
    pub fn new() -> Self {
        Self
    }

    /// Check `root` against the manifest stored at `manifest`
    pub fn check(&self, root: &Path, manifest: &Path) -> Result<CheckReport, HashUtilityError> {
        info!("Checking directory structure");
        let reader = TarManifestReader::open(manifest)?;
        let root = walk::canonical_root(root)?;
        let exclude = vec![path_utils::absolute(manifest)];

        let report = self.check_against(&root, &reader, &exclude);
        info!("Check complete, located {} files", report.files_examined);
        Ok(report)
    }

    /// Check a tree against any manifest source; never modifies the source
    pub fn check_against<S: ManifestSource>(&self, root: &Path, source: &S, exclude: &[PathBuf]) -> CheckReport {
        let mut report = CheckReport::default();

        for (key, path) in walk::walk_files(root, exclude) {
            report.files_examined += 1;
            debug!("{}", path.display());
            if !source.is_file(&key) {
                warn!("Hash missing: {}", path.display());
                report.missing_hashes.push(key);
            }
        }

        for key in source.file_paths("") {
            let path = path_utils::resolve_in_root(root, key);
            debug!("{}", path.display());
            if !path.is_file() {
                error!("File not found: {}", path.display());
                report.missing_files.push(key.to_string());
            }
        }

        report
    }
}
