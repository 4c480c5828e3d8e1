// Compare engine module
// Duplicate and unmatched-content searches over inverted indices

use std::path::Path;

use tracing::{info, warn};

use super::error::HashUtilityError;
use super::index::InvertedIndex;

/// Signatures shared by more than one path
pub fn find_duplicates(index: &InvertedIndex) -> InvertedIndex {
    index
        .iter()
        .filter(|(_, paths)| paths.len() > 1)
        .map(|(signature, paths)| (signature.to_string(), paths.to_vec()))
        .collect()
}

/// Entries of `target` whose signature never occurs in `reference`
///
/// Only the target is checked against the reference, not the reverse.
pub fn find_unmatched(reference: &InvertedIndex, target: &InvertedIndex) -> InvertedIndex {
    target
        .iter()
        .filter(|(signature, _)| !reference.contains(signature))
        .map(|(signature, paths)| (signature.to_string(), paths.to_vec()))
        .collect()
}

/// Paths that could be removed while keeping one copy of every signature
pub fn redundant_files(duplicates: &InvertedIndex) -> usize {
    duplicates.iter().map(|(_, paths)| paths.len().saturating_sub(1)).sum()
}

/// Engine listing duplicated content in an index artifact
#[derive(Debug, Default)]
pub struct DedupEngine;

impl DedupEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, reference: &Path, outfile: &Path) -> Result<InvertedIndex, HashUtilityError> {
        info!("Searching for duplicated files in {}", reference.display());
        let index = InvertedIndex::load(reference)?;

        let duplicates = find_duplicates(&index);
        info!(
            "{} hashes with multiple files found out of {} in reference ({} redundant files)",
            duplicates.len(),
            index.len(),
            redundant_files(&duplicates)
        );

        info!("Writing results to {}", outfile.display());
        duplicates.save(outfile)?;
        Ok(duplicates)
    }
}

/// Engine listing target content absent from a reference index
#[derive(Debug, Default)]
pub struct UnmatchedEngine;

impl UnmatchedEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, reference: &Path, target: &Path, outfile: &Path) -> Result<InvertedIndex, HashUtilityError> {
        info!(
            "Searching for files in {} not in reference {}",
            target.display(),
            reference.display()
        );
        let reference_index = InvertedIndex::load(reference)?;
        let target_index = InvertedIndex::load(target)?;
        info!(
            "Reference has {} hashes, target has {}",
            reference_index.len(),
            target_index.len()
        );

        let unmatched = find_unmatched(&reference_index, &target_index);
        if unmatched.is_empty() {
            info!("All hashes in target were found in reference");
        } else {
            warn!("{} hashes were not matched in reference", unmatched.len());
        }

        info!("Writing results to {}", outfile.display());
        unmatched.save(outfile)?;
        Ok(unmatched)
    }
}
