// Inverted index module
// Maps a digest signature (the full stored record text) to the paths sharing it

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::HashUtilityError;
use super::store::{ManifestSource, TarManifestReader};

/// Signature -> paths, keys sorted so artifacts are reproducible
///
/// Path order within a signature follows manifest enumeration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvertedIndex {
    entries: BTreeMap<String, Vec<String>>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` to the list kept for `signature`
    pub fn insert(&mut self, signature: impl Into<String>, path: impl Into<String>) {
        self.entries.entry(signature.into()).or_default().push(path.into());
    }

    pub fn get(&self, signature: &str) -> Option<&[String]> {
        self.entries.get(signature).map(Vec::as_slice)
    }

    pub fn contains(&self, signature: &str) -> bool {
        self.entries.contains_key(signature)
    }

    /// Number of unique signatures
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of paths across all signatures
    pub fn file_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Read a JSON index artifact
    pub fn load(path: &Path) -> Result<Self, HashUtilityError> {
        let file = File::open(path).map_err(|e| HashUtilityError::IndexIo {
            path: path.to_path_buf(),
            operation: "opening".to_string(),
            source: e,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| HashUtilityError::IndexParse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Write the index as JSON with four-space indentation
    pub fn save(&self, path: &Path) -> Result<(), HashUtilityError> {
        let io_err = |operation: &str, e: std::io::Error| HashUtilityError::IndexIo {
            path: path.to_path_buf(),
            operation: operation.to_string(),
            source: e,
        };

        let file = File::create(path).map_err(|e| io_err("creating", e))?;
        let mut writer = BufWriter::new(file);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
        self.serialize(&mut serializer)
            .map_err(|e| io_err("writing", e.into()))?;
        writer.write_all(b"\n").map_err(|e| io_err("writing", e))?;
        writer.flush().map_err(|e| io_err("flushing", e))
    }
}

impl FromIterator<(String, Vec<String>)> for InvertedIndex {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        let mut index = InvertedIndex::new();
        for (signature, paths) in iter {
            index.entries.entry(signature).or_default().extend(paths);
        }
        index
    }
}

/// Engine converting manifests into inverted indices
#[derive(Debug, Default)]
pub struct IndexEngine;

impl IndexEngine {
    pub fn new() -> Self {
        Self
    }

    /// Build the index for every file entry of a manifest source
    pub fn build_index<S: ManifestSource>(&self, source: &S) -> Result<InvertedIndex, HashUtilityError> {
        let mut index = InvertedIndex::new();
        let mut count = 0;

        for key in source.file_paths("") {
            let payload = source.read_file(key)?;
            let signature = std::str::from_utf8(payload).map_err(|_| HashUtilityError::CorruptRecord {
                path: key.to_string(),
                line: 0,
                reason: "record is not valid UTF-8".to_string(),
            })?;
            index.insert(signature, key);
            count += 1;
        }

        info!("{} files with {} unique hashes found in index", count, index.len());
        Ok(index)
    }

    /// Convert the manifest at `manifest` and write the JSON artifact to `outfile`
    pub fn convert(&self, manifest: &Path, outfile: &Path) -> Result<InvertedIndex, HashUtilityError> {
        info!("Converting manifest {} to hashmap", manifest.display());
        let reader = TarManifestReader::open(manifest)?;
        let index = self.build_index(&reader)?;

        info!("Writing results to {}", outfile.display());
        index.save(outfile)?;
        Ok(index)
    }
}
