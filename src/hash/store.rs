// Manifest store module
// Path-keyed container mirroring the recorded directory tree
//
// Manifests are tar archives: directories are explicit directory entries and
// every regular file entry holds one serialized digest record. Writers stage
// the archive in a temporary file next to the target and move it into place
// only when the recording finished, so a manifest is either complete or absent.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use super::error::HashUtilityError;
use super::path_utils;

/// Write side of a manifest store
pub trait ManifestSink {
    /// Add a directory entry; parents are added as needed
    fn make_dir(&mut self, path: &str) -> Result<(), HashUtilityError>;

    /// Add a file entry holding `payload`; each path may be written once
    fn write_file(&mut self, path: &str, payload: &[u8]) -> Result<(), HashUtilityError>;
}

/// Read side of a manifest store
pub trait ManifestSource {
    fn is_file(&self, path: &str) -> bool;

    fn is_dir(&self, path: &str) -> bool;

    /// Full payload stored for a file entry
    fn read_file(&self, path: &str) -> Result<&[u8], HashUtilityError>;

    /// File paths under `prefix` (empty for all), in stable store order
    fn file_paths(&self, prefix: &str) -> Vec<&str>;
}

/// Directory and file entries held in memory, in insertion order
#[derive(Debug, Default)]
struct EntryTable {
    files: Vec<(String, Vec<u8>)>,
    file_index: HashMap<String, usize>,
    dirs: BTreeSet<String>,
}

impl EntryTable {
    fn insert_dir(&mut self, key: &str) -> Result<(), HashUtilityError> {
        if self.file_index.contains_key(key) {
            return Err(HashUtilityError::DuplicateEntry { path: key.to_string() });
        }
        for parent in path_utils::parent_keys(key) {
            self.dirs.insert(parent.to_string());
        }
        self.dirs.insert(key.to_string());
        Ok(())
    }

    fn insert_file(&mut self, key: String, payload: Vec<u8>) -> Result<(), HashUtilityError> {
        if self.file_index.contains_key(&key) || self.dirs.contains(&key) {
            return Err(HashUtilityError::DuplicateEntry { path: key });
        }
        for parent in path_utils::parent_keys(&key) {
            self.dirs.insert(parent.to_string());
        }
        self.file_index.insert(key.clone(), self.files.len());
        self.files.push((key, payload));
        Ok(())
    }

    fn read(&self, key: &str) -> Result<&[u8], HashUtilityError> {
        self.file_index
            .get(key)
            .map(|&i| self.files[i].1.as_slice())
            .ok_or_else(|| HashUtilityError::MissingEntry { path: key.to_string() })
    }

    fn file_paths(&self, prefix: &str) -> Vec<&str> {
        let prefix = path_utils::normalize_key(prefix);
        self.files
            .iter()
            .map(|(key, _)| key.as_str())
            .filter(|key| {
                prefix.is_empty()
                    || *key == prefix
                    || (key.starts_with(prefix.as_str()) && key[prefix.len()..].starts_with('/'))
            })
            .collect()
    }
}

/// Manifest store kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryManifest {
    table: EntryTable,
}

impl MemoryManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of file entries
    pub fn len(&self) -> usize {
        self.table.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.files.is_empty()
    }
}

impl ManifestSink for MemoryManifest {
    fn make_dir(&mut self, path: &str) -> Result<(), HashUtilityError> {
        let key = path_utils::normalize_key(path);
        if key.is_empty() {
            return Ok(());
        }
        self.table.insert_dir(&key)
    }

    fn write_file(&mut self, path: &str, payload: &[u8]) -> Result<(), HashUtilityError> {
        let key = file_key(path)?;
        self.table.insert_file(key, payload.to_vec())
    }
}

impl ManifestSource for MemoryManifest {
    fn is_file(&self, path: &str) -> bool {
        self.table.file_index.contains_key(&path_utils::normalize_key(path))
    }

    fn is_dir(&self, path: &str) -> bool {
        self.table.dirs.contains(&path_utils::normalize_key(path))
    }

    fn read_file(&self, path: &str) -> Result<&[u8], HashUtilityError> {
        self.table.read(&path_utils::normalize_key(path))
    }

    fn file_paths(&self, prefix: &str) -> Vec<&str> {
        self.table.file_paths(prefix)
    }
}

/// Write-once tar manifest
pub struct TarManifestWriter {
    target: PathBuf,
    staging_path: PathBuf,
    builder: tar::Builder<BufWriter<NamedTempFile>>,
    files: HashSet<String>,
    dirs: HashSet<String>,
}

impl TarManifestWriter {
    /// Start a new manifest at `target`, failing if anything already exists there
    pub fn create(target: &Path) -> Result<Self, HashUtilityError> {
        if target.symlink_metadata().is_ok() {
            return Err(HashUtilityError::ManifestExists {
                path: target.to_path_buf(),
            });
        }

        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let staging = tempfile::Builder::new()
            .prefix(".desiderata-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| HashUtilityError::ManifestIo {
                path: target.to_path_buf(),
                operation: "creating".to_string(),
                source: e,
            })?;
        let staging_path = path_utils::absolute(staging.path());
        debug!("Staging manifest {} in {}", target.display(), staging_path.display());

        Ok(Self {
            target: target.to_path_buf(),
            staging_path,
            builder: tar::Builder::new(BufWriter::new(staging)),
            files: HashSet::new(),
            dirs: HashSet::new(),
        })
    }

    /// Temporary file receiving the archive until `finish`
    pub fn staging_path(&self) -> &Path {
        &self.staging_path
    }

    /// Complete the archive and move it to the target path
    ///
    /// Dropping the writer without calling this discards the staged archive.
    pub fn finish(self) -> Result<PathBuf, HashUtilityError> {
        let target = self.target;
        let io_err = |e: io::Error| HashUtilityError::from_manifest_io(e, "finalizing", target.clone());

        let buffered = self.builder.into_inner().map_err(io_err)?;
        let staging = buffered.into_inner().map_err(|e| io_err(e.into_error()))?;
        staging.as_file().sync_all().map_err(io_err)?;
        staging.persist_noclobber(&target).map_err(|e| io_err(e.error))?;

        Ok(target)
    }

    fn ensure_parents(&mut self, key: &str) -> Result<(), HashUtilityError> {
        let parents: Vec<String> = path_utils::parent_keys(key).into_iter().map(str::to_string).collect();
        for parent in parents {
            self.append_dir(parent)?;
        }
        Ok(())
    }

    fn append_dir(&mut self, key: String) -> Result<(), HashUtilityError> {
        if self.files.contains(&key) {
            return Err(HashUtilityError::DuplicateEntry { path: key });
        }
        if self.dirs.contains(&key) {
            return Ok(());
        }

        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Directory);
        header.set_mode(0o755);
        header.set_size(0);
        header.set_mtime(0);
        self.builder
            .append_data(&mut header, format!("{}/", key), io::empty())
            .map_err(|e| HashUtilityError::from_manifest_io(e, "writing", self.target.clone()))?;

        self.dirs.insert(key);
        Ok(())
    }
}

impl ManifestSink for TarManifestWriter {
    fn make_dir(&mut self, path: &str) -> Result<(), HashUtilityError> {
        let key = path_utils::normalize_key(path);
        if key.is_empty() {
            return Ok(());
        }
        self.ensure_parents(&key)?;
        self.append_dir(key)
    }

    fn write_file(&mut self, path: &str, payload: &[u8]) -> Result<(), HashUtilityError> {
        let key = file_key(path)?;
        if self.files.contains(&key) || self.dirs.contains(&key) {
            return Err(HashUtilityError::DuplicateEntry { path: key });
        }
        self.ensure_parents(&key)?;

        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_mode(0o644);
        header.set_size(payload.len() as u64);
        header.set_mtime(0);
        self.builder
            .append_data(&mut header, &key, payload)
            .map_err(|e| HashUtilityError::from_manifest_io(e, "writing", self.target.clone()))?;

        self.files.insert(key);
        Ok(())
    }
}

/// Read-only view of a tar manifest, loaded once on open
#[derive(Debug)]
pub struct TarManifestReader {
    path: PathBuf,
    table: EntryTable,
}

impl TarManifestReader {
    pub fn open(path: &Path) -> Result<Self, HashUtilityError> {
        let io_err = |e: io::Error| HashUtilityError::from_manifest_io(e, "reading", path.to_path_buf());

        let file = File::open(path)
            .map_err(|e| HashUtilityError::from_manifest_io(e, "opening", path.to_path_buf()))?;
        let mut archive = tar::Archive::new(BufReader::new(file));
        let mut table = EntryTable::default();

        for entry in archive.entries().map_err(io_err)? {
            let mut entry = entry.map_err(io_err)?;
            let key = {
                let raw = entry.path().map_err(io_err)?;
                path_utils::normalize_key(&raw.to_string_lossy())
            };
            if key.is_empty() {
                continue;
            }

            let entry_type = entry.header().entry_type();
            if entry_type.is_dir() {
                table.insert_dir(&key)?;
            } else if entry_type.is_file() {
                let mut payload = Vec::with_capacity(entry.size() as usize);
                entry.read_to_end(&mut payload).map_err(io_err)?;
                table.insert_file(key, payload)?;
            } else {
                debug!("Skipping non-file manifest entry {}", key);
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            table,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of file entries
    pub fn len(&self) -> usize {
        self.table.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.files.is_empty()
    }
}

impl ManifestSource for TarManifestReader {
    fn is_file(&self, path: &str) -> bool {
        self.table.file_index.contains_key(&path_utils::normalize_key(path))
    }

    fn is_dir(&self, path: &str) -> bool {
        self.table.dirs.contains(&path_utils::normalize_key(path))
    }

    fn read_file(&self, path: &str) -> Result<&[u8], HashUtilityError> {
        self.table.read(&path_utils::normalize_key(path))
    }

    fn file_paths(&self, prefix: &str) -> Vec<&str> {
        self.table.file_paths(prefix)
    }
}

fn file_key(path: &str) -> Result<String, HashUtilityError> {
    let key = path_utils::normalize_key(path);
    if key.is_empty() {
        return Err(HashUtilityError::InvalidArguments {
            message: format!("{:?} is not a valid manifest file path", path),
        });
    }
    Ok(key)
}
