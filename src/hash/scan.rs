// Recording module
// Walks a directory tree and writes one digest record per regular file

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use super::error::HashUtilityError;
use super::path_utils;
use super::pipeline::DigestPipeline;
use super::record::ManifestRecord;
use super::store::{ManifestSink, TarManifestWriter};
use super::walk::{self, TreeEntry};

/// Statistics collected while recording a tree
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RecordStats {
    pub files_hashed: usize,
    pub files_failed: usize,
    pub directories: usize,
    pub total_bytes: u64,
    #[serde(serialize_with = "serialize_duration")]
    pub duration: Duration,
}

// Helper function to serialize Duration as seconds
fn serialize_duration<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Engine producing write-once manifests
pub struct RecordEngine {
    pipeline: DigestPipeline,
    show_progress: bool,
}

impl RecordEngine {
    pub fn new(pipeline: DigestPipeline) -> Self {
        Self {
            pipeline,
            show_progress: false,
        }
    }

    /// Show a spinner with the running file count
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Record every file below `root` into a new manifest at `manifest`
    ///
    /// Fails before touching anything if `manifest` already exists. The
    /// manifest only appears once the whole tree has been recorded.
    pub fn record(&self, root: &Path, manifest: &Path) -> Result<RecordStats, HashUtilityError> {
        info!("Recording all hashes");
        if manifest.symlink_metadata().is_ok() {
            return Err(HashUtilityError::ManifestExists {
                path: manifest.to_path_buf(),
            });
        }

        let root = walk::canonical_root(root)?;
        let mut writer = TarManifestWriter::create(manifest)?;
        let exclude = vec![writer.staging_path().to_path_buf(), path_utils::absolute(manifest)];

        let stats = self.record_into(&root, &mut writer, &exclude)?;
        let written = writer.finish()?;

        info!("Recording complete, hashed {} files", stats.files_hashed);
        if stats.files_failed > 0 {
            warn!("{} files could not be read and were not recorded", stats.files_failed);
        }
        debug!("Manifest written to {}", written.display());
        Ok(stats)
    }

    /// Record a tree into any manifest sink
    ///
    /// Unreadable files and paths whose key is already taken are logged and
    /// skipped; any other sink error aborts.
    pub fn record_into<S: ManifestSink>(
        &self,
        root: &Path,
        sink: &mut S,
        exclude: &[PathBuf],
    ) -> Result<RecordStats, HashUtilityError> {
        let start_time = Instant::now();
        let pb = self.progress_bar();
        let mut stats = RecordStats::default();

        for entry in walk::walk_tree(root, exclude) {
            match entry {
                TreeEntry::Dir { key } => match sink.make_dir(&key) {
                    Ok(()) => stats.directories += 1,
                    Err(HashUtilityError::DuplicateEntry { path }) => {
                        warn!("Skipping directory {}: key {} is already taken", key, path);
                    }
                    Err(e) => return Err(e),
                },
                TreeEntry::File { key, path } => {
                    debug!("{}: {}", path.display(), key);
                    let digests = match self.pipeline.digest_file(&path) {
                        Ok(digests) => digests,
                        Err(e) if e.is_per_file() => {
                            warn!("Skipping {}: {}", path.display(), e);
                            stats.files_failed += 1;
                            pb.inc(1);
                            continue;
                        }
                        Err(e) => return Err(e),
                    };

                    let record = ManifestRecord::new(key, digests);
                    match sink.write_file(&record.path, record.to_text().as_bytes()) {
                        Ok(()) => {
                            stats.files_hashed += 1;
                            stats.total_bytes += fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
                        }
                        // Two names can share a key after lossy conversion
                        Err(HashUtilityError::DuplicateEntry { path: taken }) => {
                            warn!("Skipping {}: key {} is already taken", path.display(), taken);
                            stats.files_failed += 1;
                        }
                        Err(e) => return Err(e),
                    }
                    pb.inc(1);
                }
            }
        }

        pb.finish_and_clear();
        stats.duration = start_time.elapsed();
        Ok(stats)
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} [{elapsed_precise}] {pos} files hashed") {
            pb.set_style(style);
        }
        pb
    }
}

impl Default for RecordEngine {
    fn default() -> Self {
        Self::new(DigestPipeline::default())
    }
}
