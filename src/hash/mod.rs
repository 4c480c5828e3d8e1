// Manifest core library
// Digest pipeline, manifest store, and the record/check/verify/index engines

pub mod algorithm;
pub mod check;
pub mod compare;
pub mod error;
pub mod index;
pub mod path_utils;
pub mod pipeline;
pub mod record;
pub mod scan;
pub mod store;
pub mod verify;
pub mod walk;

// Re-export commonly used types for convenience
pub use algorithm::{Algorithm, Hasher, DEFAULT_ALGORITHMS};
pub use check::{CheckEngine, CheckReport};
pub use compare::{find_duplicates, find_unmatched, DedupEngine, UnmatchedEngine};
pub use error::HashUtilityError;
pub use index::{IndexEngine, InvertedIndex};
pub use pipeline::{DigestPipeline, PipelineMode, DEFAULT_BLOCK_SIZE, DEFAULT_QUEUE_CAPACITY};
pub use record::{AlgorithmDigest, ManifestRecord};
pub use scan::{RecordEngine, RecordStats};
pub use store::{ManifestSink, ManifestSource, MemoryManifest, TarManifestReader, TarManifestWriter};
pub use verify::{Mismatch, VerifyEngine, VerifyReport};
