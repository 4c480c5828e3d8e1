// Centralized error handling module
// Every engine reports through HashUtilityError; per-file variants are
// recovered by the engines, manifest and argument variants abort the run

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for manifest operations
#[derive(Debug, Error)]
pub enum HashUtilityError {
    /// File system errors with context
    #[error("File not found: {}\nSuggestion: Check that the file path is correct and the file exists", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Directory not found: {}\nSuggestion: Check that the directory path is correct and the directory exists", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied while {operation} file: {}\nSuggestion: Check file permissions or run with appropriate privileges", path.display())]
    PermissionDenied { path: PathBuf, operation: String },

    #[error("Failed while {operation} file {}: {source}", path.display())]
    ReadFailure {
        path: PathBuf,
        operation: String,
        #[source]
        source: io::Error,
    },

    /// Hash computation errors
    #[error("Unsupported hash algorithm: {algorithm}\nSuggestion: Choose one of md5, sha1, sha256, sha512, sha3-256, blake2b, blake3")]
    UnsupportedAlgorithm { algorithm: String },

    /// Manifest store errors
    #[error("Output file already exists: {}\nSuggestion: Manifests are write-once, choose a new output path", path.display())]
    ManifestExists { path: PathBuf },

    #[error("Manifest not found: {}\nSuggestion: Create a manifest first using the 'record' command", path.display())]
    ManifestNotFound { path: PathBuf },

    #[error("I/O error while {operation} manifest {}: {source}", path.display())]
    ManifestIo {
        path: PathBuf,
        operation: String,
        #[source]
        source: io::Error,
    },

    #[error("Manifest already holds an entry for {path}")]
    DuplicateEntry { path: String },

    #[error("Manifest has no file entry for {path}")]
    MissingEntry { path: String },

    #[error("Corrupt digest record for {path} at line {line}: {reason}")]
    CorruptRecord { path: String, line: usize, reason: String },

    /// Inverted index artifact errors
    #[error("I/O error while {operation} index {}: {source}", path.display())]
    IndexIo {
        path: PathBuf,
        operation: String,
        #[source]
        source: io::Error,
    },

    #[error("Error parsing index {}: {source}\nSuggestion: Pass an index produced by the 'convert' command", path.display())]
    IndexParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration and CLI errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Invalid arguments: {message}\nSuggestion: Run with --help to see usage information")]
    InvalidArguments { message: String },
}

impl HashUtilityError {
    /// Build a file-level error, picking a specific variant from the io::ErrorKind
    pub fn from_io_error(err: io::Error, operation: &str, path: PathBuf) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => HashUtilityError::FileNotFound { path },
            io::ErrorKind::PermissionDenied => HashUtilityError::PermissionDenied {
                path,
                operation: operation.to_string(),
            },
            _ => HashUtilityError::ReadFailure {
                path,
                operation: operation.to_string(),
                source: err,
            },
        }
    }

    /// Build a manifest store error; a missing manifest gets its own variant
    pub fn from_manifest_io(err: io::Error, operation: &str, path: PathBuf) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => HashUtilityError::ManifestNotFound { path },
            io::ErrorKind::AlreadyExists => HashUtilityError::ManifestExists { path },
            _ => HashUtilityError::ManifestIo {
                path,
                operation: operation.to_string(),
                source: err,
            },
        }
    }

    /// Bad arguments, configuration or algorithm names, caught before any I/O
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            HashUtilityError::InvalidArguments { .. }
                | HashUtilityError::InvalidConfig { .. }
                | HashUtilityError::UnsupportedAlgorithm { .. }
        )
    }

    /// True for problems local to a single tree file, which never abort a traversal
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            HashUtilityError::FileNotFound { .. }
                | HashUtilityError::PermissionDenied { .. }
                | HashUtilityError::ReadFailure { .. }
        )
    }
}
