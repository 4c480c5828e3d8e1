// Hash algorithm registry
// The algorithm menu is fixed at build time; a run picks an ordered subset

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::Digest;

use super::error::HashUtilityError;

/// Trait for hash accumulators
pub trait Hasher: Send {
    /// Feed the next block of the stream
    fn update(&mut self, data: &[u8]);

    /// Consume the accumulator and return the raw digest
    fn finalize(self: Box<Self>) -> Vec<u8>;
}

/// Adapter for every RustCrypto `Digest` implementation
struct DigestHasher<D>(D);

impl<D: Digest + Send> Hasher for DigestHasher<D> {
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().to_vec()
    }
}

struct Blake3Hasher(blake3::Hasher);

impl Hasher for Blake3Hasher {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().as_bytes().to_vec()
    }
}

/// A named digest algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Algorithm {
    #[serde(rename = "md5")]
    Md5,
    #[serde(rename = "sha1")]
    Sha1,
    #[serde(rename = "sha256")]
    Sha256,
    #[serde(rename = "sha512")]
    Sha512,
    #[serde(rename = "sha3-256")]
    Sha3_256,
    #[serde(rename = "blake2b")]
    Blake2b,
    #[serde(rename = "blake3")]
    Blake3,
}

/// md5, sha1 and sha512: increasing strength, decreasing speed
pub const DEFAULT_ALGORITHMS: [Algorithm; 3] = [Algorithm::Md5, Algorithm::Sha1, Algorithm::Sha512];

impl Algorithm {
    /// Every algorithm this build can compute
    pub fn list() -> &'static [Algorithm] {
        &[
            Algorithm::Md5,
            Algorithm::Sha1,
            Algorithm::Sha256,
            Algorithm::Sha512,
            Algorithm::Sha3_256,
            Algorithm::Blake2b,
            Algorithm::Blake3,
        ]
    }

    /// Canonical name, as written into manifest records
    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Md5 => "md5",
            Algorithm::Sha1 => "sha1",
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha512 => "sha512",
            Algorithm::Sha3_256 => "sha3-256",
            Algorithm::Blake2b => "blake2b",
            Algorithm::Blake3 => "blake3",
        }
    }

    /// Digest size in bytes
    pub fn output_size(self) -> usize {
        match self {
            Algorithm::Md5 => 16,
            Algorithm::Sha1 => 20,
            Algorithm::Sha256 | Algorithm::Sha3_256 | Algorithm::Blake3 => 32,
            Algorithm::Sha512 | Algorithm::Blake2b => 64,
        }
    }

    /// Length of the lowercase hex form
    pub fn hex_len(self) -> usize {
        self.output_size() * 2
    }

    /// Fresh accumulator for this algorithm
    pub fn hasher(self) -> Box<dyn Hasher> {
        match self {
            Algorithm::Md5 => Box::new(DigestHasher(md5::Md5::new())),
            Algorithm::Sha1 => Box::new(DigestHasher(sha1::Sha1::new())),
            Algorithm::Sha256 => Box::new(DigestHasher(sha2::Sha256::new())),
            Algorithm::Sha512 => Box::new(DigestHasher(sha2::Sha512::new())),
            Algorithm::Sha3_256 => Box::new(DigestHasher(sha3::Sha3_256::new())),
            Algorithm::Blake2b => Box::new(DigestHasher(blake2::Blake2b512::new())),
            Algorithm::Blake3 => Box::new(Blake3Hasher(blake3::Hasher::new())),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = HashUtilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "md5" => Ok(Algorithm::Md5),
            "sha1" | "sha-1" => Ok(Algorithm::Sha1),
            "sha256" | "sha-256" => Ok(Algorithm::Sha256),
            "sha512" | "sha-512" => Ok(Algorithm::Sha512),
            "sha3-256" | "sha3_256" => Ok(Algorithm::Sha3_256),
            "blake2b" | "blake2b-512" => Ok(Algorithm::Blake2b),
            "blake3" => Ok(Algorithm::Blake3),
            _ => Err(HashUtilityError::UnsupportedAlgorithm {
                algorithm: s.to_string(),
            }),
        }
    }
}

/// Parse a comma separated list such as `md5,sha1,sha512`
pub fn parse_algorithm_list(list: &str) -> Result<Vec<Algorithm>, HashUtilityError> {
    let algorithms = list
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(Algorithm::from_str)
        .collect::<Result<Vec<_>, _>>()?;
    validate_algorithm_set(&algorithms)?;
    Ok(algorithms)
}

/// An algorithm set must be non-empty and free of duplicates
pub fn validate_algorithm_set(algorithms: &[Algorithm]) -> Result<(), HashUtilityError> {
    if algorithms.is_empty() {
        return Err(HashUtilityError::InvalidConfig {
            reason: "at least one hash algorithm is required".to_string(),
        });
    }
    for (i, algorithm) in algorithms.iter().enumerate() {
        if algorithms[..i].contains(algorithm) {
            return Err(HashUtilityError::InvalidConfig {
                reason: format!("hash algorithm {} listed more than once", algorithm),
            });
        }
    }
    Ok(())
}
