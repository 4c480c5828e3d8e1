// Manifest record module
// One path's digests and the text form stored in the manifest

use serde::Serialize;

use super::algorithm::Algorithm;
use super::error::HashUtilityError;

/// Hex digest produced by one algorithm
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlgorithmDigest {
    pub algorithm: Algorithm,
    pub hex: String,
}

impl AlgorithmDigest {
    pub fn new(algorithm: Algorithm, hex: impl Into<String>) -> Self {
        Self {
            algorithm,
            hex: hex.into(),
        }
    }
}

/// Serialize digests as `<algo> <hex>\n` lines, in the given order
///
/// This text is the stored payload and also the comparison key used by
/// verification and the inverted index.
pub fn digests_to_text(digests: &[AlgorithmDigest]) -> String {
    let mut text = String::with_capacity(digests.iter().map(|d| d.hex.len() + 10).sum());
    for digest in digests {
        text.push_str(digest.algorithm.name());
        text.push(' ');
        text.push_str(&digest.hex);
        text.push('\n');
    }
    text
}

/// In-memory form of one manifest entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestRecord {
    /// Normalized relative path, `/` separated
    pub path: String,
    pub digests: Vec<AlgorithmDigest>,
}

impl ManifestRecord {
    pub fn new(path: impl Into<String>, digests: Vec<AlgorithmDigest>) -> Self {
        Self {
            path: path.into(),
            digests,
        }
    }

    pub fn to_text(&self) -> String {
        digests_to_text(&self.digests)
    }

    /// Parse a stored payload back into a record
    ///
    /// Every line must name a known algorithm followed by a lowercase hex
    /// digest of exactly that algorithm's length; an algorithm may appear once.
    pub fn parse(path: &str, text: &str) -> Result<Self, HashUtilityError> {
        let corrupt = |line: usize, reason: String| HashUtilityError::CorruptRecord {
            path: path.to_string(),
            line,
            reason,
        };

        let mut digests: Vec<AlgorithmDigest> = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let line_num = index + 1;
            let (name, hex) = line
                .split_once(' ')
                .ok_or_else(|| corrupt(line_num, format!("expected '<algorithm> <hex>', got {:?}", line)))?;

            let algorithm: Algorithm = name
                .parse()
                .map_err(|_| corrupt(line_num, format!("unknown algorithm {:?}", name)))?;

            if hex.len() != algorithm.hex_len() {
                return Err(corrupt(
                    line_num,
                    format!("{} digest must be {} hex characters, got {}", algorithm, algorithm.hex_len(), hex.len()),
                ));
            }
            if !hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
                return Err(corrupt(line_num, format!("{} digest is not lowercase hex", algorithm)));
            }
            if digests.iter().any(|d| d.algorithm == algorithm) {
                return Err(corrupt(line_num, format!("{} listed more than once", algorithm)));
            }

            digests.push(AlgorithmDigest::new(algorithm, hex));
        }

        if digests.is_empty() {
            return Err(corrupt(0, "record holds no digests".to_string()));
        }

        Ok(Self::new(path, digests))
    }

    /// Algorithms whose digests differ between two records
    ///
    /// An algorithm present in only one of the records counts as diverging.
    pub fn diverging_algorithms(&self, other: &ManifestRecord) -> Vec<Algorithm> {
        let mut diverging: Vec<Algorithm> = self
            .digests
            .iter()
            .filter(|mine| {
                other
                    .digests
                    .iter()
                    .find(|theirs| theirs.algorithm == mine.algorithm)
                    .map_or(true, |theirs| theirs.hex != mine.hex)
            })
            .map(|d| d.algorithm)
            .collect();

        diverging.extend(
            other
                .digests
                .iter()
                .filter(|theirs| !self.digests.iter().any(|mine| mine.algorithm == theirs.algorithm))
                .map(|d| d.algorithm),
        );
        diverging
    }
}
