// Tests for the algorithm registry

use std::str::FromStr;

use desiderata::hash::algorithm::{parse_algorithm_list, validate_algorithm_set};
use desiderata::hash::{Algorithm, HashUtilityError, DEFAULT_ALGORITHMS};

fn hex_of(algorithm: Algorithm, data: &[u8]) -> String {
    let mut hasher = algorithm.hasher();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[test]
fn test_known_answer_vectors() {
    assert_eq!(hex_of(Algorithm::Md5, b"abc"), "900150983cd24fb0d6963f7d28e17f72");
    assert_eq!(hex_of(Algorithm::Sha1, b"abc"), "a9993e364706816aba3e25717850c26c9cd0d89d");
    assert_eq!(
        hex_of(Algorithm::Sha256, b"hello world"),
        "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
    );
    assert_eq!(
        hex_of(Algorithm::Sha512, b"abc"),
        "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
    );
    assert_eq!(
        hex_of(Algorithm::Blake3, b""),
        "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
    );
}

#[test]
fn test_split_updates_match_single_update() {
    for &algorithm in Algorithm::list() {
        let mut split = algorithm.hasher();
        split.update(b"hello ");
        split.update(b"world");
        assert_eq!(hex::encode(split.finalize()), hex_of(algorithm, b"hello world"), "{}", algorithm);
    }
}

#[test]
fn test_output_sizes_match_digests() {
    for &algorithm in Algorithm::list() {
        assert_eq!(hex_of(algorithm, b"x").len(), algorithm.hex_len(), "{}", algorithm);
    }
}

#[test]
fn test_names_parse_back() {
    for &algorithm in Algorithm::list() {
        assert_eq!(Algorithm::from_str(algorithm.name()).unwrap(), algorithm);
    }
    assert_eq!(Algorithm::from_str("SHA-256").unwrap(), Algorithm::Sha256);
    assert_eq!(Algorithm::from_str(" Blake2b-512 ").unwrap(), Algorithm::Blake2b);
}

#[test]
fn test_unknown_algorithm() {
    let err = Algorithm::from_str("crc32").unwrap_err();
    assert!(matches!(err, HashUtilityError::UnsupportedAlgorithm { ref algorithm } if algorithm == "crc32"));
}

#[test]
fn test_default_set_is_md5_sha1_sha512() {
    assert_eq!(DEFAULT_ALGORITHMS, [Algorithm::Md5, Algorithm::Sha1, Algorithm::Sha512]);
}

#[test]
fn test_parse_algorithm_list() {
    assert_eq!(
        parse_algorithm_list("sha512, md5").unwrap(),
        vec![Algorithm::Sha512, Algorithm::Md5]
    );
    assert!(matches!(
        parse_algorithm_list("md5,md5"),
        Err(HashUtilityError::InvalidConfig { .. })
    ));
    assert!(matches!(parse_algorithm_list(""), Err(HashUtilityError::InvalidConfig { .. })));
    assert!(validate_algorithm_set(&[Algorithm::Sha1, Algorithm::Blake3]).is_ok());
}

#[test]
fn test_serde_uses_canonical_names() {
    let json = serde_json::to_string(&vec![Algorithm::Sha3_256, Algorithm::Md5]).unwrap();
    assert_eq!(json, r#"["sha3-256","md5"]"#);
    let back: Vec<Algorithm> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, vec![Algorithm::Sha3_256, Algorithm::Md5]);
}
