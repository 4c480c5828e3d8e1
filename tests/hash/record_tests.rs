// Tests for manifest record text

use desiderata::hash::record::digests_to_text;
use desiderata::hash::{Algorithm, AlgorithmDigest, HashUtilityError, ManifestRecord};

use crate::{MD5_A, MD5_B};

const SHA1_A: &str = "86f7e437faa5a7fce15d1ddcb9eaeaea377667b8";

#[test]
fn test_record_text_layout() {
    let record = ManifestRecord::new(
        "dir/a.txt",
        vec![
            AlgorithmDigest::new(Algorithm::Md5, MD5_A),
            AlgorithmDigest::new(Algorithm::Sha1, SHA1_A),
        ],
    );
    assert_eq!(record.to_text(), format!("md5 {}\nsha1 {}\n", MD5_A, SHA1_A));
    assert_eq!(record.to_text(), digests_to_text(&record.digests));
}

#[test]
fn test_parse_recovers_record() {
    let text = format!("md5 {}\nsha1 {}\n", MD5_A, SHA1_A);
    let record = ManifestRecord::parse("a.txt", &text).unwrap();
    assert_eq!(record.path, "a.txt");
    assert_eq!(record.digests.len(), 2);
    assert_eq!(record.digests[1].algorithm, Algorithm::Sha1);
    assert_eq!(record.to_text(), text);
}

#[test]
fn test_parse_rejects_malformed_lines() {
    let cases = [
        format!("md5{}\n", MD5_A),
        format!("crc32 {}\n", MD5_A),
        "md5 0cc175b9\n".to_string(),
        format!("md5 {}\n", MD5_A.to_uppercase()),
        format!("md5 {}\nmd5 {}\n", MD5_A, MD5_B),
    ];

    for text in &cases {
        let err = ManifestRecord::parse("a.txt", text).unwrap_err();
        assert!(
            matches!(err, HashUtilityError::CorruptRecord { .. }),
            "{:?} should be corrupt, got {:?}",
            text,
            err
        );
    }
}

#[test]
fn test_parse_reports_line_number() {
    let text = format!("md5 {}\nsha1 nothex\n", MD5_A);
    match ManifestRecord::parse("a.txt", &text).unwrap_err() {
        HashUtilityError::CorruptRecord { path, line, .. } => {
            assert_eq!(path, "a.txt");
            assert_eq!(line, 2);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_parse_empty_record() {
    match ManifestRecord::parse("empty", "").unwrap_err() {
        HashUtilityError::CorruptRecord { line, .. } => assert_eq!(line, 0),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_diverging_algorithms() {
    let stored = ManifestRecord::new(
        "a",
        vec![
            AlgorithmDigest::new(Algorithm::Md5, MD5_A),
            AlgorithmDigest::new(Algorithm::Sha1, SHA1_A),
        ],
    );
    let same = stored.clone();
    assert!(stored.diverging_algorithms(&same).is_empty());

    let changed = ManifestRecord::new(
        "a",
        vec![
            AlgorithmDigest::new(Algorithm::Md5, MD5_B),
            AlgorithmDigest::new(Algorithm::Sha1, SHA1_A),
        ],
    );
    assert_eq!(stored.diverging_algorithms(&changed), vec![Algorithm::Md5]);

    let other_set = ManifestRecord::new("a", vec![AlgorithmDigest::new(Algorithm::Md5, MD5_A)]);
    assert_eq!(stored.diverging_algorithms(&other_set), vec![Algorithm::Sha1]);
    assert_eq!(other_set.diverging_algorithms(&stored), vec![Algorithm::Sha1]);
}
