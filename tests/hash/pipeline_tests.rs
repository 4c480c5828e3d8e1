// Tests for the digest pipeline
// Sequential and parallel modes must agree for every input

use std::io::{self, Cursor, Read};

use proptest::prelude::*;

use desiderata::hash::{Algorithm, DigestPipeline, HashUtilityError, PipelineMode};

fn pipeline(mode: PipelineMode) -> DigestPipeline {
    DigestPipeline::new(vec![Algorithm::Md5, Algorithm::Sha1, Algorithm::Sha512])
        .unwrap()
        .with_mode(mode)
}

/// Yields `good` bytes in small pieces, then fails
struct FailingReader {
    good: usize,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.good == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "disk went away"));
        }
        let n = buf.len().min(self.good).min(3);
        buf[..n].fill(b'z');
        self.good -= n;
        Ok(n)
    }
}

/// Returns EINTR once before every successful read
struct InterruptingReader {
    inner: Cursor<Vec<u8>>,
    interrupt_next: bool,
}

impl Read for InterruptingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.interrupt_next = !self.interrupt_next;
        if self.interrupt_next {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
        }
        self.inner.read(buf)
    }
}

#[test]
fn test_known_digests_in_both_modes() {
    for mode in [PipelineMode::Sequential, PipelineMode::Parallel] {
        let digests = pipeline(mode).digest_reader(Cursor::new(b"abc".to_vec())).unwrap();
        assert_eq!(digests.len(), 3);
        assert_eq!(digests[0].algorithm, Algorithm::Md5);
        assert_eq!(digests[0].hex, "900150983cd24fb0d6963f7d28e17f72");
        assert_eq!(digests[1].algorithm, Algorithm::Sha1);
        assert_eq!(digests[1].hex, "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert_eq!(digests[2].algorithm, Algorithm::Sha512);
    }
}

#[test]
fn test_empty_input() {
    let sequential = pipeline(PipelineMode::Sequential).digest_reader(io::empty()).unwrap();
    let parallel = pipeline(PipelineMode::Parallel).digest_reader(io::empty()).unwrap();
    assert_eq!(sequential, parallel);
    assert_eq!(parallel[0].hex, "d41d8cd98f00b204e9800998ecf8427e");
    assert_eq!(parallel[1].hex, "da39a3ee5e6b4b0d3255bfef95601890afd80709");
}

#[test]
fn test_many_blocks_through_tiny_queues() {
    let data: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
    let reference = pipeline(PipelineMode::Sequential)
        .digest_reader(Cursor::new(data.clone()))
        .unwrap();

    let parallel = pipeline(PipelineMode::Parallel)
        .with_block_size(7)
        .with_queue_capacity(1)
        .digest_reader(Cursor::new(data))
        .unwrap();
    assert_eq!(parallel, reference);
}

#[test]
fn test_results_follow_algorithm_order() {
    let pipeline = DigestPipeline::new(vec![Algorithm::Blake3, Algorithm::Md5, Algorithm::Sha256]).unwrap();
    let digests = pipeline.digest_reader(Cursor::new(b"order".to_vec())).unwrap();
    let order: Vec<Algorithm> = digests.iter().map(|d| d.algorithm).collect();
    assert_eq!(order, vec![Algorithm::Blake3, Algorithm::Md5, Algorithm::Sha256]);
}

#[test]
fn test_read_failure_aborts_both_modes() {
    for mode in [PipelineMode::Sequential, PipelineMode::Parallel] {
        let result = pipeline(mode)
            .with_block_size(4)
            .with_queue_capacity(1)
            .digest_reader(FailingReader { good: 100 });
        let err = result.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other, "{:?}", mode);
    }
}

#[test]
fn test_interrupted_reads_are_retried() {
    let data = b"interrupted but complete".to_vec();
    let expected = pipeline(PipelineMode::Sequential)
        .digest_reader(Cursor::new(data.clone()))
        .unwrap();

    for mode in [PipelineMode::Sequential, PipelineMode::Parallel] {
        let reader = InterruptingReader {
            inner: Cursor::new(data.clone()),
            interrupt_next: false,
        };
        let digests = pipeline(mode).with_block_size(5).digest_reader(reader).unwrap();
        assert_eq!(digests, expected);
    }
}

#[test]
fn test_digest_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let err = DigestPipeline::default()
        .digest_file(&dir.path().join("absent.bin"))
        .unwrap_err();
    assert!(matches!(err, HashUtilityError::FileNotFound { .. }));
    assert!(err.is_per_file());
}

#[test]
fn test_digest_file_matches_reader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.bin");
    std::fs::write(&path, b"abc").unwrap();

    let from_file = DigestPipeline::default().digest_file(&path).unwrap();
    let from_reader = DigestPipeline::default().digest_reader(Cursor::new(b"abc".to_vec())).unwrap();
    assert_eq!(from_file, from_reader);
}

#[test]
fn test_invalid_algorithm_sets() {
    assert!(matches!(
        DigestPipeline::new(Vec::new()),
        Err(HashUtilityError::InvalidConfig { .. })
    ));
    assert!(matches!(
        DigestPipeline::new(vec![Algorithm::Sha1, Algorithm::Sha1]),
        Err(HashUtilityError::InvalidConfig { .. })
    ));
}

#[test]
fn test_zero_sizes_are_clamped() {
    let pipeline = DigestPipeline::default().with_block_size(0).with_queue_capacity(0);
    assert_eq!(pipeline.block_size(), 1);
    assert_eq!(pipeline.queue_capacity(), 1);
    let digests = pipeline.digest_reader(Cursor::new(b"abc".to_vec())).unwrap();
    assert_eq!(digests[0].hex, "900150983cd24fb0d6963f7d28e17f72");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_parallel_matches_sequential(
        data in proptest::collection::vec(any::<u8>(), 0..20_000),
        block_size in 1usize..4096,
        queue_capacity in 1usize..4,
    ) {
        let algorithms = vec![Algorithm::Md5, Algorithm::Sha256, Algorithm::Blake2b, Algorithm::Blake3];
        let sequential = DigestPipeline::new(algorithms.clone())
            .unwrap()
            .with_mode(PipelineMode::Sequential)
            .with_block_size(block_size)
            .digest_reader(Cursor::new(data.clone()))
            .unwrap();
        let parallel = DigestPipeline::new(algorithms)
            .unwrap()
            .with_mode(PipelineMode::Parallel)
            .with_block_size(block_size)
            .with_queue_capacity(queue_capacity)
            .digest_reader(Cursor::new(data))
            .unwrap();
        prop_assert_eq!(sequential, parallel);
    }
}
