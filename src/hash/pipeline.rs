// Digest pipeline module
// Streams a byte source once and feeds every configured algorithm
//
// Sequential mode updates each accumulator in turn on one thread. Parallel
// mode gives every algorithm its own worker fed through a bounded queue; a
// single dispatcher reads each block once and shares it with all queues, so
// buffered memory stays under algorithms * queue_capacity * block_size.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

use super::algorithm::{validate_algorithm_set, Algorithm, DEFAULT_ALGORITHMS};
use super::error::HashUtilityError;
use super::record::AlgorithmDigest;

/// 1 MiB read blocks
pub const DEFAULT_BLOCK_SIZE: usize = 1024 * 1024;

/// Blocks a worker queue may hold before the dispatcher blocks
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// How accumulators are driven
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineMode {
    Sequential,
    #[default]
    Parallel,
}

/// Message on a worker queue
enum Block {
    Data(Arc<[u8]>),
    /// End of stream, finalize
    End,
}

/// Computes one hex digest per algorithm over a single pass of the input
#[derive(Debug, Clone)]
pub struct DigestPipeline {
    algorithms: Vec<Algorithm>,
    block_size: usize,
    queue_capacity: usize,
    mode: PipelineMode,
}

impl DigestPipeline {
    pub fn new(algorithms: Vec<Algorithm>) -> Result<Self, HashUtilityError> {
        validate_algorithm_set(&algorithms)?;
        Ok(Self {
            algorithms,
            block_size: DEFAULT_BLOCK_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            mode: PipelineMode::default(),
        })
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity.max(1);
        self
    }

    pub fn with_mode(mut self, mode: PipelineMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Digest a file on disk
    pub fn digest_file(&self, path: &Path) -> Result<Vec<AlgorithmDigest>, HashUtilityError> {
        let file = File::open(path)
            .map_err(|e| HashUtilityError::from_io_error(e, "opening", path.to_path_buf()))?;
        self.digest_reader(file)
            .map_err(|e| HashUtilityError::from_io_error(e, "reading", path.to_path_buf()))
    }

    /// Digest any byte source; results follow the configured algorithm order
    pub fn digest_reader<R: Read>(&self, reader: R) -> io::Result<Vec<AlgorithmDigest>> {
        match self.mode {
            PipelineMode::Sequential => self.digest_sequential(reader),
            PipelineMode::Parallel => self.digest_parallel(reader),
        }
    }

    fn digest_sequential<R: Read>(&self, mut reader: R) -> io::Result<Vec<AlgorithmDigest>> {
        let mut hashers: Vec<_> = self.algorithms.iter().map(|a| a.hasher()).collect();
        let mut buffer = vec![0u8; self.block_size];

        loop {
            let bytes_read = read_block(&mut reader, &mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            for hasher in hashers.iter_mut() {
                hasher.update(&buffer[..bytes_read]);
            }
        }

        Ok(self
            .algorithms
            .iter()
            .zip(hashers)
            .map(|(&algorithm, hasher)| AlgorithmDigest::new(algorithm, hex::encode(hasher.finalize())))
            .collect())
    }

    fn digest_parallel<R: Read>(&self, mut reader: R) -> io::Result<Vec<AlgorithmDigest>> {
        thread::scope(|scope| -> io::Result<Vec<AlgorithmDigest>> {
            let mut senders = Vec::with_capacity(self.algorithms.len());
            let mut workers = Vec::with_capacity(self.algorithms.len());

            for &algorithm in &self.algorithms {
                let (sender, receiver) = bounded::<Block>(self.queue_capacity);
                senders.push(sender);
                workers.push(scope.spawn(move || run_worker(algorithm, receiver)));
            }

            let dispatched = dispatch(&mut reader, self.block_size, &senders);
            if dispatched.is_ok() {
                for sender in &senders {
                    // A worker that already hung up is reported by its join below
                    let _ = sender.send(Block::End);
                }
            }
            // Without the End sentinel this tells workers to abandon their state
            drop(senders);

            let mut digests = Vec::with_capacity(workers.len());
            for worker in workers {
                match worker.join() {
                    Ok(digest) => digests.push(digest),
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }

            dispatched?;
            digests
                .into_iter()
                .map(|digest| {
                    digest.ok_or_else(|| {
                        io::Error::new(io::ErrorKind::BrokenPipe, "hash worker stopped before end of stream")
                    })
                })
                .collect()
        })
    }
}

impl Default for DigestPipeline {
    fn default() -> Self {
        Self {
            algorithms: DEFAULT_ALGORITHMS.to_vec(),
            block_size: DEFAULT_BLOCK_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            mode: PipelineMode::default(),
        }
    }
}

/// Read blocks until the source is exhausted, sharing each with every queue
///
/// `send` blocks while a queue is full, which throttles the reader to the
/// slowest algorithm.
fn dispatch<R: Read>(reader: &mut R, block_size: usize, senders: &[Sender<Block>]) -> io::Result<()> {
    loop {
        let mut buffer = vec![0u8; block_size];
        let bytes_read = read_block(reader, &mut buffer)?;
        if bytes_read == 0 {
            return Ok(());
        }
        buffer.truncate(bytes_read);
        let block: Arc<[u8]> = Arc::from(buffer);

        for sender in senders {
            sender.send(Block::Data(Arc::clone(&block))).map_err(|_| {
                io::Error::new(io::ErrorKind::BrokenPipe, "hash worker hung up mid-stream")
            })?;
        }
    }
}

/// Consume one queue; returns None when the stream was abandoned
fn run_worker(algorithm: Algorithm, receiver: Receiver<Block>) -> Option<AlgorithmDigest> {
    let mut hasher = algorithm.hasher();
    loop {
        match receiver.recv() {
            Ok(Block::Data(block)) => hasher.update(&block),
            Ok(Block::End) => {
                return Some(AlgorithmDigest::new(algorithm, hex::encode(hasher.finalize())));
            }
            Err(_) => return None,
        }
    }
}

/// One read call, retrying on EINTR; zero means end of stream
fn read_block<R: Read>(reader: &mut R, buffer: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buffer) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}
