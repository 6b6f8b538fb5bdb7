use std::fs::File;
use std::io::{self, BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default chunk size in bytes (0x8FFE)
pub const DEFAULT_CHUNK_SIZE: usize = 36862;

/// Lazy, finite sequence of fixed-size byte chunks read from a local audio file
///
/// Every chunk except the last is exactly `chunk_size` bytes. The file handle is
/// released as soon as the sequence is exhausted, fails, or is dropped.
/// Re-open the path to restart from the beginning.
pub struct ChunkSource {
    path: PathBuf,
    reader: Option<BufReader<File>>,
    chunk_size: usize,
    chunks_read: usize,
    bytes_read: u64,
}

impl ChunkSource {
    pub fn open(path: impl AsRef<Path>, chunk_size: usize) -> io::Result<Self> {
        let path = path.as_ref();

        if chunk_size == 0 {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                "chunk size must be greater than zero",
            ));
        }

        let file = File::open(path)?;
        debug!("Opened chunk source {} ({} byte chunks)", path.display(), chunk_size);

        Ok(Self {
            path: path.to_path_buf(),
            reader: Some(BufReader::new(file)),
            chunk_size,
            chunks_read: 0,
            bytes_read: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Chunks yielded so far
    pub fn chunks_read(&self) -> usize {
        self.chunks_read
    }

    /// Bytes yielded so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Whether the underlying file is still held open
    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    fn release(&mut self) {
        if self.reader.take().is_some() {
            debug!(
                "Released chunk source {} after {} chunks ({} bytes)",
                self.path.display(),
                self.chunks_read,
                self.bytes_read
            );
        }
    }
}

impl Iterator for ChunkSource {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let reader = self.reader.as_mut()?;
        let mut chunk = vec![0u8; self.chunk_size];
        let mut filled = 0;

        // Short reads are not end-of-file; keep filling until the chunk is full
        while filled < chunk.len() {
            match reader.read(&mut chunk[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.release();
                    return Some(Err(e));
                }
            }
        }

        if filled == 0 {
            self.release();
            return None;
        }

        chunk.truncate(filled);
        self.chunks_read += 1;
        self.bytes_read += filled as u64;

        if filled < self.chunk_size {
            // A short chunk can only be the last one
            self.release();
        }

        Some(Ok(chunk))
    }
}

impl std::iter::FusedIterator for ChunkSource {}
