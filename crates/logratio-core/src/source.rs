//! Input sources for the aggregation pipeline.
//!
//! The pipeline reads its input twice, front to back, so a source must be
//! able to hand out a fresh reader positioned at the start on every call.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};

/// A re-openable, line-oriented byte stream of known size.
pub trait LogSource {
    /// Opens a new forward-only reader at the start of the input.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying input cannot be opened.
    fn open(&self) -> io::Result<Box<dyn BufRead + '_>>;

    /// Total size of the input in bytes.
    fn total_bytes(&self) -> u64;

    /// Human-readable name used in logs.
    fn describe(&self) -> String;
}

/// A log file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    buffer_bytes: usize,
    total_bytes: u64,
}

impl FileSource {
    /// Opens `path` once to record its size.
    ///
    /// # Errors
    ///
    /// Returns an error if the file's metadata cannot be read.
    pub fn new(path: impl AsRef<Path>, buffer_bytes: usize) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let total_bytes = std::fs::metadata(&path)?.len();
        Ok(Self {
            path,
            buffer_bytes,
            total_bytes,
        })
    }

    /// Path of the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSource for FileSource {
    fn open(&self) -> io::Result<Box<dyn BufRead + '_>> {
        let file = File::open(&self.path)?;
        Ok(Box::new(BufReader::with_capacity(self.buffer_bytes, file)))
    }

    fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// An in-memory log, mostly useful for tests and benchmarks.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    data: Vec<u8>,
}

impl MemorySource {
    /// Wraps the given bytes.
    #[must_use]
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }
}

impl LogSource for MemorySource {
    fn open(&self) -> io::Result<Box<dyn BufRead + '_>> {
        Ok(Box::new(Cursor::new(self.data.as_slice())))
    }

    fn total_bytes(&self) -> u64 {
        self.data.len() as u64
    }

    fn describe(&self) -> String {
        format!("<memory: {} bytes>", self.data.len())
    }
}
