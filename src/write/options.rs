//! Write options for chunked archiving.

use crate::codec::CompressionMethod;
use crate::timestamp::DosDateTime;

/// Default size of the pieces a source file is read and appended in (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Options controlling how entries are appended.
///
/// # Example
///
/// ```rust
/// use chunkzip::WriteOptions;
///
/// let options = WriteOptions::new()
///     .level(9)?
///     .chunk_size(256 * 1024)?;
/// assert_eq!(options.chunk_size, 256 * 1024);
/// # Ok::<(), chunkzip::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Compression level (0-9); `None` uses the method's default.
    pub level: Option<u32>,
    /// Size of each chunk read from the source.
    pub chunk_size: usize,
    /// Fixed modification time; `None` stamps entries with the current time
    /// on every write.
    pub modified: Option<DosDateTime>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            level: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            modified: None,
        }
    }
}

impl WriteOptions {
    /// Creates new write options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the compression level (strict validation).
    ///
    /// BZip2 treats 0 as 1.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCompressionLevel`](crate::Error::InvalidCompressionLevel)
    /// if level is greater than 9.
    pub fn level(mut self, level: u32) -> crate::Result<Self> {
        if level > 9 {
            return Err(crate::Error::InvalidCompressionLevel { level });
        }
        self.level = Some(level);
        Ok(self)
    }

    /// Sets the chunk size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChunkSize`](crate::Error::InvalidChunkSize) for zero.
    pub fn chunk_size(mut self, chunk_size: usize) -> crate::Result<Self> {
        if chunk_size == 0 {
            return Err(crate::Error::InvalidChunkSize);
        }
        self.chunk_size = chunk_size;
        Ok(self)
    }

    /// Stamps every write with `modified` instead of the current time.
    pub fn modified(mut self, modified: DosDateTime) -> Self {
        self.modified = Some(modified);
        self
    }

    /// Level the writer passes to the compressor for `method`.
    pub fn effective_level(&self, method: CompressionMethod) -> u32 {
        self.level.unwrap_or(method.default_level())
    }
}
