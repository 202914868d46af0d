//! Checksum computation utilities.
//!
//! ZIP entries carry a CRC-32 (IEEE 802.3 polynomial) of their uncompressed
//! contents. Because an entry is written across many independent calls, the
//! checksum has to be resumable from the value stored in the archive.
//!
//! # Example
//!
//! ```rust
//! use chunkzip::checksum::Crc32;
//!
//! let mut crc = Crc32::new();
//! crc.update(b"Hello, ");
//!
//! // Later, resume from the stored value
//! let mut resumed = Crc32::resume(crc.finalize());
//! resumed.update(b"World!");
//! assert_eq!(resumed.finalize(), Crc32::compute(b"Hello, World!"));
//! ```

use std::io::{self, Write};

/// CRC-32 of empty input, the seed of every fresh entry.
pub const EMPTY_CRC32: u32 = 0;

/// CRC-32 checksum calculator.
///
/// Uses the IEEE 802.3 polynomial (standard for Ethernet, ZIP, etc.).
///
/// ```rust
/// use chunkzip::checksum::Crc32;
///
/// let mut crc = Crc32::new();
/// crc.update(b"Hello, ");
/// crc.update(b"World!");
/// assert_eq!(crc.finalize(), 0xEC4AC3D0);
///
/// assert_eq!(Crc32::compute(b"Hello, World!"), 0xEC4AC3D0);
/// ```
#[derive(Clone)]
pub struct Crc32 {
    hasher: crc32fast::Hasher,
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crc32")
            .field("current", &self.hasher.clone().finalize())
            .finish()
    }
}

impl Crc32 {
    /// Creates a new CRC-32 calculator.
    pub fn new() -> Self {
        Self {
            hasher: crc32fast::Hasher::new(),
        }
    }

    /// Creates a calculator that continues from a previously finalized value.
    pub fn resume(crc: u32) -> Self {
        Self {
            hasher: crc32fast::Hasher::new_with_initial(crc),
        }
    }

    /// Updates the checksum with additional data.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Returns the checksum of all data seen so far.
    pub fn finalize(&self) -> u32 {
        self.hasher.clone().finalize()
    }

    /// Computes the checksum of a single slice in one call.
    pub fn compute(data: &[u8]) -> u32 {
        crc32fast::hash(data)
    }

    /// Extends a stored checksum with `data`.
    pub fn extend(crc: u32, data: &[u8]) -> u32 {
        let mut hasher = Self::resume(crc);
        hasher.update(data);
        hasher.finalize()
    }
}

/// A writer wrapper that computes CRC-32 while writing.
///
/// Used to verify extracted entries without buffering them.
///
/// ```rust
/// use chunkzip::checksum::Crc32Writer;
/// use std::io::Write;
///
/// let mut buffer = Vec::new();
/// let mut writer = Crc32Writer::new(&mut buffer);
/// writer.write_all(b"Hello, World!").unwrap();
///
/// assert_eq!(writer.crc(), 0xEC4AC3D0);
/// assert_eq!(writer.bytes_written(), 13);
/// ```
pub struct Crc32Writer<W> {
    inner: W,
    crc: Crc32,
    bytes_written: u64,
}

impl<W> Crc32Writer<W> {
    /// Creates a new CRC-32 writer wrapping the given writer.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            crc: Crc32::new(),
            bytes_written: 0,
        }
    }

    /// Returns the current CRC-32 value.
    pub fn crc(&self) -> u32 {
        self.crc.finalize()
    }

    /// Returns the number of bytes written.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Consumes the wrapper and returns the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for Crc32Writer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.crc.update(&buf[..n]);
        self.bytes_written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_empty() {
        assert_eq!(Crc32::compute(b""), EMPTY_CRC32);
        assert_eq!(Crc32::new().finalize(), EMPTY_CRC32);
    }

    #[test]
    fn test_crc32_known_value() {
        assert_eq!(Crc32::compute(b"123456789"), 0xCBF43926);
    }

    #[test]
    fn test_crc32_resume_matches_one_shot() {
        let data = b"The quick brown fox jumps over the lazy dog";
        let mut crc = EMPTY_CRC32;
        for piece in data.chunks(7) {
            crc = Crc32::extend(crc, piece);
        }
        assert_eq!(crc, Crc32::compute(data));
    }

    #[test]
    fn test_crc32_writer_passthrough() {
        let mut out = Vec::new();
        let mut writer = Crc32Writer::new(&mut out);
        writer.write_all(b"abc").unwrap();
        writer.write_all(b"def").unwrap();
        assert_eq!(writer.crc(), Crc32::compute(b"abcdef"));
        assert_eq!(writer.bytes_written(), 6);
        assert_eq!(out, b"abcdef");
    }
}
