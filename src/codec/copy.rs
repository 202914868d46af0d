//! Stored entries (no compression).

use std::io::{self, Read};

use super::{CompressionMethod, Decoder};

/// Reads a stored entry's bytes, stopping at the recorded size.
pub struct StoredDecoder<R> {
    inner: io::Take<R>,
}

impl<R: Read + Send> StoredDecoder<R> {
    /// Creates a decoder that yields at most `size` bytes of `inner`.
    pub fn new(inner: R, size: u64) -> Self {
        Self {
            inner: inner.take(size),
        }
    }
}

impl<R: Read + Send> Read for StoredDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read + Send> Decoder for StoredDecoder<R> {
    fn method(&self) -> CompressionMethod {
        CompressionMethod::Stored
    }
}
