//! BZip2 codec implementation.

use std::io::{self, Read, Write};

use bzip2::Compression;
use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;

use super::{CompressionMethod, Decoder, SharedSink};
use crate::{Error, Result};

/// BZip2 decoder.
pub struct Bzip2Decoder<R> {
    inner: BzDecoder<R>,
}

impl<R> std::fmt::Debug for Bzip2Decoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bzip2Decoder").finish_non_exhaustive()
    }
}

impl<R: Read + Send> Bzip2Decoder<R> {
    /// Creates a new BZip2 decoder.
    ///
    /// # Arguments
    ///
    /// * `input` - The compressed data source
    pub fn new(input: R) -> Self {
        Self {
            inner: BzDecoder::new(input),
        }
    }
}

impl<R: Read + Send> Read for Bzip2Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read + Send> Decoder for Bzip2Decoder<R> {
    fn method(&self) -> CompressionMethod {
        CompressionMethod::Bzip2
    }
}

/// Streaming BZip2 compressor.
///
/// BZip2 works on blocks of up to 900 KB, so most input stays buffered until a
/// block fills up or [`finish`](Self::finish) writes the last block and the
/// stream trailer.
pub struct Bzip2Compressor {
    encoder: Option<BzEncoder<SharedSink>>,
    sink: SharedSink,
}

impl std::fmt::Debug for Bzip2Compressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bzip2Compressor")
            .field("finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}

impl Bzip2Compressor {
    /// Creates a compressor; `level` is clamped to 1-9.
    pub fn new(level: u32) -> Self {
        let sink = SharedSink::default();
        let encoder = BzEncoder::new(sink.clone(), Compression::new(level.clamp(1, 9)));
        Self {
            encoder: Some(encoder),
            sink,
        }
    }

    /// Compresses `data`, returning any completed output.
    pub fn compress(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        let encoder = self.encoder.as_mut().ok_or(Error::CompressorFinished {
            method: CompressionMethod::Bzip2,
        })?;
        encoder.write_all(data)?;
        Ok(self.sink.take())
    }

    /// Writes the final block and stream trailer.
    pub fn finish(&mut self) -> Result<Vec<u8>> {
        let encoder = self.encoder.take().ok_or(Error::CompressorFinished {
            method: CompressionMethod::Bzip2,
        })?;
        encoder.finish()?;
        Ok(self.sink.take())
    }

    /// Returns true once [`finish`](Self::finish) has run.
    pub fn is_finished(&self) -> bool {
        self.encoder.is_none()
    }
}
