//! Raw deflate codec.
//!
//! Entries are never given a final deflate block: every flush is a full flush,
//! which leaves the stream byte-aligned and decodable while still allowing more
//! data to be appended later. The decoder therefore treats end of input at a
//! block boundary as the end of the entry.
//!
//! Readers that insist on a final block reject such entries. Python's
//! `zipfile` and this crate's [`ZipReader`](crate::ZipReader) accept them, but
//! Info-ZIP `unzip -t` reports "invalid compressed data to inflate".

use std::io::{self, BufRead, Read};

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use super::{CompressionMethod, Decoder};

/// Output headroom requested from the backend on each round.
const OUTPUT_STEP: usize = 32 * 1024;

/// Streaming raw deflate compressor.
pub struct DeflateCompressor {
    inner: Compress,
}

impl std::fmt::Debug for DeflateCompressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeflateCompressor")
            .field("total_in", &self.inner.total_in())
            .field("total_out", &self.inner.total_out())
            .finish_non_exhaustive()
    }
}

impl DeflateCompressor {
    /// Creates a compressor at `level` (0-9).
    pub fn new(level: u32) -> Self {
        Self {
            inner: Compress::new(Compression::new(level.min(9)), false),
        }
    }

    /// Compresses `data`, returning the output the backend has released.
    pub fn compress(&mut self, data: &[u8]) -> io::Result<Vec<u8>> {
        self.run(data, FlushCompress::None)
    }

    /// Emits all pending output followed by a full-flush marker.
    pub fn full_flush(&mut self) -> io::Result<Vec<u8>> {
        self.run(&[], FlushCompress::Full)
    }

    fn run(&mut self, mut input: &[u8], flush: FlushCompress) -> io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(OUTPUT_STEP);
        loop {
            if out.capacity() - out.len() < OUTPUT_STEP / 4 {
                out.reserve(OUTPUT_STEP);
            }
            let before = self.inner.total_in();
            self.inner
                .compress_vec(input, &mut out, flush)
                .map_err(io::Error::other)?;
            let consumed = (self.inner.total_in() - before) as usize;
            input = &input[consumed..];

            // The backend is done once it stops filling the output buffer.
            if input.is_empty() && out.len() < out.capacity() {
                return Ok(out);
            }
        }
    }
}

/// Raw deflate decoder.
pub struct DeflateDecoder<R> {
    inner: R,
    state: Decompress,
    done: bool,
}

impl<R> std::fmt::Debug for DeflateDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeflateDecoder").finish_non_exhaustive()
    }
}

impl<R: BufRead + Send> DeflateDecoder<R> {
    /// Creates a new raw deflate decoder.
    ///
    /// # Arguments
    ///
    /// * `input` - The compressed data source (must implement BufRead)
    pub fn new(input: R) -> Self {
        Self {
            inner: input,
            state: Decompress::new(false),
            done: false,
        }
    }
}

impl<R: BufRead + Send> Read for DeflateDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.done || buf.is_empty() {
            return Ok(0);
        }

        loop {
            let input = self.inner.fill_buf()?;
            let eof = input.is_empty();
            let before_in = self.state.total_in();
            let before_out = self.state.total_out();

            let status = self
                .state
                .decompress(input, buf, FlushDecompress::None)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

            let consumed = (self.state.total_in() - before_in) as usize;
            let produced = (self.state.total_out() - before_out) as usize;
            self.inner.consume(consumed);

            if status == Status::StreamEnd {
                self.done = true;
                return Ok(produced);
            }
            if produced > 0 {
                return Ok(produced);
            }
            if eof {
                // Full-flushed stream without a final block.
                self.done = true;
                return Ok(0);
            }
            if consumed == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "deflate stream stalled",
                ));
            }
        }
    }
}

impl<R: BufRead + Send> Decoder for DeflateDecoder<R> {
    fn method(&self) -> CompressionMethod {
        CompressionMethod::Deflate
    }
}
