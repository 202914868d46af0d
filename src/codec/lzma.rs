//! LZMA codec implementation.
//!
//! ZIP stores LZMA data with a small header in front of the raw stream:
//!
//! | Bytes | Meaning |
//! |-------|---------|
//! | 2 | LZMA SDK version (major, minor) |
//! | 2 | Length of the properties block (always 5) |
//! | 5 | Properties: lc/lp/pb byte + dictionary size |
//!
//! The raw stream is written with an end-of-stream marker (general purpose
//! flag bit 1).

use std::io::{self, Read, Write};

use super::{CompressionMethod, Decoder, SharedSink};
use crate::{Error, Result};

/// LZMA SDK version recorded in the header (9.20).
const SDK_VERSION: [u8; 2] = [9, 20];

/// Length of the LZMA properties block.
const PROPERTIES_LEN: usize = 5;

/// Length of the ZIP LZMA header including the properties.
pub const HEADER_LEN: usize = 4 + PROPERTIES_LEN;

fn lzma_options(preset: u32) -> lzma_rust2::LzmaOptions {
    lzma_rust2::LzmaOptions::with_preset(preset.min(9))
}

/// Encodes the ZIP LZMA header for `options`.
fn encode_header(options: &lzma_rust2::LzmaOptions) -> Vec<u8> {
    let mut header = Vec::with_capacity(HEADER_LEN);
    header.extend_from_slice(&SDK_VERSION);
    header.extend_from_slice(&(PROPERTIES_LEN as u16).to_le_bytes());
    header.push(options.get_props());
    header.extend_from_slice(&options.dict_size.to_le_bytes());
    header
}

/// Streaming LZMA compressor producing ZIP LZMA data.
pub struct LzmaCompressor {
    encoder: Option<lzma_rust2::LzmaWriter<SharedSink>>,
    sink: SharedSink,
    header: Option<Vec<u8>>,
}

impl std::fmt::Debug for LzmaCompressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LzmaCompressor")
            .field("finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}

impl LzmaCompressor {
    /// Creates a compressor using LZMA preset `preset` (0-9).
    ///
    /// # Errors
    ///
    /// Returns an error if the encoder cannot be initialized.
    pub fn new(preset: u32) -> Result<Self> {
        let options = lzma_options(preset);
        let sink = SharedSink::default();
        let encoder = lzma_rust2::LzmaWriter::new_no_header(sink.clone(), &options, true)
            .map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidData, e.to_string())))?;

        Ok(Self {
            encoder: Some(encoder),
            sink,
            header: Some(encode_header(&options)),
        })
    }

    /// Compresses `data`, returning any completed output.
    pub fn compress(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        let encoder = self.encoder.as_mut().ok_or(Error::CompressorFinished {
            method: CompressionMethod::Lzma,
        })?;
        encoder.write_all(data)?;
        Ok(self.drain())
    }

    /// Writes the end-of-stream marker and flushes the range coder.
    pub fn finish(&mut self) -> Result<Vec<u8>> {
        let encoder = self.encoder.take().ok_or(Error::CompressorFinished {
            method: CompressionMethod::Lzma,
        })?;
        encoder.finish().map_err(Error::backend)?;
        Ok(self.drain())
    }

    /// Returns true once [`finish`](Self::finish) has run.
    pub fn is_finished(&self) -> bool {
        self.encoder.is_none()
    }

    /// Takes pending output, prefixed by the header on first use.
    fn drain(&mut self) -> Vec<u8> {
        let body = self.sink.take();
        match self.header.take() {
            Some(mut header) => {
                header.extend_from_slice(&body);
                header
            }
            None => body,
        }
    }
}

/// LZMA decoder for ZIP entries.
pub struct LzmaDecoder<R> {
    inner: lzma_rust2::LzmaReader<R>,
}

impl<R> std::fmt::Debug for LzmaDecoder<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LzmaDecoder").finish_non_exhaustive()
    }
}

impl<R: Read + Send> LzmaDecoder<R> {
    /// Creates a decoder, consuming the ZIP LZMA header from `input`.
    ///
    /// # Arguments
    ///
    /// * `input` - The entry's compressed data
    /// * `uncompressed_size` - Size recorded for the entry
    ///
    /// # Errors
    ///
    /// Returns an error if the header is truncated or its properties are invalid.
    pub fn new(mut input: R, uncompressed_size: u64) -> Result<Self> {
        let mut header = [0u8; HEADER_LEN];
        input.read_exact(&mut header)?;

        let props_len = u16::from_le_bytes([header[2], header[3]]) as usize;
        if props_len != PROPERTIES_LEN {
            return Err(Error::InvalidFormat(format!(
                "LZMA properties length {} (expected {})",
                props_len, PROPERTIES_LEN
            )));
        }

        let props_byte = header[4];
        let dict_size = u32::from_le_bytes([header[5], header[6], header[7], header[8]]);

        let reader = lzma_rust2::LzmaReader::new_with_props(
            input,
            uncompressed_size,
            props_byte,
            dict_size,
            None,
        )
        .map_err(|e| Error::Io(io::Error::new(io::ErrorKind::InvalidData, e.to_string())))?;

        Ok(Self { inner: reader })
    }
}

impl<R: Read + Send> Read for LzmaDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Read + Send> Decoder for LzmaDecoder<R> {
    fn method(&self) -> CompressionMethod {
        CompressionMethod::Lzma
    }
}
