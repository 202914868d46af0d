//! Compression codecs for ZIP entries.
//!
//! Two halves live here:
//!
//! - [`Compressor`], the streaming compression adapter used while an entry is
//!   being appended. Its state must survive across independent chunk writes,
//!   so it never owns the archive; it only turns input bytes into output bytes.
//! - [`Decoder`] implementations used by the reader to verify entries.
//!
//! The supported methods split into two flush families, see [`FlushKind`].

#[cfg(feature = "bzip2")]
pub mod bzip2;

#[cfg(feature = "deflate")]
pub mod deflate;

#[cfg(feature = "lzma")]
pub mod lzma;

mod copy;

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};

use crate::format::{flags, version};
use crate::{Error, Result};

pub use copy::StoredDecoder;

/// A decoder that reads an entry's compressed data and produces the original bytes.
pub trait Decoder: Read + Send {
    /// Returns the method this decoder handles.
    fn method(&self) -> CompressionMethod;
}

/// Compression methods an entry can be written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionMethod {
    /// No compression.
    Stored,
    /// Raw deflate.
    Deflate,
    /// BZip2.
    Bzip2,
    /// LZMA with the ZIP LZMA header and an end-of-stream marker.
    Lzma,
}

/// How a method's compressed stream is brought to a decodable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushKind {
    /// Nothing is ever buffered.
    None,
    /// A full flush may be issued any number of times (deflate).
    Synchronizing,
    /// A single flush at the very end emits the final block.
    Terminal,
}

impl CompressionMethod {
    /// All methods, in method-id order.
    pub const ALL: [Self; 4] = [Self::Stored, Self::Deflate, Self::Bzip2, Self::Lzma];

    /// Returns the ZIP method id.
    pub const fn zip_id(self) -> u16 {
        match self {
            Self::Stored => 0,
            Self::Deflate => 8,
            Self::Bzip2 => 12,
            Self::Lzma => 14,
        }
    }

    /// Looks up a method by ZIP method id.
    pub fn from_zip_id(id: u16) -> Result<Self> {
        match id {
            0 => Ok(Self::Stored),
            8 => Ok(Self::Deflate),
            12 => Ok(Self::Bzip2),
            14 => Ok(Self::Lzma),
            method_id => Err(Error::UnsupportedMethod { method_id }),
        }
    }

    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stored => "Stored",
            Self::Deflate => "Deflate",
            Self::Bzip2 => "BZip2",
            Self::Lzma => "LZMA",
        }
    }

    /// Returns which flush family the method belongs to.
    pub const fn flush_kind(self) -> FlushKind {
        match self {
            Self::Stored => FlushKind::None,
            Self::Deflate => FlushKind::Synchronizing,
            Self::Bzip2 | Self::Lzma => FlushKind::Terminal,
        }
    }

    /// "Version needed to extract" for entries using this method, without zip64.
    pub const fn version_needed(self) -> u16 {
        match self {
            Self::Stored | Self::Deflate => version::DEFAULT,
            Self::Bzip2 => version::BZIP2,
            Self::Lzma => version::LZMA,
        }
    }

    /// General purpose flags implied by the method.
    pub const fn flags(self) -> u16 {
        match self {
            Self::Lzma => flags::LZMA_EOS_MARKER,
            _ => 0,
        }
    }

    /// Default compression level.
    pub const fn default_level(self) -> u32 {
        match self {
            Self::Stored => 0,
            Self::Deflate | Self::Lzma => 6,
            Self::Bzip2 => 9,
        }
    }

    /// Returns true if support for this method was compiled in.
    pub const fn is_available(self) -> bool {
        match self {
            Self::Stored => true,
            Self::Deflate => cfg!(feature = "deflate"),
            Self::Bzip2 => cfg!(feature = "bzip2"),
            Self::Lzma => cfg!(feature = "lzma"),
        }
    }
}

impl fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Growable output buffer shared between a backend encoder and its owner.
///
/// Encoders that only expose a `Write` interface write into the sink; the owner
/// drains it after every call.
#[derive(Clone, Default)]
pub(crate) struct SharedSink(Arc<Mutex<Vec<u8>>>);

impl SharedSink {
    /// Takes everything written so far.
    pub(crate) fn take(&self) -> Vec<u8> {
        let mut buf = self.0.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *buf)
    }
}

impl Write for SharedSink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut buf = self.0.lock().unwrap_or_else(|e| e.into_inner());
        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Streaming compression adapter.
///
/// `compress` may return fewer bytes than it consumed; the remainder is
/// released by [`sync_flush`](Self::sync_flush) or [`finish`](Self::finish)
/// depending on the method's [`FlushKind`]. Output is never reordered.
pub enum Compressor {
    /// Pass-through adapter for stored entries.
    Identity,
    /// Raw deflate.
    #[cfg(feature = "deflate")]
    Deflate(deflate::DeflateCompressor),
    /// BZip2.
    #[cfg(feature = "bzip2")]
    Bzip2(bzip2::Bzip2Compressor),
    /// LZMA.
    #[cfg(feature = "lzma")]
    Lzma(lzma::LzmaCompressor),
}

impl fmt::Debug for Compressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compressor")
            .field("method", &self.method())
            .field("finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}

impl Compressor {
    /// Creates a compressor for `method`.
    ///
    /// `level` defaults to [`CompressionMethod::default_level`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMethod`] if the method's feature is disabled.
    pub fn new(method: CompressionMethod, level: Option<u32>) -> Result<Self> {
        #[allow(unused_variables)]
        let level = level.unwrap_or(method.default_level());
        match method {
            CompressionMethod::Stored => Ok(Self::Identity),
            #[cfg(feature = "deflate")]
            CompressionMethod::Deflate => Ok(Self::Deflate(deflate::DeflateCompressor::new(level))),
            #[cfg(feature = "bzip2")]
            CompressionMethod::Bzip2 => Ok(Self::Bzip2(bzip2::Bzip2Compressor::new(level))),
            #[cfg(feature = "lzma")]
            CompressionMethod::Lzma => Ok(Self::Lzma(lzma::LzmaCompressor::new(level)?)),
            #[allow(unreachable_patterns)]
            other => Err(Error::UnsupportedMethod {
                method_id: other.zip_id(),
            }),
        }
    }

    /// Returns the method this compressor produces.
    pub fn method(&self) -> CompressionMethod {
        match self {
            Self::Identity => CompressionMethod::Stored,
            #[cfg(feature = "deflate")]
            Self::Deflate(_) => CompressionMethod::Deflate,
            #[cfg(feature = "bzip2")]
            Self::Bzip2(_) => CompressionMethod::Bzip2,
            #[cfg(feature = "lzma")]
            Self::Lzma(_) => CompressionMethod::Lzma,
        }
    }

    /// Feeds `data` and returns whatever compressed output is ready.
    pub fn compress(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Identity => Ok(data.to_vec()),
            #[cfg(feature = "deflate")]
            Self::Deflate(c) => Ok(c.compress(data)?),
            #[cfg(feature = "bzip2")]
            Self::Bzip2(c) => c.compress(data),
            #[cfg(feature = "lzma")]
            Self::Lzma(c) => c.compress(data),
        }
    }

    /// Flushes all pending output to a byte boundary without ending the stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFlush`] for terminal-flush methods.
    pub fn sync_flush(&mut self) -> Result<Vec<u8>> {
        match self {
            Self::Identity => Ok(Vec::new()),
            #[cfg(feature = "deflate")]
            Self::Deflate(c) => Ok(c.full_flush()?),
            #[allow(unreachable_patterns)]
            other => Err(Error::UnsupportedFlush {
                method: other.method(),
            }),
        }
    }

    /// Emits the final block of a terminal-flush stream.
    ///
    /// Deflate streams stay open for appending, so for deflate this is the same
    /// as [`sync_flush`](Self::sync_flush).
    ///
    /// # Errors
    ///
    /// Returns [`Error::CompressorFinished`] if called twice on a terminal-flush
    /// compressor.
    pub fn finish(&mut self) -> Result<Vec<u8>> {
        match self {
            Self::Identity => Ok(Vec::new()),
            #[cfg(feature = "deflate")]
            Self::Deflate(c) => Ok(c.full_flush()?),
            #[cfg(feature = "bzip2")]
            Self::Bzip2(c) => c.finish(),
            #[cfg(feature = "lzma")]
            Self::Lzma(c) => c.finish(),
        }
    }

    /// Returns true once a terminal flush has been emitted.
    pub fn is_finished(&self) -> bool {
        match self {
            #[cfg(feature = "bzip2")]
            Self::Bzip2(c) => c.is_finished(),
            #[cfg(feature = "lzma")]
            Self::Lzma(c) => c.is_finished(),
            _ => false,
        }
    }
}

/// Builds a decoder for an entry's compressed data.
///
/// # Arguments
///
/// * `input` - The compressed data, limited to the entry's data region
/// * `method` - The entry's compression method
/// * `uncompressed_size` - Size recorded for the entry
///
/// # Errors
///
/// Returns an error if the method's feature is disabled or the stream header
/// is invalid.
pub(crate) fn build_decoder<'a, R: Read + Send + 'a>(
    input: R,
    method: CompressionMethod,
    uncompressed_size: u64,
) -> Result<Box<dyn Decoder + 'a>> {
    match method {
        CompressionMethod::Stored => Ok(Box::new(StoredDecoder::new(input, uncompressed_size))),

        #[cfg(feature = "deflate")]
        CompressionMethod::Deflate => {
            let buf_reader = io::BufReader::new(input);
            Ok(Box::new(deflate::DeflateDecoder::new(buf_reader)))
        }

        #[cfg(feature = "bzip2")]
        CompressionMethod::Bzip2 => Ok(Box::new(bzip2::Bzip2Decoder::new(input))),

        #[cfg(feature = "lzma")]
        CompressionMethod::Lzma => {
            let decoder = lzma::LzmaDecoder::new(input, uncompressed_size)?;
            Ok(Box::new(decoder))
        }

        #[allow(unreachable_patterns)]
        other => Err(Error::UnsupportedMethod {
            method_id: other.zip_id(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn roundtrip(method: CompressionMethod, data: &[u8], chunk: usize) -> Vec<u8> {
        let mut compressor = Compressor::new(method, None).unwrap();
        let mut compressed = Vec::new();
        for piece in data.chunks(chunk) {
            compressed.extend(compressor.compress(piece).unwrap());
        }
        compressed.extend(compressor.finish().unwrap());

        let mut decoder =
            build_decoder(Cursor::new(compressed), method, data.len() as u64).unwrap();
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_zip_ids() {
        for method in CompressionMethod::ALL {
            assert_eq!(CompressionMethod::from_zip_id(method.zip_id()).unwrap(), method);
        }
        assert!(matches!(
            CompressionMethod::from_zip_id(93),
            Err(Error::UnsupportedMethod { method_id: 93 })
        ));
    }

    #[test]
    fn test_flush_kinds() {
        assert_eq!(CompressionMethod::Stored.flush_kind(), FlushKind::None);
        assert_eq!(CompressionMethod::Deflate.flush_kind(), FlushKind::Synchronizing);
        assert_eq!(CompressionMethod::Bzip2.flush_kind(), FlushKind::Terminal);
        assert_eq!(CompressionMethod::Lzma.flush_kind(), FlushKind::Terminal);
    }

    #[test]
    fn test_version_and_flags() {
        assert_eq!(CompressionMethod::Deflate.version_needed(), 20);
        assert_eq!(CompressionMethod::Bzip2.version_needed(), 46);
        assert_eq!(CompressionMethod::Lzma.version_needed(), 63);
        assert_eq!(CompressionMethod::Lzma.flags(), flags::LZMA_EOS_MARKER);
        assert_eq!(CompressionMethod::Stored.flags(), 0);
    }

    #[test]
    fn test_identity_passthrough() {
        let mut c = Compressor::new(CompressionMethod::Stored, None).unwrap();
        assert_eq!(c.compress(b"abc").unwrap(), b"abc");
        assert!(c.sync_flush().unwrap().is_empty());
        assert!(c.finish().unwrap().is_empty());
        assert!(!c.is_finished());
    }

    #[test]
    fn test_roundtrip_all_methods() {
        let data: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
        for method in CompressionMethod::ALL {
            if !method.is_available() {
                continue;
            }
            assert_eq!(roundtrip(method, &data, 7_000), data, "{}", method);
        }
    }

    #[test]
    fn test_sink_drains() {
        let mut sink = SharedSink::default();
        sink.write_all(b"xy").unwrap();
        let handle = sink.clone();
        assert_eq!(handle.take(), b"xy");
        assert!(sink.take().is_empty());
    }

    #[cfg(feature = "bzip2")]
    #[test]
    fn test_terminal_codec_rejects_sync_flush() {
        let mut c = Compressor::new(CompressionMethod::Bzip2, None).unwrap();
        assert!(matches!(
            c.sync_flush(),
            Err(Error::UnsupportedFlush {
                method: CompressionMethod::Bzip2
            })
        ));
    }

    #[cfg(feature = "lzma")]
    #[test]
    fn test_compress_after_finish() {
        let mut c = Compressor::new(CompressionMethod::Lzma, Some(1)).unwrap();
        c.compress(b"data").unwrap();
        c.finish().unwrap();
        assert!(c.is_finished());
        assert!(matches!(
            c.compress(b"more"),
            Err(Error::CompressorFinished { .. })
        ));
        assert!(matches!(c.finish(), Err(Error::CompressorFinished { .. })));
    }
}
