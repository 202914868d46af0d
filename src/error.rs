//! Error types for chunked ZIP operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when appending to or reading back ZIP archives, along with a
//! convenient [`Result<T>`] type alias.
//!
//! # Error Handling
//!
//! All fallible operations in this crate return `Result<T, Error>`. You can
//! handle errors using pattern matching or the `?` operator:
//!
//! ```rust,no_run
//! use chunkzip::{CompressionMethod, Result, zip_file_in_chunks};
//!
//! fn archive(source: &str, dest: &str) -> Result<()> {
//!     zip_file_in_chunks(source, dest, CompressionMethod::Deflate)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Exhaustive Error Matching
//!
//! ```rust,no_run
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! use chunkzip::{Error, ZipReader};
//!
//! fn open(path: &str) -> chunkzip::Result<ZipReader<BufReader<File>>> {
//!     match ZipReader::open(path) {
//!         Ok(reader) => Ok(reader),
//!         Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
//!             eprintln!("Archive not found: {}", path);
//!             Err(Error::Io(e))
//!         }
//!         Err(Error::InvalidFormat(msg)) => {
//!             eprintln!("Not a ZIP archive: {}", msg);
//!             Err(Error::InvalidFormat(msg))
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! ```

use std::io;

use crate::codec::CompressionMethod;

/// The main error type for chunked ZIP operations.
///
/// | Category | Variants | Typical Cause |
/// |----------|----------|---------------|
/// | I/O | [`Io`][Self::Io] | File system or codec backend failures |
/// | Format | [`InvalidFormat`][Self::InvalidFormat], [`CorruptHeader`][Self::CorruptHeader] | Unparseable archive |
/// | State | [`ArchiveClosed`][Self::ArchiveClosed], [`CompressorFinished`][Self::CompressorFinished] | Writes after close/finish |
/// | Entries | [`EntryNotFound`][Self::EntryNotFound], [`EntryNotLast`][Self::EntryNotLast], [`MethodMismatch`][Self::MethodMismatch] | Entry lookup and resume |
/// | Compatibility | [`UnsupportedMethod`][Self::UnsupportedMethod], [`UnsupportedFlush`][Self::UnsupportedFlush] | Missing codec support |
/// | Integrity | [`CrcMismatch`][Self::CrcMismatch], [`SizeMismatch`][Self::SizeMismatch] | Read-back verification |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred.
    ///
    /// Compression backend failures are reported through this variant as well.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not a valid ZIP archive.
    #[error("Invalid ZIP format: {0}")]
    InvalidFormat(String),

    /// A record in the archive is malformed.
    #[error("Corrupt header at offset {offset:#x}: {reason}")]
    CorruptHeader {
        /// Byte offset of the malformed record.
        offset: u64,
        /// Description of the problem.
        reason: String,
    },

    /// A write targeted an archive stream that has already been closed.
    #[error("Attempt to write to ZIP archive that was already closed")]
    ArchiveClosed,

    /// The requested entry does not exist in the archive.
    #[error("Entry not found: {path}")]
    EntryNotFound {
        /// The entry name that was looked up.
        path: String,
    },

    /// The entry cannot be extended because another entry's data follows it.
    #[error("Entry '{path}' is not the last entry in the archive and cannot be extended")]
    EntryNotLast {
        /// The entry name.
        path: String,
    },

    /// An entry is being written with a different method than it was started with.
    #[error("Entry '{path}' uses {existing}, cannot continue it as {requested}")]
    MethodMismatch {
        /// The entry name.
        path: String,
        /// The method already recorded for the entry.
        existing: CompressionMethod,
        /// The method requested by the writer.
        requested: CompressionMethod,
    },

    /// The compression method is not supported (or its feature is disabled).
    #[error("Unsupported compression method: {method_id}")]
    UnsupportedMethod {
        /// The ZIP method id.
        method_id: u16,
    },

    /// A synchronizing flush was requested from a codec that only has a terminal flush.
    #[error("{method} does not support a synchronizing flush")]
    UnsupportedFlush {
        /// The codec's method.
        method: CompressionMethod,
    },

    /// The compressor already emitted its terminal block.
    #[error("{method} compressor has already been finished")]
    CompressorFinished {
        /// The codec's method.
        method: CompressionMethod,
    },

    /// CRC-32 verification failed for an extracted entry.
    #[error("CRC mismatch for entry '{entry_name}': expected {expected:#x}, got {actual:#x}")]
    CrcMismatch {
        /// The entry name.
        entry_name: String,
        /// CRC recorded in the archive.
        expected: u32,
        /// CRC of the extracted data.
        actual: u32,
    },

    /// The extracted size differs from the size recorded in the archive.
    #[error("Size mismatch for entry '{entry_name}': expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// The entry name.
        entry_name: String,
        /// Size recorded in the archive.
        expected: u64,
        /// Number of bytes actually extracted.
        actual: u64,
    },

    /// An invalid compression level was provided.
    ///
    /// ```rust
    /// use chunkzip::{Error, WriteOptions};
    ///
    /// assert!(WriteOptions::new().level(5).is_ok());
    /// let result = WriteOptions::new().level(15);
    /// assert!(matches!(result, Err(Error::InvalidCompressionLevel { level: 15 })));
    /// ```
    #[error("invalid compression level {level}: must be 0-9")]
    InvalidCompressionLevel {
        /// The invalid level that was provided.
        level: u32,
    },

    /// A chunk size of zero was configured.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
}

impl Error {
    /// Creates a [`CorruptHeader`](Self::CorruptHeader) error.
    pub(crate) fn corrupt(offset: u64, reason: impl Into<String>) -> Self {
        Self::CorruptHeader {
            offset,
            reason: reason.into(),
        }
    }

    /// Wraps a codec backend error the way the codec modules report them.
    pub(crate) fn backend(err: impl std::fmt::Display) -> Self {
        Self::Io(io::Error::other(err.to_string()))
    }
}

/// A specialized Result type for chunked ZIP operations.
pub type Result<T> = std::result::Result<T, Error>;
