//! # chunkzip
//!
//! Append arbitrarily large files to ZIP archives in bounded-size chunks.
//!
//! Each chunk is compressed with a streaming compressor that lives across
//! calls, appended to the end of the entry's data, and followed by a fresh
//! central directory. The archive on disk is a valid ZIP file after every
//! chunk, so a long-running job can be interrupted and the archive inspected
//! (or resumed) at any point.
//!
//! ## Quick Start
//!
//! ### Archiving a File
//!
//! ```rust,no_run
//! use chunkzip::{CompressionMethod, Result, zip_file_in_chunks};
//!
//! fn main() -> Result<()> {
//!     let entry = zip_file_in_chunks("huge.csv", "export.zip", CompressionMethod::Deflate)?;
//!     println!("{}: {} -> {} bytes", entry.filename, entry.uncompressed_size, entry.compressed_size);
//!     Ok(())
//! }
//! ```
//!
//! ### Feeding Chunks Yourself
//!
//! ```rust,no_run
//! use chunkzip::{ChunkedZipWriter, CompressionMethod, CompressorRegistry, Result};
//!
//! fn main() -> Result<()> {
//!     let mut registry = CompressorRegistry::new();
//!     for chunk in [b"first ".as_slice(), b"second".as_slice()] {
//!         let mut writer =
//!             ChunkedZipWriter::new("out.zip", "log.txt", CompressionMethod::Lzma, &mut registry);
//!         writer.write_chunk(chunk)?;
//!     }
//!     let mut writer =
//!         ChunkedZipWriter::new("out.zip", "log.txt", CompressionMethod::Lzma, &mut registry);
//!     writer.flush()?;
//!     writer.close()?;
//!     registry.release("out.zip", "log.txt");
//!     Ok(())
//! }
//! ```
//!
//! ### Reading Back
//!
//! ```rust,no_run
//! use chunkzip::{Result, ZipReader};
//!
//! fn main() -> Result<()> {
//!     let mut archive = ZipReader::open("export.zip")?;
//!     let result = archive.verify_all()?;
//!     println!("{} of {} entries OK", result.entries_passed, result.entries_tested);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `deflate` | Yes | Deflate compression (method 8) |
//! | `bzip2` | Yes | BZip2 compression (method 12) |
//! | `lzma` | Yes | LZMA compression (method 14) |
//! | `cli` | No | Command-line interface tool |
//!
//! Stored entries (method 0) are always available.
//!
//! ## Compressed Entries Before Finalization
//!
//! Deflate entries are full-flushed on [`ChunkedZipWriter::close`] and decode
//! completely after every chunk. BZip2 and LZMA buffer data internally until
//! [`ChunkedZipWriter::flush`] emits the final block, so before that the
//! header already declares the full uncompressed size while the data cannot
//! yet be decoded to it.
//!
//! Deflate streams never receive a final block, so that any entry can be
//! extended later. Readers that require one, such as Info-ZIP `unzip`, reject
//! these entries as invalid compressed data; Python's `zipfile` and
//! [`ZipReader`] read them.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod checksum;
pub mod chunked;
pub mod codec;
pub mod error;
pub mod format;
pub mod read;
pub mod timestamp;
pub mod write;

pub use error::{Error, Result};
pub use timestamp::DosDateTime;

pub use codec::{CompressionMethod, Compressor, FlushKind};

// Re-export reading API at crate root for convenience
pub use read::{Entry, TestResult, ZipReader};

// Re-export writing API at crate root for convenience
pub use write::{
    ChunkedZipWriter, CompressorRegistry, DEFAULT_CHUNK_SIZE, EntryDescriptor, WriteOptions,
};

pub use chunked::{ChunkReader, zip_file_in_chunks, zip_file_in_chunks_with};
