//! Chunked writing of a single ZIP entry.
//!
//! A [`ChunkedZipWriter`] is bound to one archive, one entry name and one
//! compression method. Every call opens the archive, grows the entry, rewrites
//! the central directory and closes the archive again, so the file on disk is
//! a well-formed ZIP archive between calls.
//!
//! Writers are cheap and meant to be short-lived: the only state carried from
//! one call to the next is the compressor, kept in a [`CompressorRegistry`].
//!
//! # Flushing
//!
//! | Method | [`write_chunk`](ChunkedZipWriter::write_chunk) | [`flush`](ChunkedZipWriter::flush) | [`close`](ChunkedZipWriter::close) |
//! |--------|-------------|-------|-------|
//! | Stored | data as-is | no-op | no-op |
//! | Deflate | buffered | no-op | full flush |
//! | BZip2, LZMA | buffered | final block | no-op |
//!
//! Calling both `flush` and `close` after the last chunk finalizes any method.
//!
//! # Example
//!
//! ```rust,no_run
//! use chunkzip::{ChunkedZipWriter, CompressionMethod, CompressorRegistry};
//!
//! let mut registry = CompressorRegistry::new();
//! for chunk in [b"hello ".as_slice(), b"world".as_slice()] {
//!     let mut writer =
//!         ChunkedZipWriter::new("out.zip", "greeting.txt", CompressionMethod::Bzip2, &mut registry);
//!     writer.write_chunk(chunk)?;
//!     writer.close()?;
//! }
//! let mut writer =
//!     ChunkedZipWriter::new("out.zip", "greeting.txt", CompressionMethod::Bzip2, &mut registry);
//! writer.flush()?;
//! writer.close()?;
//! registry.release("out.zip", "greeting.txt");
//! # Ok::<(), chunkzip::Error>(())
//! ```

pub mod entry;
pub mod mutator;
pub(crate) mod options;
pub mod registry;

pub use entry::EntryDescriptor;
pub use mutator::{ArchiveSession, write_entry};
pub use options::{DEFAULT_CHUNK_SIZE, WriteOptions};
pub use registry::{AdapterHandle, CompressorKey, CompressorRegistry};

use std::path::{Path, PathBuf};

use crate::Result;
use crate::codec::{CompressionMethod, FlushKind};
use crate::timestamp::DosDateTime;

/// Appends chunks to one entry of one archive.
pub struct ChunkedZipWriter<'r> {
    archive: PathBuf,
    filename: String,
    method: CompressionMethod,
    options: WriteOptions,
    registry: &'r mut CompressorRegistry,
    descriptor: Option<EntryDescriptor>,
}

impl std::fmt::Debug for ChunkedZipWriter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkedZipWriter")
            .field("archive", &self.archive)
            .field("filename", &self.filename)
            .field("method", &self.method)
            .field("options", &self.options)
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

impl<'r> ChunkedZipWriter<'r> {
    /// Creates a writer with default options.
    pub fn new(
        archive: impl AsRef<Path>,
        filename: impl Into<String>,
        method: CompressionMethod,
        registry: &'r mut CompressorRegistry,
    ) -> Self {
        Self::with_options(archive, filename, method, WriteOptions::default(), registry)
    }

    /// Creates a writer with custom options.
    pub fn with_options(
        archive: impl AsRef<Path>,
        filename: impl Into<String>,
        method: CompressionMethod,
        options: WriteOptions,
        registry: &'r mut CompressorRegistry,
    ) -> Self {
        Self {
            archive: archive.as_ref().to_path_buf(),
            filename: filename.into(),
            method,
            options,
            registry,
            descriptor: None,
        }
    }

    /// Path of the archive.
    pub fn archive(&self) -> &Path {
        &self.archive
    }

    /// Entry name.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Compression method.
    pub fn method(&self) -> CompressionMethod {
        self.method
    }

    /// State of the entry after this writer's last write, if it wrote anything.
    pub fn descriptor(&self) -> Option<&EntryDescriptor> {
        self.descriptor.as_ref()
    }

    /// Compresses `chunk` and appends the output to the entry.
    ///
    /// # Errors
    ///
    /// - [`Error::MethodMismatch`](crate::Error::MethodMismatch) if the entry
    ///   or its live compressor uses another method.
    /// - [`Error::EntryNotLast`](crate::Error::EntryNotLast) if the entry is
    ///   followed by another entry.
    /// - I/O and codec errors, unmodified.
    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        let mut session = ArchiveSession::open(&self.archive)?;
        let mut entry = session.descriptor_for(&self.filename, self.method)?;
        session.check_appendable(&entry)?;

        let compressed = self
            .registry
            .get_or_create(&self.archive, &self.filename, self.method, self.level())?
            .compress(chunk)?;

        write_entry(
            &mut session,
            &mut entry,
            Some(chunk),
            &compressed,
            self.timestamp(),
        )?;
        session.commit()?;
        self.descriptor = Some(entry);
        Ok(())
    }

    /// Emits the final block of a BZip2 or LZMA entry.
    ///
    /// No-op for other methods, for a compressor that already finished and
    /// when no compressor is registered for the entry.
    pub fn flush(&mut self) -> Result<()> {
        if self.method.flush_kind() != FlushKind::Terminal || !self.has_live_compressor() {
            return Ok(());
        }
        let tail = {
            let mut adapter = self.registry.get_or_create(
                &self.archive,
                &self.filename,
                self.method,
                self.level(),
            )?;
            if adapter.is_finished() {
                log::debug!("'{}' already finished", self.filename);
                return Ok(());
            }
            adapter.finish()?
        };
        self.append_flushed(&tail)
    }

    /// Full-flushes a deflate entry so the data written so far decodes completely.
    ///
    /// No-op for other methods and when no compressor is registered for the entry.
    pub fn close(&mut self) -> Result<()> {
        if self.method.flush_kind() != FlushKind::Synchronizing || !self.has_live_compressor() {
            return Ok(());
        }
        let tail = self
            .registry
            .get_or_create(&self.archive, &self.filename, self.method, self.level())?
            .sync_flush()?;
        self.append_flushed(&tail)
    }

    /// Appends flush output, which carries no uncompressed bytes.
    fn append_flushed(&mut self, tail: &[u8]) -> Result<()> {
        if tail.is_empty() {
            return Ok(());
        }
        let mut session = ArchiveSession::open(&self.archive)?;
        let mut entry = session.descriptor_for(&self.filename, self.method)?;
        write_entry(&mut session, &mut entry, None, tail, self.timestamp())?;
        session.commit()?;
        self.descriptor = Some(entry);
        Ok(())
    }

    /// Returns true if the registry holds a compressor for this entry.
    fn has_live_compressor(&self) -> bool {
        let live = self.registry.contains(&self.archive, &self.filename);
        if !live {
            log::debug!("no live compressor for '{}', nothing to flush", self.filename);
        }
        live
    }

    fn level(&self) -> Option<u32> {
        Some(self.options.effective_level(self.method))
    }

    fn timestamp(&self) -> DosDateTime {
        self.options.modified.unwrap_or_else(DosDateTime::now)
    }
}
