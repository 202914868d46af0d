//! Reading ZIP archives back.
//!
//! The reader exists to check what the writer produced: it lists the central
//! directory, exposes raw local headers, and extracts entries while verifying
//! their CRC and size.
//!
//! # Example
//!
//! ```rust,no_run
//! use chunkzip::ZipReader;
//!
//! let mut archive = ZipReader::open("archive.zip")?;
//! for entry in archive.entries() {
//!     println!("{}: {} bytes", entry.name, entry.size);
//! }
//! let data = archive.read_entry("data.bin")?;
//! # let _ = data;
//! # Ok::<(), chunkzip::Error>(())
//! ```

mod entry;
mod info;

pub use entry::Entry;
pub use info::TestResult;

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::checksum::Crc32Writer;
use crate::codec::build_decoder;
use crate::format::{Directory, DirectoryTrailer, LocalFileHeader, read_directory};
use crate::{Error, Result};

/// A ZIP archive opened for reading.
pub struct ZipReader<R> {
    reader: R,
    directory: Directory,
    trailer: DirectoryTrailer,
}

impl<R> std::fmt::Debug for ZipReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipReader")
            .field("entries", &self.directory.len())
            .field("directory_offset", &self.trailer.offset)
            .finish_non_exhaustive()
    }
}

impl ZipReader<BufReader<File>> {
    /// Opens an archive from the filesystem.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek + Send> ZipReader<R> {
    /// Reads the central directory of `reader`.
    pub fn new(mut reader: R) -> Result<Self> {
        let (directory, trailer) = read_directory(&mut reader)?;
        Ok(Self {
            reader,
            directory,
            trailer,
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.directory.len()
    }

    /// Returns true if the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.directory.is_empty()
    }

    /// Raw archive comment.
    pub fn comment(&self) -> &[u8] {
        &self.trailer.comment
    }

    /// Offset of the central directory.
    pub fn directory_offset(&self) -> u64 {
        self.trailer.offset
    }

    /// Lists the entries in directory order.
    pub fn entries(&self) -> Vec<Entry> {
        self.directory.records().map(Entry::from_record).collect()
    }

    /// Looks up an entry by name.
    pub fn entry(&self, name: &str) -> Result<Entry> {
        self.directory
            .get(name)
            .map(Entry::from_record)
            .ok_or_else(|| Error::EntryNotFound {
                path: name.to_string(),
            })
    }

    /// Reads the local file header of an entry.
    pub fn local_header(&mut self, name: &str) -> Result<LocalFileHeader> {
        let entry = self.entry(name)?;
        self.reader.seek(SeekFrom::Start(entry.header_offset))?;
        LocalFileHeader::read_from(&mut self.reader, entry.header_offset)
    }

    /// Decompresses an entry into `sink`, verifying size and CRC.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// - [`Error::EntryNotFound`] if there is no such entry.
    /// - [`Error::SizeMismatch`] / [`Error::CrcMismatch`] if the data does not
    ///   match the directory.
    /// - I/O errors from truncated or corrupt compressed data.
    pub fn extract_to<W: Write>(&mut self, name: &str, sink: W) -> Result<u64> {
        let entry = self.entry(name)?;
        let method = entry.method()?;

        self.reader.seek(SeekFrom::Start(entry.header_offset))?;
        let header = LocalFileHeader::read_from(&mut self.reader, entry.header_offset)?;
        if header.compression_method != entry.method_id {
            return Err(Error::corrupt(
                entry.header_offset,
                format!(
                    "local header method {} disagrees with directory method {}",
                    header.compression_method, entry.method_id
                ),
            ));
        }

        let input = (&mut self.reader).take(entry.compressed_size);
        // One byte past the recorded size is enough to detect overlong data.
        let mut decoder = build_decoder(input, method, entry.size)?.take(entry.size + 1);
        let mut writer = Crc32Writer::new(sink);
        let written = io::copy(&mut decoder, &mut writer)?;

        if written != entry.size {
            return Err(Error::SizeMismatch {
                entry_name: entry.name,
                expected: entry.size,
                actual: written,
            });
        }
        if writer.crc() != entry.crc32 {
            return Err(Error::CrcMismatch {
                entry_name: entry.name,
                expected: entry.crc32,
                actual: writer.crc(),
            });
        }
        Ok(written)
    }

    /// Decompresses an entry into memory, verifying size and CRC.
    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.extract_to(name, &mut out)?;
        Ok(out)
    }

    /// Decompresses every entry and checks it against the directory.
    pub fn verify_all(&mut self) -> Result<TestResult> {
        let mut result = TestResult::default();
        let names: Vec<String> = self.directory.names().map(str::to_string).collect();

        for name in names {
            result.entries_tested += 1;
            match self.extract_to(&name, io::sink()) {
                Ok(_) => result.entries_passed += 1,
                Err(e) => {
                    log::debug!("'{}' failed verification: {}", name, e);
                    result.entries_failed += 1;
                    result.failures.push((name, e.to_string()));
                }
            }
        }
        Ok(result)
    }
}
