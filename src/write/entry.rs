//! Entry descriptor: the mutable state of the entry being appended.

use crate::checksum::{Crc32, EMPTY_CRC32};
use crate::codec::CompressionMethod;
use crate::format::{
    CentralDirectoryRecord, LocalFileHeader, ZIP64_LIMIT, ZIP64_SENTINEL_32, Zip64ExtraField,
    flags, version,
};
use crate::timestamp::DosDateTime;
use crate::Result;

/// Unix permissions recorded for new entries (regular file, rw-r--r--).
const DEFAULT_UNIX_MODE: u32 = 0o100644;

/// In-memory mirror of one entry's directory fields.
///
/// The descriptor is rebuilt from the archive on every write call, either from
/// the existing central record ([`load`](Self::load)) or from scratch
/// ([`fresh`](Self::fresh)).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDescriptor {
    /// Name of the entry inside the archive.
    pub filename: String,
    /// Compression method, fixed for the entry's lifetime.
    pub method: CompressionMethod,
    /// Last modification time.
    pub modified: DosDateTime,
    /// CRC-32 of all uncompressed bytes fed so far.
    pub crc32: u32,
    /// Number of uncompressed bytes fed so far.
    pub uncompressed_size: u64,
    /// Number of bytes in the entry's data region.
    pub compressed_size: u64,
    /// Offset of the local file header.
    pub header_offset: u64,
    external_attrs: u32,
    comment: Vec<u8>,
}

impl EntryDescriptor {
    /// Creates a descriptor for a new entry whose header goes at `header_offset`.
    pub fn fresh(filename: impl Into<String>, method: CompressionMethod, header_offset: u64) -> Self {
        Self {
            filename: filename.into(),
            method,
            modified: DosDateTime::now(),
            crc32: EMPTY_CRC32,
            uncompressed_size: 0,
            compressed_size: 0,
            header_offset,
            external_attrs: DEFAULT_UNIX_MODE << 16,
            comment: Vec::new(),
        }
    }

    /// Rebuilds the descriptor of an existing entry from its central record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMethod`](crate::Error::UnsupportedMethod) if
    /// the entry uses a method this crate cannot write.
    pub fn load(record: &CentralDirectoryRecord) -> Result<Self> {
        Ok(Self {
            filename: record.name(),
            method: CompressionMethod::from_zip_id(record.compression_method)?,
            modified: record.modified,
            crc32: record.crc32,
            uncompressed_size: record.uncompressed_size64(),
            compressed_size: record.compressed_size64(),
            header_offset: record.header_offset64(),
            external_attrs: record.external_attrs,
            comment: record.comment.clone(),
        })
    }

    /// Returns true once the uncompressed size, with a 5% margin, passes
    /// [`ZIP64_LIMIT`].
    pub fn needs_zip64(&self) -> bool {
        u128::from(self.uncompressed_size) * 105 > u128::from(ZIP64_LIMIT) * 100
    }

    /// Returns true if the local header has to use the zip64 form.
    ///
    /// Poorly compressible data can outgrow its input, so the compressed size
    /// is checked as well.
    pub fn needs_local_zip64(&self) -> bool {
        self.needs_zip64() || self.compressed_size > ZIP64_LIMIT
    }

    /// Refreshes the modification time.
    pub fn touch(&mut self, modified: DosDateTime) {
        self.modified = modified;
    }

    /// Accounts for one write: `chunk` fed to the compressor (if any) and
    /// `compressed_len` bytes appended to the data region.
    pub fn record(&mut self, chunk: Option<&[u8]>, compressed_len: u64) {
        self.compressed_size += compressed_len;
        if let Some(chunk) = chunk {
            self.uncompressed_size += chunk.len() as u64;
            self.crc32 = Crc32::extend(self.crc32, chunk);
        }
    }

    fn general_flags(&self) -> u16 {
        let utf8 = if self.filename.is_ascii() { 0 } else { flags::UTF8 };
        self.method.flags() | utf8
    }

    fn version_needed(&self, zip64: bool) -> u16 {
        if zip64 {
            self.method.version_needed().max(version::ZIP64)
        } else {
            self.method.version_needed()
        }
    }

    /// Builds the local header, in zip64 form when `zip64` is set.
    pub fn local_header(&self, zip64: bool) -> LocalFileHeader {
        let (compressed_size, uncompressed_size, extra_field) = if zip64 {
            let extra = Zip64ExtraField {
                uncompressed_size: Some(self.uncompressed_size),
                compressed_size: Some(self.compressed_size),
                header_offset: None,
            };
            (ZIP64_SENTINEL_32, ZIP64_SENTINEL_32, extra.encode())
        } else {
            (
                self.compressed_size as u32,
                self.uncompressed_size as u32,
                Vec::new(),
            )
        };

        LocalFileHeader {
            version_needed: self.version_needed(zip64),
            flags: self.general_flags(),
            compression_method: self.method.zip_id(),
            modified: self.modified,
            crc32: self.crc32,
            compressed_size,
            uncompressed_size,
            file_name: self.filename.as_bytes().to_vec(),
            extra_field,
        }
    }

    /// Builds the central directory record.
    ///
    /// Sizes and the header offset move into the zip64 extra field when they
    /// pass [`ZIP64_LIMIT`].
    pub fn central_record(&self) -> CentralDirectoryRecord {
        let mut zip64 = Zip64ExtraField::default();
        let mut compressed_size = self.compressed_size as u32;
        let mut uncompressed_size = self.uncompressed_size as u32;
        let mut header_offset = self.header_offset as u32;

        if self.uncompressed_size > ZIP64_LIMIT || self.compressed_size > ZIP64_LIMIT {
            zip64.uncompressed_size = Some(self.uncompressed_size);
            zip64.compressed_size = Some(self.compressed_size);
            compressed_size = ZIP64_SENTINEL_32;
            uncompressed_size = ZIP64_SENTINEL_32;
        }
        if self.header_offset > ZIP64_LIMIT {
            zip64.header_offset = Some(self.header_offset);
            header_offset = ZIP64_SENTINEL_32;
        }

        let is_zip64 = !zip64.is_empty();
        let version_needed = self.version_needed(is_zip64);
        CentralDirectoryRecord {
            version_made_by: version::MADE_BY_UNIX | version_needed,
            version_needed,
            flags: self.general_flags(),
            compression_method: self.method.zip_id(),
            modified: self.modified,
            crc32: self.crc32,
            compressed_size,
            uncompressed_size,
            disk_start: 0,
            internal_attrs: 0,
            external_attrs: self.external_attrs,
            header_offset,
            file_name: self.filename.as_bytes().to_vec(),
            extra_field: if is_zip64 { zip64.encode() } else { Vec::new() },
            comment: self.comment.clone(),
        }
    }
}
