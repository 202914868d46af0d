//! Entry metadata as listed in the central directory.

use crate::codec::CompressionMethod;
use crate::format::CentralDirectoryRecord;
use crate::timestamp::DosDateTime;
use crate::Result;

/// An entry in a ZIP archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Name of the entry inside the archive.
    pub name: String,
    /// ZIP compression method id.
    pub method_id: u16,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// Size of the entry's data region.
    pub compressed_size: u64,
    /// Offset of the local file header.
    pub header_offset: u64,
    /// Last modification time.
    pub modified: DosDateTime,
    /// Whether any field is stored in a zip64 extra field.
    pub is_zip64: bool,
}

impl Entry {
    pub(crate) fn from_record(record: &CentralDirectoryRecord) -> Self {
        Self {
            name: record.name(),
            method_id: record.compression_method,
            crc32: record.crc32,
            size: record.uncompressed_size64(),
            compressed_size: record.compressed_size64(),
            header_offset: record.header_offset64(),
            modified: record.modified,
            is_zip64: record.is_zip64(),
        }
    }

    /// Returns the entry's compression method.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMethod`](crate::Error::UnsupportedMethod) for
    /// methods this crate does not know.
    pub fn method(&self) -> Result<CompressionMethod> {
        CompressionMethod::from_zip_id(self.method_id)
    }

    /// Compressed size as a fraction of the uncompressed size.
    pub fn compression_ratio(&self) -> f64 {
        if self.size == 0 {
            return 1.0;
        }
        self.compressed_size as f64 / self.size as f64
    }
}
