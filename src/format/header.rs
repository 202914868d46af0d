//! ZIP record layouts.
//!
//! Every record keeps its 32-bit and 16-bit fields exactly as stored so that
//! records belonging to other entries can be written back byte-for-byte.
//! Values that may live in the zip64 extra field are resolved through the
//! `*64` accessors.

use std::io::{self, Read, Write};

use super::{ZIP64_SENTINEL_16, ZIP64_SENTINEL_32, extra_id, signature};
use crate::timestamp::DosDateTime;
use crate::{Error, Result};

fn le_u16(buf: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([buf[pos], buf[pos + 1]])
}

fn le_u32(buf: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([buf[pos], buf[pos + 1], buf[pos + 2], buf[pos + 3]])
}

fn le_u64(buf: &[u8], pos: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[pos..pos + 8]);
    u64::from_le_bytes(bytes)
}

/// Zip64 extended information extra field (header id `0x0001`).
///
/// Only the values whose 32-bit counterpart holds the sentinel are present,
/// in the fixed order uncompressed size, compressed size, header offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Zip64ExtraField {
    /// Uncompressed size.
    pub uncompressed_size: Option<u64>,
    /// Compressed size.
    pub compressed_size: Option<u64>,
    /// Offset of the local file header.
    pub header_offset: Option<u64>,
}

impl Zip64ExtraField {
    /// Returns true when no value is present.
    pub fn is_empty(&self) -> bool {
        self.uncompressed_size.is_none()
            && self.compressed_size.is_none()
            && self.header_offset.is_none()
    }

    /// Encodes the field including its 4-byte id/length prefix.
    pub fn encode(&self) -> Vec<u8> {
        let values: Vec<u64> = [
            self.uncompressed_size,
            self.compressed_size,
            self.header_offset,
        ]
        .into_iter()
        .flatten()
        .collect();

        let mut out = Vec::with_capacity(4 + values.len() * 8);
        out.extend_from_slice(&extra_id::ZIP64.to_le_bytes());
        out.extend_from_slice(&((values.len() * 8) as u16).to_le_bytes());
        for value in values {
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }

    /// Finds the zip64 field in an extra-field block and reads the flagged values.
    ///
    /// Returns `None` if the block has no zip64 field.
    pub fn parse(
        extra: &[u8],
        has_uncompressed: bool,
        has_compressed: bool,
        has_offset: bool,
    ) -> Option<Self> {
        let mut pos = 0;
        while pos + 4 <= extra.len() {
            let id = le_u16(extra, pos);
            let size = le_u16(extra, pos + 2) as usize;
            let start = pos + 4;
            let end = (start + size).min(extra.len());

            if id == extra_id::ZIP64 {
                let data = &extra[start..end];
                let mut cursor = 0;
                let mut take = |present: bool| {
                    if present && cursor + 8 <= data.len() {
                        let value = le_u64(data, cursor);
                        cursor += 8;
                        Some(value)
                    } else {
                        None
                    }
                };
                let uncompressed_size = take(has_uncompressed);
                let compressed_size = take(has_compressed);
                let header_offset = take(has_offset);
                return Some(Self {
                    uncompressed_size,
                    compressed_size,
                    header_offset,
                });
            }

            pos = start + size;
        }
        None
    }
}

/// Local file header, immediately followed by the entry's data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileHeader {
    /// Version needed to extract.
    pub version_needed: u16,
    /// General purpose bit flag.
    pub flags: u16,
    /// ZIP compression method id.
    pub compression_method: u16,
    /// Last modification time.
    pub modified: DosDateTime,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Compressed size (or the zip64 sentinel).
    pub compressed_size: u32,
    /// Uncompressed size (or the zip64 sentinel).
    pub uncompressed_size: u32,
    /// Raw file name bytes.
    pub file_name: Vec<u8>,
    /// Raw extra field block.
    pub extra_field: Vec<u8>,
}

impl LocalFileHeader {
    /// Size of the fixed part, including the signature.
    pub const FIXED_SIZE: usize = 30;

    /// Total encoded length of the header.
    pub fn encoded_len(&self) -> u64 {
        (Self::FIXED_SIZE + self.file_name.len() + self.extra_field.len()) as u64
    }

    /// Returns true if the sizes are stored in a zip64 extra field.
    pub fn is_zip64(&self) -> bool {
        self.compressed_size == ZIP64_SENTINEL_32 || self.uncompressed_size == ZIP64_SENTINEL_32
    }

    /// Uncompressed size, resolved through the zip64 extra field.
    pub fn uncompressed_size64(&self) -> u64 {
        self.zip64()
            .and_then(|z| z.uncompressed_size)
            .unwrap_or(u64::from(self.uncompressed_size))
    }

    /// Compressed size, resolved through the zip64 extra field.
    pub fn compressed_size64(&self) -> u64 {
        self.zip64()
            .and_then(|z| z.compressed_size)
            .unwrap_or(u64::from(self.compressed_size))
    }

    fn zip64(&self) -> Option<Zip64ExtraField> {
        if !self.is_zip64() {
            return None;
        }
        // Local headers always carry both sizes in the zip64 field.
        Zip64ExtraField::parse(&self.extra_field, true, true, false)
    }

    /// Encodes the header.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len() as usize);
        out.extend_from_slice(&signature::LOCAL_FILE_HEADER.to_le_bytes());
        out.extend_from_slice(&self.version_needed.to_le_bytes());
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&self.compression_method.to_le_bytes());
        out.extend_from_slice(&self.modified.time.to_le_bytes());
        out.extend_from_slice(&self.modified.date.to_le_bytes());
        out.extend_from_slice(&self.crc32.to_le_bytes());
        out.extend_from_slice(&self.compressed_size.to_le_bytes());
        out.extend_from_slice(&self.uncompressed_size.to_le_bytes());
        out.extend_from_slice(&(self.file_name.len() as u16).to_le_bytes());
        out.extend_from_slice(&(self.extra_field.len() as u16).to_le_bytes());
        out.extend_from_slice(&self.file_name);
        out.extend_from_slice(&self.extra_field);
        out
    }

    /// Reads a header located at `offset`; `offset` is only used for error reporting.
    pub fn read_from<R: Read>(reader: &mut R, offset: u64) -> Result<Self> {
        let mut fixed = [0u8; Self::FIXED_SIZE];
        reader.read_exact(&mut fixed)?;

        let sig = le_u32(&fixed, 0);
        if sig != signature::LOCAL_FILE_HEADER {
            return Err(Error::corrupt(
                offset,
                format!("expected local file header signature, found {:#010x}", sig),
            ));
        }

        let name_len = le_u16(&fixed, 26) as usize;
        let extra_len = le_u16(&fixed, 28) as usize;
        let mut file_name = vec![0u8; name_len];
        reader.read_exact(&mut file_name)?;
        let mut extra_field = vec![0u8; extra_len];
        reader.read_exact(&mut extra_field)?;

        Ok(Self {
            version_needed: le_u16(&fixed, 4),
            flags: le_u16(&fixed, 6),
            compression_method: le_u16(&fixed, 8),
            modified: DosDateTime::from_parts(le_u16(&fixed, 12), le_u16(&fixed, 10)),
            crc32: le_u32(&fixed, 14),
            compressed_size: le_u32(&fixed, 18),
            uncompressed_size: le_u32(&fixed, 22),
            file_name,
            extra_field,
        })
    }
}

/// Central directory file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryRecord {
    /// Version made by.
    pub version_made_by: u16,
    /// Version needed to extract.
    pub version_needed: u16,
    /// General purpose bit flag.
    pub flags: u16,
    /// ZIP compression method id.
    pub compression_method: u16,
    /// Last modification time.
    pub modified: DosDateTime,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Compressed size (or the zip64 sentinel).
    pub compressed_size: u32,
    /// Uncompressed size (or the zip64 sentinel).
    pub uncompressed_size: u32,
    /// Disk number where the entry starts.
    pub disk_start: u16,
    /// Internal file attributes.
    pub internal_attrs: u16,
    /// External file attributes.
    pub external_attrs: u32,
    /// Offset of the local header (or the zip64 sentinel).
    pub header_offset: u32,
    /// Raw file name bytes.
    pub file_name: Vec<u8>,
    /// Raw extra field block.
    pub extra_field: Vec<u8>,
    /// Raw file comment bytes.
    pub comment: Vec<u8>,
}

impl CentralDirectoryRecord {
    /// Size of the fixed part, including the signature.
    pub const FIXED_SIZE: usize = 46;

    /// Total encoded length of the record.
    pub fn encoded_len(&self) -> u64 {
        (Self::FIXED_SIZE + self.file_name.len() + self.extra_field.len() + self.comment.len())
            as u64
    }

    /// Returns the entry name.
    ///
    /// Names that are not valid UTF-8 are decoded lossily.
    pub fn name(&self) -> String {
        String::from_utf8_lossy(&self.file_name).into_owned()
    }

    fn zip64(&self) -> Zip64ExtraField {
        Zip64ExtraField::parse(
            &self.extra_field,
            self.uncompressed_size == ZIP64_SENTINEL_32,
            self.compressed_size == ZIP64_SENTINEL_32,
            self.header_offset == ZIP64_SENTINEL_32,
        )
        .unwrap_or_default()
    }

    /// Uncompressed size, resolved through the zip64 extra field.
    pub fn uncompressed_size64(&self) -> u64 {
        self.zip64()
            .uncompressed_size
            .unwrap_or(u64::from(self.uncompressed_size))
    }

    /// Compressed size, resolved through the zip64 extra field.
    pub fn compressed_size64(&self) -> u64 {
        self.zip64()
            .compressed_size
            .unwrap_or(u64::from(self.compressed_size))
    }

    /// Local header offset, resolved through the zip64 extra field.
    pub fn header_offset64(&self) -> u64 {
        self.zip64()
            .header_offset
            .unwrap_or(u64::from(self.header_offset))
    }

    /// Returns true if any value is stored in the zip64 extra field.
    pub fn is_zip64(&self) -> bool {
        !self.zip64().is_empty()
    }

    /// Writes the record.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut fixed = Vec::with_capacity(Self::FIXED_SIZE);
        fixed.extend_from_slice(&signature::CENTRAL_DIRECTORY.to_le_bytes());
        fixed.extend_from_slice(&self.version_made_by.to_le_bytes());
        fixed.extend_from_slice(&self.version_needed.to_le_bytes());
        fixed.extend_from_slice(&self.flags.to_le_bytes());
        fixed.extend_from_slice(&self.compression_method.to_le_bytes());
        fixed.extend_from_slice(&self.modified.time.to_le_bytes());
        fixed.extend_from_slice(&self.modified.date.to_le_bytes());
        fixed.extend_from_slice(&self.crc32.to_le_bytes());
        fixed.extend_from_slice(&self.compressed_size.to_le_bytes());
        fixed.extend_from_slice(&self.uncompressed_size.to_le_bytes());
        fixed.extend_from_slice(&(self.file_name.len() as u16).to_le_bytes());
        fixed.extend_from_slice(&(self.extra_field.len() as u16).to_le_bytes());
        fixed.extend_from_slice(&(self.comment.len() as u16).to_le_bytes());
        fixed.extend_from_slice(&self.disk_start.to_le_bytes());
        fixed.extend_from_slice(&self.internal_attrs.to_le_bytes());
        fixed.extend_from_slice(&self.external_attrs.to_le_bytes());
        fixed.extend_from_slice(&self.header_offset.to_le_bytes());

        writer.write_all(&fixed)?;
        writer.write_all(&self.file_name)?;
        writer.write_all(&self.extra_field)?;
        writer.write_all(&self.comment)
    }

    /// Parses one record from the start of `buf`.
    ///
    /// Returns the record and the number of bytes it occupied. `offset` is the
    /// archive position of `buf[0]`, used for error reporting.
    pub fn parse(buf: &[u8], offset: u64) -> Result<(Self, usize)> {
        if buf.len() < Self::FIXED_SIZE {
            return Err(Error::corrupt(offset, "truncated central directory record"));
        }

        let sig = le_u32(buf, 0);
        if sig != signature::CENTRAL_DIRECTORY {
            return Err(Error::corrupt(
                offset,
                format!("expected central directory signature, found {:#010x}", sig),
            ));
        }

        let name_len = le_u16(buf, 28) as usize;
        let extra_len = le_u16(buf, 30) as usize;
        let comment_len = le_u16(buf, 32) as usize;
        let total = Self::FIXED_SIZE + name_len + extra_len + comment_len;
        if buf.len() < total {
            return Err(Error::corrupt(offset, "central directory record overruns directory"));
        }

        let name_start = Self::FIXED_SIZE;
        let extra_start = name_start + name_len;
        let comment_start = extra_start + extra_len;

        let record = Self {
            version_made_by: le_u16(buf, 4),
            version_needed: le_u16(buf, 6),
            flags: le_u16(buf, 8),
            compression_method: le_u16(buf, 10),
            modified: DosDateTime::from_parts(le_u16(buf, 14), le_u16(buf, 12)),
            crc32: le_u32(buf, 16),
            compressed_size: le_u32(buf, 20),
            uncompressed_size: le_u32(buf, 24),
            disk_start: le_u16(buf, 34),
            internal_attrs: le_u16(buf, 36),
            external_attrs: le_u32(buf, 38),
            header_offset: le_u32(buf, 42),
            file_name: buf[name_start..extra_start].to_vec(),
            extra_field: buf[extra_start..comment_start].to_vec(),
            comment: buf[comment_start..total].to_vec(),
        };
        Ok((record, total))
    }
}

/// Classic end of central directory record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    /// Number of this disk.
    pub disk_number: u16,
    /// Disk where the central directory starts.
    pub directory_disk: u16,
    /// Entries on this disk.
    pub entries_on_disk: u16,
    /// Total entries.
    pub entries_total: u16,
    /// Size of the central directory.
    pub directory_size: u32,
    /// Offset of the central directory.
    pub directory_offset: u32,
    /// Archive comment.
    pub comment: Vec<u8>,
}

impl EndOfCentralDirectory {
    /// Size of the fixed part, including the signature.
    pub const FIXED_SIZE: usize = 22;

    /// Parses the record from the start of `buf`.
    pub fn parse(buf: &[u8], offset: u64) -> Result<Self> {
        if buf.len() < Self::FIXED_SIZE || le_u32(buf, 0) != signature::END_OF_CENTRAL_DIRECTORY {
            return Err(Error::corrupt(offset, "invalid end of central directory record"));
        }
        let comment_len = le_u16(buf, 20) as usize;
        let comment_end = (Self::FIXED_SIZE + comment_len).min(buf.len());

        Ok(Self {
            disk_number: le_u16(buf, 4),
            directory_disk: le_u16(buf, 6),
            entries_on_disk: le_u16(buf, 8),
            entries_total: le_u16(buf, 10),
            directory_size: le_u32(buf, 12),
            directory_offset: le_u32(buf, 16),
            comment: buf[Self::FIXED_SIZE..comment_end].to_vec(),
        })
    }

    /// Returns true if any field defers to the zip64 record.
    pub fn needs_zip64_record(&self) -> bool {
        self.entries_total == ZIP64_SENTINEL_16
            || self.directory_size == ZIP64_SENTINEL_32
            || self.directory_offset == ZIP64_SENTINEL_32
    }

    /// Writes the record.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&signature::END_OF_CENTRAL_DIRECTORY.to_le_bytes())?;
        writer.write_all(&self.disk_number.to_le_bytes())?;
        writer.write_all(&self.directory_disk.to_le_bytes())?;
        writer.write_all(&self.entries_on_disk.to_le_bytes())?;
        writer.write_all(&self.entries_total.to_le_bytes())?;
        writer.write_all(&self.directory_size.to_le_bytes())?;
        writer.write_all(&self.directory_offset.to_le_bytes())?;
        writer.write_all(&(self.comment.len() as u16).to_le_bytes())?;
        writer.write_all(&self.comment)
    }
}

/// Zip64 end of central directory record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Zip64EndOfCentralDirectory {
    /// Version made by.
    pub version_made_by: u16,
    /// Version needed to extract.
    pub version_needed: u16,
    /// Number of this disk.
    pub disk_number: u32,
    /// Disk where the central directory starts.
    pub directory_disk: u32,
    /// Entries on this disk.
    pub entries_on_disk: u64,
    /// Total entries.
    pub entries_total: u64,
    /// Size of the central directory.
    pub directory_size: u64,
    /// Offset of the central directory.
    pub directory_offset: u64,
}

impl Zip64EndOfCentralDirectory {
    /// Size of the record without extensible data, including the signature.
    pub const FIXED_SIZE: usize = 56;

    /// Parses the record from the start of `buf`.
    pub fn parse(buf: &[u8], offset: u64) -> Result<Self> {
        if buf.len() < Self::FIXED_SIZE
            || le_u32(buf, 0) != signature::ZIP64_END_OF_CENTRAL_DIRECTORY
        {
            return Err(Error::corrupt(offset, "invalid zip64 end of central directory record"));
        }
        Ok(Self {
            version_made_by: le_u16(buf, 12),
            version_needed: le_u16(buf, 14),
            disk_number: le_u32(buf, 16),
            directory_disk: le_u32(buf, 20),
            entries_on_disk: le_u64(buf, 24),
            entries_total: le_u64(buf, 32),
            directory_size: le_u64(buf, 40),
            directory_offset: le_u64(buf, 48),
        })
    }

    /// Writes the record.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&signature::ZIP64_END_OF_CENTRAL_DIRECTORY.to_le_bytes())?;
        // Size of the remaining record, excluding signature and this field.
        writer.write_all(&((Self::FIXED_SIZE - 12) as u64).to_le_bytes())?;
        writer.write_all(&self.version_made_by.to_le_bytes())?;
        writer.write_all(&self.version_needed.to_le_bytes())?;
        writer.write_all(&self.disk_number.to_le_bytes())?;
        writer.write_all(&self.directory_disk.to_le_bytes())?;
        writer.write_all(&self.entries_on_disk.to_le_bytes())?;
        writer.write_all(&self.entries_total.to_le_bytes())?;
        writer.write_all(&self.directory_size.to_le_bytes())?;
        writer.write_all(&self.directory_offset.to_le_bytes())
    }
}

/// Zip64 end of central directory locator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Zip64Locator {
    /// Disk holding the zip64 record.
    pub record_disk: u32,
    /// Offset of the zip64 record.
    pub record_offset: u64,
    /// Total number of disks.
    pub total_disks: u32,
}

impl Zip64Locator {
    /// Size of the locator, including the signature.
    pub const SIZE: usize = 20;

    /// Parses a locator, returning `None` if `buf` does not start with one.
    pub fn parse(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::SIZE || le_u32(buf, 0) != signature::ZIP64_LOCATOR {
            return None;
        }
        Some(Self {
            record_disk: le_u32(buf, 4),
            record_offset: le_u64(buf, 8),
            total_disks: le_u32(buf, 16),
        })
    }

    /// Writes the locator.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&signature::ZIP64_LOCATOR.to_le_bytes())?;
        writer.write_all(&self.record_disk.to_le_bytes())?;
        writer.write_all(&self.record_offset.to_le_bytes())?;
        writer.write_all(&self.total_disks.to_le_bytes())
    }
}
