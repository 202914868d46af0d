//! Central directory model, parser and writer.
//!
//! The directory is kept as an ordered map from entry name to its central
//! record. Replacing an entry is a pure transformation: [`Directory::with_entry`]
//! consumes the map and returns the updated one.

use std::io::{Read, Seek, SeekFrom, Write};

use indexmap::IndexMap;

use super::header::{
    CentralDirectoryRecord, EndOfCentralDirectory, Zip64EndOfCentralDirectory, Zip64Locator,
};
use super::{MAX_COMMENT_LEN, ZIP64_LIMIT, ZIP64_SENTINEL_16, ZIP64_SENTINEL_32, version};
use crate::{Error, Result};

/// Ordered listing of the archive's entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    entries: IndexMap<String, CentralDirectoryRecord>,
}

impl Directory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a directory from records in archive order.
    ///
    /// When a name appears more than once only the last record is kept.
    pub fn from_records(records: impl IntoIterator<Item = CentralDirectoryRecord>) -> Self {
        let mut entries = IndexMap::new();
        for record in records {
            let name = record.name();
            if entries.shift_remove(&name).is_some() {
                log::warn!("dropping stale duplicate directory entry '{}'", name);
            }
            entries.insert(name, record);
        }
        Self { entries }
    }

    /// Returns the directory with `record` replacing any entry of the same name.
    ///
    /// The record is moved to the end of the listing.
    pub fn with_entry(mut self, record: CentralDirectoryRecord) -> Self {
        let name = record.name();
        self.entries.shift_remove(&name);
        self.entries.insert(name, record);
        self
    }

    /// Returns the record for `name`.
    pub fn get(&self, name: &str) -> Option<&CentralDirectoryRecord> {
        self.entries.get(name)
    }

    /// Returns true if an entry named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the directory has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the records in directory order.
    pub fn records(&self) -> impl Iterator<Item = &CentralDirectoryRecord> {
        self.entries.values()
    }

    /// Iterates over the entry names in directory order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns true if some entry other than `name` has its local header past
    /// `offset`.
    pub fn has_entry_after(&self, name: &str, offset: u64) -> bool {
        self.entries
            .iter()
            .any(|(other, record)| other != name && record.header_offset64() > offset)
    }

    /// Encoded size of all central records.
    pub fn encoded_len(&self) -> u64 {
        self.records().map(CentralDirectoryRecord::encoded_len).sum()
    }
}

/// Location of the central directory and the archive comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryTrailer {
    /// Offset of the first central record.
    pub offset: u64,
    /// Size of the central directory in bytes.
    pub size: u64,
    /// Raw archive comment.
    pub comment: Vec<u8>,
}

/// Reads the central directory of an archive.
pub fn read_directory<R: Read + Seek>(reader: &mut R) -> Result<(Directory, DirectoryTrailer)> {
    let file_len = reader.seek(SeekFrom::End(0))?;
    if file_len < EndOfCentralDirectory::FIXED_SIZE as u64 {
        return Err(Error::InvalidFormat(format!(
            "file is too small to be a ZIP archive ({} bytes)",
            file_len
        )));
    }

    let (eocd_pos, eocd) = find_end_record(reader, file_len)?;

    let (count, size, offset) = match read_zip64_record(reader, eocd_pos)? {
        Some(zip64) => (
            zip64.entries_total,
            zip64.directory_size,
            zip64.directory_offset,
        ),
        None => {
            if eocd.needs_zip64_record() {
                // Exactly 65535 entries is legal without zip64; bad offsets fail below.
                log::warn!(
                    "end record at {:#x} has zip64 sentinels but no zip64 record",
                    eocd_pos
                );
            }
            (
                u64::from(eocd.entries_total),
                u64::from(eocd.directory_size),
                u64::from(eocd.directory_offset),
            )
        }
    };

    if offset.checked_add(size).is_none_or(|end| end > eocd_pos) {
        return Err(Error::corrupt(
            eocd_pos,
            format!(
                "central directory ({} bytes at {:#x}) overlaps end record",
                size, offset
            ),
        ));
    }

    let mut buf = vec![0u8; size as usize];
    reader.seek(SeekFrom::Start(offset))?;
    reader.read_exact(&mut buf)?;

    let mut records = Vec::new();
    let mut pos = 0usize;
    while pos < buf.len() {
        let (record, used) = CentralDirectoryRecord::parse(&buf[pos..], offset + pos as u64)?;
        records.push(record);
        pos += used;
    }
    if records.len() as u64 != count {
        log::warn!(
            "end record declares {} entries, directory holds {}",
            count,
            records.len()
        );
    }

    let trailer = DirectoryTrailer {
        offset,
        size,
        comment: eocd.comment,
    };
    Ok((Directory::from_records(records), trailer))
}

/// Scans backwards from the end of the file for the end of central directory record.
fn find_end_record<R: Read + Seek>(
    reader: &mut R,
    file_len: u64,
) -> Result<(u64, EndOfCentralDirectory)> {
    let fixed = EndOfCentralDirectory::FIXED_SIZE;
    let window = file_len.min((fixed + MAX_COMMENT_LEN) as u64);
    let start = file_len - window;

    let mut tail = vec![0u8; window as usize];
    reader.seek(SeekFrom::Start(start))?;
    reader.read_exact(&mut tail)?;

    let signature = super::signature::END_OF_CENTRAL_DIRECTORY.to_le_bytes();
    for pos in (0..=tail.len() - fixed).rev() {
        if tail[pos..pos + 4] != signature {
            continue;
        }
        let comment_len = u16::from_le_bytes([tail[pos + 20], tail[pos + 21]]) as usize;
        if pos + fixed + comment_len > tail.len() {
            continue;
        }
        let eocd = EndOfCentralDirectory::parse(&tail[pos..], start + pos as u64)?;
        return Ok((start + pos as u64, eocd));
    }

    Err(Error::InvalidFormat(
        "end of central directory record not found".into(),
    ))
}

/// Follows the zip64 locator preceding the end record, if there is one.
fn read_zip64_record<R: Read + Seek>(
    reader: &mut R,
    eocd_pos: u64,
) -> Result<Option<Zip64EndOfCentralDirectory>> {
    if eocd_pos < Zip64Locator::SIZE as u64 {
        return Ok(None);
    }

    let mut buf = [0u8; Zip64Locator::SIZE];
    reader.seek(SeekFrom::Start(eocd_pos - Zip64Locator::SIZE as u64))?;
    reader.read_exact(&mut buf)?;
    let Some(locator) = Zip64Locator::parse(&buf) else {
        return Ok(None);
    };

    let mut record = [0u8; Zip64EndOfCentralDirectory::FIXED_SIZE];
    reader.seek(SeekFrom::Start(locator.record_offset))?;
    reader.read_exact(&mut record)?;
    Zip64EndOfCentralDirectory::parse(&record, locator.record_offset).map(Some)
}

/// Writes the central directory and end records at the writer's position.
///
/// `offset` must be the writer's current position. Returns the offset just
/// past the end record.
pub fn write_directory<W: Write>(
    writer: &mut W,
    directory: &Directory,
    offset: u64,
    comment: &[u8],
) -> Result<u64> {
    let mut encoded = Vec::with_capacity(directory.encoded_len() as usize);
    for record in directory.records() {
        record.write_to(&mut encoded)?;
    }
    writer.write_all(&encoded)?;

    let count = directory.len() as u64;
    let size = encoded.len() as u64;
    let mut end = offset + size;

    if count > u64::from(ZIP64_SENTINEL_16) || offset > ZIP64_LIMIT || size > ZIP64_LIMIT {
        log::trace!("writing zip64 end records at {:#x}", end);
        let record = Zip64EndOfCentralDirectory {
            version_made_by: version::ZIP64,
            version_needed: version::ZIP64,
            disk_number: 0,
            directory_disk: 0,
            entries_on_disk: count,
            entries_total: count,
            directory_size: size,
            directory_offset: offset,
        };
        record.write_to(writer)?;
        Zip64Locator {
            record_disk: 0,
            record_offset: end,
            total_disks: 1,
        }
        .write_to(writer)?;
        end += (Zip64EndOfCentralDirectory::FIXED_SIZE + Zip64Locator::SIZE) as u64;
    }

    let comment = &comment[..comment.len().min(MAX_COMMENT_LEN)];
    let entries = count.min(u64::from(ZIP64_SENTINEL_16)) as u16;
    let eocd = EndOfCentralDirectory {
        disk_number: 0,
        directory_disk: 0,
        entries_on_disk: entries,
        entries_total: entries,
        directory_size: size.min(u64::from(ZIP64_SENTINEL_32)) as u32,
        directory_offset: offset.min(u64::from(ZIP64_SENTINEL_32)) as u32,
        comment: comment.to_vec(),
    };
    eocd.write_to(writer)?;
    end += (EndOfCentralDirectory::FIXED_SIZE + comment.len()) as u64;

    Ok(end)
}
