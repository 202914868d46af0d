//! In-place mutation of an archive.
//!
//! An [`ArchiveSession`] holds the archive open for a single write call. It
//! loads the directory up front, lets [`write_entry`] grow one entry, and
//! rewrites the central directory right after the entry's data when it is
//! committed. Dropping a session commits it.
//!
//! Each write touches the file in this order:
//!
//! 1. the local header at `header_offset`, still carrying the previous sizes
//! 2. the new compressed bytes, right after the bytes already in the data region
//! 3. the local header again, now with the updated sizes and CRC
//! 4. on commit, the central directory and end records, followed by truncation

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::entry::EntryDescriptor;
use crate::codec::CompressionMethod;
use crate::format::{Directory, DirectoryTrailer, LocalFileHeader, read_directory, write_directory};
use crate::timestamp::DosDateTime;
use crate::{Error, Result};

/// Block size used when moving an entry's data region.
const RELOCATE_BLOCK: usize = 64 * 1024;

/// An archive opened for one write call.
pub struct ArchiveSession {
    path: PathBuf,
    file: Option<File>,
    directory: Directory,
    trailer: DirectoryTrailer,
    modified: bool,
}

impl std::fmt::Debug for ArchiveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveSession")
            .field("path", &self.path)
            .field("open", &self.file.is_some())
            .field("entries", &self.directory.len())
            .field("directory_offset", &self.trailer.offset)
            .field("modified", &self.modified)
            .finish()
    }
}

impl ArchiveSession {
    /// Opens `path` for appending, creating an empty archive if the file is
    /// missing or empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] or [`Error::CorruptHeader`] if the file
    /// exists but its directory cannot be read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        let (directory, trailer) = if file.metadata()?.len() == 0 {
            (Directory::new(), DirectoryTrailer::default())
        } else {
            read_directory(&mut file)?
        };
        log::trace!(
            "opened {} ({} entries, directory at {:#x})",
            path.display(),
            directory.len(),
            trailer.offset
        );

        Ok(Self {
            path,
            file: Some(file),
            directory,
            trailer,
            modified: false,
        })
    }

    /// Path of the archive.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The directory as it will be written on commit.
    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Offset the central directory will be written at.
    pub fn directory_offset(&self) -> u64 {
        self.trailer.offset
    }

    /// Returns true until the session is committed.
    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Looks up `filename`, or starts a fresh entry at the directory offset.
    pub fn descriptor_for(
        &self,
        filename: &str,
        method: CompressionMethod,
    ) -> Result<EntryDescriptor> {
        match self.directory.get(filename) {
            Some(record) => {
                let entry = EntryDescriptor::load(record)?;
                if entry.method != method {
                    return Err(Error::MethodMismatch {
                        path: filename.to_string(),
                        existing: entry.method,
                        requested: method,
                    });
                }
                Ok(entry)
            }
            None => {
                log::debug!(
                    "'{}' not in {}, starting at {:#x}",
                    filename,
                    self.path.display(),
                    self.trailer.offset
                );
                Ok(EntryDescriptor::fresh(filename, method, self.trailer.offset))
            }
        }
    }

    /// Fails if appending to `entry` would overwrite another entry.
    pub fn check_appendable(&self, entry: &EntryDescriptor) -> Result<()> {
        if self
            .directory
            .has_entry_after(&entry.filename, entry.header_offset)
        {
            return Err(Error::EntryNotLast {
                path: entry.filename.clone(),
            });
        }
        Ok(())
    }

    fn file(&mut self) -> Result<&mut File> {
        self.file.as_mut().ok_or(Error::ArchiveClosed)
    }

    /// Writes the central directory at the directory offset and truncates the
    /// file after it. Later calls are no-ops.
    pub fn commit(&mut self) -> Result<()> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };
        if !self.modified {
            return Ok(());
        }

        file.seek(SeekFrom::Start(self.trailer.offset))?;
        let mut writer = BufWriter::new(&mut file);
        let end = write_directory(
            &mut writer,
            &self.directory,
            self.trailer.offset,
            &self.trailer.comment,
        )?;
        writer.flush()?;
        drop(writer);
        file.set_len(end)?;

        log::trace!(
            "committed {} entries to {}, {} bytes",
            self.directory.len(),
            self.path.display(),
            end
        );
        self.modified = false;
        Ok(())
    }
}

impl Drop for ArchiveSession {
    fn drop(&mut self) {
        if let Err(e) = self.commit() {
            log::warn!("failed to commit {}: {}", self.path.display(), e);
        }
    }
}

/// Appends `compressed` to `entry`'s data region and brings the archive up to
/// date.
///
/// `chunk` is the uncompressed input behind `compressed`; it is `None` when the
/// bytes come from a flush. On success `entry` holds the updated counters and
/// the session's directory lists it last.
///
/// # Errors
///
/// - [`Error::ArchiveClosed`] if the session was already committed.
/// - [`Error::EntryNotLast`] if another entry's data follows this one.
pub fn write_entry(
    session: &mut ArchiveSession,
    entry: &mut EntryDescriptor,
    chunk: Option<&[u8]>,
    compressed: &[u8],
    now: DosDateTime,
) -> Result<()> {
    if !session.is_open() {
        return Err(Error::ArchiveClosed);
    }
    session.check_appendable(entry)?;
    entry.touch(now);

    let mut updated = entry.clone();
    updated.record(chunk, compressed.len() as u64);
    // One header form for both rewrites so the header length stays put.
    let zip64 = updated.needs_local_zip64();
    let header = entry.local_header(zip64);
    let data_start = entry.header_offset + header.encoded_len();

    session.modified = true;
    rewrite_header(session, entry, &header)?;

    let file = session.file()?;
    file.seek(SeekFrom::Start(data_start + entry.compressed_size))?;
    file.write_all(compressed)?;

    *entry = updated;
    let data_end = data_start + entry.compressed_size;

    file.seek(SeekFrom::Start(entry.header_offset))?;
    file.write_all(&entry.local_header(zip64).to_bytes())?;

    log::debug!(
        "{}: +{} bytes in, +{} bytes out (crc {:08x}, {} / {} bytes, data ends at {:#x})",
        entry.filename,
        chunk.map_or(0, <[u8]>::len),
        compressed.len(),
        entry.crc32,
        entry.uncompressed_size,
        entry.compressed_size,
        data_end
    );

    session.trailer.offset = data_end;
    session.directory = std::mem::take(&mut session.directory).with_entry(entry.central_record());
    Ok(())
}

/// Writes `header` over the entry's local header, first moving the data region
/// if the header length changed.
///
/// After a move the session's directory offset follows the data, so a commit
/// never lands on top of it.
fn rewrite_header(
    session: &mut ArchiveSession,
    entry: &EntryDescriptor,
    header: &LocalFileHeader,
) -> Result<()> {
    let data_start = entry.header_offset + header.encoded_len();
    let file = session.file()?;

    let mut moved = false;
    if entry.compressed_size > 0 {
        file.seek(SeekFrom::Start(entry.header_offset))?;
        let on_disk = LocalFileHeader::read_from(file, entry.header_offset)?;
        let old_start = entry.header_offset + on_disk.encoded_len();
        if old_start != data_start {
            relocate(file, old_start, data_start, entry.compressed_size)?;
            moved = true;
        }
    }

    file.seek(SeekFrom::Start(entry.header_offset))?;
    file.write_all(&header.to_bytes())?;
    if moved {
        session.trailer.offset = data_start + entry.compressed_size;
    }
    Ok(())
}

/// Moves `len` bytes from `from` to `to`, handling overlapping ranges.
fn relocate<F: Read + Write + Seek>(file: &mut F, from: u64, to: u64, len: u64) -> Result<()> {
    log::trace!("moving {} data bytes from {:#x} to {:#x}", len, from, to);

    let mut buf = vec![0u8; RELOCATE_BLOCK.min(len as usize)];
    let mut moved = 0u64;
    while moved < len {
        let n = (len - moved).min(buf.len() as u64);
        // Moving towards the end of the file has to start from the back.
        let pos = if to > from { len - moved - n } else { moved };
        let block = &mut buf[..n as usize];

        file.seek(SeekFrom::Start(from + pos))?;
        file.read_exact(block)?;
        file.seek(SeekFrom::Start(to + pos))?;
        file.write_all(block)?;
        moved += n;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn scratch() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.zip");
        (dir, path)
    }

    fn stamp() -> DosDateTime {
        DosDateTime::from_parts(0x5821, 0x6000)
    }

    fn append(path: &Path, name: &str, data: &[u8]) -> EntryDescriptor {
        let mut session = ArchiveSession::open(path).unwrap();
        let mut entry = session
            .descriptor_for(name, CompressionMethod::Stored)
            .unwrap();
        write_entry(&mut session, &mut entry, Some(data), data, stamp()).unwrap();
        session.commit().unwrap();
        entry
    }

    #[test]
    fn test_relocate_forward_overlapping() {
        let data: Vec<u8> = (0..200u8).collect();
        let mut cursor = Cursor::new(data.clone());
        relocate(&mut cursor, 10, 15, 100).unwrap();
        assert_eq!(&cursor.get_ref()[15..115], &data[10..110]);
    }

    #[test]
    fn test_relocate_backward_overlapping() {
        let data: Vec<u8> = (0..200u8).collect();
        let mut cursor = Cursor::new(data.clone());
        relocate(&mut cursor, 30, 10, 150).unwrap();
        assert_eq!(&cursor.get_ref()[10..160], &data[30..180]);
    }

    #[test]
    fn test_relocate_spans_blocks() {
        let len = RELOCATE_BLOCK * 2 + 123;
        let data: Vec<u8> = (0..len + 64).map(|i| (i % 251) as u8).collect();
        let mut cursor = Cursor::new(data.clone());
        relocate(&mut cursor, 0, 20, len as u64).unwrap();
        assert_eq!(&cursor.get_ref()[20..20 + len], &data[..len]);
    }

    #[test]
    fn test_new_archive_layout() {
        let (_dir, path) = scratch();
        let entry = append(&path, "a.txt", b"hello");
        assert_eq!(entry.header_offset, 0);
        assert_eq!(entry.compressed_size, 5);

        let bytes = std::fs::read(&path).unwrap();
        let header = LocalFileHeader::read_from(&mut Cursor::new(&bytes), 0).unwrap();
        assert_eq!(header.compressed_size, 5);
        assert_eq!(&bytes[35..40], b"hello");

        let (directory, trailer) = read_directory(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(directory.len(), 1);
        assert_eq!(trailer.offset, 40);
    }

    #[test]
    fn test_append_continues_data_region() {
        let (_dir, path) = scratch();
        append(&path, "a.txt", b"hello ");
        let entry = append(&path, "a.txt", b"world");
        assert_eq!(entry.compressed_size, 11);
        assert_eq!(entry.crc32, crate::checksum::Crc32::compute(b"hello world"));

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[35..46], b"hello world");
        let (directory, trailer) = read_directory(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(directory.len(), 1);
        assert_eq!(trailer.offset, 46);
    }

    #[test]
    fn test_second_entry_goes_after_first() {
        let (_dir, path) = scratch();
        append(&path, "a.txt", b"first");
        let second = append(&path, "b.txt", b"second");
        assert_eq!(second.header_offset, 35 + 5);

        let bytes = std::fs::read(&path).unwrap();
        let (directory, _) = read_directory(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(directory.names().collect::<Vec<_>>(), vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_entry_not_last() {
        let (_dir, path) = scratch();
        append(&path, "a.txt", b"first");
        append(&path, "b.txt", b"second");

        let mut session = ArchiveSession::open(&path).unwrap();
        let mut entry = session
            .descriptor_for("a.txt", CompressionMethod::Stored)
            .unwrap();
        let err = write_entry(&mut session, &mut entry, Some(b"x"), b"x", stamp()).unwrap_err();
        assert!(matches!(err, Error::EntryNotLast { .. }));
    }

    #[test]
    fn test_method_mismatch_on_resume() {
        let (_dir, path) = scratch();
        append(&path, "a.txt", b"first");
        let session = ArchiveSession::open(&path).unwrap();
        let err = session
            .descriptor_for("a.txt", CompressionMethod::Deflate)
            .unwrap_err();
        assert!(matches!(err, Error::MethodMismatch { .. }));
    }

    #[test]
    fn test_write_after_commit_fails() {
        let (_dir, path) = scratch();
        let mut session = ArchiveSession::open(&path).unwrap();
        let mut entry = session
            .descriptor_for("a.txt", CompressionMethod::Stored)
            .unwrap();
        session.commit().unwrap();
        assert!(!session.is_open());

        let err = write_entry(&mut session, &mut entry, Some(b"x"), b"x", stamp()).unwrap_err();
        assert!(matches!(err, Error::ArchiveClosed));
        assert_eq!(entry.compressed_size, 0);
    }

    #[test]
    fn test_relocates_when_header_grows() {
        let (_dir, path) = scratch();
        append(&path, "a.txt", b"abc");

        // Pretend the entry is large enough to need the zip64 header form.
        let mut session = ArchiveSession::open(&path).unwrap();
        let mut entry = session
            .descriptor_for("a.txt", CompressionMethod::Stored)
            .unwrap();
        entry.uncompressed_size = 3_000_000_000;
        write_entry(&mut session, &mut entry, Some(b"def"), b"def", stamp()).unwrap();
        session.commit().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let header = LocalFileHeader::read_from(&mut Cursor::new(&bytes), 0).unwrap();
        assert!(header.is_zip64());
        assert_eq!(header.compressed_size64(), 6);
        let start = header.encoded_len() as usize;
        assert_eq!(&bytes[start..start + 6], b"abcdef");

        let (directory, trailer) = read_directory(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(trailer.offset, (start + 6) as u64);
        assert_eq!(directory.get("a.txt").unwrap().uncompressed_size64(), 3_000_000_003);
    }

    #[test]
    fn test_interrupted_write_after_relocation_stays_readable() {
        let (_dir, path) = scratch();
        append(&path, "a.txt", b"abc");
        append(&path, "b.txt", b"defgh");

        let mut session = ArchiveSession::open(&path).unwrap();
        let mut entry = session
            .descriptor_for("b.txt", CompressionMethod::Stored)
            .unwrap();
        entry.uncompressed_size = 3_000_000_000;
        let header = entry.local_header(true);
        session.modified = true;
        rewrite_header(&mut session, &entry, &header).unwrap();
        // Nothing else is written, as if the data write had failed.
        drop(session);

        let mut reader = crate::read::ZipReader::open(&path).unwrap();
        assert_eq!(reader.read_entry("a.txt").unwrap(), b"abc");
        assert_eq!(reader.read_entry("b.txt").unwrap(), b"defgh");
        assert_eq!(
            reader.directory_offset(),
            entry.header_offset + header.encoded_len() + 5
        );
    }

    #[test]
    fn test_commit_truncates_stale_bytes() {
        let (_dir, path) = scratch();
        append(&path, "a.txt", b"data");
        let len_before = std::fs::metadata(&path).unwrap().len();
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(&[0u8; 100]).unwrap();
        }
        // Trailing bytes after the end record are dropped on the next commit.
        append(&path, "a.txt", b"!");
        assert_eq!(std::fs::metadata(&path).unwrap().len(), len_before + 1);
    }

    #[test]
    fn test_drop_commits() {
        let (_dir, path) = scratch();
        {
            let mut session = ArchiveSession::open(&path).unwrap();
            let mut entry = session
                .descriptor_for("a.txt", CompressionMethod::Stored)
                .unwrap();
            write_entry(&mut session, &mut entry, Some(b"x"), b"x", stamp()).unwrap();
        }
        let bytes = std::fs::read(&path).unwrap();
        let (directory, _) = read_directory(&mut Cursor::new(&bytes)).unwrap();
        assert!(directory.contains("a.txt"));
    }

    #[test]
    fn test_rejects_non_zip() {
        let (_dir, path) = scratch();
        std::fs::write(&path, vec![0x11u8; 64]).unwrap();
        let err = ArchiveSession::open(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
    }
}
