//! Archiving a whole file in fixed-size chunks.
//!
//! [`zip_file_in_chunks`] reads the source one chunk at a time and hands each
//! chunk to a fresh [`ChunkedZipWriter`], so memory use is bounded by the
//! chunk size no matter how large the source is. The archive is valid on disk
//! after every chunk.
//!
//! # Example
//!
//! ```rust,no_run
//! use chunkzip::{CompressionMethod, zip_file_in_chunks};
//!
//! let entry = zip_file_in_chunks("big.log", "logs.zip", CompressionMethod::Deflate)?;
//! println!("{} -> {} bytes", entry.uncompressed_size, entry.compressed_size);
//! # Ok::<(), chunkzip::Error>(())
//! ```

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::codec::CompressionMethod;
use crate::write::{ChunkedZipWriter, CompressorRegistry, EntryDescriptor, WriteOptions};
use crate::{Error, Result};

/// Lazy sequence of fixed-size chunks read from a source.
///
/// Every chunk except the last is exactly `chunk_size` bytes long. An empty
/// source yields no chunks.
pub struct ChunkReader<R> {
    inner: R,
    chunk_size: usize,
    exhausted: bool,
}

impl<R> std::fmt::Debug for ChunkReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkReader")
            .field("chunk_size", &self.chunk_size)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}

impl ChunkReader<File> {
    /// Opens `path` for chunked reading.
    pub fn open(path: impl AsRef<Path>, chunk_size: usize) -> Result<Self> {
        Self::new(File::open(path.as_ref())?, chunk_size)
    }
}

impl<R: Read> ChunkReader<R> {
    /// Wraps `inner`, yielding chunks of at most `chunk_size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidChunkSize`] if `chunk_size` is zero.
    pub fn new(inner: R, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidChunkSize);
        }
        Ok(Self {
            inner,
            chunk_size,
            exhausted: false,
        })
    }

    /// Maximum chunk length.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }

    fn next_chunk(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut chunk = Vec::with_capacity(self.chunk_size);
        let read = (&mut self.inner)
            .take(self.chunk_size as u64)
            .read_to_end(&mut chunk)?;
        if read < self.chunk_size {
            self.exhausted = true;
        }
        Ok((read > 0).then_some(chunk))
    }
}

impl<R: Read + Seek> ChunkReader<R> {
    /// Restarts the sequence from the beginning of the source.
    pub fn rewind(&mut self) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(0))?;
        self.exhausted = false;
        Ok(())
    }
}

impl<R: Read> Iterator for ChunkReader<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        match self.next_chunk() {
            Ok(chunk) => chunk.map(Ok),
            Err(e) => {
                self.exhausted = true;
                Some(Err(e))
            }
        }
    }
}

/// Derives the in-archive entry name from a source path's base name.
pub fn entry_name(source: &Path) -> Result<String> {
    source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{}' has no file name", source.display()),
            ))
        })
}

/// Appends `source` to `dest` as one entry, with default options.
///
/// Returns the entry's final state.
pub fn zip_file_in_chunks(
    source: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    method: CompressionMethod,
) -> Result<EntryDescriptor> {
    let mut registry = CompressorRegistry::new();
    zip_file_in_chunks_with(source, dest, method, &WriteOptions::default(), &mut registry)
}

/// Appends `source` to `dest` as one entry.
///
/// One writer is used per chunk and closed after it, then a last writer is
/// flushed and closed to finalize the entry. The registry key for the entry is
/// released afterwards, also when an error occurs.
///
/// An empty source still produces an (empty) entry.
pub fn zip_file_in_chunks_with(
    source: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    method: CompressionMethod,
    options: &WriteOptions,
    registry: &mut CompressorRegistry,
) -> Result<EntryDescriptor> {
    let source = source.as_ref();
    let dest = dest.as_ref();
    let filename = entry_name(source)?;
    let chunks = ChunkReader::open(source, options.chunk_size)?;

    log::debug!(
        "archiving {} into {} as '{}' ({}, {} byte chunks)",
        source.display(),
        dest.display(),
        filename,
        method,
        options.chunk_size
    );

    let result = append_chunks(chunks, dest, &filename, method, options, registry);
    registry.release(dest, &filename);
    result
}

fn append_chunks<R: Read>(
    chunks: ChunkReader<R>,
    dest: &Path,
    filename: &str,
    method: CompressionMethod,
    options: &WriteOptions,
    registry: &mut CompressorRegistry,
) -> Result<EntryDescriptor> {
    let mut last = None;
    let mut count = 0usize;

    for chunk in chunks {
        let chunk = chunk?;
        let mut writer =
            ChunkedZipWriter::with_options(dest, filename, method, options.clone(), registry);
        writer.write_chunk(&chunk)?;
        writer.close()?;
        last = writer.descriptor().cloned();
        count += 1;
    }

    if count == 0 {
        let mut writer =
            ChunkedZipWriter::with_options(dest, filename, method, options.clone(), registry);
        writer.write_chunk(&[])?;
        writer.close()?;
        last = writer.descriptor().cloned();
    }

    let mut writer =
        ChunkedZipWriter::with_options(dest, filename, method, options.clone(), registry);
    writer.flush()?;
    writer.close()?;
    if let Some(descriptor) = writer.descriptor() {
        last = Some(descriptor.clone());
    }

    log::debug!("'{}' written in {} chunk(s)", filename, count);
    last.ok_or_else(|| Error::EntryNotFound {
        path: filename.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_chunk_reader_uneven() {
        let data: Vec<u8> = (0..10u8).collect();
        let chunks: Vec<Vec<u8>> = ChunkReader::new(Cursor::new(data), 4)
            .unwrap()
            .map(|c| c.unwrap())
            .collect();
        assert_eq!(chunks, vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7], vec![8, 9]]);
    }

    #[test]
    fn test_chunk_reader_exact_multiple() {
        let chunks: Vec<_> = ChunkReader::new(Cursor::new(vec![7u8; 8]), 4)
            .unwrap()
            .collect();
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_chunk_reader_empty() {
        let mut reader = ChunkReader::new(Cursor::new(Vec::new()), 4).unwrap();
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_chunk_reader_rewind() {
        let mut reader = ChunkReader::new(Cursor::new(b"abcdef".to_vec()), 4).unwrap();
        assert_eq!(reader.by_ref().count(), 2);
        reader.rewind().unwrap();
        assert_eq!(reader.next().unwrap().unwrap(), b"abcd");
    }

    #[test]
    fn test_zero_chunk_size() {
        assert!(matches!(
            ChunkReader::new(Cursor::new(Vec::new()), 0),
            Err(Error::InvalidChunkSize)
        ));
    }

    #[test]
    fn test_entry_name() {
        assert_eq!(entry_name(Path::new("/tmp/dir/data.bin")).unwrap(), "data.bin");
        assert!(entry_name(Path::new("/")).is_err());
    }

    #[test]
    fn test_empty_source_creates_entry() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("empty.txt");
        std::fs::write(&source, b"").unwrap();
        let dest = dir.path().join("out.zip");

        let entry = zip_file_in_chunks(&source, &dest, CompressionMethod::Stored).unwrap();
        assert_eq!(entry.uncompressed_size, 0);

        let mut reader = crate::ZipReader::open(&dest).unwrap();
        assert_eq!(reader.read_entry("empty.txt").unwrap(), b"");
    }

    #[test]
    fn test_registry_released_on_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.txt");
        std::fs::write(&source, b"payload").unwrap();
        let dest = dir.path().join("out.zip");
        std::fs::write(&dest, b"definitely not a zip archive").unwrap();

        let mut registry = CompressorRegistry::new();
        let result = zip_file_in_chunks_with(
            &source,
            &dest,
            CompressionMethod::Stored,
            &WriteOptions::default(),
            &mut registry,
        );
        assert!(result.is_err());
        assert!(registry.is_empty());
    }
}
