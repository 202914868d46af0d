//! Shared test utilities for integration tests.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use chunkzip::{
    ChunkedZipWriter, CompressionMethod, CompressorRegistry, DosDateTime, EntryDescriptor,
    WriteOptions, ZipReader, zip_file_in_chunks_with,
};
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

/// Fixed timestamp so archives are byte-for-byte reproducible.
pub const FIXED_TIME: DosDateTime = DosDateTime::from_parts(0x5821, 0x6000);

/// Methods compiled into this build.
pub fn available_methods() -> Vec<CompressionMethod> {
    CompressionMethod::ALL
        .into_iter()
        .filter(|m| m.is_available())
        .collect()
}

/// Generates `len` bytes of seeded random data.
pub fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill(&mut data[..]);
    data
}

/// Generates `len` bytes of highly repetitive text.
pub fn repetitive_bytes(len: usize) -> Vec<u8> {
    b"The quick brown fox jumps over the lazy dog. "
        .iter()
        .copied()
        .cycle()
        .take(len)
        .collect()
}

/// A scratch directory holding a source file and a destination archive.
pub struct Scratch {
    pub dir: TempDir,
    pub source: PathBuf,
    pub archive: PathBuf,
}

impl Scratch {
    /// Writes `data` to `<dir>/<name>` and reserves `<dir>/out.zip`.
    pub fn new(name: &str, data: &[u8]) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let source = dir.path().join(name);
        std::fs::write(&source, data).expect("Failed to write source");
        let archive = dir.path().join("out.zip");
        Self {
            dir,
            source,
            archive,
        }
    }
}

/// Options with a fixed timestamp and the given chunk size.
pub fn options(chunk_size: usize) -> WriteOptions {
    WriteOptions::new()
        .chunk_size(chunk_size)
        .expect("valid chunk size")
        .modified(FIXED_TIME)
}

/// Archives `source` into `archive` with a private registry.
pub fn archive_file(
    source: &Path,
    archive: &Path,
    method: CompressionMethod,
    chunk_size: usize,
) -> chunkzip::Result<EntryDescriptor> {
    let mut registry = CompressorRegistry::new();
    let entry =
        zip_file_in_chunks_with(source, archive, method, &options(chunk_size), &mut registry)?;
    assert!(registry.is_empty(), "orchestrator must release its compressor");
    Ok(entry)
}

/// Feeds `chunks` through one writer per chunk without the final flush.
pub fn write_chunks_unflushed(
    archive: &Path,
    name: &str,
    method: CompressionMethod,
    chunks: &[&[u8]],
    registry: &mut CompressorRegistry,
) -> chunkzip::Result<()> {
    for chunk in chunks {
        let mut writer =
            ChunkedZipWriter::with_options(archive, name, method, options(1024), registry);
        writer.write_chunk(chunk)?;
        writer.close()?;
    }
    Ok(())
}

/// Flushes and closes the entry, then releases its compressor.
pub fn finalize(
    archive: &Path,
    name: &str,
    method: CompressionMethod,
    registry: &mut CompressorRegistry,
) -> chunkzip::Result<()> {
    let mut writer =
        ChunkedZipWriter::with_options(archive, name, method, options(1024), registry);
    writer.flush()?;
    writer.close()?;
    registry.release(archive, name);
    Ok(())
}

/// Reads one entry back, verifying CRC and size.
pub fn read_back(archive: &Path, name: &str) -> chunkzip::Result<Vec<u8>> {
    ZipReader::open(archive)?.read_entry(name)
}
