//! BZip2 entries: the terminal flush carries the final block.

#![cfg(feature = "bzip2")]

use chunkzip::{ChunkedZipWriter, CompressionMethod, CompressorRegistry, Error, ZipReader};

mod common;

use common::{Scratch, options, read_back, repetitive_bytes, write_chunks_unflushed};

const MIB: usize = 1024 * 1024;

#[test]
fn test_15mib_plus_512_flush_appends_tail() {
    let data = repetitive_bytes(15 * MIB + 512);
    let scratch = Scratch::new("big.txt", &data);
    let mut registry = CompressorRegistry::new();
    let refs: Vec<&[u8]> = data.chunks(MIB).collect();
    assert_eq!(refs.len(), 16);

    write_chunks_unflushed(
        &scratch.archive,
        "big.txt",
        CompressionMethod::Bzip2,
        &refs,
        &mut registry,
    )
    .unwrap();
    let before = ZipReader::open(&scratch.archive)
        .unwrap()
        .entry("big.txt")
        .unwrap();
    assert_eq!(before.size, data.len() as u64);

    // Omitting the final flush leaves a stream that cannot be fully decoded.
    assert!(read_back(&scratch.archive, "big.txt").is_err());

    let mut writer = ChunkedZipWriter::with_options(
        &scratch.archive,
        "big.txt",
        CompressionMethod::Bzip2,
        options(MIB),
        &mut registry,
    );
    writer.flush().unwrap();
    writer.close().unwrap();
    let after = writer.descriptor().unwrap().clone();
    registry.release(&scratch.archive, "big.txt");

    assert!(after.compressed_size > before.compressed_size);
    assert_eq!(after.uncompressed_size, before.size);
    assert_eq!(read_back(&scratch.archive, "big.txt").unwrap(), data);
}

#[test]
fn test_write_after_flush_is_rejected() {
    let scratch = Scratch::new("done.txt", b"");
    let mut registry = CompressorRegistry::new();
    let mut writer = ChunkedZipWriter::with_options(
        &scratch.archive,
        "done.txt",
        CompressionMethod::Bzip2,
        options(64),
        &mut registry,
    );
    writer.write_chunk(b"x").unwrap();
    writer.flush().unwrap();
    let err = writer.write_chunk(b"y").unwrap_err();
    assert!(matches!(err, Error::CompressorFinished { .. }));

    // The rejected chunk left the entry untouched.
    assert_eq!(read_back(&scratch.archive, "done.txt").unwrap(), b"x");
}

#[test]
fn test_finalize_releases_compressor() {
    let scratch = Scratch::new("r.txt", b"");
    let mut registry = CompressorRegistry::new();
    write_chunks_unflushed(
        &scratch.archive,
        "r.txt",
        CompressionMethod::Bzip2,
        &[b"payload".as_slice()],
        &mut registry,
    )
    .unwrap();
    assert_eq!(registry.len(), 1);
    common::finalize(&scratch.archive, "r.txt", CompressionMethod::Bzip2, &mut registry)
        .unwrap();
    assert!(registry.is_empty());
    assert_eq!(read_back(&scratch.archive, "r.txt").unwrap(), b"payload");
}
