//! Deflate entries: full flush on close keeps the entry decodable.

#![cfg(feature = "deflate")]

use chunkzip::{CompressionMethod, CompressorRegistry, ZipReader};

mod common;

use common::{Scratch, archive_file, read_back, repetitive_bytes, write_chunks_unflushed};

const MIB: usize = 1024 * 1024;

#[test]
fn test_10mib_repetitive_in_1mib_chunks() {
    let data = repetitive_bytes(10 * MIB);
    let scratch = Scratch::new("repetitive.txt", &data);

    let entry = archive_file(&scratch.source, &scratch.archive, CompressionMethod::Deflate, MIB)
        .unwrap();

    let archive_len = std::fs::metadata(&scratch.archive).unwrap().len();
    assert!(
        archive_len < (MIB as u64) / 2,
        "archive is {archive_len} bytes"
    );
    assert_eq!(entry.uncompressed_size, (10 * MIB) as u64);
    assert_eq!(read_back(&scratch.archive, "repetitive.txt").unwrap(), data);
}

#[test]
fn test_decodable_without_final_flush() {
    let scratch = Scratch::new("partial.txt", b"");
    let mut registry = CompressorRegistry::new();
    let chunks: Vec<Vec<u8>> = (0..4).map(|i| repetitive_bytes(5_000 + i * 10)).collect();
    let refs: Vec<&[u8]> = chunks.iter().map(Vec::as_slice).collect();

    write_chunks_unflushed(
        &scratch.archive,
        "partial.txt",
        CompressionMethod::Deflate,
        &refs,
        &mut registry,
    )
    .unwrap();

    // Deflate never needs the terminal flush.
    assert_eq!(
        read_back(&scratch.archive, "partial.txt").unwrap(),
        chunks.concat()
    );
    assert!(registry.contains(&scratch.archive, "partial.txt"));
}

#[test]
fn test_level_zero_still_roundtrips() {
    let data = repetitive_bytes(100_000);
    let scratch = Scratch::new("l0.txt", &data);
    let options = common::options(30_000).level(0).unwrap();
    let mut registry = CompressorRegistry::new();
    chunkzip::zip_file_in_chunks_with(
        &scratch.source,
        &scratch.archive,
        CompressionMethod::Deflate,
        &options,
        &mut registry,
    )
    .unwrap();

    let mut reader = ZipReader::open(&scratch.archive).unwrap();
    let entry = reader.entry("l0.txt").unwrap();
    assert!(entry.compressed_size >= entry.size);
    assert_eq!(reader.read_entry("l0.txt").unwrap(), data);
}
