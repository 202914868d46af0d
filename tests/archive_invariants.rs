//! Structural checks on the archive after every chunk, and resume behavior.

use std::io::Write;

use chunkzip::{
    ChunkedZipWriter, CompressionMethod, CompressorRegistry, Error, ZipReader,
    format::read_directory,
};

mod common;

use common::{
    Scratch, archive_file, available_methods, finalize, options, random_bytes, read_back,
    write_chunks_unflushed,
};

/// Local header fields must agree with the central record.
fn assert_local_header_matches(archive: &std::path::Path, name: &str) {
    let mut reader = ZipReader::open(archive).unwrap();
    let entry = reader.entry(name).unwrap();
    let header = reader.local_header(name).unwrap();
    assert_eq!(header.file_name, name.as_bytes());
    assert_eq!(header.compression_method, entry.method_id);
    assert_eq!(header.crc32, entry.crc32);
    assert_eq!(header.uncompressed_size64(), entry.size);
    assert_eq!(header.compressed_size64(), entry.compressed_size);
    assert_eq!(header.modified, entry.modified);
    // Data region ends exactly where the directory begins.
    assert_eq!(
        entry.header_offset + header.encoded_len() + entry.compressed_size,
        reader.directory_offset()
    );
}

#[test]
fn test_single_entry_and_valid_directory_after_every_chunk() {
    let data = random_bytes(20_000, 10);
    for method in available_methods() {
        let scratch = Scratch::new("steps.bin", b"");
        let mut registry = CompressorRegistry::new();

        for (i, chunk) in data.chunks(4_096).enumerate() {
            write_chunks_unflushed(&scratch.archive, "steps.bin", method, &[chunk], &mut registry)
                .unwrap();

            let mut file = std::fs::File::open(&scratch.archive).unwrap();
            let (directory, trailer) = read_directory(&mut file).unwrap();
            let file_len = file.metadata().unwrap().len();
            assert_eq!(directory.len(), 1, "{method} chunk {i}");
            assert!(directory.contains("steps.bin"));
            assert!(trailer.offset + trailer.size <= file_len);

            let entry = ZipReader::open(&scratch.archive)
                .unwrap()
                .entry("steps.bin")
                .unwrap();
            let fed = data.chunks(4_096).take(i + 1).map(<[u8]>::len).sum::<usize>();
            assert_eq!(entry.size, fed as u64, "{method} chunk {i}");
            assert_local_header_matches(&scratch.archive, "steps.bin");
        }

        finalize(&scratch.archive, "steps.bin", method, &mut registry).unwrap();
        assert!(registry.is_empty());
        assert_local_header_matches(&scratch.archive, "steps.bin");
        assert_eq!(read_back(&scratch.archive, "steps.bin").unwrap(), data);
    }
}

#[test]
fn test_stored_readable_after_every_chunk() {
    let scratch = Scratch::new("s.bin", b"");
    let mut registry = CompressorRegistry::new();
    let mut expected = Vec::new();
    for i in 0..6u8 {
        let chunk = vec![i; 777];
        expected.extend_from_slice(&chunk);
        write_chunks_unflushed(
            &scratch.archive,
            "s.bin",
            CompressionMethod::Stored,
            &[&chunk],
            &mut registry,
        )
        .unwrap();
        assert_eq!(read_back(&scratch.archive, "s.bin").unwrap(), expected);
    }
}

#[test]
fn test_resume_appends_after_prior_content() {
    let first = random_bytes(3_000, 11);
    let second = random_bytes(2_000, 12);
    let scratch = Scratch::new("resume.bin", &first);

    archive_file(&scratch.source, &scratch.archive, CompressionMethod::Stored, 1_000).unwrap();
    let before = ZipReader::open(&scratch.archive)
        .unwrap()
        .entry("resume.bin")
        .unwrap();

    // A new session with a fresh registry picks up where the archive left off.
    std::fs::write(&scratch.source, &second).unwrap();
    let entry =
        archive_file(&scratch.source, &scratch.archive, CompressionMethod::Stored, 1_000).unwrap();

    assert_eq!(entry.header_offset, before.header_offset);
    assert_eq!(entry.uncompressed_size, 5_000);
    let mut reader = ZipReader::open(&scratch.archive).unwrap();
    assert_eq!(reader.len(), 1);
    let mut expected = first;
    expected.extend_from_slice(&second);
    assert_eq!(reader.read_entry("resume.bin").unwrap(), expected);
}

#[cfg(feature = "deflate")]
#[test]
fn test_deflate_resume_in_new_session() {
    let scratch = Scratch::new("d.txt", b"");
    let mut registry = CompressorRegistry::new();
    write_chunks_unflushed(
        &scratch.archive,
        "d.txt",
        CompressionMethod::Deflate,
        &[b"first half, ".as_slice()],
        &mut registry,
    )
    .unwrap();
    registry.clear();

    // The full flush left a byte-aligned stream, so a new compressor can continue it.
    write_chunks_unflushed(
        &scratch.archive,
        "d.txt",
        CompressionMethod::Deflate,
        &[b"second half".as_slice()],
        &mut registry,
    )
    .unwrap();
    assert_eq!(
        read_back(&scratch.archive, "d.txt").unwrap(),
        b"first half, second half"
    );
}

#[test]
fn test_second_entry_lands_after_first() {
    let a = random_bytes(2_500, 13);
    let b = random_bytes(1_500, 14);
    let scratch_a = Scratch::new("a.bin", &a);
    let source_b = scratch_a.dir.path().join("b.bin");
    std::fs::write(&source_b, &b).unwrap();

    archive_file(&scratch_a.source, &scratch_a.archive, CompressionMethod::Stored, 1_000).unwrap();
    let entry_b =
        archive_file(&source_b, &scratch_a.archive, CompressionMethod::Stored, 1_000).unwrap();
    assert!(entry_b.header_offset > 2_500);

    let mut reader = ZipReader::open(&scratch_a.archive).unwrap();
    let names: Vec<String> = reader.entries().into_iter().map(|e| e.name).collect();
    assert_eq!(names, ["a.bin", "b.bin"]);
    assert_eq!(reader.read_entry("a.bin").unwrap(), a);
    assert_eq!(reader.read_entry("b.bin").unwrap(), b);
}

#[test]
fn test_extending_non_last_entry_is_rejected() {
    let scratch = Scratch::new("a.bin", b"aaaa");
    let source_b = scratch.dir.path().join("b.bin");
    std::fs::write(&source_b, b"bbbb").unwrap();

    archive_file(&scratch.source, &scratch.archive, CompressionMethod::Stored, 2).unwrap();
    archive_file(&source_b, &scratch.archive, CompressionMethod::Stored, 2).unwrap();
    let before = std::fs::read(&scratch.archive).unwrap();

    let err = archive_file(&scratch.source, &scratch.archive, CompressionMethod::Stored, 2)
        .unwrap_err();
    assert!(matches!(err, Error::EntryNotLast { .. }));
    assert_eq!(std::fs::read(&scratch.archive).unwrap(), before);
}

#[test]
fn test_method_mismatch_on_resume() {
    let scratch = Scratch::new("m.bin", b"data");
    archive_file(&scratch.source, &scratch.archive, CompressionMethod::Stored, 2).unwrap();

    for method in available_methods() {
        if method == CompressionMethod::Stored {
            continue;
        }
        let err = archive_file(&scratch.source, &scratch.archive, method, 2).unwrap_err();
        assert!(matches!(
            err,
            Error::MethodMismatch {
                existing: CompressionMethod::Stored,
                ..
            }
        ));
    }
    assert_eq!(read_back(&scratch.archive, "m.bin").unwrap(), b"data");
}

#[test]
fn test_foreign_entries_and_comment_preserved() {
    use zip::write::SimpleFileOptions;

    let scratch = Scratch::new("appended.bin", &random_bytes(3_000, 15));
    {
        let file = std::fs::File::create(&scratch.archive).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let opts =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        zip.start_file("existing.txt", opts).unwrap();
        zip.write_all(b"written by another tool").unwrap();
        zip.set_comment("archive comment");
        zip.finish().unwrap();
    }

    archive_file(&scratch.source, &scratch.archive, CompressionMethod::Stored, 1_024).unwrap();

    let mut reader = ZipReader::open(&scratch.archive).unwrap();
    assert_eq!(reader.comment(), b"archive comment");
    assert_eq!(
        reader.read_entry("existing.txt").unwrap(),
        b"written by another tool"
    );
    assert_eq!(reader.read_entry("appended.bin").unwrap().len(), 3_000);

    let file = std::fs::File::open(&scratch.archive).unwrap();
    let archive = zip::ZipArchive::new(file).unwrap();
    assert_eq!(archive.len(), 2);
    assert_eq!(archive.comment(), b"archive comment");
}

#[test]
fn test_not_a_zip_is_rejected() {
    let scratch = Scratch::new("x.bin", b"payload");
    std::fs::write(&scratch.archive, b"this is plainly not a zip archive").unwrap();
    let err =
        archive_file(&scratch.source, &scratch.archive, CompressionMethod::Stored, 4).unwrap_err();
    assert!(matches!(err, Error::InvalidFormat(_)));
}

#[test]
fn test_writer_reports_descriptor() {
    let scratch = Scratch::new("w.bin", b"");
    let mut registry = CompressorRegistry::new();
    let mut writer = ChunkedZipWriter::with_options(
        &scratch.archive,
        "w.bin",
        CompressionMethod::Stored,
        options(64),
        &mut registry,
    );
    assert!(writer.descriptor().is_none());
    writer.write_chunk(b"12345").unwrap();
    let entry = writer.descriptor().unwrap();
    assert_eq!(entry.uncompressed_size, 5);
    assert_eq!(entry.modified, common::FIXED_TIME);
}
