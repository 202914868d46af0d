//! Command implementations for the CLI tool.

use std::path::Path;

use chunkzip::{
    CompressionMethod, CompressorRegistry, WriteOptions, ZipReader, zip_file_in_chunks_with,
};

use crate::Method;
use crate::exit_codes::{ExitCode, error_to_exit_code};
use crate::output::{format_add_result, format_list, format_test_result};

/// Configuration for the add command.
pub struct AddConfig<'a> {
    pub source: &'a Path,
    pub archive_path: &'a Path,
    pub method: Method,
    pub chunk_size: usize,
    pub level: Option<u32>,
    pub quiet: bool,
}

/// Add command implementation
pub fn add(config: &AddConfig<'_>) -> ExitCode {
    let method: CompressionMethod = config.method.into();
    if !method.is_available() {
        eprintln!("Error: {} support not enabled", method);
        return ExitCode::BadArgs;
    }

    let options = match build_options(config.chunk_size, config.level) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {}", e);
            return error_to_exit_code(&e);
        }
    };

    let mut registry = CompressorRegistry::new();
    match zip_file_in_chunks_with(
        config.source,
        config.archive_path,
        method,
        &options,
        &mut registry,
    ) {
        Ok(entry) => {
            if !config.quiet {
                print!("{}", format_add_result(&entry));
            }
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("Error adding {}: {}", config.source.display(), e);
            error_to_exit_code(&e)
        }
    }
}

fn build_options(chunk_size: usize, level: Option<u32>) -> chunkzip::Result<WriteOptions> {
    let options = WriteOptions::new().chunk_size(chunk_size)?;
    match level {
        Some(level) => options.level(level),
        None => Ok(options),
    }
}

/// List command implementation
pub fn list(archive_path: &Path, technical: bool) -> ExitCode {
    let archive = match open_archive(archive_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    print!("{}", format_list(&archive.entries(), technical));
    ExitCode::Success
}

/// Test command implementation
pub fn test(archive_path: &Path, quiet: bool) -> ExitCode {
    let mut archive = match open_archive(archive_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let result = match archive.verify_all() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return error_to_exit_code(&e);
        }
    };

    if !quiet || result.is_err() {
        print!("{}", format_test_result(&result));
    }

    if result.is_ok() {
        ExitCode::Success
    } else {
        ExitCode::BadArchive
    }
}

fn open_archive(path: &Path) -> Result<ZipReader<std::io::BufReader<std::fs::File>>, ExitCode> {
    ZipReader::open(path).map_err(|e| {
        eprintln!("Error opening archive: {}", e);
        error_to_exit_code(&e)
    })
}
