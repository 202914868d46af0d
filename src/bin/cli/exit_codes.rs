//! Exit codes for the CLI tool.

use chunkzip::Error;

/// Exit code constants
pub const SUCCESS: i32 = 0;
/// Fatal error occurred
pub const FATAL_ERROR: i32 = 2;
/// Archive format error
pub const BAD_ARCHIVE: i32 = 3;
/// Entry cannot be appended to
pub const ENTRY_CONFLICT: i32 = 4;
/// I/O error
pub const IO_ERROR: i32 = 5;
/// Invalid command line arguments
pub const BAD_ARGS: i32 = 255;

/// Exit code enum for structured handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    FatalError,
    BadArchive,
    EntryConflict,
    IoError,
    BadArgs,
}

impl ExitCode {
    /// Returns the numeric exit code
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::FatalError => FATAL_ERROR,
            Self::BadArchive => BAD_ARCHIVE,
            Self::EntryConflict => ENTRY_CONFLICT,
            Self::IoError => IO_ERROR,
            Self::BadArgs => BAD_ARGS,
        }
    }
}

/// Converts a chunkzip error to an exit code
pub fn error_to_exit_code(error: &Error) -> ExitCode {
    match error {
        Error::Io(_) => ExitCode::IoError,
        Error::InvalidFormat(_) | Error::CorruptHeader { .. } => ExitCode::BadArchive,
        Error::CrcMismatch { .. } | Error::SizeMismatch { .. } => ExitCode::BadArchive,
        Error::UnsupportedMethod { .. } => ExitCode::BadArchive,
        Error::EntryNotFound { .. } => ExitCode::BadArgs,
        Error::EntryNotLast { .. } | Error::MethodMismatch { .. } => ExitCode::EntryConflict,
        Error::InvalidCompressionLevel { .. } | Error::InvalidChunkSize => ExitCode::BadArgs,
        Error::ArchiveClosed
        | Error::CompressorFinished { .. }
        | Error::UnsupportedFlush { .. } => ExitCode::FatalError,
        // Future error variants - required by #[non_exhaustive]
        _ => ExitCode::FatalError,
    }
}
