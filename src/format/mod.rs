//! ZIP archive format constants, record layouts, and directory parsing.
//!
//! Only the subset of the ZIP layout needed to grow a single entry in place is
//! modeled here: local file headers, central directory records, the classic
//! end-of-central-directory record and its zip64 counterparts.

pub mod directory;
pub mod header;

pub use directory::{Directory, DirectoryTrailer, read_directory, write_directory};
pub use header::{
    CentralDirectoryRecord, EndOfCentralDirectory, LocalFileHeader, Zip64EndOfCentralDirectory,
    Zip64ExtraField, Zip64Locator,
};

/// Practical rollover point of the 32-bit size fields.
///
/// Sizes and offsets above this value are written in zip64 form.
pub const ZIP64_LIMIT: u64 = (1 << 31) - 1;

/// Sentinel stored in a 32-bit field whose value lives in the zip64 extra field.
pub const ZIP64_SENTINEL_32: u32 = 0xFFFF_FFFF;

/// Sentinel stored in a 16-bit entry count whose value lives in the zip64 record.
pub const ZIP64_SENTINEL_16: u16 = 0xFFFF;

/// Maximum length of the archive comment.
pub const MAX_COMMENT_LEN: usize = 0xFFFF;

/// Record signatures.
pub mod signature {
    /// Local file header.
    pub const LOCAL_FILE_HEADER: u32 = 0x0403_4b50;
    /// Central directory file header.
    pub const CENTRAL_DIRECTORY: u32 = 0x0201_4b50;
    /// End of central directory record.
    pub const END_OF_CENTRAL_DIRECTORY: u32 = 0x0605_4b50;
    /// Zip64 end of central directory record.
    pub const ZIP64_END_OF_CENTRAL_DIRECTORY: u32 = 0x0606_4b50;
    /// Zip64 end of central directory locator.
    pub const ZIP64_LOCATOR: u32 = 0x0706_4b50;
}

/// "Version needed to extract" values.
pub mod version {
    /// Stored and deflate entries.
    pub const DEFAULT: u16 = 20;
    /// Entries using zip64 extensions.
    pub const ZIP64: u16 = 45;
    /// BZip2 entries.
    pub const BZIP2: u16 = 46;
    /// LZMA entries.
    pub const LZMA: u16 = 63;
    /// Host system stored in the high byte of "version made by" (3 = Unix).
    pub const MADE_BY_UNIX: u16 = 3 << 8;
}

/// General purpose bit flags.
pub mod flags {
    /// LZMA: the compressed stream ends with an end-of-stream marker.
    pub const LZMA_EOS_MARKER: u16 = 1 << 1;
    /// File name and comment are UTF-8.
    pub const UTF8: u16 = 1 << 11;
}

/// Extra field header ids.
pub mod extra_id {
    /// Zip64 extended information.
    pub const ZIP64: u16 = 0x0001;
}
