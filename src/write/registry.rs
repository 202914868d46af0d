//! Registry of live compressors.
//!
//! Each chunk write opens and closes the archive on its own, but a compressed
//! stream cannot restart in the middle. The registry keeps the compressor for
//! every `(archive, entry)` pair alive between writes until the caller
//! [releases](CompressorRegistry::release) it.
//!
//! ```rust
//! use chunkzip::{CompressionMethod, CompressorRegistry};
//!
//! let mut registry = CompressorRegistry::new();
//! let out = registry
//!     .get_or_create("a.zip", "data.bin", CompressionMethod::Deflate, None)?
//!     .compress(b"hello")?;
//! assert!(registry.contains("a.zip", "data.bin"));
//!
//! registry.release("a.zip", "data.bin");
//! assert!(registry.is_empty());
//! # let _ = out;
//! # Ok::<(), chunkzip::Error>(())
//! ```

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use crate::codec::{CompressionMethod, Compressor};
use crate::{Error, Result};

/// Identifies one entry of one archive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompressorKey {
    /// Absolute path of the archive.
    pub archive: PathBuf,
    /// Entry name.
    pub filename: String,
}

impl CompressorKey {
    /// Builds a key; relative archive paths are made absolute so that the same
    /// file always maps to the same key.
    pub fn new(archive: impl AsRef<Path>, filename: impl Into<String>) -> Self {
        let archive = archive.as_ref();
        Self {
            archive: std::path::absolute(archive).unwrap_or_else(|_| archive.to_path_buf()),
            filename: filename.into(),
        }
    }
}

/// A compressor handed out by the registry.
///
/// Stored entries get a throwaway identity compressor; every other method
/// borrows the registered one.
#[derive(Debug)]
pub enum AdapterHandle<'a> {
    /// A compressor owned by the registry.
    Shared(&'a mut Compressor),
    /// A compressor that is not registered.
    Owned(Compressor),
}

impl Deref for AdapterHandle<'_> {
    type Target = Compressor;

    fn deref(&self) -> &Compressor {
        match self {
            Self::Shared(c) => c,
            Self::Owned(c) => c,
        }
    }
}

impl DerefMut for AdapterHandle<'_> {
    fn deref_mut(&mut self) -> &mut Compressor {
        match self {
            Self::Shared(c) => c,
            Self::Owned(c) => c,
        }
    }
}

/// Table of live compressors keyed by archive and entry name.
///
/// Not synchronized; concurrent writers to the same entry are unsupported.
#[derive(Debug, Default)]
pub struct CompressorRegistry {
    compressors: HashMap<CompressorKey, Compressor>,
}

impl CompressorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the live compressor for the entry, creating it on first use.
    ///
    /// # Errors
    ///
    /// - [`Error::MethodMismatch`] if a compressor with another method is
    ///   already registered for the entry.
    /// - [`Error::UnsupportedMethod`] if the method's feature is disabled.
    pub fn get_or_create(
        &mut self,
        archive: impl AsRef<Path>,
        filename: &str,
        method: CompressionMethod,
        level: Option<u32>,
    ) -> Result<AdapterHandle<'_>> {
        if method == CompressionMethod::Stored {
            return Ok(AdapterHandle::Owned(Compressor::Identity));
        }

        match self.compressors.entry(CompressorKey::new(archive, filename)) {
            Entry::Occupied(slot) => {
                let existing = slot.get().method();
                if existing != method {
                    return Err(Error::MethodMismatch {
                        path: filename.to_string(),
                        existing,
                        requested: method,
                    });
                }
                Ok(AdapterHandle::Shared(slot.into_mut()))
            }
            Entry::Vacant(slot) => {
                log::debug!(
                    "creating {} compressor for '{}' in {}",
                    method,
                    filename,
                    slot.key().archive.display()
                );
                let compressor = Compressor::new(method, level)?;
                Ok(AdapterHandle::Shared(slot.insert(compressor)))
            }
        }
    }

    /// Drops the compressor registered for the entry, returning it.
    pub fn release(&mut self, archive: impl AsRef<Path>, filename: &str) -> Option<Compressor> {
        let released = self
            .compressors
            .remove(&CompressorKey::new(archive, filename));
        if released.is_some() {
            log::debug!("released compressor for '{}'", filename);
        }
        released
    }

    /// Returns true if a compressor is registered for the entry.
    pub fn contains(&self, archive: impl AsRef<Path>, filename: &str) -> bool {
        self.compressors
            .contains_key(&CompressorKey::new(archive, filename))
    }

    /// Number of live compressors.
    pub fn len(&self) -> usize {
        self.compressors.len()
    }

    /// Returns true if no compressor is registered.
    pub fn is_empty(&self) -> bool {
        self.compressors.is_empty()
    }

    /// Drops every registered compressor.
    pub fn clear(&mut self) {
        self.compressors.clear();
    }
}
