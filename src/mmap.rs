//! Memory-mapped sequence input.
//!
//! [`MmapSequenceFile`] maps an uncompressed FASTA or FASTQ file into
//! memory and parses records straight out of the mapping, skipping the
//! buffered-read copy the regular [`reader`](crate::reader) path makes.
//! The format is resolved against the path at open time, so a mapped
//! `reads.fq` parses as FASTQ without the caller repeating the detection.
//!
//! Compressed files cannot be mapped meaningfully; `.gz` paths are
//! rejected up front rather than handed to the record parser as raw
//! deflate bytes. The underlying file must not be modified while the
//! mapping is alive.

use std::{fs::File, path::Path};

use memmap2::Mmap;

use crate::{
    error::KtallyError,
    reader::{records_from_bytes, SeqRecord, SequenceFormat},
};

/// An uncompressed sequence file mapped into memory.
#[derive(Debug)]
pub struct MmapSequenceFile {
    map: Mmap,
    format: SequenceFormat,
}

impl MmapSequenceFile {
    /// Maps a sequence file, resolving `format` against the path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path ends in `.gz` or the file cannot be
    /// opened or mapped.
    #[allow(unsafe_code)]
    pub fn open(path: &Path, format: SequenceFormat) -> Result<Self, KtallyError> {
        let mmap_err = |source| KtallyError::MmapError {
            source,
            path: path.to_path_buf(),
        };

        if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
        {
            return Err(mmap_err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "compressed files cannot be memory-mapped",
            )));
        }

        let file = File::open(path).map_err(mmap_err)?;
        // SAFETY: the mapping is read-only; the file staying unmodified
        // for the mapping's lifetime is the caller's contract.
        let map = unsafe { Mmap::map(&file) }.map_err(mmap_err)?;
        Ok(Self {
            map,
            format: format.resolve(Some(path)),
        })
    }

    /// Returns the format records will be parsed as.
    #[must_use]
    pub const fn format(&self) -> SequenceFormat {
        self.format
    }

    /// Returns the raw mapped bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.map
    }

    /// Parses every record out of the mapping.
    ///
    /// # Errors
    ///
    /// Returns an error if the mapped bytes are not valid for the
    /// resolved format.
    pub fn records(&self) -> Result<Vec<SeqRecord>, KtallyError> {
        records_from_bytes(&self.map, self.format)
    }
}
