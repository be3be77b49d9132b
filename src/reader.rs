//! Sequence input: sources, formats, and record parsing.
//!
//! Input comes from a file path or stdin ([`Input`]), in FASTA or FASTQ
//! format ([`SequenceFormat`], auto-detected from the extension when not
//! given explicitly). Records keep their id, description, and quality
//! string so filtered reads can be written back out unchanged.
//!
//! With the `gzip` feature, files ending in `.gz` are decompressed
//! transparently.
//!
//! # Example
//!
//! ```rust
//! use ktally::reader::{Input, SequenceFormat};
//! use std::path::Path;
//!
//! let input = Input::from_path(Path::new("-"));
//! assert!(input.is_stdin());
//!
//! let format = SequenceFormat::Auto.resolve(Some(Path::new("reads.fq.gz")));
//! assert_eq!(format, SequenceFormat::Fastq);
//! ```

use std::{
    ffi::OsStr,
    fs::File,
    io::{self, BufReader, Read, Write},
    path::{Path, PathBuf},
};

use bio::io::{fasta, fastq};
use bytes::Bytes;
use clap::ValueEnum;

use crate::error::KtallyError;

/// Input source for sequence data.
///
/// Represents either a file path or standard input, allowing the same
/// parsing logic to work with both.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Input {
    /// Read from a file at the specified path.
    File(PathBuf),
    /// Read from standard input.
    #[default]
    Stdin,
}

impl Input {
    /// Creates an `Input` from a path; `-` selects stdin.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        if path.as_os_str() == "-" {
            Self::Stdin
        } else {
            Self::File(path.to_path_buf())
        }
    }

    /// Creates an `Input` from an optional path; `None` or `-` selects
    /// stdin.
    #[must_use]
    pub fn from_option(path: Option<&Path>) -> Self {
        path.map_or(Self::Stdin, Self::from_path)
    }

    /// Returns `true` if this input is stdin.
    #[must_use]
    pub const fn is_stdin(&self) -> bool {
        matches!(self, Self::Stdin)
    }

    /// Returns the file path if this is a file input.
    #[must_use]
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Stdin => None,
        }
    }
}

impl std::fmt::Display for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Stdin => write!(f, "<stdin>"),
        }
    }
}

/// Sequence file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SequenceFormat {
    /// Auto-detect from the file extension, after stripping `.gz`:
    /// `.fq`/`.fastq` is FASTQ, anything else (including stdin) is FASTA.
    #[default]
    Auto,
    /// FASTA format (`.fa`, `.fasta`, `.fna`).
    Fasta,
    /// FASTQ format (`.fq`, `.fastq`).
    Fastq,
}

impl SequenceFormat {
    /// Detects the sequence format from a file path's extension.
    ///
    /// Handles gzip-compressed files by stripping the `.gz` extension
    /// first.
    #[must_use]
    pub fn from_extension(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_lowercase);

        let effective_ext = match ext.as_deref() {
            Some("gz") => path
                .file_stem()
                .and_then(|stem| Path::new(stem).extension())
                .and_then(OsStr::to_str)
                .map(str::to_lowercase),
            other => other.map(String::from),
        };

        match effective_ext.as_deref() {
            Some("fq" | "fastq") => Self::Fastq,
            _ => Self::Fasta,
        }
    }

    /// Resolves `Auto` to a concrete format; stdin defaults to FASTA.
    #[must_use]
    pub fn resolve(self, path: Option<&Path>) -> Self {
        match self {
            Self::Auto => path.map_or(Self::Fasta, Self::from_extension),
            other => other,
        }
    }

    /// Returns `true` if this format is FASTQ.
    #[must_use]
    pub const fn is_fastq(self) -> bool {
        matches!(self, Self::Fastq)
    }
}

impl std::fmt::Display for SequenceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Fasta => write!(f, "fasta"),
            Self::Fastq => write!(f, "fastq"),
        }
    }
}

/// A parsed sequence record.
///
/// For FASTA input, `qual` is always `None`; for FASTQ it holds the
/// Phred+33 quality string, unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqRecord {
    pub id: String,
    pub desc: Option<String>,
    pub seq: Bytes,
    pub qual: Option<Bytes>,
}

impl SeqRecord {
    /// Returns the sequence length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    /// Returns `true` if the sequence is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }
}

impl From<fasta::Record> for SeqRecord {
    fn from(record: fasta::Record) -> Self {
        Self {
            id: record.id().to_owned(),
            desc: record.desc().map(str::to_owned),
            seq: Bytes::copy_from_slice(record.seq()),
            qual: None,
        }
    }
}

impl From<fastq::Record> for SeqRecord {
    fn from(record: fastq::Record) -> Self {
        Self {
            id: record.id().to_owned(),
            desc: record.desc().map(str::to_owned),
            seq: Bytes::copy_from_slice(record.seq()),
            qual: Some(Bytes::copy_from_slice(record.qual())),
        }
    }
}

/// Reads all records from an input source.
///
/// # Errors
///
/// Returns an error if the source cannot be opened or a record cannot be
/// parsed.
pub fn read_records(input: &Input, format: SequenceFormat) -> Result<Vec<SeqRecord>, KtallyError> {
    let resolved = format.resolve(input.as_path());
    match input {
        Input::Stdin => records_from_reader(io::stdin().lock(), resolved),
        Input::File(path) => {
            let file = File::open(path).map_err(|source| KtallyError::SequenceRead {
                source,
                path: path.clone(),
            })?;

            #[cfg(feature = "gzip")]
            if is_gzip_path(path) {
                let decoder = flate2::read::GzDecoder::new(file);
                return records_from_reader(BufReader::new(decoder), resolved);
            }

            records_from_reader(BufReader::new(file), resolved)
        }
    }
}

/// Reads the sequences of an input source, discarding ids and qualities.
///
/// # Errors
///
/// Returns an error if the source cannot be opened or a record cannot be
/// parsed.
pub fn read_sequences(input: &Input, format: SequenceFormat) -> Result<Vec<Bytes>, KtallyError> {
    Ok(read_records(input, format)?
        .into_iter()
        .map(|record| record.seq)
        .collect())
}

/// Parses records from an in-memory buffer.
///
/// # Errors
///
/// Returns an error if a record cannot be parsed.
pub fn records_from_bytes(
    bytes: &[u8],
    format: SequenceFormat,
) -> Result<Vec<SeqRecord>, KtallyError> {
    records_from_reader(bytes, format.resolve(None))
}

fn records_from_reader<R: Read>(
    reader: R,
    format: SequenceFormat,
) -> Result<Vec<SeqRecord>, KtallyError> {
    match format {
        SequenceFormat::Fastq => fastq::Reader::new(reader)
            .records()
            .map(|record| record.map(SeqRecord::from))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| KtallyError::SequenceParse {
                details: e.to_string(),
            }),
        SequenceFormat::Fasta | SequenceFormat::Auto => fasta::Reader::new(reader)
            .records()
            .map(|record| record.map(SeqRecord::from))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| KtallyError::SequenceParse {
                details: e.to_string(),
            }),
    }
}

/// Writes records in the given format.
///
/// # Errors
///
/// Returns an error if a record cannot be written, or if FASTQ output is
/// requested for a record without quality scores.
pub fn write_records<W: Write>(
    records: &[SeqRecord],
    format: SequenceFormat,
    writer: W,
) -> Result<(), KtallyError> {
    match format {
        SequenceFormat::Fastq => {
            let mut out = fastq::Writer::new(writer);
            for record in records {
                let qual = record.qual.as_ref().ok_or_else(|| KtallyError::WriteError {
                    source: io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("record '{}' has no quality scores for FASTQ output", record.id),
                    ),
                })?;
                out.write(&record.id, record.desc.as_deref(), &record.seq, qual)
                    .map_err(|source| KtallyError::WriteError { source })?;
            }
            out.flush().map_err(|source| KtallyError::WriteError { source })
        }
        SequenceFormat::Fasta | SequenceFormat::Auto => {
            let mut out = fasta::Writer::new(writer);
            for record in records {
                out.write(&record.id, record.desc.as_deref(), &record.seq)
                    .map_err(|source| KtallyError::WriteError { source })?;
            }
            out.flush().map_err(|source| KtallyError::WriteError { source })
        }
    }
}

/// Checks if a path has a `.gz` extension.
#[cfg(feature = "gzip")]
pub(crate) fn is_gzip_path(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}
