//! Text serialization of count tables.
//!
//! The dump format is one `<kmer><TAB><count>` pair per line with no
//! header, the same shape external counters dump. The parser is strict:
//! any line that is not a valid k-mer of the table's length plus a
//! positive integer count is reported as a [`TableParseError`] carrying
//! its 1-based line number. Whitespace of any kind separates the two
//! columns; blank lines are tolerated.
//!
//! [`render_table`] additionally offers the FASTA-like and JSON renderings
//! used by the CLI. All renderings are sorted by k-mer so output is
//! deterministic; readers must not rely on any particular order.

use std::{
    collections::{HashMap, HashSet},
    fs::File,
    io::{BufRead, BufReader, Write},
    path::Path,
};

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

use crate::{
    cli::OutputFormat,
    count::KmerCountTable,
    error::{InvalidBaseError, KtallyError},
    kmer::{Kmer, KmerLength, Strandedness},
};

/// A malformed line in a count table file.
#[derive(Debug, Error)]
pub enum TableParseError {
    /// A line did not have exactly two whitespace-separated columns.
    #[error("line {line}: expected '<kmer> <count>', found {found} columns")]
    ColumnCount { line: usize, found: usize },

    /// The k-mer column contained an invalid base.
    #[error("line {line}: {source}")]
    InvalidKmer {
        line: usize,
        #[source]
        source: InvalidBaseError,
    },

    /// The k-mer column had the wrong length.
    #[error("line {line}: k-mer length {found} does not match table k {expected}")]
    LengthMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// The count column was not a positive integer.
    #[error("line {line}: '{value}' is not a valid count")]
    InvalidCount { line: usize, value: String },

    /// Counts in a table are always at least 1.
    #[error("line {line}: count must be at least 1")]
    ZeroCount { line: usize },

    /// The same k-mer appeared on two lines.
    #[error("line {line}: duplicate k-mer '{kmer}'")]
    Duplicate { line: usize, kmer: String },

    /// Reading the underlying stream failed.
    #[error("read failed at line {line}: {source}")]
    Io {
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

/// A k-mer with its count, used for JSON serialization.
#[derive(Serialize)]
struct KmerCountEntry {
    kmer: String,
    count: u64,
}

/// Writes a table in dump format, sorted by k-mer.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_table<W: Write>(table: &KmerCountTable, writer: W) -> Result<(), KtallyError> {
    render_table(table, OutputFormat::Tsv, writer)
}

/// Renders a table in the requested output format, sorted by k-mer.
///
/// # Errors
///
/// Returns an error if the writer fails or JSON serialization fails.
pub fn render_table<W: Write>(
    table: &KmerCountTable,
    format: OutputFormat,
    mut writer: W,
) -> Result<(), KtallyError> {
    let mut entries: Vec<(&Bytes, u64)> = table.iter().collect();
    entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));

    match format {
        OutputFormat::Tsv => {
            for (kmer, count) in entries {
                writeln!(writer, "{}\t{count}", String::from_utf8_lossy(kmer))?;
            }
        }
        OutputFormat::Fasta => {
            for (kmer, count) in entries {
                writeln!(writer, ">{count}\n{}", String::from_utf8_lossy(kmer))?;
            }
        }
        OutputFormat::Json => {
            let json_data: Vec<KmerCountEntry> = entries
                .into_iter()
                .map(|(kmer, count)| KmerCountEntry {
                    kmer: String::from_utf8_lossy(kmer).into_owned(),
                    count,
                })
                .collect();
            serde_json::to_writer_pretty(&mut writer, &json_data)?;
            writeln!(writer)?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Parses a count table from dump-format text.
///
/// Keys are oriented per `strandedness`, so a dump written by either
/// strand policy reloads into a table honoring this one. When two lines
/// collapse to the same canonical key (a k-mer and its reverse
/// complement, from a single-strand dump), their counts are summed; a
/// literal repeat of the same k-mer is still a [`TableParseError::Duplicate`].
///
/// # Errors
///
/// Returns a [`TableParseError`] naming the first malformed line.
pub fn parse_table<R: BufRead>(
    reader: R,
    k: KmerLength,
    strandedness: Strandedness,
) -> Result<KmerCountTable, TableParseError> {
    let mut counts: HashMap<Bytes, u64> = HashMap::new();
    let mut seen: HashSet<Bytes> = HashSet::new();

    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line.map_err(|source| TableParseError::Io {
            line: line_number,
            source,
        })?;

        let mut columns = line.split_ascii_whitespace();
        let Some(kmer_text) = columns.next() else {
            continue;
        };
        let Some(count_text) = columns.next() else {
            return Err(TableParseError::ColumnCount {
                line: line_number,
                found: 1,
            });
        };
        if columns.next().is_some() {
            return Err(TableParseError::ColumnCount {
                line: line_number,
                found: 3 + columns.count(),
            });
        }

        if kmer_text.len() != k.get() {
            return Err(TableParseError::LengthMismatch {
                line: line_number,
                expected: k.get(),
                found: kmer_text.len(),
            });
        }
        let kmer = Kmer::from_window(Bytes::copy_from_slice(kmer_text.as_bytes())).map_err(
            |source| TableParseError::InvalidKmer {
                line: line_number,
                source,
            },
        )?;

        let count: u64 = count_text
            .parse()
            .map_err(|_| TableParseError::InvalidCount {
                line: line_number,
                value: count_text.to_owned(),
            })?;
        if count == 0 {
            return Err(TableParseError::ZeroCount { line: line_number });
        }

        // Duplicates are detected on the k-mer as written, before
        // orientation, so a single-strand dump's AAAA/TTTT pair merges
        // instead of erroring.
        if !seen.insert(kmer.clone().into_bytes()) {
            return Err(TableParseError::Duplicate {
                line: line_number,
                kmer: kmer_text.to_owned(),
            });
        }
        *counts.entry(strandedness.orient(kmer).into_bytes()).or_insert(0) += count;
    }

    Ok(KmerCountTable::new(k, strandedness, counts))
}

/// Reads a count table from a dump-format file.
///
/// Files ending in `.gz` are decompressed when the `gzip` feature is
/// enabled.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or contains a malformed
/// line.
pub fn read_table_path<P: AsRef<Path>>(
    path: P,
    k: KmerLength,
    strandedness: Strandedness,
) -> Result<KmerCountTable, KtallyError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| KtallyError::TableRead {
        source,
        path: path.to_path_buf(),
    })?;

    #[cfg(feature = "gzip")]
    if crate::reader::is_gzip_path(path) {
        let decoder = flate2::read::GzDecoder::new(file);
        return parse_table(BufReader::new(decoder), k, strandedness).map_err(|source| {
            KtallyError::TableParse {
                source,
                path: path.to_path_buf(),
            }
        });
    }

    parse_table(BufReader::new(file), k, strandedness).map_err(|source| KtallyError::TableParse {
        source,
        path: path.to_path_buf(),
    })
}
