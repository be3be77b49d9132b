//! Exact k-mer counting and k-mer-based read filtering.
//!
//! `ktally` counts the k-length substrings of DNA sequences from FASTA and
//! FASTQ files, either per strand or canonically (a k-mer and its reverse
//! complement tallied together). Count tables can be capped and bounded,
//! persisted to a compact binary database, rendered as text, and used to
//! keep or drop whole reads by how many database k-mers they contain.
//!
//! Windows containing a base other than `ACGT` (case-insensitive) are
//! skipped; counting resumes immediately after the offending byte.
//!
//! # Quick start
//!
//! ```
//! use bytes::Bytes;
//! use ktally::count::{count_kmers, CountFilter};
//! use ktally::kmer::Strandedness;
//!
//! let table = count_kmers(
//!     vec![Bytes::from_static(b"AAAAAAAAAAAAAAA")],
//!     4,
//!     Strandedness::Canonical,
//!     CountFilter::default(),
//! )?;
//!
//! // A 15-base homopolymer has twelve 4-base windows.
//! assert_eq!(table.get(b"AAAA"), Some(12));
//! # Ok::<(), ktally::error::KtallyError>(())
//! ```
//!
//! # Cargo features
//!
//! - `gzip`: read and write `.gz` sequence files, count tables, and
//!   databases
//! - `mmap`: memory-mapped reading of large sequence files
//! - `tracing`: structured logging instrumentation
//! - `production`: all of the above

pub mod builder;
pub mod cli;
pub mod commands;
pub mod count;
pub mod db;
pub mod error;
pub mod extract;
pub mod filter;
pub mod histogram;
pub mod kmer;
#[cfg(feature = "mmap")]
pub mod mmap;
pub mod reader;
pub mod table;

pub use builder::Counter;
pub use count::{count_kmers, CountFilter, KmerCountTable};
pub use error::KtallyError;
pub use extract::extract_kmers;
pub use filter::{ReadFilter, Threshold};
pub use kmer::{Kmer, KmerLength, Strandedness};
