//! Error types for ktally.
//!
//! This module provides exhaustive, strongly-typed errors for all operations
//! in the library, enabling precise error handling and informative messages.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in ktally operations.
#[derive(Debug, Error)]
pub enum KtallyError {
    /// K-mer length is invalid (must be at least 1).
    #[error("invalid k-mer length {k}: must be at least 1")]
    InvalidKmerLength { k: usize },

    /// K-mer length was not set before calling a counting method.
    #[error("k-mer length not set; call .k() first")]
    KmerLengthNotSet,

    /// Encountered an invalid DNA base.
    #[error("invalid base '{base}' at position {position}")]
    InvalidBase { base: u8, position: usize },

    /// Invalid count filter configuration.
    #[error(transparent)]
    Filter(#[from] CountFilterError),

    /// Invalid read-retention threshold.
    #[error(transparent)]
    Threshold(#[from] crate::filter::ThresholdError),

    /// Failed to read sequence file.
    #[error("failed to read sequence file '{path}': {source}")]
    SequenceRead {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to parse sequence record.
    #[error("failed to parse sequence record: {details}")]
    SequenceParse { details: String },

    /// Failed to write output.
    #[error("failed to write output: {source}")]
    WriteError {
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize JSON output.
    #[error("failed to serialize JSON: {source}")]
    JsonError {
        #[source]
        source: serde_json::Error,
    },

    /// Failed to decompress gzip file.
    #[cfg(feature = "gzip")]
    #[error("failed to decompress gzip file '{path}': {source}")]
    GzipError {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to memory-map file.
    #[cfg(feature = "mmap")]
    #[error("failed to memory-map file '{path}': {source}")]
    MmapError {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to read a count table file.
    #[error("failed to read count table '{path}': {source}")]
    TableRead {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// A count table file contained a malformed line.
    #[error("invalid count table '{path}': {source}")]
    TableParse {
        #[source]
        source: crate::table::TableParseError,
        path: PathBuf,
    },

    /// Failed to read a count database file.
    #[error("failed to read database '{path}': {source}")]
    DbRead {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to write a count database file.
    #[error("failed to write database '{path}': {source}")]
    DbWrite {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Invalid or corrupted count database file.
    #[error("invalid database '{path}': {details}")]
    InvalidDb { details: String, path: PathBuf },
}

/// Error for invalid k-mer length.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("k-mer length {k} is invalid: must be at least 1")]
pub struct KmerLengthError {
    /// The invalid k value that was provided.
    pub k: usize,
}

/// Error for invalid DNA base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidBaseError {
    /// The invalid byte value.
    pub base: u8,
    /// Position of the invalid byte in the window.
    pub position: usize,
}

impl std::fmt::Display for InvalidBaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.base.is_ascii_graphic() || self.base == b' ' {
            write!(
                f,
                "invalid base '{}' (0x{:02x}) at position {}",
                self.base as char, self.base, self.position
            )
        } else {
            write!(
                f,
                "invalid base 0x{:02x} at position {}",
                self.base, self.position
            )
        }
    }
}

impl std::error::Error for InvalidBaseError {}

/// Errors for invalid count filter bounds.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CountFilterError {
    /// The minimum occurrence bound exceeds the maximum.
    #[error("minimum occurrence bound {min} exceeds maximum {max}")]
    BoundsReversed { min: u64, max: u64 },

    /// A counter cap of zero would discard every k-mer.
    #[error("counter cap must be at least 1")]
    ZeroCounterCap,
}

impl From<std::io::Error> for KtallyError {
    fn from(source: std::io::Error) -> Self {
        KtallyError::WriteError { source }
    }
}

impl From<serde_json::Error> for KtallyError {
    fn from(source: serde_json::Error) -> Self {
        KtallyError::JsonError { source }
    }
}

impl From<KmerLengthError> for KtallyError {
    fn from(err: KmerLengthError) -> Self {
        KtallyError::InvalidKmerLength { k: err.k }
    }
}

impl From<InvalidBaseError> for KtallyError {
    fn from(err: InvalidBaseError) -> Self {
        KtallyError::InvalidBase {
            base: err.base,
            position: err.position,
        }
    }
}
