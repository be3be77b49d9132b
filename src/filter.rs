//! Read filtering against a reference k-mer table.
//!
//! A [`ReadFilter`] keeps or drops whole reads by how many distinct
//! reference k-mers each read contains. Occurrence is membership: a read
//! k-mer present in the reference counts once no matter how often it
//! repeats in the read or how high its reference count is.
//!
//! Thresholds may be absolute counts or fractions of read length, so one
//! setting works across mixed-length reads:
//!
//! ```
//! use ktally::filter::Threshold;
//!
//! let min: Threshold = "0.5".parse()?;
//! assert_eq!(min.resolve(9), 4);
//! let max: Threshold = "12".parse()?;
//! assert_eq!(max.resolve(9), 12);
//! # Ok::<(), ktally::filter::ThresholdError>(())
//! ```

use std::{
    collections::HashSet,
    hash::BuildHasherDefault,
    path::Path,
    str::FromStr,
};

use bytes::Bytes;
use rayon::prelude::*;
use rustc_hash::FxHasher;
use serde::Serialize;
use thiserror::Error;

use crate::{
    count::KmerCountTable,
    error::KtallyError,
    extract::KmerWindows,
    kmer::Strandedness,
    reader::{read_records, write_records, Input, SeqRecord, SequenceFormat},
};

#[cfg(feature = "tracing")]
use tracing::{info, info_span};

/// Error for invalid read-filter thresholds.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ThresholdError {
    /// Fractional thresholds are relative to read length.
    #[error("fraction {value} is out of range: must be within 0.0..=1.0")]
    FractionOutOfRange { value: f64 },

    /// The input was neither an integer count nor a fraction.
    #[error("'{input}' is not a valid threshold: expected a count or a fraction")]
    Unparseable { input: String },
}

/// A read-filter threshold, either an absolute k-mer count or a fraction
/// of read length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    /// An absolute number of distinct reference k-mers.
    Count(u64),
    /// A fraction of the read's length, within `0.0..=1.0`.
    Fraction(f64),
}

impl Threshold {
    /// Creates a fractional threshold, validating the range.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is outside `0.0..=1.0`.
    pub fn fraction(value: f64) -> Result<Self, ThresholdError> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self::Fraction(value))
        } else {
            Err(ThresholdError::FractionOutOfRange { value })
        }
    }

    /// Resolves the threshold to an absolute count for a read of
    /// `seq_len` bases. Fractions truncate toward zero.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn resolve(&self, seq_len: usize) -> u64 {
        match self {
            Self::Count(count) => *count,
            Self::Fraction(fraction) => (fraction * seq_len as f64) as u64,
        }
    }
}

impl FromStr for Threshold {
    type Err = ThresholdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(count) = s.parse::<u64>() {
            return Ok(Self::Count(count));
        }
        match s.parse::<f64>() {
            Ok(value) => Self::fraction(value),
            Err(_) => Err(ThresholdError::Unparseable {
                input: s.to_owned(),
            }),
        }
    }
}

/// Filters reads by their distinct-k-mer overlap with a reference table.
///
/// Both bounds are optional and inclusive. A resolved bound of 0 is still
/// enforced: `max_occs` of 0 keeps only reads sharing no k-mer with the
/// reference.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use ktally::count::{count_kmers, CountFilter};
/// use ktally::filter::{ReadFilter, Threshold};
/// use ktally::kmer::Strandedness;
///
/// let reference = count_kmers(
///     vec![Bytes::from_static(b"ACGTACGT")],
///     4,
///     Strandedness::Canonical,
///     CountFilter::default(),
/// )?;
/// let filter = ReadFilter::new(&reference).min_occs(Threshold::Count(1));
/// assert!(filter.retains(&Bytes::from_static(b"ACGTTTTT")));
/// assert!(!filter.retains(&Bytes::from_static(b"GGGGGGGG")));
/// # Ok::<(), ktally::error::KtallyError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ReadFilter<'a> {
    reference: &'a KmerCountTable,
    min_occs: Option<Threshold>,
    max_occs: Option<Threshold>,
}

impl<'a> ReadFilter<'a> {
    /// Creates a filter with no bounds; every read is retained until a
    /// bound is set.
    #[must_use]
    pub const fn new(reference: &'a KmerCountTable) -> Self {
        Self {
            reference,
            min_occs: None,
            max_occs: None,
        }
    }

    /// Sets the minimum number of distinct reference k-mers a read must
    /// contain.
    #[must_use]
    pub const fn min_occs(mut self, threshold: Threshold) -> Self {
        self.min_occs = Some(threshold);
        self
    }

    /// Sets the maximum number of distinct reference k-mers a read may
    /// contain.
    #[must_use]
    pub const fn max_occs(mut self, threshold: Threshold) -> Self {
        self.max_occs = Some(threshold);
        self
    }

    /// Counts the distinct reference k-mers present in a sequence.
    ///
    /// K-mers are extracted with the reference's k and strand policy.
    #[must_use]
    pub fn overlap(&self, seq: &Bytes) -> u64 {
        let mut seen: HashSet<Bytes, BuildHasherDefault<FxHasher>> = HashSet::default();
        let windows =
            KmerWindows::new(seq.clone(), self.reference.k(), self.reference.strandedness());
        for kmer in windows {
            let bytes = kmer.into_bytes();
            if self.reference.contains(&bytes) {
                seen.insert(bytes);
            }
        }
        seen.len() as u64
    }

    /// Tests whether a sequence passes both bounds.
    #[must_use]
    pub fn retains(&self, seq: &Bytes) -> bool {
        let occs = self.overlap(seq);
        let min = self.min_occs.map(|t| t.resolve(seq.len()));
        let max = self.max_occs.map(|t| t.resolve(seq.len()));
        min.map_or(true, |m| occs >= m) && max.map_or(true, |m| occs <= m)
    }

    /// Filters a batch of records, preserving input order.
    ///
    /// Records are tested in parallel.
    #[must_use]
    pub fn filter_records(&self, records: Vec<SeqRecord>) -> (Vec<SeqRecord>, FilterSummary) {
        let reads_in = records.len();
        let keep: Vec<bool> = records
            .par_iter()
            .map(|record| self.retains(&record.seq))
            .collect();

        let kept: Vec<SeqRecord> = records
            .into_iter()
            .zip(keep)
            .filter_map(|(record, keep)| keep.then_some(record))
            .collect();

        let summary = FilterSummary {
            reads_in,
            reads_kept: kept.len(),
            reads_dropped: reads_in - kept.len(),
            reference_kmers: self.reference.len(),
            k: self.reference.k().get(),
            strandedness: self.reference.strandedness(),
        };
        (kept, summary)
    }
}

/// Outcome of a filtering run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FilterSummary {
    /// Number of reads examined.
    pub reads_in: usize,
    /// Number of reads retained.
    pub reads_kept: usize,
    /// Number of reads dropped.
    pub reads_dropped: usize,
    /// Number of distinct k-mers in the reference table.
    pub reference_kmers: usize,
    /// K-mer length of the reference table.
    pub k: usize,
    /// Strand policy of the reference table.
    pub strandedness: Strandedness,
}

/// Filters a sequence file against a reference table, writing retained
/// reads to `output` (or stdout when `None`) in the resolved input format.
///
/// # Errors
///
/// Returns an error if the reads cannot be read or the output cannot be
/// written.
pub fn filter_file(
    reference: &KmerCountTable,
    reads: &Input,
    format: SequenceFormat,
    output: Option<&Path>,
    min_occs: Option<Threshold>,
    max_occs: Option<Threshold>,
) -> Result<FilterSummary, KtallyError> {
    #[cfg(feature = "tracing")]
    let _span = info_span!("filter_file", %reads).entered();

    let resolved = format.resolve(reads.as_path());
    let records = read_records(reads, format)?;

    let mut filter = ReadFilter::new(reference);
    if let Some(threshold) = min_occs {
        filter = filter.min_occs(threshold);
    }
    if let Some(threshold) = max_occs {
        filter = filter.max_occs(threshold);
    }
    let (kept, summary) = filter.filter_records(records);

    #[cfg(feature = "tracing")]
    info!(
        reads_in = summary.reads_in,
        reads_kept = summary.reads_kept,
        "filtered reads"
    );

    match output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .map_err(|source| KtallyError::WriteError { source })?;
            write_records(&kept, resolved, std::io::BufWriter::new(file))?;
        }
        None => {
            let stdout = std::io::stdout();
            write_records(&kept, resolved, stdout.lock())?;
        }
    }

    Ok(summary)
}
