//! Parallel k-mer counting into immutable count tables.
//!
//! Counting tallies every window produced by [`KmerWindows`] into a
//! concurrent map, one rayon task per sequence, then applies the
//! [`CountFilter`] in two steps: the counter cap clamps each tally, and the
//! occurrence bounds then remove k-mers whose *capped* count falls outside
//! `[min, max]`. The result is an isolated [`KmerCountTable`]; no state is
//! shared between calls.
//!
//! # Example
//!
//! ```rust
//! use bytes::Bytes;
//! use ktally::count::{count_kmers, CountFilter};
//! use ktally::kmer::Strandedness;
//!
//! let sequences = vec![Bytes::from_static(b"AAAAAAAAAAAAAAA")];
//! let table = count_kmers(sequences, 4, Strandedness::Canonical, CountFilter::default())?;
//! assert_eq!(table.get(b"AAAA"), Some(12));
//! # Ok::<(), ktally::error::KtallyError>(())
//! ```

use std::{collections::HashMap, hash::BuildHasherDefault};

use bytes::Bytes;
use dashmap::DashMap;
use rayon::prelude::*;
use rustc_hash::FxHasher;

use crate::{
    error::{CountFilterError, KtallyError},
    extract::KmerWindows,
    kmer::{KmerLength, Strandedness},
    reader::{read_records, Input, SeqRecord, SequenceFormat},
};

#[cfg(feature = "tracing")]
use tracing::{info, info_span};

/// Occurrence bounds and counter cap applied after tallying.
///
/// All fields are optional; an absent field places no constraint. The cap
/// clamps counts before the bounds are tested, and k-mers whose capped count
/// falls outside `[min_occs, max_occs]` are removed from the table entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountFilter {
    /// Minimum capped count a k-mer must reach to be kept.
    pub min_occs: Option<u64>,
    /// Maximum capped count a k-mer may have and still be kept.
    pub max_occs: Option<u64>,
    /// Counts are clamped to this value before the bounds are tested.
    pub counter_cap: Option<u64>,
}

impl CountFilter {
    /// Checks that the configuration is satisfiable.
    ///
    /// # Errors
    ///
    /// Returns [`CountFilterError`] if `min_occs > max_occs` or the counter
    /// cap is zero.
    pub fn validate(self) -> Result<(), CountFilterError> {
        if let (Some(min), Some(max)) = (self.min_occs, self.max_occs) {
            if min > max {
                return Err(CountFilterError::BoundsReversed { min, max });
            }
        }
        if self.counter_cap == Some(0) {
            return Err(CountFilterError::ZeroCounterCap);
        }
        Ok(())
    }

    fn cap(self, count: u64) -> u64 {
        self.counter_cap.map_or(count, |cap| count.min(cap))
    }

    fn retains(self, capped: u64) -> bool {
        self.min_occs.map_or(true, |min| capped >= min)
            && self.max_occs.map_or(true, |max| capped <= max)
    }
}

/// An immutable k-mer count table.
///
/// Maps each k-mer to its occurrence count, and remembers the `k` and
/// [`Strandedness`] it was built with. Two tables are equal when all three
/// agree; iteration order is not part of the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmerCountTable {
    k: KmerLength,
    strandedness: Strandedness,
    counts: HashMap<Bytes, u64>,
}

impl KmerCountTable {
    pub(crate) fn new(
        k: KmerLength,
        strandedness: Strandedness,
        counts: HashMap<Bytes, u64>,
    ) -> Self {
        Self {
            k,
            strandedness,
            counts,
        }
    }

    /// Returns the k-mer length the table was built with.
    #[must_use]
    pub const fn k(&self) -> KmerLength {
        self.k
    }

    /// Returns the strandedness the table was built with.
    #[must_use]
    pub const fn strandedness(&self) -> Strandedness {
        self.strandedness
    }

    /// Returns the number of distinct k-mers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns `true` if the table contains no k-mers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Looks up the count for a k-mer.
    #[must_use]
    pub fn get(&self, kmer: &[u8]) -> Option<u64> {
        self.counts.get(kmer).copied()
    }

    /// Returns `true` if the k-mer is present.
    #[must_use]
    pub fn contains(&self, kmer: &[u8]) -> bool {
        self.counts.contains_key(kmer)
    }

    /// Iterates over `(kmer, count)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&Bytes, u64)> {
        self.counts.iter().map(|(kmer, &count)| (kmer, count))
    }

    /// Returns a reference to the underlying counts.
    #[must_use]
    pub const fn counts(&self) -> &HashMap<Bytes, u64> {
        &self.counts
    }

    /// Consumes the table and returns the underlying counts.
    #[must_use]
    pub fn into_counts(self) -> HashMap<Bytes, u64> {
        self.counts
    }

    /// Converts the table to string-keyed counts.
    ///
    /// Useful for interoperability with text-based formats and tests.
    #[must_use]
    pub fn to_string_counts(&self) -> HashMap<String, u64> {
        self.counts
            .iter()
            .map(|(kmer, &count)| (String::from_utf8_lossy(kmer).into_owned(), count))
            .collect()
    }

    /// Counts how many of this table's k-mers occur as keys of `reference`.
    ///
    /// Only key membership matters; the reference's count values are
    /// ignored.
    #[must_use]
    pub fn occurrence_overlap(&self, reference: &Self) -> u64 {
        self.counts
            .keys()
            .filter(|kmer| reference.contains(kmer))
            .count() as u64
    }
}

/// Counts k-mers across a batch of in-memory sequences.
///
/// Validates `k` upfront, then tallies all sequences in parallel and applies
/// `filter`.
///
/// # Errors
///
/// Returns an error if `k` is zero or `filter` is unsatisfiable.
pub fn count_kmers<I>(
    sequences: I,
    k: usize,
    strandedness: Strandedness,
    filter: CountFilter,
) -> Result<KmerCountTable, KtallyError>
where
    I: IntoIterator<Item = Bytes>,
{
    let k = KmerLength::new(k)?;
    count_sequences(sequences.into_iter().collect(), k, strandedness, filter)
}

/// Counts k-mers across a batch of sequences with a pre-validated length.
///
/// # Errors
///
/// Returns an error if `filter` is unsatisfiable.
pub fn count_sequences(
    sequences: Vec<Bytes>,
    k: KmerLength,
    strandedness: Strandedness,
    filter: CountFilter,
) -> Result<KmerCountTable, KtallyError> {
    filter.validate()?;

    #[cfg(feature = "tracing")]
    let _span = info_span!(
        "count_sequences",
        k = k.get(),
        sequences = sequences.len()
    )
    .entered();

    let tally = TallyMap::new();
    sequences
        .par_iter()
        .for_each(|seq| tally.tally_sequence(seq.clone(), k, strandedness));
    let table = tally.into_table(k, strandedness, filter);

    #[cfg(feature = "tracing")]
    info!(unique_kmers = table.len(), "k-mer counting complete");

    Ok(table)
}

/// Counts k-mers across parsed sequence records.
///
/// # Errors
///
/// Returns an error if `filter` is unsatisfiable.
pub fn count_records(
    records: &[SeqRecord],
    k: KmerLength,
    strandedness: Strandedness,
    filter: CountFilter,
) -> Result<KmerCountTable, KtallyError> {
    filter.validate()?;

    let tally = TallyMap::new();
    records
        .par_iter()
        .for_each(|record| tally.tally_sequence(record.seq.clone(), k, strandedness));
    let table = tally.into_table(k, strandedness, filter);

    #[cfg(feature = "tracing")]
    info!(unique_kmers = table.len(), "k-mer counting complete");

    Ok(table)
}

/// Counts k-mers from a sequence file or stdin.
///
/// # Errors
///
/// Returns an error if the input cannot be read or parsed, or if `filter`
/// is unsatisfiable.
pub fn count_file(
    input: &Input,
    format: SequenceFormat,
    k: KmerLength,
    strandedness: Strandedness,
    filter: CountFilter,
) -> Result<KmerCountTable, KtallyError> {
    #[cfg(feature = "tracing")]
    let _span = info_span!("count_file", input = %input, k = k.get()).entered();

    let records = read_records(input, format)?;

    #[cfg(feature = "tracing")]
    info!(sequences = records.len(), "read sequences from input");

    count_records(&records, k, strandedness, filter)
}

/// Counts k-mers from several sequence files, as one combined batch.
///
/// # Errors
///
/// Returns an error if any input cannot be read or parsed, or if `filter`
/// is unsatisfiable.
pub fn count_files(
    inputs: &[Input],
    format: SequenceFormat,
    k: KmerLength,
    strandedness: Strandedness,
    filter: CountFilter,
) -> Result<KmerCountTable, KtallyError> {
    let mut records = Vec::new();
    for input in inputs {
        records.extend(read_records(input, format)?);
    }
    count_records(&records, k, strandedness, filter)
}

/// Counts k-mers from a memory-mapped sequence file.
///
/// The file must be uncompressed; the mapping is parsed in place without
/// copying the file into memory first.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, mapped, or parsed, or if
/// `filter` is unsatisfiable.
#[cfg(feature = "mmap")]
pub fn count_file_mmap(
    path: &std::path::Path,
    format: SequenceFormat,
    k: KmerLength,
    strandedness: Strandedness,
    filter: CountFilter,
) -> Result<KmerCountTable, KtallyError> {
    use crate::mmap::MmapSequenceFile;

    let mapped = MmapSequenceFile::open(path, format)?;
    let records = mapped.records()?;
    count_records(&records, k, strandedness, filter)
}

/// A custom `DashMap` w/ `FxHasher`.
type DashFx = DashMap<Bytes, u64, BuildHasherDefault<FxHasher>>;

struct TallyMap(DashFx);

impl TallyMap {
    fn new() -> Self {
        Self(DashMap::with_hasher(
            BuildHasherDefault::<FxHasher>::default(),
        ))
    }

    fn tally_sequence(&self, seq: Bytes, k: KmerLength, strandedness: Strandedness) {
        for kmer in KmerWindows::new(seq, k, strandedness) {
            *self.0.entry(kmer.into_bytes()).or_insert(0) += 1;
        }
    }

    fn into_table(
        self,
        k: KmerLength,
        strandedness: Strandedness,
        filter: CountFilter,
    ) -> KmerCountTable {
        let counts: HashMap<Bytes, u64> = self
            .0
            .into_iter()
            .par_bridge()
            .map(|(kmer, count)| (kmer, filter.cap(count)))
            .filter(|&(_, count)| filter.retains(count))
            .collect();
        KmerCountTable::new(k, strandedness, counts)
    }
}
