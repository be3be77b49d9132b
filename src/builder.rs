//! Builder pattern API for ergonomic k-mer counting.
//!
//! This module provides a fluent builder interface for configuring and
//! executing k-mer counting operations.
//!
//! # Example
//!
//! ```rust,no_run
//! use ktally::builder::Counter;
//!
//! let table = Counter::new()
//!     .k(21)?
//!     .min_occs(2)
//!     .count_path("genome.fa")?;
//!
//! println!("Found {} unique k-mers", table.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::path::Path;

use bytes::Bytes;

use crate::{
    count::{count_file, count_sequences, CountFilter, KmerCountTable},
    error::{KmerLengthError, KtallyError},
    kmer::{KmerLength, Strandedness},
    reader::{Input, SequenceFormat},
};

/// A builder for configuring k-mer counting operations.
///
/// Use [`Counter::new()`] to create a new builder, configure it with the
/// fluent API, then call [`count()`](Counter::count) or
/// [`count_path()`](Counter::count_path) to execute.
///
/// # Example
///
/// ```rust,no_run
/// use ktally::builder::Counter;
/// use ktally::kmer::Strandedness;
///
/// // Basic usage
/// let table = Counter::new()
///     .k(21)?
///     .count_path("sequences.fa")?;
///
/// // With all options
/// let table = Counter::new()
///     .k(21)?
///     .strandedness(Strandedness::Single)
///     .min_occs(5)
///     .counter_cap(1000)
///     .count_path("sequences.fa")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Counter {
    k: Option<KmerLength>,
    strandedness: Strandedness,
    filter: CountFilter,
}

impl Counter {
    /// Creates a new `Counter` builder with default settings.
    ///
    /// Default settings:
    /// - `k`: None (must be set before counting)
    /// - `strandedness`: canonical (a k-mer and its reverse complement are
    ///   counted together)
    /// - no count bounds and no counter cap
    ///
    /// # Example
    ///
    /// ```rust
    /// use ktally::builder::Counter;
    ///
    /// let counter = Counter::new();
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the k-mer length.
    ///
    /// # Errors
    ///
    /// Returns [`KmerLengthError`] if `k` is zero.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ktally::builder::Counter;
    ///
    /// let counter = Counter::new().k(21)?;
    /// # Ok::<(), ktally::error::KmerLengthError>(())
    /// ```
    pub fn k(mut self, k: usize) -> Result<Self, KmerLengthError> {
        self.k = Some(KmerLength::new(k)?);
        Ok(self)
    }

    /// Sets the k-mer length from a pre-validated `KmerLength`.
    ///
    /// Use this when you already have a validated `KmerLength` instance.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ktally::builder::Counter;
    /// use ktally::kmer::KmerLength;
    ///
    /// let k = KmerLength::new(21)?;
    /// let counter = Counter::new().k_validated(k);
    /// # Ok::<(), ktally::error::KmerLengthError>(())
    /// ```
    #[must_use]
    pub fn k_validated(mut self, k: KmerLength) -> Self {
        self.k = Some(k);
        self
    }

    /// Sets the strand policy.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ktally::builder::Counter;
    /// use ktally::kmer::Strandedness;
    ///
    /// let counter = Counter::new()
    ///     .k(21)?
    ///     .strandedness(Strandedness::Single);
    /// # Ok::<(), ktally::error::KmerLengthError>(())
    /// ```
    #[must_use]
    pub fn strandedness(mut self, strandedness: Strandedness) -> Self {
        self.strandedness = strandedness;
        self
    }

    /// Sets the minimum count threshold.
    ///
    /// K-mers with capped counts below this threshold are excluded from
    /// results.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ktally::builder::Counter;
    ///
    /// // Only include k-mers that appear at least 5 times
    /// let counter = Counter::new()
    ///     .k(21)?
    ///     .min_occs(5);
    /// # Ok::<(), ktally::error::KmerLengthError>(())
    /// ```
    #[must_use]
    pub fn min_occs(mut self, min_occs: u64) -> Self {
        self.filter.min_occs = Some(min_occs);
        self
    }

    /// Sets the maximum count threshold.
    ///
    /// K-mers with capped counts above this threshold are excluded from
    /// results.
    #[must_use]
    pub fn max_occs(mut self, max_occs: u64) -> Self {
        self.filter.max_occs = Some(max_occs);
        self
    }

    /// Sets the counter cap.
    ///
    /// Counts saturate at the cap before the min/max bounds are tested.
    #[must_use]
    pub fn counter_cap(mut self, counter_cap: u64) -> Self {
        self.filter.counter_cap = Some(counter_cap);
        self
    }

    /// Counts k-mers across in-memory sequences.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `k` has not been set
    /// - The configured count bounds are unsatisfiable
    ///
    /// # Example
    ///
    /// ```rust
    /// use bytes::Bytes;
    /// use ktally::builder::Counter;
    ///
    /// let table = Counter::new()
    ///     .k(4)?
    ///     .count(vec![Bytes::from_static(b"AAAAAAAAAAAAAAA")])?;
    ///
    /// assert_eq!(table.get(b"AAAA"), Some(12));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn count<I>(&self, sequences: I) -> Result<KmerCountTable, KtallyError>
    where
        I: IntoIterator<Item = Bytes>,
    {
        let k = self.k.ok_or(KtallyError::KmerLengthNotSet)?;
        count_sequences(
            sequences.into_iter().collect(),
            k,
            self.strandedness,
            self.filter,
        )
    }

    /// Counts k-mers in the specified sequence file.
    ///
    /// The format is detected from the file extension; `-` reads stdin.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `k` has not been set
    /// - The file cannot be read or parsed
    /// - The configured count bounds are unsatisfiable
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use ktally::builder::Counter;
    ///
    /// let table = Counter::new()
    ///     .k(21)?
    ///     .count_path("genome.fa")?;
    ///
    /// println!("Found {} unique k-mers", table.len());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn count_path<P: AsRef<Path>>(&self, path: P) -> Result<KmerCountTable, KtallyError> {
        let k = self.k.ok_or(KtallyError::KmerLengthNotSet)?;
        let input = Input::from_path(path.as_ref());
        count_file(
            &input,
            SequenceFormat::Auto,
            k,
            self.strandedness,
            self.filter,
        )
    }

    /// Counts k-mers using memory-mapped I/O.
    ///
    /// Memory-maps the sequence file for potentially faster access on large
    /// files. The file must be uncompressed.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `k` has not been set
    /// - The file cannot be opened, mapped, or parsed
    /// - The configured count bounds are unsatisfiable
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use ktally::builder::Counter;
    ///
    /// let table = Counter::new()
    ///     .k(21)?
    ///     .count_path_mmap("large_genome.fa")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    #[cfg(feature = "mmap")]
    pub fn count_path_mmap<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> Result<KmerCountTable, KtallyError> {
        use crate::count::count_file_mmap;

        let k = self.k.ok_or(KtallyError::KmerLengthNotSet)?;
        count_file_mmap(
            path.as_ref(),
            SequenceFormat::Auto,
            k,
            self.strandedness,
            self.filter,
        )
    }

    /// Returns the configured k-mer length, if set.
    #[must_use]
    pub const fn get_k(&self) -> Option<KmerLength> {
        self.k
    }

    /// Returns the configured strand policy.
    #[must_use]
    pub const fn get_strandedness(&self) -> Strandedness {
        self.strandedness
    }

    /// Returns the configured count filter.
    #[must_use]
    pub const fn get_filter(&self) -> CountFilter {
        self.filter
    }
}
