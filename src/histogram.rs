//! K-mer frequency histograms (count of counts).
//!
//! Histograms summarize a count table by how many distinct k-mers share
//! each count value. They are the standard input for genome size
//! estimation and sequencing error inspection.
//!
//! # Example
//!
//! ```rust
//! use bytes::Bytes;
//! use ktally::count::{count_kmers, CountFilter};
//! use ktally::histogram::compute_histogram;
//! use ktally::kmer::Strandedness;
//!
//! let table = count_kmers(
//!     vec![Bytes::from_static(b"AAAAA")],
//!     4,
//!     Strandedness::Canonical,
//!     CountFilter::default(),
//! )?;
//!
//! // One distinct k-mer (AAAA) with count 2.
//! let histogram = compute_histogram(&table);
//! assert_eq!(histogram.get(&2), Some(&1));
//! # Ok::<(), ktally::error::KtallyError>(())
//! ```

use std::{collections::BTreeMap, io::Write};

use serde::Serialize;

use crate::{count::KmerCountTable, error::KtallyError};

/// K-mer frequency histogram: maps count -> number of distinct k-mers with
/// that count.
///
/// Uses `BTreeMap` for sorted iteration (counts in ascending order).
pub type CountHistogram = BTreeMap<u64, u64>;

/// Summary statistics for a k-mer histogram.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistogramStats {
    /// Total k-mer occurrences (sum of all k-mer counts).
    pub total_kmers: u64,
    /// Number of unique k-mers.
    pub distinct_kmers: u64,
    /// The count value that appears most frequently (mode of the distribution).
    pub mode_count: u64,
    /// Number of k-mers that have the mode count.
    pub mode_frequency: u64,
    /// Average k-mer count (`total_kmers` / `distinct_kmers`).
    pub mean_count: f64,
}

/// Computes a histogram from a count table.
#[must_use]
pub fn compute_histogram(table: &KmerCountTable) -> CountHistogram {
    let mut histogram = BTreeMap::new();
    for (_, count) in table.iter() {
        *histogram.entry(count).or_insert(0) += 1;
    }
    histogram
}

/// Computes summary statistics for a k-mer histogram.
///
/// # Example
///
/// ```rust
/// use ktally::histogram::{histogram_stats, CountHistogram};
///
/// let histogram: CountHistogram = [(1, 2), (2, 2)].into();
/// let stats = histogram_stats(&histogram);
///
/// assert_eq!(stats.distinct_kmers, 4);
/// assert_eq!(stats.total_kmers, 6); // 1+1+2+2
/// ```
#[must_use]
pub fn histogram_stats(histogram: &CountHistogram) -> HistogramStats {
    let distinct: u64 = histogram.values().sum();
    let total: u64 = histogram.iter().map(|(c, f)| c * f).sum();

    let (mode_count, mode_frequency) = histogram
        .iter()
        .max_by_key(|(_, f)| *f)
        .map_or((0, 0), |(&c, &f)| (c, f));

    HistogramStats {
        total_kmers: total,
        distinct_kmers: distinct,
        mode_count,
        mode_frequency,
        #[allow(clippy::cast_precision_loss)]
        mean_count: if distinct > 0 {
            total as f64 / distinct as f64
        } else {
            0.0
        },
    }
}

/// Writes a histogram as `<count><TAB><frequency>` lines in ascending
/// count order.
///
/// # Errors
///
/// Returns an error if the writer fails.
pub fn write_histogram<W: Write>(
    histogram: &CountHistogram,
    mut writer: W,
) -> Result<(), KtallyError> {
    for (count, frequency) in histogram {
        writeln!(writer, "{count}\t{frequency}")?;
    }
    writer.flush()?;
    Ok(())
}
