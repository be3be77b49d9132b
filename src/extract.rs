//! Lazy k-mer extraction over sequences.
//!
//! [`KmerWindows`] walks one sequence with stride 1, yielding every valid
//! window oriented per the configured [`Strandedness`]. A sequence of length
//! `L` yields `L - k + 1` windows when every base is valid, and none at all
//! when `k > L`. Windows containing a base outside `ACGT` are skipped, with
//! the scan resuming just past the last offending byte.
//!
//! [`extract_kmers`] chains the windows of a whole batch of sequences into
//! one iterator. Extraction is deterministic: iterating twice over the same
//! input produces the same k-mers in the same order.
//!
//! # Example
//!
//! ```rust
//! use bytes::Bytes;
//! use ktally::extract::extract_kmers;
//! use ktally::kmer::{KmerLength, Strandedness};
//!
//! let sequences = vec![Bytes::from_static(b"ACGTT")];
//! let k = KmerLength::new(4)?;
//!
//! let kmers: Vec<String> = extract_kmers(sequences, k, Strandedness::Single)
//!     .map(|kmer| kmer.to_string())
//!     .collect();
//! assert_eq!(kmers, ["ACGT", "CGTT"]);
//! # Ok::<(), ktally::error::KmerLengthError>(())
//! ```

use bytes::Bytes;

use crate::kmer::{Kmer, KmerLength, Strandedness};

/// Iterator over the valid k-mer windows of a single sequence.
#[derive(Debug, Clone)]
pub struct KmerWindows {
    seq: Bytes,
    k: usize,
    strandedness: Strandedness,
    pos: usize,
}

impl KmerWindows {
    /// Creates a window iterator over `seq`.
    #[must_use]
    pub fn new(seq: Bytes, k: KmerLength, strandedness: Strandedness) -> Self {
        Self {
            seq,
            k: k.get(),
            strandedness,
            pos: 0,
        }
    }
}

impl Iterator for KmerWindows {
    type Item = Kmer;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos + self.k <= self.seq.len() {
            let window = self.seq.slice(self.pos..self.pos + self.k);
            match Kmer::from_window(window) {
                Ok(kmer) => {
                    self.pos += 1;
                    return Some(self.strandedness.orient(kmer));
                }
                Err(err) => {
                    // Jump past the invalid base
                    self.pos += err.position + 1;
                }
            }
        }
        None
    }
}

/// Lazily extracts every k-mer from a batch of sequences.
///
/// Sequences are visited in order; within a sequence, windows are emitted
/// left to right.
pub fn extract_kmers<I>(
    sequences: I,
    k: KmerLength,
    strandedness: Strandedness,
) -> impl Iterator<Item = Kmer>
where
    I: IntoIterator<Item = Bytes>,
{
    sequences
        .into_iter()
        .flat_map(move |seq| KmerWindows::new(seq, k, strandedness))
}
