//! Core k-mer types: validated lengths, windows, and canonical forms.
//!
//! A [`Kmer`] is a validated window of uppercase `A`/`C`/`G`/`T` bytes taken
//! from a sequence. Lowercase (soft-masked) input is accepted and uppercased;
//! any other byte is rejected with its position, which callers use to skip
//! the scan past the offending base.
//!
//! # Example
//!
//! ```rust
//! use bytes::Bytes;
//! use ktally::kmer::{Kmer, Strandedness};
//!
//! let kmer = Kmer::from_window(Bytes::from_static(b"TTTT"))?;
//! let canonical = Strandedness::Canonical.orient(kmer);
//! assert_eq!(canonical.as_bytes(), b"AAAA");
//! # Ok::<(), ktally::error::InvalidBaseError>(())
//! ```

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{InvalidBaseError, KmerLengthError};

/// A validated k-mer length.
///
/// Guarantees `k >= 1`. There is no upper bound: k-mers are stored as byte
/// strings, and a `k` longer than every input sequence simply yields no
/// windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KmerLength(usize);

impl KmerLength {
    /// Validates and wraps a k-mer length.
    ///
    /// # Errors
    ///
    /// Returns [`KmerLengthError`] if `k` is zero.
    pub const fn new(k: usize) -> Result<Self, KmerLengthError> {
        if k == 0 {
            return Err(KmerLengthError { k });
        }
        Ok(Self(k))
    }

    /// Returns the validated length.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for KmerLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How windows are oriented before they are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strandedness {
    /// Count each window exactly as it appears in the sequence.
    Single,
    /// Replace each window by the lexicographically smaller of itself and
    /// its reverse complement, so a k-mer and its reverse complement share
    /// one table entry.
    #[default]
    Canonical,
}

impl Strandedness {
    /// Applies this orientation policy to a k-mer.
    #[must_use]
    pub fn orient(self, kmer: Kmer) -> Kmer {
        match self {
            Self::Single => kmer,
            Self::Canonical => kmer.canonical(),
        }
    }

    /// Returns `true` for single-strand counting.
    #[must_use]
    pub const fn is_single(self) -> bool {
        matches!(self, Self::Single)
    }
}

impl std::fmt::Display for Strandedness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Canonical => write!(f, "canonical"),
        }
    }
}

/// A validated window of DNA bases.
///
/// The bytes are always uppercase `A`/`C`/`G`/`T`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Kmer {
    bytes: Bytes,
}

impl Kmer {
    /// Validates a window of sequence bytes as a k-mer.
    ///
    /// Lowercase bases are uppercased; the common all-uppercase case keeps
    /// the input buffer without copying.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidBaseError`] carrying the *last* invalid byte and its
    /// position within the window, so a scan can resume immediately after it.
    pub fn from_window(window: Bytes) -> Result<Self, InvalidBaseError> {
        if let Some(position) = window
            .iter()
            .rposition(|b| Base::try_from(*b).is_err())
        {
            return Err(InvalidBaseError {
                base: window[position],
                position,
            });
        }
        if window.iter().any(u8::is_ascii_lowercase) {
            let upper: Bytes = window.iter().map(u8::to_ascii_uppercase).collect();
            return Ok(Self { bytes: upper });
        }
        Ok(Self { bytes: window })
    }

    /// Returns the k-mer bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the k-mer and returns its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    /// Returns the k-mer length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the k-mer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the reverse complement of this k-mer.
    #[must_use]
    pub fn reverse_complement(&self) -> Self {
        let bytes: Bytes = self
            .bytes
            .iter()
            .rev()
            .map(|byte| Base::from_ascii(*byte).complement().into_ascii())
            .collect();
        Self { bytes }
    }

    /// Returns the canonical form: the lexicographically smaller of this
    /// k-mer and its reverse complement.
    #[must_use]
    pub fn canonical(self) -> Self {
        let revcomp = self.reverse_complement();
        if revcomp.bytes < self.bytes {
            revcomp
        } else {
            self
        }
    }
}

impl std::fmt::Display for Kmer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.bytes))
    }
}

/// A single DNA base.
enum Base {
    A,
    C,
    G,
    T,
}

impl TryFrom<u8> for Base {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            b'A' | b'a' => Ok(Self::A),
            b'C' | b'c' => Ok(Self::C),
            b'G' | b'g' => Ok(Self::G),
            b'T' | b't' => Ok(Self::T),
            _ => Err(()),
        }
    }
}

impl Base {
    const fn complement(self) -> Self {
        match self {
            Self::A => Self::T,
            Self::C => Self::G,
            Self::G => Self::C,
            Self::T => Self::A,
        }
    }

    /// Only called on validated k-mer bytes.
    const fn from_ascii(byte: u8) -> Self {
        match byte {
            b'A' => Self::A,
            b'C' => Self::C,
            b'G' => Self::G,
            _ => Self::T,
        }
    }

    const fn into_ascii(self) -> u8 {
        match self {
            Self::A => b'A',
            Self::C => b'C',
            Self::G => b'G',
            Self::T => b'T',
        }
    }
}
