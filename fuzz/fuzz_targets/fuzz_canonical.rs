//! Fuzz target for canonical k-mer computation.
//!
//! Tests that the canonical form has the expected properties:
//! 1. Is idempotent
//! 2. k-mer and reverse complement have same canonical form
//! 3. Canonical form is lexicographically smallest

#![no_main]

use bytes::Bytes;
use ktally::kmer::Kmer;
use libfuzzer_sys::fuzz_target;

/// Compute reverse complement of a DNA sequence.
fn reverse_complement(seq: &[u8]) -> Vec<u8> {
    seq.iter()
        .rev()
        .map(|&b| match b {
            b'A' => b'T',
            b'T' => b'A',
            b'C' => b'G',
            b'G' => b'C',
            _ => unreachable!(),
        })
        .collect()
}

fuzz_target!(|data: &[u8]| {
    // Filter to valid DNA sequences only
    if data.is_empty() || data.len() > 32 {
        return;
    }

    // Only test with valid uppercase DNA bases
    for &byte in data {
        if !matches!(byte, b'A' | b'C' | b'G' | b'T') {
            return;
        }
    }

    let kmer = Kmer::from_window(Bytes::copy_from_slice(data)).unwrap();
    let canonical = kmer.canonical();

    // Property 1: Canonical is idempotent
    let canonical2 = Kmer::from_window(Bytes::copy_from_slice(canonical.as_bytes()))
        .unwrap()
        .canonical();
    assert_eq!(
        canonical.as_bytes(),
        canonical2.as_bytes(),
        "Canonical is not idempotent"
    );

    // Property 2: k-mer and RC have same canonical
    let rc = reverse_complement(data);
    let rc_canonical = Kmer::from_window(Bytes::from(rc.clone()))
        .unwrap()
        .canonical();
    assert_eq!(
        canonical.as_bytes(),
        rc_canonical.as_bytes(),
        "k-mer and RC have different canonical forms"
    );

    // Property 3: Canonical is lexicographically smallest
    assert!(
        canonical.as_bytes() <= data,
        "Canonical {:?} > original {:?}",
        canonical.as_bytes(),
        data
    );
    assert!(
        canonical.as_bytes() <= rc.as_slice(),
        "Canonical {:?} > RC {:?}",
        canonical.as_bytes(),
        rc
    );
});
