//! Fuzz target for window validation and extraction.
//!
//! Tests that `Kmer::from_window` handles arbitrary byte input gracefully
//! and that `KmerWindows` never emits a k-mer containing an invalid base,
//! whatever bytes the sequence holds.

#![no_main]

use bytes::Bytes;
use ktally::extract::KmerWindows;
use ktally::kmer::{Kmer, KmerLength, Strandedness};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() || data.len() > 256 {
        return;
    }

    // from_window should either succeed or fail gracefully - never panic
    if data.len() <= 32 {
        match Kmer::from_window(Bytes::copy_from_slice(data)) {
            Ok(kmer) => {
                for &byte in kmer.as_bytes() {
                    assert!(
                        matches!(byte, b'A' | b'C' | b'G' | b'T'),
                        "Invalid base in accepted kmer: {}",
                        byte as char
                    );
                }
                assert_eq!(kmer.len(), data.len());
            }
            Err(err) => {
                assert!(
                    err.position < data.len(),
                    "Error position {} out of bounds for data len {}",
                    err.position,
                    data.len()
                );
                assert_eq!(
                    err.base, data[err.position],
                    "Error byte mismatch at position {}",
                    err.position
                );
            }
        }
    }

    // Window extraction over arbitrary bytes emits only valid k-mers, and
    // never more than the window-count law allows.
    let k = (data[0] as usize % 8) + 1;
    let seq = Bytes::copy_from_slice(&data[1..]);
    let seq_len = seq.len();
    let k_len = KmerLength::new(k).unwrap();

    let mut emitted = 0usize;
    for kmer in KmerWindows::new(seq, k_len, Strandedness::Canonical) {
        assert_eq!(kmer.len(), k);
        assert!(kmer
            .as_bytes()
            .iter()
            .all(|b| matches!(b, b'A' | b'C' | b'G' | b'T')));
        emitted += 1;
    }

    let max_windows = seq_len.saturating_sub(k - 1);
    assert!(
        emitted <= max_windows,
        "Emitted {emitted} windows from a sequence with at most {max_windows}"
    );
});
