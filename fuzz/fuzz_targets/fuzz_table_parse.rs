//! Fuzz target for the count table text parser.
//!
//! Tests that `parse_table` never panics on arbitrary input and that any
//! table it accepts satisfies the table invariants: keys of the right
//! length, valid bases, counts of at least 1.

#![no_main]

use ktally::kmer::{KmerLength, Strandedness};
use ktally::table::parse_table;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() || data.len() > 4096 {
        return;
    }

    let k = (data[0] as usize % 16) + 1;
    let k_len = KmerLength::new(k).unwrap();
    let text = &data[1..];

    for strandedness in [Strandedness::Single, Strandedness::Canonical] {
        // Parsing must never panic; accepted tables must be well-formed.
        if let Ok(table) = parse_table(text, k_len, strandedness) {
            for (kmer, count) in table.iter() {
                assert_eq!(kmer.len(), k);
                assert!(kmer
                    .iter()
                    .all(|b| matches!(b, b'A' | b'C' | b'G' | b'T')));
                assert!(count >= 1);
            }
        }
    }
});
