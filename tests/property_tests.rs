//! Property-based tests using proptest.
//!
//! These tests verify invariants that should hold across all valid inputs,
//! catching edge cases that might be missed by example-based tests.

use bytes::Bytes;
use ktally::count::{count_kmers, CountFilter};
use ktally::db::{load_db, save_db};
use ktally::extract::extract_kmers;
use ktally::kmer::{Kmer, KmerLength, Strandedness};
use ktally::table::{parse_table, write_table};
use proptest::prelude::*;
use tempfile::NamedTempFile;

/// Strategy for generating valid DNA sequences within a length range.
fn dna_sequence(min_len: usize, max_len: usize) -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![Just('A'), Just('C'), Just('G'), Just('T')],
        min_len..=max_len,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// Strategy for sequences that may contain ambiguity codes.
fn noisy_sequence(min_len: usize, max_len: usize) -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            Just('A'),
            Just('C'),
            Just('G'),
            Just('T'),
            Just('N'),
            Just('a'),
            Just('t'),
        ],
        min_len..=max_len,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

fn reverse_complement(seq: &str) -> String {
    seq.chars()
        .rev()
        .map(|c| match c {
            'A' => 'T',
            'T' => 'A',
            'C' => 'G',
            'G' => 'C',
            _ => unreachable!(),
        })
        .collect()
}

proptest! {
    /// The canonical form should be idempotent: canonical(canonical(x)) == canonical(x).
    #[test]
    fn canonical_is_idempotent(seq in dna_sequence(1, 32)) {
        let canonical1 = Kmer::from_window(Bytes::from(seq)).unwrap().canonical();
        let canonical2 = Kmer::from_window(Bytes::copy_from_slice(canonical1.as_bytes()))
            .unwrap()
            .canonical();

        prop_assert_eq!(canonical1.as_bytes(), canonical2.as_bytes());
    }

    /// A k-mer and its reverse complement should have the same canonical form.
    #[test]
    fn kmer_and_rc_have_same_canonical(seq in dna_sequence(1, 32)) {
        let rc = reverse_complement(&seq);

        let canonical1 = Kmer::from_window(Bytes::from(seq)).unwrap().canonical();
        let canonical2 = Kmer::from_window(Bytes::from(rc)).unwrap().canonical();

        prop_assert_eq!(canonical1.as_bytes(), canonical2.as_bytes());
    }

    /// The canonical form should be lexicographically <= both the original and its RC.
    #[test]
    fn canonical_is_lexicographically_smallest(seq in dna_sequence(1, 32)) {
        let rc = reverse_complement(&seq);

        let canonical = Kmer::from_window(Bytes::from(seq.clone())).unwrap().canonical();

        prop_assert!(canonical.as_bytes() <= seq.as_bytes());
        prop_assert!(canonical.as_bytes() <= rc.as_bytes());
    }

    /// Reverse complement should be an involution: rc(rc(x)) == x.
    #[test]
    fn reverse_complement_is_an_involution(seq in dna_sequence(1, 64)) {
        let kmer = Kmer::from_window(Bytes::from(seq.clone())).unwrap();
        let double = kmer.reverse_complement().reverse_complement();

        prop_assert_eq!(double.as_bytes(), seq.as_bytes());
    }

    /// KmerLength should accept any positive value.
    #[test]
    fn kmer_length_accepts_any_positive(k in 1usize..10_000) {
        let result = KmerLength::new(k);
        prop_assert!(result.is_ok());
        prop_assert_eq!(result.unwrap().get(), k);
    }

    #[test]
    fn kmer_length_rejects_zero(_dummy in Just(())) {
        let result = KmerLength::new(0);
        prop_assert!(result.is_err());
    }

    /// Soft-masked (lowercase) sequences should produce same result as uppercase.
    #[test]
    fn soft_masked_equals_uppercase(seq in dna_sequence(1, 32)) {
        let upper = Kmer::from_window(Bytes::from(seq.clone())).unwrap();
        let lower = Kmer::from_window(Bytes::from(seq.to_lowercase())).unwrap();

        prop_assert_eq!(upper.as_bytes(), lower.as_bytes());
    }

    /// Mixed case should produce same result as all uppercase.
    #[test]
    fn mixed_case_equals_uppercase(seq in dna_sequence(1, 32)) {
        let mixed: String = seq
            .chars()
            .enumerate()
            .map(|(i, c)| if i % 2 == 0 { c } else { c.to_ascii_lowercase() })
            .collect();

        let upper = Kmer::from_window(Bytes::from(seq)).unwrap();
        let from_mixed = Kmer::from_window(Bytes::from(mixed)).unwrap();

        prop_assert_eq!(upper.as_bytes(), from_mixed.as_bytes());
    }

    /// A clean sequence yields exactly len - k + 1 k-mers.
    ///
    /// Property: Σ(counts) = seq.len - k + 1 for a single all-ACGT sequence
    #[test]
    fn clean_sequence_counts_every_window(
        seq in dna_sequence(1, 100),
        k in 1usize..=16,
    ) {
        prop_assume!(seq.len() >= k);

        let table = count_kmers(
            vec![Bytes::from(seq.clone())],
            k,
            Strandedness::Single,
            CountFilter::default(),
        ).unwrap();

        let total: u64 = table.iter().map(|(_, count)| count).sum();
        prop_assert_eq!(total, (seq.len() - k + 1) as u64);
    }

    /// Total k-mer count should not exceed the number of windows in the input.
    ///
    /// Property: Σ(counts) ≤ (seq.len - k + 1) even with invalid bases present
    #[test]
    fn total_count_at_most_window_count(
        seq in noisy_sequence(1, 100),
        k in 1usize..=16,
    ) {
        prop_assume!(seq.len() >= k);

        let table = count_kmers(
            vec![Bytes::from(seq.clone())],
            k,
            Strandedness::Canonical,
            CountFilter::default(),
        ).unwrap();

        let total: u64 = table.iter().map(|(_, count)| count).sum();
        let max_windows = (seq.len() - k + 1) as u64;

        prop_assert!(
            total <= max_windows,
            "Total count {} exceeds max windows {}", total, max_windows
        );
    }

    /// Single-strand and canonical counting agree on total k-mer mass.
    #[test]
    fn strand_policies_count_the_same_mass(
        seq in dna_sequence(1, 100),
        k in 1usize..=16,
    ) {
        prop_assume!(seq.len() >= k);

        let single = count_kmers(
            vec![Bytes::from(seq.clone())],
            k,
            Strandedness::Single,
            CountFilter::default(),
        ).unwrap();
        let canonical = count_kmers(
            vec![Bytes::from(seq)],
            k,
            Strandedness::Canonical,
            CountFilter::default(),
        ).unwrap();

        let single_total: u64 = single.iter().map(|(_, count)| count).sum();
        let canonical_total: u64 = canonical.iter().map(|(_, count)| count).sum();
        prop_assert_eq!(single_total, canonical_total);
        prop_assert!(canonical.len() <= single.len());
    }

    /// Extraction and counting agree on the canonical key set.
    #[test]
    fn extraction_yields_exactly_the_counted_keys(
        seq in noisy_sequence(1, 60),
        k in 1usize..=8,
    ) {
        let k_len = KmerLength::new(k).unwrap();
        let extracted: std::collections::HashSet<Bytes> = extract_kmers(
            vec![Bytes::from(seq.clone())],
            k_len,
            Strandedness::Canonical,
        )
        .map(Kmer::into_bytes)
        .collect();

        let table = count_kmers(
            vec![Bytes::from(seq)],
            k,
            Strandedness::Canonical,
            CountFilter::default(),
        ).unwrap();
        let counted: std::collections::HashSet<Bytes> =
            table.iter().map(|(kmer, _)| kmer.clone()).collect();

        prop_assert_eq!(extracted, counted);
    }

    /// Every surviving count respects the cap and both bounds.
    #[test]
    fn filtered_counts_respect_cap_and_bounds(
        seq in dna_sequence(1, 200),
        k in 1usize..=8,
        cap in 1u64..20,
        min in 0u64..10,
        span in 0u64..10,
    ) {
        prop_assume!(seq.len() >= k);
        let max = min + span;

        let table = count_kmers(
            vec![Bytes::from(seq)],
            k,
            Strandedness::Canonical,
            CountFilter {
                min_occs: Some(min),
                max_occs: Some(max),
                counter_cap: Some(cap),
            },
        ).unwrap();

        for (_, count) in table.iter() {
            prop_assert!(count <= cap);
            prop_assert!(count >= min && count <= max);
        }
    }

    /// Database save/load roundtrip should preserve the table exactly.
    ///
    /// Property: load(save(table)) = table
    #[test]
    fn db_roundtrip_preserves_the_table(
        seqs in proptest::collection::vec(dna_sequence(1, 50), 0..8),
        k in 1usize..=12,
    ) {
        let table = count_kmers(
            seqs.into_iter().map(Bytes::from).collect::<Vec<_>>(),
            k,
            Strandedness::Canonical,
            CountFilter::default(),
        ).unwrap();

        let tmp = NamedTempFile::with_suffix(".ktab").unwrap();
        save_db(&table, tmp.path()).unwrap();
        let loaded = load_db(tmp.path()).unwrap();

        prop_assert_eq!(loaded, table);
    }

    /// Text dump/parse roundtrip should preserve the table exactly.
    #[test]
    fn dump_roundtrip_preserves_the_table(
        seqs in proptest::collection::vec(dna_sequence(1, 50), 0..8),
        k in 1usize..=12,
    ) {
        let table = count_kmers(
            seqs.into_iter().map(Bytes::from).collect::<Vec<_>>(),
            k,
            Strandedness::Canonical,
            CountFilter::default(),
        ).unwrap();

        let mut dump = Vec::new();
        write_table(&table, &mut dump).unwrap();
        let reparsed = parse_table(
            &dump[..],
            KmerLength::new(k).unwrap(),
            Strandedness::Canonical,
        ).unwrap();

        prop_assert_eq!(reparsed, table);
    }

    /// A k-mer and its reverse complement should be counted together under one
    /// canonical entry.
    #[test]
    fn kmer_and_rc_count_together(seq in dna_sequence(1, 32)) {
        let rc = reverse_complement(&seq);
        let k = seq.len();

        let table = count_kmers(
            vec![Bytes::from(seq), Bytes::from(rc)],
            k,
            Strandedness::Canonical,
            CountFilter::default(),
        ).unwrap();

        prop_assert_eq!(
            table.len(), 1,
            "K-mer and RC should produce exactly 1 canonical entry, got {}", table.len()
        );

        let kmer_count = table.iter().map(|(_, count)| count).next().unwrap();
        prop_assert_eq!(
            kmer_count, 2,
            "K-mer and RC should have combined count 2, got {}", kmer_count
        );
    }
}
