//! Substitution distances between sequences, measured over the columns of a multiple alignment.
use crate::align::columns::Column;
use derive_getters::Getters;
use itertools::Itertools;
use log::debug;

/// How often two sequences agree and disagree across the columns they share.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Getters)]
pub struct PairCounts {
    matches: u64,
    mismatches: u64,
}

impl PairCounts {
    /// The fraction of shared columns in which the two sequences differ, or zero if they share
    /// none.
    pub fn subs_per_site(&self) -> f64 {
        let total = self.matches + self.mismatches;
        if total == 0 {
            0.0
        } else {
            self.mismatches as f64 / total as f64
        }
    }
}

/// Triangular matrix of [`PairCounts`] for every unordered pair of sequences.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistanceMatrix {
    sequence_count: usize,
    counts: Vec<PairCounts>,
    samples: u64,
}

impl DistanceMatrix {
    pub fn new(sequence_count: usize) -> Self {
        Self {
            sequence_count,
            counts: vec![PairCounts::default(); sequence_count * sequence_count.saturating_sub(1) / 2],
            samples: 0,
        }
    }

    pub fn sequence_count(&self) -> usize {
        self.sequence_count
    }

    /// The number of residue pairs recorded.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Index of the unordered pair `(i, j)`, `i != j`, in the triangular table.
    fn index(&self, i: usize, j: usize) -> usize {
        assert!(
            i < self.sequence_count && j < self.sequence_count,
            "Sequence index out of range: ({i}, {j}) for {} sequences",
            self.sequence_count
        );
        let (i, j) = if i < j { (i, j) } else { (j, i) };
        // rows before i hold (n - 1) + (n - 2) + ... + (n - i) entries
        i * (2 * self.sequence_count - i - 1) / 2 + (j - i - 1)
    }

    /// The counts for sequences `i` and `j`; all zero when `i == j`.
    pub fn counts(&self, i: usize, j: usize) -> PairCounts {
        if i == j {
            assert!(i < self.sequence_count, "Sequence index out of range: {i}");
            PairCounts::default()
        } else {
            self.counts[self.index(i, j)]
        }
    }

    /// Records one pair of residues from sequences `i` and `j` in the same column.
    pub fn record(&mut self, i: usize, j: usize, residue_i: u8, residue_j: u8) {
        let index = self.index(i, j);
        if residue_i.eq_ignore_ascii_case(&residue_j) {
            self.counts[index].matches += 1;
        } else {
            self.counts[index].mismatches += 1;
        }
        self.samples += 1;
    }

    /// Substitutions per site between sequences `i` and `j`: symmetric, and zero for a sequence
    /// against itself or for sequences that never share a column.
    pub fn subs_per_site(&self, i: usize, j: usize) -> f64 {
        self.counts(i, j).subs_per_site()
    }
}

/// See [`DistanceMatrix::subs_per_site`].
pub fn subs_per_site(i: usize, j: usize, matrix: &DistanceMatrix) -> f64 {
    matrix.subs_per_site(i, j)
}

/// Counts matching and mismatching residues for every pair of sequences sharing a column, in
/// column order, stopping once `max_pairs_to_consider` residue pairs have been recorded.
pub fn get_distance_matrix<S: AsRef<[u8]>>(
    columns: &[Column],
    sequences: &[S],
    max_pairs_to_consider: u64,
) -> DistanceMatrix {
    let mut matrix = DistanceMatrix::new(sequences.len());
    'columns: for column in columns.iter().filter(|c| c.len() >= 2) {
        for (&(seq_i, pos_i), &(seq_j, pos_j)) in column.entries().iter().tuple_combinations() {
            if matrix.samples() >= max_pairs_to_consider {
                break 'columns;
            }
            matrix.record(
                seq_i,
                seq_j,
                sequences[seq_i].as_ref()[pos_i],
                sequences[seq_j].as_ref()[pos_j],
            );
        }
    }
    debug!(
        "Recorded {} residue pairs across {} sequences",
        matrix.samples(),
        matrix.sequence_count()
    );
    matrix
}

#[cfg(test)]
pub mod tests {
    use super::{get_distance_matrix, subs_per_site, DistanceMatrix};
    use crate::align::{
        columns::{get_multiple_sequence_alignment, make_columns},
        multiple::make_all_pairwise_alignments,
        pairwise::{GlobalAligner, PairwiseAlignmentParameters},
    };
    use rstest::rstest;

    const SEQS: [&str; 4] = ["AGTTT", "AGTGTG", "AC", ""];

    fn example_matrix(max_pairs_to_consider: u64) -> DistanceMatrix {
        let pairs = make_all_pairwise_alignments(
            &SEQS,
            &GlobalAligner,
            &PairwiseAlignmentParameters::default(),
        );
        let columns = get_multiple_sequence_alignment(&SEQS, &pairs, 0.2);
        get_distance_matrix(&columns, &SEQS, max_pairs_to_consider)
    }

    #[rstest]
    #[case(0, 1, 0.2)]
    #[case(0, 2, 0.5)]
    #[case(0, 3, 0.0)]
    #[case(1, 2, 0.5)]
    #[case(1, 3, 0.0)]
    #[case(2, 3, 0.0)]
    #[case(2, 2, 0.0)]
    fn test_subs_per_site(#[case] i: usize, #[case] j: usize, #[case] expected: f64) {
        let matrix = example_matrix(100_000);
        assert!((subs_per_site(i, j, &matrix) - expected).abs() < 0.00001);
        assert_eq!(matrix.subs_per_site(i, j), matrix.subs_per_site(j, i));
    }

    #[test]
    fn test_counts() {
        let matrix = example_matrix(100_000);
        assert_eq!(matrix.sequence_count(), 4);
        assert_eq!(matrix.samples(), 9);
        assert_eq!(*matrix.counts(0, 1).matches(), 4);
        assert_eq!(*matrix.counts(1, 0).mismatches(), 1);
        assert_eq!(*matrix.counts(2, 1).matches(), 1);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(2, 2)]
    #[case(9, 9)]
    #[case(1_000, 9)]
    fn test_max_pairs_to_consider(#[case] max_pairs: u64, #[case] expected: u64) {
        assert_eq!(example_matrix(max_pairs).samples(), expected);
    }

    #[test]
    fn test_unaligned_columns_give_zero_distance() {
        let columns = make_columns(&SEQS);
        let matrix = get_distance_matrix(&columns, &SEQS, 100_000);
        assert_eq!(matrix.samples(), 0);
        assert_eq!(matrix.subs_per_site(0, 1), 0.0);
    }

    #[test]
    fn test_case_insensitive() {
        let seqs = ["acgT", "ACGA"];
        let pairs = (0..4)
            .map(|pos| crate::align::AlignedPair::new(crate::align::PROB_ONE, 0, pos, 1, pos))
            .collect::<Vec<_>>();
        let columns = get_multiple_sequence_alignment(&seqs, &pairs, 0.0);
        let matrix = get_distance_matrix(&columns, &seqs, 100);
        assert!((matrix.subs_per_site(0, 1) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_triangular_index_covers_all_pairs() {
        let mut matrix = DistanceMatrix::new(5);
        for i in 0..5 {
            for j in (i + 1)..5 {
                matrix.record(i, j, b'A', if (i + j) % 2 == 0 { b'A' } else { b'C' });
            }
        }
        for i in 0..5 {
            for j in (i + 1)..5 {
                let counts = matrix.counts(j, i);
                assert_eq!(*counts.matches() + *counts.mismatches(), 1);
            }
        }
        assert_eq!(matrix.samples(), 10);
    }

    #[test]
    fn test_no_sequences() {
        let seqs: Vec<&str> = Vec::new();
        let matrix = get_distance_matrix(&[], &seqs, 100);
        assert_eq!(matrix.sequence_count(), 0);
        assert_eq!(matrix.samples(), 0);
    }
}
