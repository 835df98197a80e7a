//! Decides which pairs of sequences are given to the pairwise aligner.
//!
//! Every schedule is a list of `(i, j)` sequence-index pairs with `i < j`.
use itertools::Itertools;
use rand::{seq::SliceRandom, Rng};
use std::collections::BTreeSet;

/// Every unordered pair of the `n` sequences, once each, in lexicographic order.
pub fn all_pairs(n: usize) -> Vec<(usize, usize)> {
    (0..n).tuple_combinations().collect()
}

/// The deduplicated union of the edges of `trees` random spanning trees over `n` sequences.
///
/// Each tree visits the sequences in a random order and connects every sequence after the first
/// to a uniformly chosen sequence visited before it, so every tree connects all `n` sequences.
pub fn spanning_trees<R: Rng + ?Sized>(n: usize, trees: usize, rng: &mut R) -> Vec<(usize, usize)> {
    if n < 2 {
        return Vec::new();
    }
    let mut edges: BTreeSet<(usize, usize)> = BTreeSet::new();
    let mut order = (0..n).collect_vec();
    for _ in 0..trees {
        order.shuffle(rng);
        for k in 1..n {
            let other = order[rng.gen_range(0..k)];
            let node = order[k];
            edges.insert((node.min(other), node.max(other)));
        }
    }
    edges.into_iter().collect()
}

/// The schedule used for sampled alignments: spanning trees when they are cheaper than aligning
/// all pairs, otherwise all pairs.
pub fn sampled<R: Rng + ?Sized>(n: usize, trees: usize, rng: &mut R) -> Vec<(usize, usize)> {
    let total_pairs = n * n.saturating_sub(1) / 2;
    if trees.saturating_mul(n) >= total_pairs {
        all_pairs(n)
    } else {
        spanning_trees(n, trees, rng)
    }
}

/// A star anchored at the first sequence, the cheapest pairs (by combined length) first.  Ties
/// are broken by the index of the other sequence.
pub fn reference_pairs<S: AsRef<[u8]>>(sequences: &[S]) -> Vec<(usize, usize)> {
    reference_pairs_by(sequences, |anchor, other| {
        anchor.as_ref().len() + other.as_ref().len()
    })
}

/// A star anchored at the first sequence, ordered by ascending `key(anchor, other)` and then by
/// the index of the other sequence.
pub fn reference_pairs_by<S, K, F>(sequences: &[S], key: F) -> Vec<(usize, usize)>
where
    F: Fn(&S, &S) -> K,
    K: Ord,
{
    match sequences.split_first() {
        None => Vec::new(),
        Some((anchor, others)) => others
            .iter()
            .enumerate()
            .map(|(offset, other)| (key(anchor, other), offset + 1))
            .sorted()
            .map(|(_, index)| (0, index))
            .collect(),
    }
}

#[cfg(test)]
pub mod tests {
    use super::{all_pairs, reference_pairs, reference_pairs_by, sampled, spanning_trees};
    use itertools::Itertools;
    use rand::{rngs::StdRng, SeedableRng};
    use rstest::rstest;

    /// True if the edges connect all `n` nodes.
    fn is_connected(n: usize, edges: &[(usize, usize)]) -> bool {
        if n == 0 {
            return true;
        }
        let mut seen = vec![false; n];
        let mut stack = vec![0];
        seen[0] = true;
        while let Some(node) = stack.pop() {
            for &(a, b) in edges {
                let other = if a == node {
                    b
                } else if b == node {
                    a
                } else {
                    continue;
                };
                if !seen[other] {
                    seen[other] = true;
                    stack.push(other);
                }
            }
        }
        seen.into_iter().all(|s| s)
    }

    #[rstest]
    #[case(0, vec![])]
    #[case(1, vec![])]
    #[case(2, vec![(0, 1)])]
    #[case(4, vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)])]
    fn test_all_pairs(#[case] n: usize, #[case] expected: Vec<(usize, usize)>) {
        assert_eq!(all_pairs(n), expected);
    }

    #[test]
    fn test_reference_pairs() {
        let seqs = ["AGTTT", "AGTGTG", "AC", ""];
        assert_eq!(reference_pairs(&seqs), vec![(0, 3), (0, 2), (0, 1)]);
    }

    #[test]
    fn test_reference_pairs_ties_by_index() {
        let seqs = ["AAA", "CC", "GG", "T"];
        assert_eq!(reference_pairs(&seqs), vec![(0, 3), (0, 1), (0, 2)]);
    }

    #[rstest]
    #[case(vec![])]
    #[case(vec!["ACGT"])]
    fn test_reference_pairs_degenerate(#[case] seqs: Vec<&str>) {
        assert!(reference_pairs(&seqs).is_empty());
    }

    #[test]
    fn test_reference_pairs_custom_order() {
        let seqs = ["AAA", "CC", "GGGG"];
        let pairs = reference_pairs_by(&seqs, |_, other| std::cmp::Reverse(other.len()));
        assert_eq!(pairs, vec![(0, 2), (0, 1)]);
    }

    #[test]
    fn test_spanning_trees_connected() {
        let mut rng = StdRng::seed_from_u64(42);
        for n in 2..30 {
            for trees in 1..4 {
                let edges = spanning_trees(n, trees, &mut rng);
                assert!(is_connected(n, &edges), "n={n} trees={trees}");
                assert!(edges.len() >= n - 1);
                assert!(edges.len() <= trees * (n - 1));
                assert!(edges.iter().all(|&(a, b)| a < b && b < n));
                assert_eq!(edges, edges.iter().copied().sorted().dedup().collect_vec());
            }
        }
    }

    #[rstest]
    #[case(0, 3)]
    #[case(1, 3)]
    #[case(10, 0)]
    fn test_spanning_trees_degenerate(#[case] n: usize, #[case] trees: usize) {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(spanning_trees(n, trees, &mut rng).is_empty());
    }

    #[test]
    fn test_spanning_trees_reproducible() {
        let first = spanning_trees(50, 3, &mut StdRng::seed_from_u64(7));
        let second = spanning_trees(50, 3, &mut StdRng::seed_from_u64(7));
        assert_eq!(first, second);
    }

    #[test]
    fn test_sampled_falls_back_to_all_pairs() {
        let mut rng = StdRng::seed_from_u64(3);
        // 5 sequences: 10 pairs <= 2 trees * 5 sequences
        assert_eq!(sampled(5, 2, &mut rng), all_pairs(5));
        // 100 sequences: 4950 pairs > 2 trees * 100 sequences
        let edges = sampled(100, 2, &mut rng);
        assert!(edges.len() <= 2 * 99);
        assert!(is_connected(100, &edges));
    }
}
