//! Builds the columns of a multiple alignment from scored correspondences.
use crate::align::{aligned_pair::AlignedPair, poset::PosetConsistencyFilter};
use itertools::Itertools;
use log::debug;

/// A set of `(sequence, position)` entries judged to be aligned to each other, sorted by
/// sequence index.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Column {
    entries: Vec<(usize, usize)>,
}

impl Column {
    /// Adds an entry; entries must be added in increasing sequence order.
    pub(crate) fn push(&mut self, seq: usize, pos: usize) {
        debug_assert!(self.entries.last().map_or(true, |&(last, _)| last < seq));
        self.entries.push((seq, pos));
    }

    pub fn entries(&self) -> &[(usize, usize)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The position of the given sequence in this column, if any.
    pub fn position(&self, seq: usize) -> Option<usize> {
        self.entries
            .binary_search_by_key(&seq, |&(s, _)| s)
            .ok()
            .map(|index| self.entries[index].1)
    }
}

/// The minimum probability a correspondence needs to be merged into a column for the given gap
/// gamma.  A gap gamma of zero requires even odds, one merges anything consistent.
pub fn merge_floor(gap_gamma: f64) -> f64 {
    (1.0 - gap_gamma.clamp(0.0, 1.0)) / 2.0
}

/// One singleton column per position of every sequence: the alignment before any evidence.
pub fn make_columns<S: AsRef<[u8]>>(sequences: &[S]) -> Vec<Column> {
    PosetConsistencyFilter::from_sequences(sequences).columns()
}

/// The pairs in the order they are offered to the consistency filter: descending score, then
/// ascending coordinates.
fn by_descending_score(aligned_pairs: &[AlignedPair]) -> Vec<AlignedPair> {
    aligned_pairs
        .iter()
        .copied()
        .sorted_by(AlignedPair::by_descending_score)
        .collect()
}

/// Offers the pairs to one consistency filter in descending score order, skipping those below
/// the [`merge_floor`] for `gap_gamma` and those that contradict the pairs accepted before them.
/// Returns the accepted pairs, in the order they were accepted, and the resulting columns.
pub fn resolve<S: AsRef<[u8]>>(
    sequences: &[S],
    aligned_pairs: &[AlignedPair],
    gap_gamma: f64,
) -> (Vec<AlignedPair>, Vec<Column>) {
    let floor = merge_floor(gap_gamma);
    let mut filter = PosetConsistencyFilter::from_sequences(sequences);
    let mut accepted = Vec::with_capacity(aligned_pairs.len());
    let mut below_floor = 0;
    for pair in by_descending_score(aligned_pairs) {
        pair.validate(sequences);
        if pair.probability() < floor {
            below_floor += 1;
        } else if filter.add(pair.seq_x, pair.x, pair.seq_y, pair.y) {
            accepted.push(pair);
        }
    }
    let columns = filter.columns();
    debug!(
        "Accepted {} of {} aligned pairs ({} below the floor of {:.3}) into {} columns",
        accepted.len(),
        aligned_pairs.len(),
        below_floor,
        floor,
        columns.len()
    );
    (accepted, columns)
}

/// Greedily accepts the pairs, highest score first, that are consistent with those accepted
/// before them.  The accepted pairs are returned in the order they were accepted.
pub fn accepted_pairs<S: AsRef<[u8]>>(
    sequences: &[S],
    aligned_pairs: &[AlignedPair],
) -> Vec<AlignedPair> {
    resolve(sequences, aligned_pairs, 1.0).0
}

/// Builds the columns of the multiple alignment from the pairs that survive [`resolve`].  Every
/// position of every sequence is in exactly one of the returned columns, which are in alignment
/// order.
pub fn get_multiple_sequence_alignment<S: AsRef<[u8]>>(
    sequences: &[S],
    aligned_pairs: &[AlignedPair],
    gap_gamma: f64,
) -> Vec<Column> {
    resolve(sequences, aligned_pairs, gap_gamma).1
}
