use super::{PairwiseAligner, PairwiseAlignmentParameters};
use crate::align::aligned_pair::{PairwiseMatch, PROB_ONE};
use bio::alignment::{
    pairwise::{banded::Aligner as BandedAligner, Scoring as BioScoring},
    AlignmentOperation::{self, Del, Ins, Match, Subst, Xclip, Yclip},
};

/// Banded global aligner with a linear gap score, built on `bio`'s banded aligner.
///
/// The band follows the chain of shared `kmer_size`-mers between the two sequences, widened by
/// `band_width`; sequences without a shared k-mer are aligned over the full matrix.  Every
/// aligned column of the alignment becomes a [`PairwiseMatch`].  The score of a match is the
/// fraction of identical columns among the aligned columns within `confidence_radius` of it
/// (itself included), scaled to `PROB_ONE`.  Bases are compared case-insensitively.
#[derive(Copy, Clone, Debug, Default)]
pub struct GlobalAligner;

/// The number of bases of x and y consumed by an operation.
fn consumed(op: AlignmentOperation) -> (usize, usize) {
    match op {
        Match | Subst => (1, 1),
        Ins => (1, 0),
        Del => (0, 1),
        Xclip(len) => (len, 0),
        Yclip(len) => (0, len),
    }
}

/// Scores each aligned column `(x, y, identical)` by the identity of the window of
/// `2 * radius + 1` aligned columns around it, clipped to the alignment.
fn windowed_identity(columns: &[(usize, usize, bool)], radius: usize) -> Vec<PairwiseMatch> {
    // Prefix sums of identical columns to score each window in constant time
    let mut identical_before: Vec<usize> = Vec::with_capacity(columns.len() + 1);
    identical_before.push(0);
    for (_, _, identical) in columns {
        let last = identical_before[identical_before.len() - 1];
        identical_before.push(last + usize::from(*identical));
    }

    columns
        .iter()
        .enumerate()
        .map(|(index, &(x, y, _))| {
            let start = index.saturating_sub(radius);
            let end = index.saturating_add(radius).saturating_add(1).min(columns.len());
            let identical = (identical_before[end] - identical_before[start]) as u64;
            let total = (end - start) as u64;
            let score = (u64::from(PROB_ONE) * identical / total).max(1) as u32;
            PairwiseMatch::new(score, x, y)
        })
        .collect()
}

impl PairwiseAligner for GlobalAligner {
    fn align(
        &self,
        x_seq: &[u8],
        y_seq: &[u8],
        params: &PairwiseAlignmentParameters,
    ) -> Vec<PairwiseMatch> {
        if x_seq.is_empty() || y_seq.is_empty() {
            return Vec::new();
        }
        let (match_score, mismatch_score) = (*params.match_score(), *params.mismatch_score());
        let match_fn = move |a: u8, b: u8| {
            if a.eq_ignore_ascii_case(&b) {
                match_score
            } else {
                mismatch_score
            }
        };
        let mut aligner = BandedAligner::with_capacity_and_scoring(
            x_seq.len(),
            y_seq.len(),
            BioScoring::new(0, *params.gap_score(), match_fn),
            *params.kmer_size(),
            *params.band_width(),
        );
        let alignment = aligner.global(x_seq, y_seq);

        // Collect the aligned columns as (x, y, identical)
        let mut columns: Vec<(usize, usize, bool)> = Vec::new();
        let (mut x, mut y) = (alignment.xstart, alignment.ystart);
        for &op in &alignment.operations {
            match op {
                Match => columns.push((x, y, true)),
                Subst => columns.push((x, y, false)),
                _ => (),
            }
            let (on_x, on_y) = consumed(op);
            x += on_x;
            y += on_y;
        }
        debug_assert!(x == x_seq.len() && y == y_seq.len());

        windowed_identity(&columns, *params.confidence_radius())
    }
}
