//! The pairwise alignment capability consumed by the multiple aligner, and its configuration.
pub(crate) mod constants;
mod global;

pub use global::GlobalAligner;

use crate::align::aligned_pair::PairwiseMatch;
use constants::{
    DEFAULT_BAND_WIDTH, DEFAULT_CONFIDENCE_RADIUS, DEFAULT_GAP_SCORE, DEFAULT_KMER_SIZE,
    DEFAULT_MATCH_SCORE, DEFAULT_MISMATCH_SCORE, MAX_BAND_WIDTH,
};
use derive_builder::Builder;
use derive_getters::Getters;

/// Produces scored correspondences between two sequences.
///
/// Implementations must return matches with `x < x_seq.len()`, `y < y_seq.len()` and a score in
/// `(0, PROB_ONE]`.  They are shared across the aggregator's worker threads.
pub trait PairwiseAligner: Send + Sync {
    fn align(
        &self,
        x_seq: &[u8],
        y_seq: &[u8],
        params: &PairwiseAlignmentParameters,
    ) -> Vec<PairwiseMatch>;
}

/// Configuration forwarded unchanged to the [`PairwiseAligner`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Builder, Getters)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct PairwiseAlignmentParameters {
    /// K-mer size used to find the shared seeds the band is built around.
    #[builder(default = "DEFAULT_KMER_SIZE")]
    kmer_size: usize,
    /// Number of cells either side of the seed chain included in the band.
    #[builder(default = "DEFAULT_BAND_WIDTH")]
    band_width: usize,
    #[builder(default = "DEFAULT_MATCH_SCORE")]
    match_score: i32,
    #[builder(default = "DEFAULT_MISMATCH_SCORE")]
    mismatch_score: i32,
    /// Score for each gapped base (must not be positive)
    #[builder(default = "DEFAULT_GAP_SCORE")]
    gap_score: i32,
    /// Number of aligned columns either side of a correspondence used to estimate its confidence.
    #[builder(default = "DEFAULT_CONFIDENCE_RADIUS")]
    confidence_radius: usize,
}

impl PairwiseAlignmentParametersBuilder {
    fn validate(&self) -> Result<(), String> {
        let match_score = self.match_score.unwrap_or(DEFAULT_MATCH_SCORE);
        let mismatch_score = self.mismatch_score.unwrap_or(DEFAULT_MISMATCH_SCORE);
        let gap_score = self.gap_score.unwrap_or(DEFAULT_GAP_SCORE);
        let kmer_size = self.kmer_size.unwrap_or(DEFAULT_KMER_SIZE);
        let band_width = self.band_width.unwrap_or(DEFAULT_BAND_WIDTH);
        if match_score <= mismatch_score {
            return Err(format!(
                "match score ({match_score}) must exceed the mismatch score ({mismatch_score})"
            ));
        }
        if gap_score > 0 {
            return Err(format!("gap score must not be positive: {gap_score}"));
        }
        if kmer_size == 0 || kmer_size > MAX_BAND_WIDTH {
            return Err(format!(
                "k-mer size must be between 1 and {MAX_BAND_WIDTH}: {kmer_size}"
            ));
        }
        if band_width > MAX_BAND_WIDTH {
            return Err(format!(
                "band width must be at most {MAX_BAND_WIDTH}: {band_width}"
            ));
        }
        Ok(())
    }
}

impl Default for PairwiseAlignmentParameters {
    fn default() -> Self {
        Self {
            kmer_size: DEFAULT_KMER_SIZE,
            band_width: DEFAULT_BAND_WIDTH,
            match_score: DEFAULT_MATCH_SCORE,
            mismatch_score: DEFAULT_MISMATCH_SCORE,
            gap_score: DEFAULT_GAP_SCORE,
            confidence_radius: DEFAULT_CONFIDENCE_RADIUS,
        }
    }
}
