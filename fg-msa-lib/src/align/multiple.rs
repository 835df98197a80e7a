//! Entry points that turn a set of sequences into a multiple alignment.
//!
//! Pairs of sequences are scheduled, aligned in parallel by a [`PairwiseAligner`], and the
//! resulting correspondences are resolved greedily, highest score first, into a single
//! consistent alignment.
use crate::align::{
    aggregate::PairwiseAggregator,
    aligned_pair::AlignedPair,
    columns::{resolve, Column},
    distance::{get_distance_matrix, DistanceMatrix},
    pairwise::{PairwiseAligner, PairwiseAlignmentParameters},
    schedule,
};
use derive_builder::Builder;
use derive_getters::Getters;
use log::info;
use rand::{rngs::StdRng, SeedableRng};

pub const DEFAULT_SPANNING_TREE_COUNT: usize = 3;
pub const DEFAULT_MAX_PAIRS_TO_CONSIDER: u64 = 10_000_000;
pub const DEFAULT_SEED: u64 = 42;

/// The result of a sampled multiple alignment.
#[derive(Clone, Debug, PartialEq, Getters)]
pub struct MultipleAlignment {
    /// The accepted correspondences, in the order they were accepted
    aligned_pairs: Vec<AlignedPair>,
    /// The alignment columns, in alignment order
    columns: Vec<Column>,
    distances: DistanceMatrix,
}

/// Configuration for building multiple alignments.
#[derive(Copy, Clone, Debug, PartialEq, Builder, Getters)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct MultipleAligner {
    /// Number of threads used for the pairwise alignments
    #[builder(default = "num_cpus::get()")]
    threads: usize,
    /// Minimum probability for a pairwise correspondence to be kept, in `[0, 1]`
    #[builder(default = "0.0")]
    threshold: f64,
    /// Number of random spanning trees whose edges are aligned when sampling
    #[builder(default = "DEFAULT_SPANNING_TREE_COUNT")]
    spanning_tree_count: usize,
    /// Maximum number of residue pairs counted for the distance matrix
    #[builder(default = "DEFAULT_MAX_PAIRS_TO_CONSIDER")]
    max_pairs_to_consider: u64,
    /// Seed for the spanning tree sampling
    #[builder(default = "DEFAULT_SEED")]
    seed: u64,
    /// How liberally correspondences are merged into columns, in `[0, 1]`; `1.0` merges every
    /// consistent correspondence
    #[builder(default = "1.0")]
    gap_gamma: f64,
}

impl MultipleAlignerBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(threshold) = self.threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(format!("threshold must be in [0, 1]: {threshold}"));
            }
        }
        if let Some(gap_gamma) = self.gap_gamma {
            if !(0.0..=1.0).contains(&gap_gamma) {
                return Err(format!("gap gamma must be in [0, 1]: {gap_gamma}"));
            }
        }
        if self.threads == Some(0) {
            return Err("threads must be at least one".to_string());
        }
        Ok(())
    }
}

impl Default for MultipleAligner {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            threshold: 0.0,
            spanning_tree_count: DEFAULT_SPANNING_TREE_COUNT,
            max_pairs_to_consider: DEFAULT_MAX_PAIRS_TO_CONSIDER,
            seed: DEFAULT_SEED,
            gap_gamma: 1.0,
        }
    }
}

impl MultipleAligner {
    /// Aligns the scheduled pairs, keeping correspondences at or above the threshold.
    fn aggregate<S, A>(
        &self,
        sequences: &[S],
        schedule: &[(usize, usize)],
        threshold: f64,
        aligner: &A,
        params: &PairwiseAlignmentParameters,
    ) -> Vec<AlignedPair>
    where
        S: AsRef<[u8]> + Sync,
        A: PairwiseAligner + ?Sized,
    {
        PairwiseAggregator::new(aligner, *params, self.threads).aggregate(
            sequences,
            schedule,
            threshold,
        )
    }

    /// Every correspondence the aligner reports between every pair of sequences, unfiltered.
    pub fn all_pairwise_alignments<S, A>(
        &self,
        sequences: &[S],
        aligner: &A,
        params: &PairwiseAlignmentParameters,
    ) -> Vec<AlignedPair>
    where
        S: AsRef<[u8]> + Sync,
        A: PairwiseAligner + ?Sized,
    {
        self.aggregate(
            sequences,
            &schedule::all_pairs(sequences.len()),
            0.0,
            aligner,
            params,
        )
    }

    /// Aligns every pair of sequences and returns the correspondences accepted by the greedy
    /// resolution, in the order they were accepted.
    pub fn align_all_pairs<S, A>(
        &self,
        sequences: &[S],
        aligner: &A,
        params: &PairwiseAlignmentParameters,
    ) -> Vec<AlignedPair>
    where
        S: AsRef<[u8]> + Sync,
        A: PairwiseAligner + ?Sized,
    {
        let pairs = schedule::all_pairs(sequences.len());
        info!(
            "Aligning {} sequences using all {} pairs",
            sequences.len(),
            pairs.len()
        );
        let aligned = self.aggregate(sequences, &pairs, self.threshold, aligner, params);
        let (accepted, _) = resolve(sequences, &aligned, self.gap_gamma);
        info!("Accepted {} aligned pairs", accepted.len());
        accepted
    }

    /// Aligns the edges of random spanning trees over the sequences (or every pair when that is
    /// no more work), then resolves the correspondences into columns and measures the distances
    /// between the sequences over them.
    pub fn align<S, A>(
        &self,
        sequences: &[S],
        aligner: &A,
        params: &PairwiseAlignmentParameters,
    ) -> MultipleAlignment
    where
        S: AsRef<[u8]> + Sync,
        A: PairwiseAligner + ?Sized,
    {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let pairs = schedule::sampled(sequences.len(), self.spanning_tree_count, &mut rng);
        info!(
            "Aligning {} sequences using {} pairs from {} spanning trees",
            sequences.len(),
            pairs.len(),
            self.spanning_tree_count
        );
        let aligned = self.aggregate(sequences, &pairs, self.threshold, aligner, params);
        let (aligned_pairs, columns) = resolve(sequences, &aligned, self.gap_gamma);
        let distances = get_distance_matrix(&columns, sequences, self.max_pairs_to_consider);
        info!(
            "Accepted {} aligned pairs into {} columns",
            aligned_pairs.len(),
            columns.len()
        );
        MultipleAlignment {
            aligned_pairs,
            columns,
            distances,
        }
    }
}

/// Aligns every pair of sequences, keeping correspondences with a probability of at least
/// `threshold`, and returns those accepted by the greedy resolution.
pub fn make_alignment_using_all_pairs<S, A>(
    sequences: &[S],
    threshold: f64,
    aligner: &A,
    params: &PairwiseAlignmentParameters,
) -> Vec<AlignedPair>
where
    S: AsRef<[u8]> + Sync,
    A: PairwiseAligner + ?Sized,
{
    MultipleAligner {
        threshold,
        ..MultipleAligner::default()
    }
    .align_all_pairs(sequences, aligner, params)
}

/// Aligns the pairs of `spanning_tree_count` random spanning trees seeded with `seed`; see
/// [`MultipleAligner::align`].
pub fn make_alignment<S, A>(
    sequences: &[S],
    spanning_tree_count: usize,
    max_pairs_to_consider: u64,
    threshold: f64,
    aligner: &A,
    params: &PairwiseAlignmentParameters,
    seed: u64,
) -> MultipleAlignment
where
    S: AsRef<[u8]> + Sync,
    A: PairwiseAligner + ?Sized,
{
    MultipleAligner {
        threshold,
        spanning_tree_count,
        max_pairs_to_consider,
        seed,
        ..MultipleAligner::default()
    }
    .align(sequences, aligner, params)
}

/// Every correspondence between every pair of sequences, in schedule order.
pub fn make_all_pairwise_alignments<S, A>(
    sequences: &[S],
    aligner: &A,
    params: &PairwiseAlignmentParameters,
) -> Vec<AlignedPair>
where
    S: AsRef<[u8]> + Sync,
    A: PairwiseAligner + ?Sized,
{
    MultipleAligner::default().all_pairwise_alignments(sequences, aligner, params)
}
