pub mod aggregate;
pub mod aligned_pair;
pub mod columns;
pub mod distance;
pub mod multiple;
pub mod pairwise;
pub mod poset;
pub mod schedule;

pub use aligned_pair::{AlignedPair, PairwiseMatch, PROB_ONE};
pub use columns::Column;
pub use distance::DistanceMatrix;
pub use multiple::{MultipleAligner, MultipleAlignerBuilder, MultipleAlignment};
pub use pairwise::{
    GlobalAligner, PairwiseAligner, PairwiseAlignmentParameters,
    PairwiseAlignmentParametersBuilder,
};
pub use poset::PosetConsistencyFilter;
