pub const DEFAULT_BAND_WIDTH: usize = 100;
pub const DEFAULT_KMER_SIZE: usize = 12;
pub const DEFAULT_MATCH_SCORE: i32 = 1;
pub const DEFAULT_MISMATCH_SCORE: i32 = -1;
pub const DEFAULT_GAP_SCORE: i32 = -1;
pub const DEFAULT_CONFIDENCE_RADIUS: usize = 2;

/// The largest band width or k-mer size accepted.  Sequence coordinates in the banded aligner
/// are 32-bit, so a wider band already covers the whole matrix.
pub const MAX_BAND_WIDTH: usize = u32::MAX as usize;
