use std::{cmp::Ordering, fmt};

/// The fixed-point score that represents a posterior probability of 1.0.
pub const PROB_ONE: u32 = 10_000_000;

/// A single scored correspondence produced by a pairwise aligner, relative to the two sequences
/// given to it: position `x` of the first sequence aligns to position `y` of the second.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash)]
pub struct PairwiseMatch {
    /// The confidence of the correspondence, in `(0, PROB_ONE]`
    pub score: u32,
    /// 0-based position in the first sequence
    pub x: usize,
    /// 0-based position in the second sequence
    pub y: usize,
}

impl PairwiseMatch {
    pub fn new(score: u32, x: usize, y: usize) -> Self {
        Self { score, x, y }
    }
}

/// Asserts that position `x` of sequence `seq_x` corresponds to position `y` of sequence `seq_y`.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash)]
pub struct AlignedPair {
    /// The confidence of the correspondence, in `(0, PROB_ONE]`
    pub score: u32,
    /// Index of the first sequence
    pub seq_x: usize,
    /// 0-based position in the first sequence
    pub x: usize,
    /// Index of the second sequence
    pub seq_y: usize,
    /// 0-based position in the second sequence
    pub y: usize,
}

impl AlignedPair {
    pub fn new(score: u32, seq_x: usize, x: usize, seq_y: usize, y: usize) -> Self {
        Self {
            score,
            seq_x,
            x,
            seq_y,
            y,
        }
    }

    /// Stamps the sequence indices onto a match returned by a pairwise aligner.
    pub fn from_match(seq_x: usize, seq_y: usize, m: &PairwiseMatch) -> Self {
        Self::new(m.score, seq_x, m.x, seq_y, m.y)
    }

    /// The score as a probability in `(0, 1]`.
    pub fn probability(&self) -> f64 {
        f64::from(self.score) / f64::from(PROB_ONE)
    }

    /// Panics if the pair breaks any of its invariants with respect to the given sequences.
    pub fn validate<S: AsRef<[u8]>>(&self, sequences: &[S]) {
        assert!(self.score > 0, "score must be positive: {self}");
        assert!(self.score <= PROB_ONE, "score exceeds PROB_ONE: {self}");
        assert!(self.seq_x < sequences.len(), "seq_x out of range: {self}");
        assert!(self.seq_y < sequences.len(), "seq_y out of range: {self}");
        assert_ne!(self.seq_x, self.seq_y, "self alignment: {self}");
        assert!(
            self.x < sequences[self.seq_x].as_ref().len(),
            "x out of range: {self}"
        );
        assert!(
            self.y < sequences[self.seq_y].as_ref().len(),
            "y out of range: {self}"
        );
    }

    /// Orders pairs by descending score, then ascending coordinates, so that greedy processing is
    /// deterministic.
    pub fn by_descending_score(a: &Self, b: &Self) -> Ordering {
        b.score
            .cmp(&a.score)
            .then_with(|| (a.seq_x, a.x, a.seq_y, a.y).cmp(&(b.seq_x, b.x, b.seq_y, b.y)))
    }
}

impl fmt::Display for AlignedPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.score, self.seq_x, self.x, self.seq_y, self.y
        )
    }
}
