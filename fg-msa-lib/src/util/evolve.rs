//! Random related sequences for property tests.
use rand::{seq::SliceRandom, Rng};

pub const BASES: [u8; 4] = *b"ACGT";

/// Per-position probability of a substitution when evolving a sequence.
pub const SUBSTITUTION_RATE: f64 = 0.1;

/// Per-position probability of an insertion, and separately of a deletion.
pub const INDEL_RATE: f64 = 0.05;

fn random_base<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    *BASES.choose(rng).unwrap()
}

pub fn random_sequence<R: Rng + ?Sized>(length: usize, rng: &mut R) -> Vec<u8> {
    (0..length).map(|_| random_base(rng)).collect()
}

/// A descendant of `ancestor` with random substitutions, insertions and deletions.
pub fn evolve<R: Rng + ?Sized>(ancestor: &[u8], rng: &mut R) -> Vec<u8> {
    let mut seq = Vec::with_capacity(ancestor.len() + ancestor.len() / 10 + 1);
    for &base in ancestor {
        if rng.gen_bool(INDEL_RATE) {
            seq.push(random_base(rng));
        }
        if rng.gen_bool(INDEL_RATE) {
            continue;
        }
        if rng.gen_bool(SUBSTITUTION_RATE) {
            seq.push(random_base(rng));
        } else {
            seq.push(base);
        }
    }
    seq
}

/// Up to `max_sequences - 1` sequences, each evolved from one random ancestor of length below
/// `max_length`.
pub fn random_family<R: Rng + ?Sized>(
    max_sequences: usize,
    max_length: usize,
    rng: &mut R,
) -> Vec<Vec<u8>> {
    let num_sequences = rng.gen_range(0..max_sequences);
    let ancestor = random_sequence(rng.gen_range(0..max_length), rng);
    (0..num_sequences).map(|_| evolve(&ancestor, rng)).collect()
}

#[cfg(test)]
pub mod tests {
    use super::{evolve, random_family, random_sequence, BASES};
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_random_sequence() {
        let mut rng = StdRng::seed_from_u64(5);
        let seq = random_sequence(50, &mut rng);
        assert_eq!(seq.len(), 50);
        assert!(seq.iter().all(|b| BASES.contains(b)));
    }

    #[test]
    fn test_evolve_is_related() {
        let mut rng = StdRng::seed_from_u64(9);
        let ancestor = random_sequence(1000, &mut rng);
        let child = evolve(&ancestor, &mut rng);
        assert!(child.len() > 800 && child.len() < 1200);
        assert!(child.iter().all(|b| BASES.contains(b)));
        assert!(evolve(&[], &mut rng).is_empty());
    }

    #[test]
    fn test_random_family_reproducible() {
        let first = random_family(10, 100, &mut StdRng::seed_from_u64(3));
        let second = random_family(10, 100, &mut StdRng::seed_from_u64(3));
        assert_eq!(first, second);
        assert!(first.len() < 10);
    }
}
