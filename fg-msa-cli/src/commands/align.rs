use super::command::Command;
use anyhow::{ensure, Context, Result};
use clap::Parser;
use itertools::Itertools;
use log::info;
use msa::{
    align::{
        columns::get_multiple_sequence_alignment,
        distance::get_distance_matrix,
        multiple::{DEFAULT_MAX_PAIRS_TO_CONSIDER, DEFAULT_SEED, DEFAULT_SPANNING_TREE_COUNT},
        AlignedPair, Column, DistanceMatrix, GlobalAligner, MultipleAlignerBuilder,
        PairwiseAlignmentParametersBuilder,
    },
    util::{
        fasta::{read_sequences, NamedSequence},
        io::open_writer,
        NUM_CPU,
    },
};
use std::{io::Write, path::PathBuf};

/// Builds a multiple sequence alignment of the sequences in a FASTA file.
///
/// Pairs of sequences are aligned with a banded global aligner, each aligned base getting a
/// confidence from the identity of the surrounding alignment.  The correspondences are then added
/// to the multiple alignment greedily, most confident first, skipping any that contradict those
/// already added.  By default only the pairs on `--spanning-trees` random spanning trees over the
/// sequences are aligned; use `--all-pairs` to align every pair.
///
/// Three tab-separated files are written using the `--output` prefix:
/// - `<output>.pairs.tsv`: the accepted correspondences
/// - `<output>.columns.tsv`: the alignment columns, in alignment order
/// - `<output>.distances.tsv`: substitutions per site between every pair of sequences
#[derive(Parser, Debug, Clone)]
#[clap(term_width = 0)]
pub struct Align {
    /// The path to the input FASTA.
    #[clap(long, short = 'i', display_order = 1)]
    input: PathBuf,

    /// The prefix for the output files.
    #[clap(long, short = 'o', display_order = 2)]
    output: PathBuf,

    /// The number of threads to use.
    #[clap(long, short = 't', default_value = NUM_CPU.as_str(), display_order = 3)]
    threads: usize,

    /// Align every pair of sequences rather than sampling spanning trees.
    #[clap(long, short = 'a', default_value = "false", display_order = 4)]
    all_pairs: bool,

    /// The number of random spanning trees whose pairs are aligned.
    #[clap(long, short = 'n', default_value_t = DEFAULT_SPANNING_TREE_COUNT, display_order = 5)]
    spanning_trees: usize,

    /// The seed for sampling spanning trees.
    #[clap(long, short = 's', default_value_t = DEFAULT_SEED, display_order = 6)]
    seed: u64,

    /// The minimum probability for a pairwise correspondence to be considered.
    #[clap(long, short = 'T', default_value = "0.0", display_order = 7)]
    threshold: f64,

    /// How liberally correspondences are merged into columns, from 0 (only those with a
    /// probability of at least one half) to 1 (any consistent correspondence).
    #[clap(long, short = 'g', default_value = "1.0", display_order = 8)]
    gap_gamma: f64,

    /// The maximum number of residue pairs to count when computing distances.
    #[clap(long, default_value_t = DEFAULT_MAX_PAIRS_TO_CONSIDER, display_order = 9)]
    max_pairs: u64,

    /// K-mer size for finding the seeds the pairwise alignment band is built around.
    #[clap(long, short = 'k', default_value = "12", display_order = 10)]
    kmer_size: usize,

    /// Band size around the seeds for pairwise alignment.
    #[clap(long, short = 'w', default_value = "100", display_order = 11)]
    band_width: usize,

    /// Score for a sequence match (must be greater than the mismatch score)
    #[clap(long, short = 'A', default_value = "1", display_order = 12)]
    match_score: i32,

    /// Score for a sequence mismatch
    #[clap(
        long,
        short = 'B',
        default_value = "-1",
        allow_hyphen_values = true,
        display_order = 13
    )]
    mismatch_score: i32,

    /// Score for each gapped base (must not be positive)
    #[clap(
        long,
        short = 'G',
        default_value = "-1",
        allow_hyphen_values = true,
        display_order = 14
    )]
    gap_score: i32,

    /// Number of aligned columns either side of a correspondence used for its confidence.
    #[clap(long, short = 'r', default_value = "2", display_order = 15)]
    confidence_radius: usize,
}

impl Align {
    fn output_path(&self, suffix: &str) -> PathBuf {
        let mut path = self.output.clone().into_os_string();
        path.push(suffix);
        PathBuf::from(path)
    }

    fn write_pairs(&self, sequences: &[NamedSequence], pairs: &[AlignedPair]) -> Result<()> {
        let path = self.output_path(".pairs.tsv");
        let mut writer = open_writer(&path)?;
        writeln!(writer, "score\tseq_x\tx\tseq_y\ty\tname_x\tname_y")?;
        for pair in pairs {
            writeln!(
                writer,
                "{pair}\t{}\t{}",
                sequences[pair.seq_x].name, sequences[pair.seq_y].name
            )?;
        }
        writer.flush()?;
        info!("Wrote {} aligned pairs to {}", pairs.len(), path.display());
        Ok(())
    }

    fn write_columns(&self, columns: &[Column]) -> Result<()> {
        let path = self.output_path(".columns.tsv");
        let mut writer = open_writer(&path)?;
        writeln!(writer, "column\tsize\tentries")?;
        for (index, column) in columns.iter().enumerate() {
            let entries = column
                .entries()
                .iter()
                .map(|(seq, pos)| format!("{seq}:{pos}"))
                .join(",");
            writeln!(writer, "{index}\t{}\t{entries}", column.len())?;
        }
        writer.flush()?;
        info!("Wrote {} columns to {}", columns.len(), path.display());
        Ok(())
    }

    fn write_distances(
        &self,
        sequences: &[NamedSequence],
        distances: &DistanceMatrix,
    ) -> Result<()> {
        let path = self.output_path(".distances.tsv");
        let mut writer = open_writer(&path)?;
        writeln!(
            writer,
            "name_i\tname_j\tmatches\tmismatches\tsubs_per_site"
        )?;
        for (i, j) in (0..sequences.len()).tuple_combinations() {
            let counts = distances.counts(i, j);
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{:.6}",
                sequences[i].name,
                sequences[j].name,
                counts.matches(),
                counts.mismatches(),
                counts.subs_per_site()
            )?;
        }
        writer.flush()?;
        info!("Wrote distances to {}", path.display());
        Ok(())
    }
}

impl Command for Align {
    fn execute(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.gap_gamma),
            "--gap-gamma must be in [0, 1]: {}",
            self.gap_gamma
        );
        let params = PairwiseAlignmentParametersBuilder::default()
            .kmer_size(self.kmer_size)
            .band_width(self.band_width)
            .match_score(self.match_score)
            .mismatch_score(self.mismatch_score)
            .gap_score(self.gap_score)
            .confidence_radius(self.confidence_radius)
            .build()
            .context("Invalid pairwise alignment parameters")?;
        let aligner = MultipleAlignerBuilder::default()
            .threads(self.threads)
            .threshold(self.threshold)
            .spanning_tree_count(self.spanning_trees)
            .max_pairs_to_consider(self.max_pairs)
            .seed(self.seed)
            .gap_gamma(self.gap_gamma)
            .build()
            .context("Invalid multiple alignment options")?;

        let sequences = read_sequences(&self.input)?;
        let seqs = sequences.iter().map(|s| s.seq.as_slice()).collect_vec();
        let (pairs, columns, distances) = if self.all_pairs {
            let pairs = aligner.align_all_pairs(&seqs, &GlobalAligner, &params);
            let columns = get_multiple_sequence_alignment(&seqs, &pairs, self.gap_gamma);
            let distances = get_distance_matrix(&columns, &seqs, self.max_pairs);
            (pairs, columns, distances)
        } else {
            let alignment = aligner.align(&seqs, &GlobalAligner, &params);
            (
                alignment.aligned_pairs().clone(),
                alignment.columns().clone(),
                alignment.distances().clone(),
            )
        };

        self.write_pairs(&sequences, &pairs)?;
        self.write_columns(&columns)?;
        self.write_distances(&sequences, &distances)?;
        info!("Done");
        Ok(())
    }
}
