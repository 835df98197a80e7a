use super::command::Command;
use anyhow::Result;
use clap::Parser;
use log::info;
use msa::util::fasta::merge_chunks;
use std::path::PathBuf;

/// Merges FASTA files of sequence chunks back into a single FASTA file.
///
/// Each chunk header is a `|`-separated list of attributes whose last attribute is the offset of
/// the chunk within its sequence.  Chunks are written in input order: the first chunk of a
/// sequence (offset zero) starts a new record, with the offset removed from its header, and every
/// chunk contributes its bases on a line of their own.
#[derive(Parser, Debug, Clone)]
#[clap(term_width = 0)]
pub struct MergeChunks {
    /// The path to the output FASTA.
    output: PathBuf,

    /// The chunk FASTA files to merge, in order.
    inputs: Vec<PathBuf>,
}

impl Command for MergeChunks {
    fn execute(&self) -> Result<()> {
        info!(
            "Merging {} chunk files into {}",
            self.inputs.len(),
            self.output.display()
        );
        merge_chunks(&self.output, &self.inputs)
    }
}
