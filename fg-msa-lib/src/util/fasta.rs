//! Reading input sequences from FASTA, and merging FASTA chunk files back into whole records.
use crate::util::io::{is_fasta_path, open_reader, open_writer, BUFFER_SIZE};
use anyhow::{bail, ensure, Context, Result};
use itertools::Itertools;
use log::{info, warn};
use seq_io::fasta::{OwnedRecord, Reader as FastaReader, Record as FastaRecord};
use std::{
    io::{BufRead, Write},
    path::{Path, PathBuf},
};

/// Separates the attributes of a chunk header.
pub const HEADER_ATTRIBUTE_DELIMITER: &str = "|";

/// A named input sequence.
#[derive(Default, Debug, PartialEq, Eq, Clone)]
pub struct NamedSequence {
    pub name: String,
    pub seq: Vec<u8>,
}

/// Converts the FASTA header (which may contain whitespace) to a sequence name.
fn header_to_name(header: &[u8]) -> Result<String> {
    let header = String::from_utf8_lossy(header);
    header
        .split_whitespace()
        .next()
        .map(std::string::ToString::to_string)
        .context("empty sequence name")
}

/// Reads every record of a FASTA file.
fn read_records<P: AsRef<Path>>(path: &P) -> Result<Vec<OwnedRecord>> {
    let source: FastaReader<Box<dyn BufRead + Send>> =
        FastaReader::with_capacity(open_reader(path)?, BUFFER_SIZE);
    source
        .into_records()
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Error reading FASTA: {}", path.as_ref().display()))
}

/// Reads the sequences to align from a (possibly GZIPPED) FASTA file.  Sequences are upper-cased
/// and may be empty.
pub fn read_sequences<P: AsRef<Path>>(path: &P) -> Result<Vec<NamedSequence>> {
    if !is_fasta_path(path) {
        warn!(
            "Reading {} as FASTA despite its extension",
            path.as_ref().display()
        );
    }
    let sequences = read_records(path)?
        .iter()
        .map(|record| {
            Ok(NamedSequence {
                name: header_to_name(record.head())?,
                seq: record.seq().iter().map(u8::to_ascii_uppercase).collect_vec(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    info!(
        "Read {} sequences from {}",
        sequences.len(),
        path.as_ref().display()
    );
    Ok(sequences)
}

/// Splits a chunk header into its leading attributes and the offset of the chunk within the
/// whole sequence, which is the last attribute.
pub fn parse_chunk_header(header: &str) -> Result<(Vec<&str>, u64)> {
    let mut attributes = header.split(HEADER_ATTRIBUTE_DELIMITER).collect_vec();
    let offset = match attributes.pop() {
        Some(last) => last.trim(),
        None => bail!("Empty chunk header"),
    };
    let offset = offset
        .parse::<i64>()
        .with_context(|| format!("Chunk offset is not a number in header: {header}"))?;
    ensure!(offset >= 0, "Negative chunk offset in header: {header}");
    Ok((attributes, offset as u64))
}

/// Writes one chunk record.  The header, without its offset, only starts a new record for the
/// first chunk of a sequence (offset zero); later chunks only contribute their sequence line.
pub fn write_chunk<W: Write>(writer: &mut W, header: &str, seq: &[u8]) -> Result<()> {
    let (attributes, offset) = parse_chunk_header(header)?;
    if offset == 0 {
        writeln!(
            writer,
            ">{}",
            attributes.join(HEADER_ATTRIBUTE_DELIMITER)
        )?;
    }
    writer.write_all(seq)?;
    writeln!(writer)?;
    Ok(())
}

/// Merges FASTA chunk files, in order, into a single FASTA file.  Output already written is left
/// in place if an input fails.
pub fn merge_chunks<P: AsRef<Path>>(output: &P, inputs: &[PathBuf]) -> Result<()> {
    let mut writer = open_writer(output)?;
    let mut num_chunks = 0;
    for input in inputs {
        for record in read_records(input)? {
            let header = String::from_utf8_lossy(record.head());
            write_chunk(&mut writer, &header, record.seq())
                .with_context(|| format!("Error merging chunk from {}", input.display()))?;
            num_chunks += 1;
        }
    }
    writer.flush()?;
    info!(
        "Merged {} chunks from {} files into {}",
        num_chunks,
        inputs.len(),
        output.as_ref().display()
    );
    Ok(())
}
