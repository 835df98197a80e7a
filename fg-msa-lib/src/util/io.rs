use anyhow::{Context, Result};
use fgoxide::io::Io;
use std::{
    io::{BufRead, BufWriter, Write},
    path::Path,
};

/// 128 KB default buffer size, same as pigz.
pub const BUFFER_SIZE: usize = 64 * (1 << 10) * 2;

/// The compression level used when writing GZIP output.
pub const COMPRESSION_LEVEL: u32 = 5;

/// The set of file extensions to treat as GZIPPED
const GZIP_EXTENSIONS: [&str; 2] = ["gz", "bgz"];

/// The set of file extensions to treat as FASTA
const FASTA_EXTENSIONS: [&str; 4] = ["fasta", "fa", "fna", "fas"];

/// Returns true if the path ends with one of the given extensions
fn is_path_with_extension<P: AsRef<Path>>(p: &P, extensions: &[&str]) -> bool {
    match p.as_ref().extension().and_then(|ext| ext.to_str()) {
        Some(ext) => extensions.contains(&ext),
        None => false,
    }
}

/// Returns true if the path ends with a recognized GZIP file extension
fn is_gzip_path<P: AsRef<Path>>(p: &P) -> bool {
    is_path_with_extension(p, &GZIP_EXTENSIONS)
}

/// Returns true if the path is a FASTA file, optionally GZIPPED (e.g. `seqs.fa.gz`)
pub fn is_fasta_path<P: AsRef<Path>>(p: &P) -> bool {
    let path = p.as_ref();
    if is_gzip_path(&path) {
        path.file_stem()
            .map_or(false, |stem| is_path_with_extension(&Path::new(stem), &FASTA_EXTENSIONS))
    } else {
        is_path_with_extension(&path, &FASTA_EXTENSIONS)
    }
}

/// Opens a buffered reader, decompressing GZIP input based on the file extension.
pub fn open_reader<P: AsRef<Path>>(p: &P) -> Result<Box<dyn BufRead + Send>> {
    let fg_io = Io::new(COMPRESSION_LEVEL, BUFFER_SIZE);
    fg_io
        .new_reader(p)
        .with_context(|| format!("Error opening input: {}", p.as_ref().display()))
}

/// Opens a buffered writer, compressing GZIP output based on the file extension.
pub fn open_writer<P: AsRef<Path>>(p: &P) -> Result<BufWriter<Box<dyn Write + Send>>> {
    let fg_io = Io::new(COMPRESSION_LEVEL, BUFFER_SIZE);
    fg_io
        .new_writer(p)
        .with_context(|| format!("Error opening output: {}", p.as_ref().display()))
}
