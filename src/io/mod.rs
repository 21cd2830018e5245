use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use serde::{Deserialize, Serialize};

use crate::errors::BenchAlignError;

pub mod pairs;
pub mod output;

pub use pairs::{read_fasta_pairs, read_pairs, SequencePair};
pub use output::{emit, AlignmentRecord, OutputFormat};

const FASTA_EXTENSIONS: [&str; 3] = ["fa", "fna", "fasta"];

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// A `>pattern` line followed by a `<text` line per pair
    Pairs,

    /// Consecutive FASTA records form a pair
    Fasta,
}

impl InputFormat {
    /// Guess the format from the file name, ignoring a trailing `.gz`.
    pub fn from_path(path: &Path) -> Self {
        let is_gzipped = path.extension().map_or(false, |ext| ext == "gz");
        let non_gzip_fname = if is_gzipped { path.with_extension("") } else { path.to_path_buf() };

        let is_fasta = non_gzip_fname.extension()
            .map_or(false, |ext| FASTA_EXTENSIONS.iter().any(|fasta_ext| ext == *fasta_ext));

        if is_fasta {
            Self::Fasta
        } else {
            Self::Pairs
        }
    }
}

/// Open a file for reading, transparently decompressing `.gz` files.
pub fn open_input(path: &Path) -> Result<Box<dyn BufRead + Send>, BenchAlignError> {
    let is_gzipped = path.extension().map_or(false, |ext| ext == "gz");

    let reader: Box<dyn BufRead + Send> = if is_gzipped {
        Box::new(
            File::open(path)
                .map(MultiGzDecoder::new)
                .map(BufReader::new)?,
        )
    } else {
        Box::new(File::open(path).map(BufReader::new)?)
    };

    Ok(reader)
}

/// Load all sequence pairs from a file. The format is derived from the file name if not given.
pub fn load_pairs(path: &Path, format: Option<InputFormat>) -> Result<Vec<SequencePair>, BenchAlignError> {
    let reader = open_input(path)?;

    match format.unwrap_or_else(|| InputFormat::from_path(path)) {
        InputFormat::Pairs => read_pairs(reader),
        InputFormat::Fasta => read_fasta_pairs(reader),
    }
}
