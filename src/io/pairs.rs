//! Readers for sequence pair inputs.
//!
//! The line based format stores one pair per two lines: a pattern line starting with `>`,
//! directly followed by a text line starting with `<`. Empty lines are ignored.
use std::io::BufRead;

use noodles::fasta;
use serde::{Deserialize, Serialize};

use crate::errors::BenchAlignError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencePair {
    pub id: String,
    pub pattern: Vec<u8>,
    pub text: Vec<u8>,
}

impl SequencePair {
    pub fn new(id: impl Into<String>, pattern: impl Into<Vec<u8>>, text: impl Into<Vec<u8>>) -> Self {
        Self { id: id.into(), pattern: pattern.into(), text: text.into() }
    }
}

pub fn read_pairs<R: BufRead>(reader: R) -> Result<Vec<SequencePair>, BenchAlignError> {
    let mut pairs = Vec::new();
    let mut pending: Option<(usize, Vec<u8>)> = None;

    for (line_ix, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = line_ix + 1;
        let line = line.trim_end();

        if line.is_empty() {
            continue;
        }

        if let Some(pattern) = line.strip_prefix('>') {
            if let Some((prev_line, _)) = pending {
                return Err(BenchAlignError::MalformedInput {
                    record: line_no,
                    reason: format!("pattern at line {prev_line} has no text line"),
                });
            }

            pending = Some((line_no, pattern.as_bytes().to_vec()));
        } else if let Some(text) = line.strip_prefix('<') {
            let Some((_, pattern)) = pending.take() else {
                return Err(BenchAlignError::MalformedInput {
                    record: line_no,
                    reason: "text line without a preceding pattern line".to_string(),
                });
            };

            pairs.push(SequencePair::new(format!("pair{}", pairs.len() + 1), pattern, text.as_bytes()));
        } else {
            return Err(BenchAlignError::MalformedInput {
                record: line_no,
                reason: "expected a line starting with '>' or '<'".to_string(),
            });
        }
    }

    if let Some((line_no, _)) = pending {
        return Err(BenchAlignError::MalformedInput {
            record: line_no,
            reason: "pattern has no text line".to_string(),
        });
    }

    Ok(pairs)
}

/// Read pairs from FASTA, where each two consecutive records form a pair. The pair is named after
/// its first record.
pub fn read_fasta_pairs<R: BufRead>(reader: R) -> Result<Vec<SequencePair>, BenchAlignError> {
    let mut reader = fasta::io::Reader::new(reader);

    let mut pairs = Vec::new();
    let mut pending: Option<(String, Vec<u8>)> = None;
    let mut num_records = 0;

    for result in reader.records() {
        let record = result?;
        num_records += 1;

        let sequence = record.sequence().as_ref().to_vec();
        match pending.take() {
            None => {
                let name = String::from_utf8_lossy(record.name()).to_string();
                pending = Some((name, sequence));
            },
            Some((name, pattern)) => pairs.push(SequencePair::new(name, pattern, sequence)),
        }
    }

    if let Some((name, _)) = pending {
        return Err(BenchAlignError::MalformedInput {
            record: num_records,
            reason: format!("record '{name}' has no partner, FASTA input needs an even number of records"),
        });
    }

    Ok(pairs)
}
