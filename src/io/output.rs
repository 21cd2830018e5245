use std::io::Write;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::aligner::scoring::AlignmentCosts;
use crate::aligner::utils::format_alignment;
use crate::aligner::AlignmentResult;
use crate::errors::BenchAlignError;
use crate::io::pairs::SequencePair;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Tab separated: id, pattern length, text length, score, CIGAR
    Cigar,

    /// One JSON object per line
    Json,

    /// Header line followed by a three-line alignment view
    Pretty,
}

/// Outcome of aligning a single pair, ready for output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentRecord {
    pub id: String,
    pub pattern_length: usize,
    pub text_length: usize,
    pub score: Option<i64>,
    pub cigar: Option<String>,
    pub matches: usize,
    pub mismatches: usize,
    pub error: Option<String>,
    pub elapsed_ns: u64,

    #[serde(skip)]
    pub view: Option<String>,
}

impl AlignmentRecord {
    pub fn new<C: AlignmentCosts>(
        pair: &SequencePair,
        result: &Result<AlignmentResult, BenchAlignError>,
        costs: &C,
        elapsed: Duration,
        with_view: bool,
    ) -> Self {
        let mut record = Self {
            id: pair.id.clone(),
            pattern_length: pair.pattern.len(),
            text_length: pair.text.len(),
            score: None,
            cigar: None,
            matches: 0,
            mismatches: 0,
            error: None,
            elapsed_ns: elapsed.as_nanos().try_into().unwrap_or(u64::MAX),
            view: None,
        };

        match result {
            Ok(aln) => {
                record.score = Some(aln.score(costs));
                record.cigar = Some(aln.cigar());
                record.matches = aln.num_matches();
                record.mismatches = aln.num_mismatches();

                if with_view {
                    record.view = Some(format_alignment(&pair.pattern, &pair.text, aln));
                }
            },
            Err(err) => record.error = Some(err.to_string()),
        }

        record
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Write a single record in the given output format.
pub fn emit<W: Write + ?Sized>(writer: &mut W, format: OutputFormat, record: &AlignmentRecord) -> Result<(), BenchAlignError> {
    match format {
        OutputFormat::Cigar => {
            let score = record.score.map_or_else(|| "*".to_string(), |s| s.to_string());
            let cigar = record.cigar.as_deref().unwrap_or("*");

            write!(writer, "{}\t{}\t{}\t{}\t{}", record.id, record.pattern_length, record.text_length, score, cigar)?;
            if let Some(ref error) = record.error {
                write!(writer, "\t{error}")?;
            }

            writeln!(writer)?;
        },
        OutputFormat::Json => {
            serde_json::to_writer(&mut *writer, record)?;
            writeln!(writer)?;
        },
        OutputFormat::Pretty => {
            match (&record.error, record.score) {
                (Some(error), _) => writeln!(writer, "# {} failed: {error}", record.id)?,
                (None, Some(score)) => writeln!(
                    writer, "# {} score={score} matches={} mismatches={}",
                    record.id, record.matches, record.mismatches
                )?,
                (None, None) => writeln!(writer, "# {}", record.id)?,
            }

            if let Some(ref view) = record.view {
                writeln!(writer, "{view}")?;
            }

            writeln!(writer)?;
        },
    }

    Ok(())
}
