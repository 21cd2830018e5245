use tracing::trace;

use crate::aligner::cigar::pack_raw;
use crate::aligner::scoring::EngineCosts;
use crate::errors::BenchAlignError;
use crate::sequence::Symbol;

use super::gotoh::AffineMatrix;
use super::{PackedAlignment, PackedEngine};

/// One-shot global aligner that fills the complete DP matrix and reports a packed CIGAR.
///
/// Characters outside the nucleotide alphabet are scored like `N`.
#[derive(Clone, Debug)]
pub struct FullMatrixEngine {
    costs: EngineCosts,
}

impl PackedEngine for FullMatrixEngine {
    fn init(costs: &EngineCosts) -> Result<Self, BenchAlignError> {
        Ok(Self { costs: *costs })
    }

    fn align(&mut self, pattern: &[u8], text: &[u8]) -> Result<PackedAlignment, BenchAlignError> {
        let to_symbols = |seq: &[u8]| -> Vec<Symbol> {
            seq.iter()
                .map(|c| Symbol::from_ascii(*c).unwrap_or(Symbol::Any))
                .collect()
        };

        let mut matrix = AffineMatrix::new(self.costs);
        matrix.extend_text(&to_symbols(text));
        matrix.extend_pattern(&to_symbols(pattern));

        let ops = matrix.traceback(pattern.len(), text.len())?;
        let score = matrix.corner_score();
        trace!(score, aligned_len = ops.len(), "full matrix alignment");

        Ok(PackedAlignment {
            cigar: pack_raw(&ops),
            aligned_len: ops.len(),
            score,
        })
    }
}
