use tracing::{debug_span, trace};

use crate::aligner::cigar::decode;
use crate::aligner::reconcile::reconcile;
use crate::aligner::AlignmentResult;
use crate::engine::PackedEngine;
use crate::errors::BenchAlignError;
use crate::sequence::validate;

/// Globally align `pattern` against `text` with a full-matrix engine.
///
/// The engine's packed operations are expanded, checked against the aligned length the engine
/// reported, and refined into matches and mismatches.
pub fn align_packed<E: PackedEngine>(
    engine: &mut E,
    pattern: &[u8],
    text: &[u8],
) -> Result<AlignmentResult, BenchAlignError> {
    let span = debug_span!("packed_align", pattern_len = pattern.len(), text_len = text.len());
    let _enter = span.enter();

    validate(pattern)?;
    validate(text)?;

    let aln = engine.align(pattern, text)?;
    trace!(entries = aln.cigar.len(), aligned_len = aln.aligned_len, score = aln.score, "engine output");

    let coarse = decode(&aln.cigar, aln.aligned_len)?;

    reconcile(pattern, text, &coarse)
}
