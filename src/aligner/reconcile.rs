use crate::aligner::{AlignmentResult, Operation};
use crate::errors::{AlignStage, BenchAlignError};

/// Refine a coarse operation stream into exact operations.
///
/// Aligned operations (`Match`, or a `Mismatch` from engines that already tell them apart) are
/// re-checked against the sequences and emitted as `Match` or `Mismatch`. Insertions and
/// deletions advance only the pattern or text cursor respectively. The operations must consume
/// both sequences completely.
pub fn reconcile(pattern: &[u8], text: &[u8], coarse: &[Operation]) -> Result<AlignmentResult, BenchAlignError> {
    let mut operations = Vec::new();
    operations.try_reserve_exact(coarse.len())
        .map_err(|_| BenchAlignError::AllocationFailure { stage: AlignStage::Reconcile, requested: coarse.len() })?;

    let mut pattern_pos = 0;
    let mut text_pos = 0;

    for (operation_index, op) in coarse.iter().enumerate() {
        let exceeds = (op.consumes_pattern() && pattern_pos >= pattern.len())
            || (op.consumes_text() && text_pos >= text.len());

        if exceeds {
            return Err(BenchAlignError::OperationsExceedInput { operation_index, pattern_pos, text_pos });
        }

        let refined = if !op.is_aligned() {
            *op
        } else if pattern[pattern_pos] == text[text_pos] {
            Operation::Match
        } else {
            Operation::Mismatch
        };

        if op.consumes_pattern() {
            pattern_pos += 1;
        }

        if op.consumes_text() {
            text_pos += 1;
        }

        operations.push(refined);
    }

    if pattern_pos != pattern.len() || text_pos != text.len() {
        return Err(BenchAlignError::UnconsumedInput {
            pattern_consumed: pattern_pos,
            pattern_length: pattern.len(),
            text_consumed: text_pos,
            text_length: text.len(),
        });
    }

    Ok(operations.into_iter().collect())
}
