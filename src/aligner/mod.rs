use std::fmt::{self, Display, Formatter};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use scoring::AlignmentCosts;

pub mod scoring;
pub mod cigar;
pub mod reconcile;
pub mod driver;
pub mod packed;
pub mod utils;

pub use driver::{BandedAlignmentDriver, DriverConfig};
pub use packed::align_packed;
pub use reconcile::reconcile;

/// A single alignment operation. Each operation consumes exactly one position pair:
/// `Match` and `Mismatch` consume one pattern and one text character, `Insert` consumes a pattern
/// character, and `Delete` consumes a text character.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Match,
    Mismatch,
    Insert,
    Delete,
}

impl Operation {
    #[inline]
    pub fn consumes_pattern(&self) -> bool {
        !matches!(self, Self::Delete)
    }

    #[inline]
    pub fn consumes_text(&self) -> bool {
        !matches!(self, Self::Insert)
    }

    #[inline]
    pub fn is_aligned(&self) -> bool {
        matches!(self, Self::Match | Self::Mismatch)
    }

    pub fn as_char(&self) -> char {
        match self {
            Self::Match => 'M',
            Self::Mismatch => 'X',
            Self::Insert => 'I',
            Self::Delete => 'D',
        }
    }
}

/// A normalized alignment: exact operations plus the number of pattern and text positions they
/// consume.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentResult {
    operations: Vec<Operation>,
    pattern_consumed: usize,
    text_consumed: usize,
}

impl AlignmentResult {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn push(&mut self, op: Operation) {
        if op.consumes_pattern() {
            self.pattern_consumed += 1;
        }

        if op.consumes_text() {
            self.text_consumed += 1;
        }

        self.operations.push(op);
    }

    #[inline]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    #[inline]
    pub fn pattern_consumed(&self) -> usize {
        self.pattern_consumed
    }

    #[inline]
    pub fn text_consumed(&self) -> usize {
        self.text_consumed
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn is_complete(&self, pattern_length: usize, text_length: usize) -> bool {
        self.pattern_consumed == pattern_length && self.text_consumed == text_length
    }

    pub fn num_matches(&self) -> usize {
        self.operations.iter().filter(|op| **op == Operation::Match).count()
    }

    pub fn num_mismatches(&self) -> usize {
        self.operations.iter().filter(|op| **op == Operation::Mismatch).count()
    }

    /// Run-length encoded CIGAR string using `M`, `X`, `I` and `D`.
    pub fn cigar(&self) -> String {
        self.operations.iter()
            .dedup_with_count()
            .map(|(count, op)| format!("{count}{}", op.as_char()))
            .collect()
    }

    /// One character per operation.
    pub fn operations_string(&self) -> String {
        self.operations.iter().map(|op| op.as_char()).collect()
    }

    /// Score of this alignment under the given costs. Each run of insertions or deletions is
    /// charged as a single gap.
    pub fn score<C: AlignmentCosts>(&self, costs: &C) -> i64 {
        self.operations.iter()
            .dedup_with_count()
            .map(|(count, op)| match op {
                Operation::Match => count as i64 * costs.substitution_score(true),
                Operation::Mismatch => count as i64 * costs.substitution_score(false),
                Operation::Insert | Operation::Delete => -(costs.gap_cost(count) as i64),
            })
            .sum()
    }
}

impl Display for AlignmentResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.cigar())
    }
}

impl FromIterator<Operation> for AlignmentResult {
    fn from_iter<T: IntoIterator<Item = Operation>>(iter: T) -> Self {
        let mut result = Self::new();
        for op in iter {
            result.push(op);
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::scoring::{GapAffine, GapAffine2Piece};
    use Operation::*;

    #[test]
    fn test_result_counters() {
        let result: AlignmentResult = [Match, Match, Mismatch, Insert, Insert, Delete, Match].into_iter().collect();

        assert_eq!(result.len(), 7);
        assert_eq!(result.pattern_consumed(), 6);
        assert_eq!(result.text_consumed(), 5);
        assert!(result.is_complete(6, 5));
        assert_eq!(result.num_matches(), 3);
        assert_eq!(result.num_mismatches(), 1);
    }

    #[test]
    fn test_cigar_strings() {
        let result: AlignmentResult = [Match, Match, Match, Mismatch, Delete, Match].into_iter().collect();
        assert_eq!(result.cigar(), "3M1X1D1M");
        assert_eq!(result.operations_string(), "MMMXDM");
        assert_eq!(format!("{result}"), "3M1X1D1M");

        assert_eq!(AlignmentResult::new().cigar(), "");
    }

    #[test]
    fn test_score() {
        let costs = GapAffine::new(1, 4, 6, 2);
        let result: AlignmentResult = [Match, Match, Mismatch, Insert, Insert, Match, Delete].into_iter().collect();

        // 3 matches, one mismatch, a gap of length 2 and one of length 1
        assert_eq!(result.score(&costs), 3 - 4 - 10 - 8);

        let costs = GapAffine2Piece::new(1, 4, 6, 2, 10, 1);
        let long_gap: AlignmentResult = std::iter::repeat(Delete).take(10).collect();
        assert_eq!(long_gap.score(&costs), -20);
    }
}
