use serde::{Deserialize, Serialize};

use super::AlignmentCosts;

/// Single-tier gap-affine costs. A gap of length `l` costs `gap_open + l * gap_extend`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapAffine {
    score_match: u32,
    cost_mismatch: u32,
    cost_gap_open: u32,
    cost_gap_extend: u32,
}

impl GapAffine {
    pub fn new(score_match: u32, cost_mismatch: u32, cost_gap_open: u32, cost_gap_extend: u32) -> Self {
        Self { score_match, cost_mismatch, cost_gap_open, cost_gap_extend }
    }
}

impl AlignmentCosts for GapAffine {
    #[inline(always)]
    fn match_score(&self) -> u32 {
        self.score_match
    }

    #[inline(always)]
    fn mismatch(&self) -> u32 {
        self.cost_mismatch
    }

    #[inline(always)]
    fn gap_open(&self) -> u32 {
        self.cost_gap_open
    }

    #[inline(always)]
    fn gap_extend(&self) -> u32 {
        self.cost_gap_extend
    }

    #[inline(always)]
    fn gap_open2(&self) -> u32 {
        0
    }

    #[inline(always)]
    fn gap_extend2(&self) -> u32 {
        0
    }

    #[inline(always)]
    fn is_two_piece(&self) -> bool {
        false
    }

    #[inline]
    fn gap_cost(&self, length: usize) -> u64 {
        if length == 0 {
            return 0
        }

        self.cost_gap_open as u64 + (length as u64 * self.cost_gap_extend as u64)
    }
}
