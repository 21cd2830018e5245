use serde::{Deserialize, Serialize};

use super::AlignmentCosts;

/// Two-piece gap-affine costs. Each gap is charged by whichever of the two
/// `(gap_open, gap_extend)` tiers is cheaper for its length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapAffine2Piece {
    score_match: u32,
    cost_mismatch: u32,
    cost_gap_open1: u32,
    cost_gap_extend1: u32,
    cost_gap_open2: u32,
    cost_gap_extend2: u32,
}

impl GapAffine2Piece {
    pub fn new(
        score_match: u32,
        cost_mismatch: u32,
        cost_gap_open1: u32,
        cost_gap_extend1: u32,
        cost_gap_open2: u32,
        cost_gap_extend2: u32,
    ) -> Self {
        Self { score_match, cost_mismatch, cost_gap_open1, cost_gap_extend1, cost_gap_open2, cost_gap_extend2 }
    }
}

impl AlignmentCosts for GapAffine2Piece {
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
        self.cost_gap_open1
    }

    #[inline(always)]
    fn gap_extend(&self) -> u32 {
        self.cost_gap_extend1
    }

    #[inline(always)]
    fn gap_open2(&self) -> u32 {
        self.cost_gap_open2
    }

    #[inline(always)]
    fn gap_extend2(&self) -> u32 {
        self.cost_gap_extend2
    }

    #[inline(always)]
    fn is_two_piece(&self) -> bool {
        true
    }

    #[inline]
    fn gap_cost(&self, length: usize) -> u64 {
        if length == 0 {
            return 0
        }

        let l = length as u64;
        let tier1 = self.cost_gap_open1 as u64 + l * self.cost_gap_extend1 as u64;
        let tier2 = self.cost_gap_open2 as u64 + l * self.cost_gap_extend2 as u64;

        tier1.min(tier2)
    }
}
