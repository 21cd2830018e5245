pub mod gap_affine;
pub mod gap_affine_2piece;

pub use gap_affine::GapAffine;
pub use gap_affine_2piece::GapAffine2Piece;

use serde::{Deserialize, Serialize};

use crate::errors::BenchAlignError;

/// Largest cost magnitude accepted by [`translate`]. Scores are accumulated in `i64`, which
/// leaves plenty of headroom for long sequences with costs up to this value.
pub const MAX_PENALTY: u32 = 1 << 16;

/// Engine-neutral alignment costs. Match is a reward, all other values are costs to subtract.
pub trait AlignmentCosts: Copy {
    fn match_score(&self) -> u32;

    fn mismatch(&self) -> u32;

    fn gap_open(&self) -> u32;
    fn gap_extend(&self) -> u32;

    fn gap_open2(&self) -> u32;
    fn gap_extend2(&self) -> u32;

    fn is_two_piece(&self) -> bool;

    /// Cost of a single gap of the given length.
    fn gap_cost(&self, length: usize) -> u64;

    /// Score contribution of aligning two residues against each other.
    #[inline]
    fn substitution_score(&self, is_match: bool) -> i64 {
        if is_match {
            self.match_score() as i64
        } else {
            -(self.mismatch() as i64)
        }
    }

    /// A 5x5 substitution matrix over `A, C, G, T, N`, as used by profile based aligners. Rows
    /// and columns for `N` score 0.
    fn substitution_matrix(&self) -> [[i32; 5]; 5] {
        let a = self.match_score() as i32;
        let b = -(self.mismatch() as i32);

        let mut mat = [[0; 5]; 5];
        for (i, row) in mat.iter_mut().enumerate().take(4) {
            for (j, cell) in row.iter_mut().enumerate().take(4) {
                *cell = if i == j { a } else { b };
            }
        }

        mat
    }
}

/// Penalties as supplied by the caller. Signs are not normalized yet: the caller may use either
/// signed scores (e.g., a negative mismatch score) or unsigned penalty magnitudes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PenaltyModel {
    SingleAffine {
        match_score: i32,
        mismatch: i32,
        gap_open: i32,
        gap_extend: i32,
    },
    TwoPieceAffine {
        match_score: i32,
        mismatch: i32,
        gap_open1: i32,
        gap_extend1: i32,
        gap_open2: i32,
        gap_extend2: i32,
    },
}

impl PenaltyModel {
    /// Build a penalty model from individual values. A second gap tier is used if both of its
    /// values are given; giving only one of them is an error.
    pub fn from_parts(
        match_score: i32,
        mismatch: i32,
        gap_open: i32,
        gap_extend: i32,
        gap_open2: Option<i32>,
        gap_extend2: Option<i32>,
    ) -> Result<Self, BenchAlignError> {
        match (gap_open2, gap_extend2) {
            (None, None) => Ok(Self::SingleAffine { match_score, mismatch, gap_open, gap_extend }),
            (Some(gap_open2), Some(gap_extend2)) => Ok(Self::TwoPieceAffine {
                match_score,
                mismatch,
                gap_open1: gap_open,
                gap_extend1: gap_extend,
                gap_open2,
                gap_extend2,
            }),
            _ => Err(BenchAlignError::InvalidPenalties(
                "two-piece affine penalties require both a second gap open and gap extend value".to_string()
            )),
        }
    }
}

/// Translated costs handed to an engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineCosts {
    Affine(GapAffine),
    Affine2Piece(GapAffine2Piece),
}

/// Translate caller penalties into engine costs, normalizing the sign of every value once.
///
/// A non-positive match value is replaced by the minimum reward of 1. Choosing the cheaper gap tier of
/// a two-piece model is left to the engine.
pub fn translate(penalties: &PenaltyModel) -> Result<EngineCosts, BenchAlignError> {
    match *penalties {
        PenaltyModel::SingleAffine { match_score, mismatch, gap_open, gap_extend } => {
            Ok(EngineCosts::Affine(GapAffine::new(
                normalize_match(match_score)?,
                magnitude("mismatch", mismatch)?,
                magnitude("gap_open", gap_open)?,
                magnitude("gap_extend", gap_extend)?,
            )))
        },
        PenaltyModel::TwoPieceAffine { match_score, mismatch, gap_open1, gap_extend1, gap_open2, gap_extend2 } => {
            Ok(EngineCosts::Affine2Piece(GapAffine2Piece::new(
                normalize_match(match_score)?,
                magnitude("mismatch", mismatch)?,
                magnitude("gap_open1", gap_open1)?,
                magnitude("gap_extend1", gap_extend1)?,
                magnitude("gap_open2", gap_open2)?,
                magnitude("gap_extend2", gap_extend2)?,
            )))
        },
    }
}

fn normalize_match(value: i32) -> Result<u32, BenchAlignError> {
    if value <= 0 {
        Ok(1)
    } else {
        magnitude("match", value)
    }
}

fn magnitude(name: &str, value: i32) -> Result<u32, BenchAlignError> {
    let abs = value.unsigned_abs();
    if abs > MAX_PENALTY {
        return Err(BenchAlignError::InvalidPenalties(
            format!("{name} penalty {value} exceeds the maximum magnitude of {MAX_PENALTY}")
        ));
    }

    Ok(abs)
}

impl AlignmentCosts for EngineCosts {
    #[inline(always)]
    fn match_score(&self) -> u32 {
        match self {
            Self::Affine(c) => c.match_score(),
            Self::Affine2Piece(c) => c.match_score(),
        }
    }

    #[inline(always)]
    fn mismatch(&self) -> u32 {
        match self {
            Self::Affine(c) => c.mismatch(),
            Self::Affine2Piece(c) => c.mismatch(),
        }
    }

    #[inline(always)]
    fn gap_open(&self) -> u32 {
        match self {
            Self::Affine(c) => c.gap_open(),
            Self::Affine2Piece(c) => c.gap_open(),
        }
    }

    #[inline(always)]
    fn gap_extend(&self) -> u32 {
        match self {
            Self::Affine(c) => c.gap_extend(),
            Self::Affine2Piece(c) => c.gap_extend(),
        }
    }

    #[inline(always)]
    fn gap_open2(&self) -> u32 {
        match self {
            Self::Affine(c) => c.gap_open2(),
            Self::Affine2Piece(c) => c.gap_open2(),
        }
    }

    #[inline(always)]
    fn gap_extend2(&self) -> u32 {
        match self {
            Self::Affine(c) => c.gap_extend2(),
            Self::Affine2Piece(c) => c.gap_extend2(),
        }
    }

    #[inline(always)]
    fn is_two_piece(&self) -> bool {
        matches!(self, Self::Affine2Piece(_))
    }

    #[inline]
    fn gap_cost(&self, length: usize) -> u64 {
        match self {
            Self::Affine(c) => c.gap_cost(length),
            Self::Affine2Piece(c) => c.gap_cost(length),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_sign_normalization() {
        let signed = PenaltyModel::SingleAffine { match_score: -1, mismatch: -4, gap_open: -6, gap_extend: -2 };
        let unsigned = PenaltyModel::SingleAffine { match_score: 1, mismatch: 4, gap_open: 6, gap_extend: 2 };

        let costs = translate(&signed).unwrap();
        assert_eq!(costs, translate(&unsigned).unwrap());
        assert_eq!(costs.match_score(), 1);
        assert_eq!(costs.mismatch(), 4);
        assert_eq!(costs.gap_open(), 6);
        assert_eq!(costs.gap_extend(), 2);
        assert!(!costs.is_two_piece());

        assert_eq!(costs.substitution_score(true), 1);
        assert_eq!(costs.substitution_score(false), -4);
    }

    #[test]
    fn test_translate_non_positive_match() {
        let penalties = PenaltyModel::SingleAffine { match_score: 0, mismatch: 4, gap_open: 6, gap_extend: 2 };
        let costs = translate(&penalties).unwrap();
        assert_eq!(costs.match_score(), 1);

        let penalties = PenaltyModel::SingleAffine { match_score: -2, mismatch: 4, gap_open: 6, gap_extend: 2 };
        let costs = translate(&penalties).unwrap();
        assert_eq!(costs.match_score(), 1);
        assert_eq!(costs.substitution_score(true), 1);

        let penalties = PenaltyModel::TwoPieceAffine {
            match_score: i32::MIN, mismatch: 4,
            gap_open1: 6, gap_extend1: 2,
            gap_open2: 24, gap_extend2: 1,
        };
        assert_eq!(translate(&penalties).unwrap().match_score(), 1);
    }

    #[test]
    fn test_translate_two_piece() {
        let penalties = PenaltyModel::TwoPieceAffine {
            match_score: 0, mismatch: -4,
            gap_open1: 6, gap_extend1: 2,
            gap_open2: -24, gap_extend2: -1,
        };

        let costs = translate(&penalties).unwrap();
        assert!(costs.is_two_piece());
        assert_eq!(costs.gap_open(), 6);
        assert_eq!(costs.gap_extend(), 2);
        assert_eq!(costs.gap_open2(), 24);
        assert_eq!(costs.gap_extend2(), 1);

        // Short gaps use the first tier, long gaps the second
        assert_eq!(costs.gap_cost(1), 8);
        assert_eq!(costs.gap_cost(30), 54);
    }

    #[test]
    fn test_translate_rejects_huge_penalties() {
        let penalties = PenaltyModel::SingleAffine { match_score: 1, mismatch: i32::MIN, gap_open: 6, gap_extend: 2 };
        assert!(matches!(translate(&penalties), Err(BenchAlignError::InvalidPenalties(_))));
    }

    #[test]
    fn test_from_parts() {
        assert!(matches!(
            PenaltyModel::from_parts(0, 4, 6, 2, None, None),
            Ok(PenaltyModel::SingleAffine { .. })
        ));
        assert!(matches!(
            PenaltyModel::from_parts(0, 4, 6, 2, Some(24), Some(1)),
            Ok(PenaltyModel::TwoPieceAffine { gap_open2: 24, gap_extend2: 1, .. })
        ));
        assert!(PenaltyModel::from_parts(0, 4, 6, 2, Some(24), None).is_err());
    }

    #[test]
    fn test_substitution_matrix() {
        let costs = translate(&PenaltyModel::SingleAffine { match_score: 2, mismatch: 4, gap_open: 6, gap_extend: 2 }).unwrap();
        let mat = costs.substitution_matrix();

        assert_eq!(mat[0], [2, -4, -4, -4, 0]);
        assert_eq!(mat[3], [-4, -4, -4, 2, 0]);
        assert_eq!(mat[4], [0; 5]);
    }
}
