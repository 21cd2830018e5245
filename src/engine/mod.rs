//! Engine side of the alignment protocol.
//!
//! Banded engines extend their DP matrix a bounded number of cells per fill step, and expose the
//! intermediate results as [`FillState`] handles. Full-matrix engines align a pair in one call
//! and return a packed operation sequence.
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use crate::aligner::scoring::EngineCosts;
use crate::aligner::Operation;
use crate::errors::BenchAlignError;
use crate::sequence::{Section, SectionId, Symbol};

pub mod gotoh;
pub mod banded;
pub mod full;

#[cfg(test)]
pub(crate) mod mock;

pub use banded::ReferenceBandedEngine;
pub use full::FullMatrixEngine;

/// Status bits reported by a fill step. The flags are independent of each other.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct FillStatus(u8);

impl FillStatus {
    /// The data of section A is exhausted; continue with a tail section.
    pub const NEEDS_TAIL_A: Self = Self(0b001);

    /// The data of section B is exhausted; continue with a tail section.
    pub const NEEDS_TAIL_B: Self = Self(0b010);

    /// The engine stopped extending, no further fill steps are possible.
    pub const TERMINATED: Self = Self(0b100);

    pub const fn empty() -> Self {
        Self(0)
    }

    #[inline(always)]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline(always)]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline(always)]
    pub const fn needs_tail_a(self) -> bool {
        self.contains(Self::NEEDS_TAIL_A)
    }

    #[inline(always)]
    pub const fn needs_tail_b(self) -> bool {
        self.contains(Self::NEEDS_TAIL_B)
    }

    #[inline(always)]
    pub const fn is_terminated(self) -> bool {
        self.contains(Self::TERMINATED)
    }
}

impl BitOr for FillStatus {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FillStatus {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for FillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (Self::NEEDS_TAIL_A, "NEEDS_TAIL_A"),
            (Self::NEEDS_TAIL_B, "NEEDS_TAIL_B"),
            (Self::TERMINATED, "TERMINATED"),
        ].into_iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| name)
            .collect();

        if names.is_empty() {
            write!(f, "FillStatus(empty)")
        } else {
            write!(f, "FillStatus({})", names.join(" | "))
        }
    }
}

/// Reference to the score frontier of one fill step, owned by the engine's DP context.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FillId(pub usize);

/// Result of a single fill step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FillState {
    /// Frontier computed by this step
    pub id: FillId,

    /// Maximum score reached by this step
    pub max: i64,

    pub status: FillStatus,
}

impl FillState {
    /// Score marker for states that have no alignment score (yet).
    pub const NO_SCORE: i64 = i64::MIN;

    pub fn new(id: FillId, max: i64, status: FillStatus) -> Self {
        Self { id, max, status }
    }
}

/// Traceback output of an engine. Engines either emit operations directly, or a packed
/// run-length sequence (`length << 4 | selector`) together with the total aligned length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AlignmentPath {
    Operations(Vec<Operation>),
    Packed { cigar: Vec<u32>, aligned_len: usize },
}

/// An engine that fills its DP matrix incrementally.
pub trait BandedEngine: Sized {
    type Dp: DpMatrix;

    fn init(costs: &EngineCosts, xdrop: i32) -> Result<Self, BenchAlignError>;

    /// Create a fresh DP context for a single alignment.
    fn dp_init(&self) -> Self::Dp;

    fn build_section<'a>(&self, id: SectionId, data: &'a [Symbol]) -> Section<'a> {
        Section::new(id, data)
    }
}

/// Per-alignment DP context of a banded engine.
pub trait DpMatrix {
    /// First fill step, starting at the given offsets in both sections.
    fn fill_root(
        &mut self,
        section_a: Section<'_>,
        offset_a: usize,
        section_b: Section<'_>,
        offset_b: usize,
        fill_cap: u32,
    ) -> Result<FillState, BenchAlignError>;

    /// Continue filling from a previous state. `fill_cap` bounds the number of positions the
    /// step advances along either section.
    fn fill(
        &mut self,
        previous: &FillState,
        section_a: Section<'_>,
        section_b: Section<'_>,
        fill_cap: u32,
    ) -> Result<FillState, BenchAlignError>;

    fn trace(&mut self, state: &FillState) -> Result<AlignmentPath, BenchAlignError>;

    /// Release the frontier of a fill step. Releasing twice is a no-op.
    fn release(&mut self, id: FillId);

    /// Release everything held by this context. Calling it more than once is a no-op.
    fn clean(&mut self);
}

/// Output of a full-matrix engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackedAlignment {
    pub cigar: Vec<u32>,
    pub aligned_len: usize,
    pub score: i64,
}

/// An engine that aligns a pair in a single call and returns packed operations.
pub trait PackedEngine: Sized {
    fn init(costs: &EngineCosts) -> Result<Self, BenchAlignError>;

    fn align(&mut self, pattern: &[u8], text: &[u8]) -> Result<PackedAlignment, BenchAlignError>;
}
