//! Reference implementation of the banded fill protocol.
//!
//! Each fill step takes at most `block_size` symbols (further bounded by the fill cap) from the
//! current section of either sequence and grows a global Gotoh matrix accordingly. A side whose
//! section runs into the sentinel padding, or past its end, is exhausted: the step reports
//! `NEEDS_TAIL_x` for that side, and the side does not grow any further. Once both sides are
//! exhausted the fill terminates.
//!
//! States that do not cover both sequences completely have no global alignment score and report
//! [`FillState::NO_SCORE`]. The X-drop condition is checked on the score of the filled region's
//! corner cell: a step whose corner falls more than `xdrop` below the best corner so far
//! terminates the fill.
use tracing::{debug, trace};

use crate::aligner::scoring::{EngineCosts, GapAffine};
use crate::errors::{AlignStage, BenchAlignError};
use crate::sequence::{Section, SectionId, Symbol};

use super::gotoh::AffineMatrix;
use super::{AlignmentPath, BandedEngine, DpMatrix, FillId, FillState, FillStatus};

pub const DEFAULT_BLOCK_SIZE: usize = 32;

#[derive(Clone, Debug)]
pub struct ReferenceBandedEngine {
    costs: GapAffine,
    xdrop: i64,
    block_size: usize,
}

impl ReferenceBandedEngine {
    /// Set the maximum number of symbols taken from each section per fill step. Sequences need
    /// at least this much padding.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }
}

impl BandedEngine for ReferenceBandedEngine {
    type Dp = ReferenceDp;

    fn init(costs: &EngineCosts, xdrop: i32) -> Result<Self, BenchAlignError> {
        match costs {
            EngineCosts::Affine(costs) => Ok(Self {
                costs: *costs,
                xdrop: xdrop.unsigned_abs() as i64,
                block_size: DEFAULT_BLOCK_SIZE,
            }),
            EngineCosts::Affine2Piece(_) => Err(BenchAlignError::EngineFailure {
                stage: AlignStage::Fill,
                reason: "the banded reference engine only supports single-tier gap-affine costs".to_string(),
            }),
        }
    }

    fn dp_init(&self) -> Self::Dp {
        ReferenceDp {
            costs: self.costs,
            matrix: AffineMatrix::new(self.costs),
            cursors: [SideCursor::default(), SideCursor::default()],
            fills: Vec::new(),
            best_corner: FillState::NO_SCORE,
            xdrop: self.xdrop,
            block_size: self.block_size,
        }
    }
}

/// Read position of one side within its current section.
#[derive(Clone, Debug, Default)]
struct SideCursor {
    section: Option<SectionId>,
    pos: usize,
    exhausted: bool,
}

impl SideCursor {
    /// Take up to `limit` real symbols. Returns the symbols and whether this side became
    /// exhausted in this step.
    fn advance<'a>(&mut self, section: Section<'a>, offset: usize, limit: usize) -> (&'a [Symbol], bool) {
        if self.exhausted {
            return (&[], false);
        }

        if self.section != Some(section.id()) {
            self.section = Some(section.id());
            self.pos = offset;
        }

        let data = section.data();
        let start = self.pos.min(data.len());
        let end = data[start..].iter()
            .take(limit)
            .position(|s| s.is_sentinel())
            .map(|p| start + p)
            .unwrap_or_else(|| start.saturating_add(limit).min(data.len()));

        self.pos = end;
        self.exhausted = data.get(end).map_or(true, |s| s.is_sentinel());

        (&data[start..end], self.exhausted)
    }
}

#[derive(Clone, Debug)]
struct FillRecord {
    pattern_len: usize,
    text_len: usize,
    terminated: bool,
    released: bool,
}

pub struct ReferenceDp {
    costs: GapAffine,
    matrix: AffineMatrix<GapAffine>,
    cursors: [SideCursor; 2],
    fills: Vec<FillRecord>,
    best_corner: i64,
    xdrop: i64,
    block_size: usize,
}

impl ReferenceDp {
    fn step(
        &mut self,
        section_a: Section<'_>,
        offset_a: usize,
        section_b: Section<'_>,
        offset_b: usize,
        fill_cap: u32,
    ) -> FillState {
        let limit = self.block_size.min(fill_cap as usize).max(1);

        let (symbols_a, done_a) = self.cursors[0].advance(section_a, offset_a, limit);
        let (symbols_b, done_b) = self.cursors[1].advance(section_b, offset_b, limit);

        self.matrix.extend_text(symbols_b);
        self.matrix.extend_pattern(symbols_a);

        let mut status = FillStatus::empty();
        if done_a {
            status |= FillStatus::NEEDS_TAIL_A;
        }

        if done_b {
            status |= FillStatus::NEEDS_TAIL_B;
        }

        let corner = self.matrix.corner_score();
        self.best_corner = self.best_corner.max(corner);

        let complete = self.cursors[0].exhausted && self.cursors[1].exhausted;
        let dropped = corner < self.best_corner.saturating_sub(self.xdrop);
        if dropped {
            debug!(corner, best = self.best_corner, "X-drop condition reached");
        }

        let max = if complete || dropped {
            status |= FillStatus::TERMINATED;
            corner
        } else {
            FillState::NO_SCORE
        };

        let id = FillId(self.fills.len());
        self.fills.push(FillRecord {
            pattern_len: self.matrix.pattern_len(),
            text_len: self.matrix.text_len(),
            terminated: status.is_terminated(),
            released: false,
        });

        trace!(
            id = id.0,
            pattern_len = self.matrix.pattern_len(),
            text_len = self.matrix.text_len(),
            ?status,
            "fill step"
        );

        FillState::new(id, max, status)
    }

    fn check_previous(&self, previous: &FillState) -> Result<(), BenchAlignError> {
        let reason = match self.fills.get(previous.id.0) {
            None => "unknown fill state",
            Some(_) if previous.id.0 + 1 != self.fills.len() => "fill must continue from the most recent state",
            Some(record) if record.released => "fill state was already released",
            Some(record) if record.terminated => "fill already terminated",
            Some(_) => return Ok(()),
        };

        Err(BenchAlignError::EngineFailure { stage: AlignStage::Fill, reason: reason.to_string() })
    }
}

impl DpMatrix for ReferenceDp {
    fn fill_root(
        &mut self,
        section_a: Section<'_>,
        offset_a: usize,
        section_b: Section<'_>,
        offset_b: usize,
        fill_cap: u32,
    ) -> Result<FillState, BenchAlignError> {
        if !self.fills.is_empty() {
            return Err(BenchAlignError::EngineFailure {
                stage: AlignStage::Fill,
                reason: "root fill on a DP context that was already used".to_string(),
            });
        }

        Ok(self.step(section_a, offset_a, section_b, offset_b, fill_cap))
    }

    fn fill(
        &mut self,
        previous: &FillState,
        section_a: Section<'_>,
        section_b: Section<'_>,
        fill_cap: u32,
    ) -> Result<FillState, BenchAlignError> {
        self.check_previous(previous)?;

        Ok(self.step(section_a, 0, section_b, 0, fill_cap))
    }

    fn trace(&mut self, state: &FillState) -> Result<AlignmentPath, BenchAlignError> {
        let record = self.fills.get(state.id.0)
            .filter(|record| !record.released)
            .ok_or_else(|| BenchAlignError::EngineFailure {
                stage: AlignStage::Trace,
                reason: format!("fill state {} is not available for traceback", state.id.0),
            })?;

        let ops = self.matrix.traceback(record.pattern_len, record.text_len)?;

        Ok(AlignmentPath::Operations(ops))
    }

    fn release(&mut self, id: FillId) {
        if let Some(record) = self.fills.get_mut(id.0) {
            record.released = true;
        }
    }

    fn clean(&mut self) {
        for record in self.fills.iter_mut() {
            record.released = true;
        }

        self.matrix = AffineMatrix::new(self.costs);
    }
}
