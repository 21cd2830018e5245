//! Driving a banded engine from the root fill to termination.
//!
//! Both sequences are encoded into padded sections. Fill steps continue on the sequence sections
//! until the engine reports that one of them is exhausted, after which that side continues on a
//! shared all-padding tail section. The fill loop stops when a step terminates, or when a step asks
//! for a tail on a side that is already on its tail. The state with the highest score seen along
//! the way is traced back.
use smallvec::SmallVec;
use tracing::{debug, debug_span, trace};

use crate::aligner::cigar::decode;
use crate::aligner::reconcile::reconcile;
use crate::aligner::scoring::EngineCosts;
use crate::aligner::AlignmentResult;
use crate::engine::{AlignmentPath, BandedEngine, DpMatrix, FillId, FillState, FillStatus};
use crate::errors::{AlignStage, BenchAlignError};
use crate::sequence::{encode, EncodedSection, Section, SectionId};

pub const PATTERN_SECTION: SectionId = 0;
pub const TEXT_SECTION: SectionId = 2;
pub const TAIL_SECTION: SectionId = 4;

/// Extra fill steps allowed on top of the sequence and padding lengths before the driver gives up.
const EXTRA_FILL_STEPS: usize = 4;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DriverConfig {
    /// Number of sentinel symbols appended to each section
    pub padding: usize,

    /// X-drop threshold handed to the engine on initialization
    pub xdrop: i32,

    /// Maximum number of positions a single fill step may advance. `u32::MAX` is unbounded.
    pub fill_cap: u32,

    /// Maximum number of fill steps per alignment. Derived from the input lengths if not set.
    pub max_fill_steps: Option<usize>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            padding: 32,
            xdrop: 100,
            fill_cap: u32::MAX,
            max_fill_steps: None,
        }
    }
}

/// Which sections the next fill step reads from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FillPhase {
    Root,
    FillingBody,
    FillingTailA,
    FillingTailB,
    FillingBothTails,
    Done,
}

impl FillPhase {
    fn from_tails(tail_a: bool, tail_b: bool) -> Self {
        match (tail_a, tail_b) {
            (false, false) => Self::FillingBody,
            (true, false) => Self::FillingTailA,
            (false, true) => Self::FillingTailB,
            (true, true) => Self::FillingBothTails,
        }
    }

    #[inline]
    pub fn on_tail_a(self) -> bool {
        matches!(self, Self::FillingTailA | Self::FillingBothTails)
    }

    #[inline]
    pub fn on_tail_b(self) -> bool {
        matches!(self, Self::FillingTailB | Self::FillingBothTails)
    }

    /// The phase following a fill step that reported `status`.
    pub fn after(self, status: FillStatus) -> Self {
        if self == Self::Done || status.is_terminated() {
            return Self::Done;
        }

        if (status.needs_tail_a() && self.on_tail_a()) || (status.needs_tail_b() && self.on_tail_b()) {
            return Self::Done;
        }

        Self::from_tails(
            self.on_tail_a() || status.needs_tail_a(),
            self.on_tail_b() || status.needs_tail_b(),
        )
    }

    /// Select the sections for the next fill step.
    pub fn sections<'a>(self, a: Section<'a>, b: Section<'a>, tail: Section<'a>) -> (Section<'a>, Section<'a>) {
        (
            if self.on_tail_a() { tail } else { a },
            if self.on_tail_b() { tail } else { b },
        )
    }
}

/// Owns a DP context for the duration of one alignment. Every fill state produced through the
/// session is released, and the context cleaned, when the session is dropped.
struct FillSession<D: DpMatrix> {
    dp: D,
    chain: SmallVec<[FillId; 16]>,
}

impl<D: DpMatrix> FillSession<D> {
    fn new(dp: D) -> Self {
        Self { dp, chain: SmallVec::new() }
    }

    fn fill_root(&mut self, a: Section<'_>, b: Section<'_>, fill_cap: u32) -> Result<FillState, BenchAlignError> {
        let state = self.dp.fill_root(a, 0, b, 0, fill_cap)?;
        self.chain.push(state.id);

        Ok(state)
    }

    fn fill(
        &mut self,
        previous: &FillState,
        a: Section<'_>,
        b: Section<'_>,
        fill_cap: u32,
    ) -> Result<FillState, BenchAlignError> {
        let state = self.dp.fill(previous, a, b, fill_cap)?;
        self.chain.push(state.id);

        Ok(state)
    }

    fn trace(&mut self, state: &FillState) -> Result<AlignmentPath, BenchAlignError> {
        self.dp.trace(state)
    }
}

impl<D: DpMatrix> Drop for FillSession<D> {
    fn drop(&mut self) {
        for id in self.chain.drain(..) {
            self.dp.release(id);
        }

        self.dp.clean();
    }
}

#[derive(Copy, Clone, Debug)]
pub struct FillOutcome {
    /// State with the highest score, the first one on ties
    pub best: FillState,

    /// Final state of the fill loop
    pub last: FillState,

    /// Number of fill steps including the root
    pub steps: usize,
}

#[derive(Clone, Debug, Default)]
pub struct BandedAlignmentDriver {
    config: DriverConfig,
}

impl BandedAlignmentDriver {
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Initialize an engine with the driver's X-drop setting.
    pub fn init_engine<E: BandedEngine>(&self, costs: &EngineCosts) -> Result<E, BenchAlignError> {
        E::init(costs, self.config.xdrop)
    }

    /// Globally align `pattern` against `text` with the given engine.
    pub fn align<E: BandedEngine>(
        &self,
        engine: &E,
        pattern: &[u8],
        text: &[u8],
    ) -> Result<AlignmentResult, BenchAlignError> {
        let span = debug_span!("banded_align", pattern_len = pattern.len(), text_len = text.len());
        let _enter = span.enter();

        let padding = self.config.padding;
        let max_steps = match self.config.max_fill_steps {
            Some(max_steps) => max_steps,
            None => fill_step_limit(pattern.len(), text.len(), padding)?,
        };

        let encoded_a = encode(PATTERN_SECTION, pattern, padding)?;
        let encoded_b = encode(TEXT_SECTION, text, padding)?;
        let encoded_tail = EncodedSection::tail(TAIL_SECTION, padding)?;

        let a = engine.build_section(encoded_a.id(), encoded_a.data());
        let b = engine.build_section(encoded_b.id(), encoded_b.data());
        let tail = engine.build_section(encoded_tail.id(), encoded_tail.data());

        let path = {
            let mut session = FillSession::new(engine.dp_init());
            let outcome = self.fill_to_end(&mut session, a, b, tail, max_steps)?;
            debug!(
                steps = outcome.steps,
                best = outcome.best.id.0,
                max = outcome.best.max,
                last_status = ?outcome.last.status,
                "fill finished"
            );

            session.trace(&outcome.best)?
        };

        let coarse = match path {
            AlignmentPath::Operations(ops) => ops,
            AlignmentPath::Packed { cigar, aligned_len } => decode(&cigar, aligned_len)?,
        };

        reconcile(pattern, text, &coarse)
    }

    fn fill_to_end<D: DpMatrix>(
        &self,
        session: &mut FillSession<D>,
        a: Section<'_>,
        b: Section<'_>,
        tail: Section<'_>,
        max_steps: usize,
    ) -> Result<FillOutcome, BenchAlignError> {
        let fill_cap = self.config.fill_cap;

        let root = session.fill_root(a, b, fill_cap)?;
        trace!(id = root.id.0, max = root.max, status = ?root.status, "root fill");

        let mut best = root;
        let mut last = root;
        let mut steps = 1;
        let mut phase = FillPhase::Root.after(root.status);

        while phase != FillPhase::Done {
            if steps >= max_steps {
                return Err(BenchAlignError::EngineFailure {
                    stage: AlignStage::Fill,
                    reason: format!("fill did not terminate within {steps} steps"),
                });
            }

            let (section_a, section_b) = phase.sections(a, b, tail);
            let next = session.fill(&last, section_a, section_b, fill_cap)?;
            steps += 1;

            trace!(id = next.id.0, max = next.max, status = ?next.status, ?phase, "fill");

            if next.max > best.max {
                best = next;
            }

            let next_phase = phase.after(next.status);
            if next_phase != phase && next_phase != FillPhase::Done {
                debug!(from = ?phase, to = ?next_phase, "switching to tail section");
            }

            phase = next_phase;
            last = next;
        }

        Ok(FillOutcome { best, last, steps })
    }
}

/// Default bound on the number of fill steps: one per sequence and padding symbol, plus a few.
fn fill_step_limit(pattern_len: usize, text_len: usize, padding: usize) -> Result<usize, BenchAlignError> {
    padding.checked_mul(2)
        .and_then(|n| n.checked_add(pattern_len))
        .and_then(|n| n.checked_add(text_len))
        .and_then(|n| n.checked_add(EXTRA_FILL_STEPS))
        .ok_or(BenchAlignError::AllocationFailure { stage: AlignStage::Encode, requested: usize::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aligner::scoring::{translate, PenaltyModel};
    use crate::aligner::Operation;
    use crate::engine::mock::{ScriptStep, ScriptedEngine};
    use crate::engine::{FullMatrixEngine, PackedEngine, ReferenceBandedEngine};
    use Operation::*;

    const EMPTY: FillStatus = FillStatus::empty();

    fn costs() -> EngineCosts {
        translate(&PenaltyModel::SingleAffine { match_score: 1, mismatch: 4, gap_open: 6, gap_extend: 2 }).unwrap()
    }

    #[test]
    fn test_phase_transitions() {
        use FillPhase::*;

        assert_eq!(Root.after(EMPTY), FillingBody);
        assert_eq!(Root.after(FillStatus::NEEDS_TAIL_A), FillingTailA);
        assert_eq!(FillingTailA.after(FillStatus::NEEDS_TAIL_B), FillingBothTails);
        assert_eq!(FillingTailA.after(EMPTY), FillingTailA);
        assert_eq!(FillingTailA.after(FillStatus::NEEDS_TAIL_A), Done);
        assert_eq!(FillingBothTails.after(FillStatus::NEEDS_TAIL_B), Done);
        assert_eq!(FillingBody.after(FillStatus::TERMINATED | FillStatus::NEEDS_TAIL_A), Done);
        assert_eq!(Done.after(EMPTY), Done);
    }

    #[test]
    fn test_phase_sections() {
        let a = Section::new(0, &[]);
        let b = Section::new(2, &[]);
        let tail = Section::new(4, &[]);

        for (phase, expected) in [
            (FillPhase::FillingBody, (0, 2)),
            (FillPhase::FillingTailA, (4, 2)),
            (FillPhase::FillingTailB, (0, 4)),
            (FillPhase::FillingBothTails, (4, 4)),
        ] {
            let (x, y) = phase.sections(a, b, tail);
            assert_eq!((x.id(), y.id()), expected);
        }
    }

    #[test]
    fn test_best_state_first_on_ties() {
        let engine = ScriptedEngine::new(vec![
            ScriptStep::fill(5, EMPTY),
            ScriptStep::fill(8, EMPTY),
            ScriptStep::fill(8, EMPTY),
            ScriptStep::fill(3, FillStatus::TERMINATED),
        ], AlignmentPath::Operations(vec![Match; 4]));
        let log = engine.log();

        let result = BandedAlignmentDriver::default().align(&engine, b"ACGT", b"ACGT").unwrap();
        assert_eq!(result.cigar(), "4M");

        let log = log.borrow();
        assert_eq!(log.traced, vec![FillId(1)]);
        assert_eq!(log.sections.len(), 4);
    }

    #[test]
    fn test_root_only() {
        let engine = ScriptedEngine::new(
            vec![ScriptStep::fill(0, FillStatus::TERMINATED)],
            AlignmentPath::Operations(vec![]),
        );
        let log = engine.log();

        let result = BandedAlignmentDriver::default().align(&engine, b"", b"").unwrap();
        assert!(result.is_empty());

        let log = log.borrow();
        assert_eq!(log.sections, vec![(PATTERN_SECTION, TEXT_SECTION)]);
        assert_eq!(log.traced, vec![FillId(0)]);
        assert_eq!(log.released, vec![FillId(0)]);
        assert_eq!(log.cleaned, 1);
    }

    #[test]
    fn test_tail_switching() {
        let engine = ScriptedEngine::new(vec![
            ScriptStep::fill(1, EMPTY),
            ScriptStep::fill(2, FillStatus::NEEDS_TAIL_B),
            ScriptStep::fill(3, FillStatus::NEEDS_TAIL_A),
            ScriptStep::fill(4, FillStatus::TERMINATED),
        ], AlignmentPath::Operations(vec![Match, Match, Match, Delete]));
        let log = engine.log();

        let result = BandedAlignmentDriver::default().align(&engine, b"ACG", b"ACGT").unwrap();
        assert_eq!(result.cigar(), "3M1D");

        let log = log.borrow();
        assert_eq!(log.sections, vec![
            (PATTERN_SECTION, TEXT_SECTION),
            (PATTERN_SECTION, TEXT_SECTION),
            (PATTERN_SECTION, TAIL_SECTION),
            (TAIL_SECTION, TAIL_SECTION),
        ]);
        assert_eq!(log.traced, vec![FillId(3)]);
        assert!(log.fill_caps.iter().all(|cap| *cap == u32::MAX));
    }

    #[test]
    fn test_repeated_tail_request_stops() {
        // The second request for a tail on A ends the loop, even without TERMINATED. The
        // flag-free step in between does not reset the tail state.
        let engine = ScriptedEngine::new(vec![
            ScriptStep::fill(1, FillStatus::NEEDS_TAIL_A),
            ScriptStep::fill(2, EMPTY),
            ScriptStep::fill(3, FillStatus::NEEDS_TAIL_A),
            ScriptStep::fill(4, FillStatus::TERMINATED),
        ], AlignmentPath::Operations(vec![Match; 4]));
        let log = engine.log();

        BandedAlignmentDriver::default().align(&engine, b"ACGT", b"ACGT").unwrap();

        let log = log.borrow();
        assert_eq!(log.sections, vec![
            (PATTERN_SECTION, TEXT_SECTION),
            (TAIL_SECTION, TEXT_SECTION),
            (TAIL_SECTION, TEXT_SECTION),
        ]);
        assert_eq!(log.traced, vec![FillId(2)]);
        assert_eq!(log.released, vec![FillId(0), FillId(1), FillId(2)]);
    }

    #[test]
    fn test_fill_failure_releases_states() {
        let engine = ScriptedEngine::new(vec![
            ScriptStep::fill(1, EMPTY),
            ScriptStep::fill(2, EMPTY),
            ScriptStep::Fail,
        ], AlignmentPath::Operations(vec![]));
        let log = engine.log();

        let err = BandedAlignmentDriver::default().align(&engine, b"ACGT", b"ACGT").unwrap_err();
        assert_eq!(err.stage(), Some(AlignStage::Fill));

        let log = log.borrow();
        assert!(log.traced.is_empty());
        assert_eq!(log.released, vec![FillId(0), FillId(1)]);
        assert_eq!(log.cleaned, 1);
    }

    #[test]
    fn test_non_termination_guard() {
        let engine = ScriptedEngine::new(vec![ScriptStep::fill(0, EMPTY); 10], AlignmentPath::Operations(vec![]));
        let log = engine.log();

        let driver = BandedAlignmentDriver::new(DriverConfig { max_fill_steps: Some(3), ..DriverConfig::default() });
        let err = driver.align(&engine, b"ACGT", b"ACGT").unwrap_err();
        assert!(matches!(err, BenchAlignError::EngineFailure { stage: AlignStage::Fill, .. }));

        let log = log.borrow();
        assert_eq!(log.sections.len(), 3);
        assert_eq!(log.released.len(), 3);
        assert_eq!(log.cleaned, 1);
    }

    #[test]
    fn test_packed_path_is_decoded() {
        let engine = ScriptedEngine::new(
            vec![ScriptStep::fill(0, FillStatus::TERMINATED)],
            AlignmentPath::Packed { cigar: vec![3 << 4, (1 << 4) | 1], aligned_len: 4 },
        );

        let result = BandedAlignmentDriver::default().align(&engine, b"ACC", b"ACGT").unwrap();
        assert_eq!(result.operations(), &[Match, Match, Mismatch, Delete]);

        let engine = ScriptedEngine::new(
            vec![ScriptStep::fill(0, FillStatus::TERMINATED)],
            AlignmentPath::Packed { cigar: vec![3 << 4], aligned_len: 4 },
        );
        let err = BandedAlignmentDriver::default().align(&engine, b"ACG", b"ACG").unwrap_err();
        assert!(err.is_protocol_violation());
    }

    #[test]
    fn test_huge_padding_is_rejected() {
        let engine = ScriptedEngine::new(vec![ScriptStep::fill(0, FillStatus::TERMINATED)], AlignmentPath::Operations(vec![]));
        let log = engine.log();

        let config = DriverConfig { padding: usize::MAX / 2 + 1, ..DriverConfig::default() };
        let err = BandedAlignmentDriver::new(config).align(&engine, b"ACGT", b"ACGT").unwrap_err();

        assert!(matches!(err, BenchAlignError::AllocationFailure { stage: AlignStage::Encode, requested: usize::MAX }));
        assert!(log.borrow().sections.is_empty());

        assert_eq!(fill_step_limit(3, 4, 32).unwrap(), 75);
        assert!(fill_step_limit(usize::MAX - 4, 4, 0).is_err());
    }

    #[test]
    fn test_invalid_symbol_before_fill() {
        let engine = ScriptedEngine::new(vec![ScriptStep::fill(0, FillStatus::TERMINATED)], AlignmentPath::Operations(vec![]));
        let log = engine.log();

        let err = BandedAlignmentDriver::default().align(&engine, b"ACXT", b"ACGT").unwrap_err();
        assert_eq!(err.stage(), Some(AlignStage::Encode));
        assert!(log.borrow().sections.is_empty());
    }

    #[test]
    fn test_reference_engine_end_to_end() {
        let driver = BandedAlignmentDriver::default();
        let engine: ReferenceBandedEngine = driver.init_engine(&costs()).unwrap();

        let result = driver.align(&engine, b"ACGT", b"ACGT").unwrap();
        assert_eq!(result.operations(), &[Match; 4]);

        let result = driver.align(&engine, b"ACGA", b"ACGT").unwrap();
        assert_eq!(result.operations(), &[Match, Match, Match, Mismatch]);

        let result = driver.align(&engine, b"ACG", b"ACGT").unwrap();
        assert_eq!(result.operations(), &[Match, Match, Match, Delete]);

        let result = driver.align(&engine, b"", b"").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_unit_penalties() {
        let costs = translate(&PenaltyModel::SingleAffine { match_score: 1, mismatch: 1, gap_open: 1, gap_extend: 1 }).unwrap();
        let driver = BandedAlignmentDriver::default();
        let engine: ReferenceBandedEngine = driver.init_engine(&costs).unwrap();

        let result = driver.align(&engine, b"ACGT", b"ACGT").unwrap();
        assert_eq!(result.operations(), &[Match; 4]);
        assert!(result.is_complete(4, 4));
    }

    #[test]
    fn test_reference_engine_small_blocks() {
        let costs = costs();
        let driver = BandedAlignmentDriver::new(DriverConfig { padding: 4, ..DriverConfig::default() });
        let engine = driver.init_engine::<ReferenceBandedEngine>(&costs).unwrap().with_block_size(4);

        let pattern = b"ACGTTGCATTACGGATC";
        let text = b"ACGTGCATTAACGGAT";
        let result = driver.align(&engine, pattern, text).unwrap();

        assert!(result.is_complete(pattern.len(), text.len()));

        let mut full = FullMatrixEngine::init(&costs).unwrap();
        let expected = full.align(pattern, text).unwrap();
        assert_eq!(result.score(&costs), expected.score);
    }

    #[test]
    fn test_reference_engine_fill_cap() {
        let driver = BandedAlignmentDriver::new(DriverConfig { fill_cap: 1, ..DriverConfig::default() });
        let engine: ReferenceBandedEngine = driver.init_engine(&costs()).unwrap();

        let result = driver.align(&engine, b"ACGTACGT", b"ACGTACGT").unwrap();
        assert_eq!(result.cigar(), "8M");
    }

    #[test]
    fn test_reference_engine_xdrop() {
        let driver = BandedAlignmentDriver::new(DriverConfig { xdrop: 10, padding: 4, ..DriverConfig::default() });
        let engine = driver.init_engine::<ReferenceBandedEngine>(&costs()).unwrap().with_block_size(4);

        let err = driver.align(&engine, b"AAAAAAAACCCCCCCCCCCCCCCC", b"AAAAAAAAGGGGGGGGGGGGGGGG").unwrap_err();
        assert!(matches!(err, BenchAlignError::UnconsumedInput { .. }));
    }
}
