//! A banded engine that replays a fixed script of fill results. Used to exercise the alignment
//! driver without a real DP implementation.
use std::cell::RefCell;
use std::rc::Rc;

use crate::aligner::scoring::EngineCosts;
use crate::errors::{AlignStage, BenchAlignError};
use crate::sequence::{Section, SectionId};

use super::{AlignmentPath, BandedEngine, DpMatrix, FillId, FillState, FillStatus};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ScriptStep {
    Fill { max: i64, status: FillStatus },
    Fail,
}

impl ScriptStep {
    pub fn fill(max: i64, status: FillStatus) -> Self {
        Self::Fill { max, status }
    }
}

/// Record of the calls the driver made into a scripted DP context.
#[derive(Clone, Debug, Default)]
pub struct ScriptLog {
    /// Section ids passed to each fill call, root included
    pub sections: Vec<(SectionId, SectionId)>,
    pub fill_caps: Vec<u32>,
    pub traced: Vec<FillId>,
    pub released: Vec<FillId>,
    pub cleaned: usize,
}

#[derive(Clone, Debug)]
pub struct ScriptedEngine {
    script: Vec<ScriptStep>,
    path: AlignmentPath,
    log: Rc<RefCell<ScriptLog>>,
}

impl ScriptedEngine {
    pub fn new(script: Vec<ScriptStep>, path: AlignmentPath) -> Self {
        Self { script, path, log: Rc::new(RefCell::new(ScriptLog::default())) }
    }

    pub fn log(&self) -> Rc<RefCell<ScriptLog>> {
        Rc::clone(&self.log)
    }
}

impl BandedEngine for ScriptedEngine {
    type Dp = ScriptedDp;

    fn init(_: &EngineCosts, _: i32) -> Result<Self, BenchAlignError> {
        Ok(Self::new(Vec::new(), AlignmentPath::Operations(Vec::new())))
    }

    fn dp_init(&self) -> Self::Dp {
        ScriptedDp {
            script: self.script.clone(),
            path: Some(self.path.clone()),
            released: Vec::new(),
            cleaned: false,
            log: Rc::clone(&self.log),
        }
    }
}

pub struct ScriptedDp {
    script: Vec<ScriptStep>,
    path: Option<AlignmentPath>,
    released: Vec<bool>,
    cleaned: bool,
    log: Rc<RefCell<ScriptLog>>,
}

impl ScriptedDp {
    fn next(&mut self, section_a: Section<'_>, section_b: Section<'_>, fill_cap: u32) -> Result<FillState, BenchAlignError> {
        {
            let mut log = self.log.borrow_mut();
            log.sections.push((section_a.id(), section_b.id()));
            log.fill_caps.push(fill_cap);
        }

        let index = self.released.len();
        match self.script.get(index) {
            Some(ScriptStep::Fill { max, status }) => {
                self.released.push(false);
                Ok(FillState::new(FillId(index), *max, *status))
            },
            Some(ScriptStep::Fail) => Err(BenchAlignError::EngineFailure {
                stage: AlignStage::Fill,
                reason: format!("scripted failure at step {index}"),
            }),
            None => Err(BenchAlignError::EngineFailure {
                stage: AlignStage::Fill,
                reason: "fill script exhausted".to_string(),
            }),
        }
    }
}

impl DpMatrix for ScriptedDp {
    fn fill_root(
        &mut self,
        section_a: Section<'_>,
        _: usize,
        section_b: Section<'_>,
        _: usize,
        fill_cap: u32,
    ) -> Result<FillState, BenchAlignError> {
        self.next(section_a, section_b, fill_cap)
    }

    fn fill(
        &mut self,
        _: &FillState,
        section_a: Section<'_>,
        section_b: Section<'_>,
        fill_cap: u32,
    ) -> Result<FillState, BenchAlignError> {
        self.next(section_a, section_b, fill_cap)
    }

    fn trace(&mut self, state: &FillState) -> Result<AlignmentPath, BenchAlignError> {
        self.log.borrow_mut().traced.push(state.id);

        self.path.take().ok_or_else(|| BenchAlignError::EngineFailure {
            stage: AlignStage::Trace,
            reason: "scripted path already consumed".to_string(),
        })
    }

    fn release(&mut self, id: FillId) {
        if let Some(released) = self.released.get_mut(id.0) {
            if !*released {
                *released = true;
                self.log.borrow_mut().released.push(id);
            }
        }
    }

    fn clean(&mut self) {
        if self.cleaned {
            return;
        }

        for id in 0..self.released.len() {
            self.release(FillId(id));
        }

        self.cleaned = true;
        self.log.borrow_mut().cleaned += 1;
    }
}
