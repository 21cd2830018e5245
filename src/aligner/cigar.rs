//! Packed run-length operation encoding, as emitted by full-matrix engines.
//!
//! Each packed entry stores the run length in the upper bits and an operation selector in the
//! lowest 4 bits: `entry = run_length << 4 | selector`. Selectors index the alphabet
//! `{Match, Delete, Insert}`. Engines emitting this encoding can not tell matches from
//! mismatches, so every aligned run decodes to provisional [`Operation::Match`] operations.
use itertools::Itertools;

use crate::aligner::Operation;
use crate::errors::{AlignStage, BenchAlignError};

const OP_SHIFT: u32 = 4;
const OP_MASK: u32 = 0xF;

/// Operation alphabet of packed entries, in selector order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PackedOp {
    Match = 0,
    Delete = 1,
    Insert = 2,
}

const PACKED_ALPHABET: [PackedOp; 3] = [PackedOp::Match, PackedOp::Delete, PackedOp::Insert];

impl PackedOp {
    #[inline]
    pub fn code(self) -> u32 {
        self as u32
    }

    #[inline]
    pub fn to_operation(self) -> Operation {
        match self {
            Self::Match => Operation::Match,
            Self::Delete => Operation::Delete,
            Self::Insert => Operation::Insert,
        }
    }

    /// The coarse packed operation for an exact operation. Mismatches fold into `Match`.
    #[inline]
    pub fn from_operation(op: Operation) -> Self {
        match op {
            Operation::Match | Operation::Mismatch => Self::Match,
            Operation::Delete => Self::Delete,
            Operation::Insert => Self::Insert,
        }
    }
}

/// A single run of identical coarse operations.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PackedOperation {
    pub op: PackedOp,
    pub length: u32,
}

impl PackedOperation {
    pub fn new(op: PackedOp, length: u32) -> Self {
        Self { op, length }
    }

    /// Unpack a raw entry. `index` is the position of the entry, used for error reporting.
    pub fn from_raw(index: usize, raw: u32) -> Result<Self, BenchAlignError> {
        let selector = raw & OP_MASK;
        let op = PACKED_ALPHABET.get(selector as usize)
            .copied()
            .ok_or(BenchAlignError::InvalidOperationCode { index, code: selector })?;

        Ok(Self { op, length: raw >> OP_SHIFT })
    }

    #[inline]
    pub fn to_raw(self) -> u32 {
        (self.length << OP_SHIFT) | self.op.code()
    }
}

/// Unpack raw entries into runs, without expanding them.
pub fn unpack(packed: &[u32]) -> Result<Vec<PackedOperation>, BenchAlignError> {
    packed.iter()
        .enumerate()
        .map(|(index, raw)| PackedOperation::from_raw(index, *raw))
        .collect()
}

/// Expand a packed operation sequence into one operation per consumed position pair.
///
/// `reported_len` is the total aligned length reported by the engine; the decoded operations must
/// add up to exactly this length.
pub fn decode(packed: &[u32], reported_len: usize) -> Result<Vec<Operation>, BenchAlignError> {
    let runs = unpack(packed)?;

    let decoded: usize = runs.iter().map(|run| run.length as usize).sum();
    if decoded != reported_len {
        return Err(BenchAlignError::DecodedLengthMismatch { decoded, reported: reported_len });
    }

    let mut operations = Vec::new();
    operations.try_reserve_exact(decoded)
        .map_err(|_| BenchAlignError::AllocationFailure { stage: AlignStage::Decode, requested: decoded })?;

    for run in runs {
        operations.extend(std::iter::repeat(run.op.to_operation()).take(run.length as usize));
    }

    Ok(operations)
}

/// Collapse consecutive identical coarse operations into runs.
pub fn pack(operations: &[Operation]) -> Vec<PackedOperation> {
    operations.iter()
        .map(|op| PackedOp::from_operation(*op))
        .dedup_with_count()
        .map(|(count, op)| PackedOperation::new(op, count as u32))
        .collect()
}

/// Pack operations straight to raw entries.
pub fn pack_raw(operations: &[Operation]) -> Vec<u32> {
    pack(operations).into_iter()
        .map(|run| run.to_raw())
        .collect()
}
