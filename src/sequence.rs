//! Nucleotide symbol coding and padded sequence sections for banded engines.
use std::fmt;

use crate::errors::{AlignStage, BenchAlignError};

/// A nucleotide symbol as seen by a banded engine.
///
/// Each base has its own single-bit code, and `Any` is the union of all four. Two symbols match
/// if their codes intersect, so `Any` matches every base. `Any` is used to pad sections beyond the
/// real sequence data.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Symbol {
    A = 0b0001,
    C = 0b0010,
    G = 0b0100,
    T = 0b1000,
    Any = 0b1111,
}

impl Symbol {
    pub const BASES: [Symbol; 4] = [Symbol::A, Symbol::C, Symbol::G, Symbol::T];

    #[inline(always)]
    pub const fn code(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0b0001 => Some(Self::A),
            0b0010 => Some(Self::C),
            0b0100 => Some(Self::G),
            0b1000 => Some(Self::T),
            0b1111 => Some(Self::Any),
            _ => None,
        }
    }

    /// Look up the symbol for a raw nucleotide character. Only upper case `ACGT` are recognized.
    #[inline(always)]
    pub fn from_ascii(c: u8) -> Option<Self> {
        SYMBOL_TABLE[c as usize]
    }

    /// Combine two symbols. The union of two distinct symbols is not a single base, and
    /// collapses to `Any`.
    #[inline]
    pub fn union(self, other: Self) -> Self {
        if self == other {
            self
        } else {
            Self::Any
        }
    }

    #[inline(always)]
    pub fn matches(self, other: Self) -> bool {
        self.code() & other.code() != 0
    }

    #[inline(always)]
    pub fn is_sentinel(self) -> bool {
        self == Self::Any
    }

    /// Row/column of this symbol in a 5x5 substitution matrix (`A, C, G, T, N`).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::C => 1,
            Self::G => 2,
            Self::T => 3,
            Self::Any => 4,
        }
    }

    pub fn to_ascii(self) -> u8 {
        match self {
            Self::A => b'A',
            Self::C => b'C',
            Self::G => b'G',
            Self::T => b'T',
            Self::Any => b'N',
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_ascii() as char)
    }
}

const fn build_symbol_table() -> [Option<Symbol>; 256] {
    let mut table = [None; 256];
    table[b'A' as usize] = Some(Symbol::A);
    table[b'C' as usize] = Some(Symbol::C);
    table[b'G' as usize] = Some(Symbol::G);
    table[b'T' as usize] = Some(Symbol::T);

    table
}

static SYMBOL_TABLE: [Option<Symbol>; 256] = build_symbol_table();

/// Identifier of a section, used by engines to tell whether a fill continues the same section.
pub type SectionId = u32;

/// A padded, symbol-coded copy of one input sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedSection {
    id: SectionId,
    data: Vec<Symbol>,
    seq_len: usize,
}

impl EncodedSection {
    /// A section that consists only of padding, substituted for a sequence whose data ran out.
    pub fn tail(id: SectionId, padding: usize) -> Result<Self, BenchAlignError> {
        let mut data = Vec::new();
        reserve(&mut data, padding)?;
        data.resize(padding, Symbol::Any);

        Ok(Self { id, data, seq_len: 0 })
    }

    #[inline]
    pub fn id(&self) -> SectionId {
        self.id
    }

    /// Encoded symbols, including the trailing padding.
    #[inline]
    pub fn data(&self) -> &[Symbol] {
        &self.data
    }

    /// Number of symbols in the buffer (sequence length plus padding).
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of real sequence symbols, excluding padding.
    #[inline]
    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    #[inline]
    pub fn padding(&self) -> usize {
        self.data.len() - self.seq_len
    }

    pub fn as_section(&self) -> Section<'_> {
        Section::new(self.id, &self.data)
    }
}

/// Encode a nucleotide sequence and append `padding` sentinel symbols.
///
/// The padding must be at least as wide as the largest extension an engine performs in a
/// single fill step; this is not checked here.
pub fn encode(id: SectionId, sequence: &[u8], padding: usize) -> Result<EncodedSection, BenchAlignError> {
    let total = sequence.len().checked_add(padding)
        .ok_or(BenchAlignError::AllocationFailure { stage: AlignStage::Encode, requested: usize::MAX })?;
    let mut data = Vec::new();
    reserve(&mut data, total)?;

    for (position, &c) in sequence.iter().enumerate() {
        let symbol = Symbol::from_ascii(c)
            .ok_or(BenchAlignError::InvalidSymbol { position, symbol: c })?;
        data.push(symbol);
    }

    data.resize(total, Symbol::Any);

    Ok(EncodedSection { id, data, seq_len: sequence.len() })
}

/// Check that every character of `sequence` is a recognized nucleotide.
pub fn validate(sequence: &[u8]) -> Result<(), BenchAlignError> {
    match sequence.iter().position(|&c| Symbol::from_ascii(c).is_none()) {
        Some(position) => Err(BenchAlignError::InvalidSymbol { position, symbol: sequence[position] }),
        None => Ok(()),
    }
}

fn reserve(data: &mut Vec<Symbol>, requested: usize) -> Result<(), BenchAlignError> {
    data.try_reserve_exact(requested)
        .map_err(|_| BenchAlignError::AllocationFailure { stage: AlignStage::Encode, requested })
}

/// A borrowed view on section data handed to an engine fill step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Section<'a> {
    id: SectionId,
    data: &'a [Symbol],
}

impl<'a> Section<'a> {
    pub fn new(id: SectionId, data: &'a [Symbol]) -> Self {
        Self { id, data }
    }

    #[inline(always)]
    pub fn id(&self) -> SectionId {
        self.id
    }

    #[inline(always)]
    pub fn data(&self) -> &'a [Symbol] {
        self.data
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
